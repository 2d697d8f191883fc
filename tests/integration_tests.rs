use std::io::Read;

use chrono::Utc;
use page_ledger::{PersistencyConfig, PersistencyError, PersistencyManager, ScrapedRecord};

fn record(url: &str) -> ScrapedRecord {
    ScrapedRecord::new(
        url,
        "title",
        "content",
        "author",
        "2024-07-28",
        Utc::now(),
        vec!["news".to_string()],
    )
}

fn config_for(dir: &std::path::Path, run_id: &str) -> PersistencyConfig {
    let json = serde_json::json!({
        "database": {
            "url": format!("sqlite://{}", dir.join("ledger.db").display()),
            "table": "scraped_raw_v3"
        },
        "classifiers_store": {"bucket": dir.join("classifiers").display().to_string(), "prefix": "dev"},
        "urls_store": {"bucket": dir.join("urls").display().to_string(), "prefix": "dev"},
        "run_id": run_id
    });
    PersistencyConfig::from_json(&json.to_string()).unwrap()
}

#[tokio::test]
async fn test_crawl_cycle_through_configured_manager() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = PersistencyManager::from_config(&config_for(dir.path(), "nightly"))
        .await
        .unwrap();
    assert_eq!(manager.run_id(), "nightly");

    let batch: Vec<String> = vec![
        "https://example.com/a".to_string(),
        "https://example.com/b".to_string(),
        "https://other.org/c".to_string(),
    ];
    assert_eq!(manager.filter_scraped_urls(&batch).await.unwrap(), batch);

    manager
        .save(&[record("https://example.com/a"), record("https://other.org/c")])
        .await
        .unwrap();
    assert_eq!(
        manager.filter_scraped_urls(&batch).await.unwrap(),
        vec!["https://example.com/b".to_string()]
    );

    // A second manager over the same configuration sees the stored rows
    let mut reopened = PersistencyManager::from_config(&config_for(dir.path(), "nightly"))
        .await
        .unwrap();
    assert!(reopened.was_scraped("https://other.org/c").await.unwrap());
    assert_eq!(reopened.get_all(10, Some(true)).await.unwrap().count(), 2);
}

#[tokio::test]
async fn test_temp_url_lists_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let manager = PersistencyManager::from_config(&config_for(dir.path(), "nightly"))
        .await
        .unwrap();

    let source = dir.path().join("pending.csv");
    std::fs::write(&source, "https://example.com/b\n").unwrap();
    manager.store_temp_urls(&source, "pending.csv").await.unwrap();

    let names = manager.list_temp_urls().await.unwrap();
    assert_eq!(names, vec!["dev/nightly/pending.csv".to_string()]);

    let mut contents = String::new();
    manager
        .get_temp_file(&names[0])
        .await
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "https://example.com/b\n");
}

#[tokio::test]
async fn test_missing_urls_store_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(dir.path(), "nightly");
    config.urls_store = None;

    let manager = PersistencyManager::from_config(&config).await.unwrap();
    assert!(matches!(
        manager.list_temp_urls().await,
        Err(PersistencyError::NoSecondaryStoreConfigured)
    ));
    assert!(manager.list_classifiers().await.unwrap().is_empty());
}
