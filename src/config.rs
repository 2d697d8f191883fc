use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{PersistencyError, Result};

/// Environment variable overriding [`PersistencyConfig::run_id`]
pub const RUN_ID_ENV: &str = "PAGE_LEDGER_RUN_ID";

/// Configuration for the queryable store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Table holding one row per scraped page
    #[serde(default = "default_table")]
    pub table: String,
}

/// Configuration for a blob store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobStoreConfig {
    /// Bucket location
    pub bucket: String,

    /// Prefix applied to every blob name in the bucket
    #[serde(default)]
    pub prefix: String,
}

/// Everything needed to assemble a persistency manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistencyConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Store for classifier artifacts
    pub classifiers_store: BlobStoreConfig,

    /// Store for temporary per-run url lists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls_store: Option<BlobStoreConfig>,

    /// Namespace for temporary files of this run
    #[serde(default = "default_run_id")]
    pub run_id: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            table: default_table(),
        }
    }
}

/// Default value for the database url
fn default_database_url() -> String {
    "sqlite::memory:".to_string()
}

fn default_table() -> String {
    "scraped_raw".to_string()
}

/// Default run identifier
pub fn default_run_id() -> String {
    "default".to_string()
}

impl PersistencyConfig {
    /// Create a configuration with default database settings
    pub fn new(classifiers_store: BlobStoreConfig) -> Self {
        Self {
            database: DatabaseConfig::default(),
            classifiers_store,
            urls_store: None,
            run_id: default_run_id(),
        }
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut contents = String::new();
        File::open(path)
            .and_then(|mut file| file.read_to_string(&mut contents))
            .map_err(|e| PersistencyError::LocalFile {
                path: path.to_path_buf(),
                source: e,
            })?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        if let Ok(run_id) = std::env::var(RUN_ID_ENV) {
            self.apply_run_id_override(&run_id);
        }
    }

    fn apply_run_id_override(&mut self, run_id: &str) {
        if !run_id.is_empty() {
            self.run_id = run_id.to_string();
        }
    }

    fn validate(&self) -> Result<()> {
        if self.run_id.is_empty() {
            return Err(PersistencyError::Config("run_id must not be empty".to_string()));
        }
        if self.classifiers_store.bucket.is_empty() {
            return Err(PersistencyError::Config(
                "classifiers_store.bucket must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config =
            PersistencyConfig::from_json(r#"{"classifiers_store": {"bucket": "/tmp/models"}}"#)
                .unwrap();

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.table, "scraped_raw");
        assert_eq!(config.classifiers_store.prefix, "");
        assert!(config.urls_store.is_none());
        assert_eq!(config.run_id, "default");
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "database": {"url": "sqlite://ledger.db", "table": "scraped_raw_v3"},
            "classifiers_store": {"bucket": "/srv/classifiers", "prefix": "dev"},
            "urls_store": {"bucket": "/srv/urls", "prefix": "dev"},
            "run_id": "2024-07-28"
        }"#;
        let config = PersistencyConfig::from_json(json).unwrap();

        assert_eq!(config.database.table, "scraped_raw_v3");
        assert_eq!(config.urls_store.unwrap().bucket, "/srv/urls");
        assert_eq!(config.run_id, "2024-07-28");
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(matches!(
            PersistencyConfig::from_json(r#"{"classifiers_store": {"bucket": ""}}"#),
            Err(PersistencyError::Config(_))
        ));
        assert!(matches!(
            PersistencyConfig::from_json(r#"{"run_id": "x"}"#),
            Err(PersistencyError::Json(_))
        ));
    }

    #[test]
    fn test_run_id_override_ignores_empty() {
        let mut config = PersistencyConfig::new(BlobStoreConfig {
            bucket: "/tmp".to_string(),
            prefix: String::new(),
        });
        config.apply_run_id_override("");
        assert_eq!(config.run_id, "default");
        config.apply_run_id_override("nightly");
        assert_eq!(config.run_id, "nightly");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, r#"{"classifiers_store": {"bucket": "b"}}"#).unwrap();
        assert_eq!(
            PersistencyConfig::from_file(&path).unwrap().classifiers_store.bucket,
            "b"
        );

        assert!(matches!(
            PersistencyConfig::from_file(dir.path().join("missing.json")),
            Err(PersistencyError::LocalFile { .. })
        ));
    }
}
