//! The persistency manager: one queryable store and up to two blob stores
//! behind a single interface.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use crate::config::{PersistencyConfig, default_run_id};
use crate::error::{PersistencyError, Result};
use crate::records::{DatabaseRow, ScrapedRecord};
use crate::stores::{BlobStore, FsBlobStore, QueryableStore, RowIter, SqliteStore};
use crate::website::extract_website;

/// Prefix under which classifier artifacts are stored
pub const CLASSIFIERS_PREFIX: &str = "classifiers/";

/// Lazily decoded records returned by [`PersistencyManager::get_all`].
///
/// A row that cannot be decoded yields an error; the following rows are
/// still available to a caller that keeps iterating.
pub struct RecordIter {
    rows: RowIter,
}

impl Iterator for RecordIter {
    type Item = Result<ScrapedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(DatabaseRow::decode)
    }
}

/// Storage façade used by crawlers, scrapers and classifiers
pub struct PersistencyManager {
    database: Box<dyn QueryableStore>,
    classifiers_store: Box<dyn BlobStore>,
    urls_store: Option<Box<dyn BlobStore>>,
    run_id: String,
}

impl PersistencyManager {
    /// Create a manager without a store for temporary url lists
    pub fn new(
        database: impl QueryableStore + 'static,
        classifiers_store: impl BlobStore + 'static,
    ) -> Self {
        Self {
            database: Box::new(database),
            classifiers_store: Box::new(classifiers_store),
            urls_store: None,
            run_id: default_run_id(),
        }
    }

    /// Set the store for temporary url lists
    pub fn with_urls_store(mut self, urls_store: impl BlobStore + 'static) -> Self {
        self.urls_store = Some(Box::new(urls_store));
        self
    }

    /// Set the run identifier namespacing temporary files
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Assemble the reference stores described by `config`
    pub async fn from_config(config: &PersistencyConfig) -> Result<Self> {
        let database = SqliteStore::connect(&config.database.url, &config.database.table).await?;
        let classifiers_store = FsBlobStore::new(
            &config.classifiers_store.bucket,
            &config.classifiers_store.prefix,
        );

        let mut manager = Self::new(database, classifiers_store).with_run_id(&config.run_id);
        if let Some(urls) = &config.urls_store {
            manager = manager.with_urls_store(FsBlobStore::new(&urls.bucket, &urls.prefix));
        }
        Ok(manager)
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Up to `limit` stored records, optionally restricted to pages with
    /// (or without) content.
    pub async fn get_all(&self, limit: usize, scraped: Option<bool>) -> Result<RecordIter> {
        let rows = self.database.list_records(limit, scraped).await?;
        Ok(RecordIter { rows })
    }

    /// Filter out urls of `website` that are already stored.
    ///
    /// Every url in `urls` is assumed to belong to `website`.
    pub async fn filter_website_scraped_urls(
        &mut self,
        website: &str,
        urls: &[String],
    ) -> Result<Vec<String>> {
        ::log::info!("Filtering {} urls", urls.len());
        let known = self.database.known_urls(website).await.inspect_err(|e| {
            ::log::warn!("Could not fetch stored urls for website {}: {}", website, e)
        })?;
        ::log::info!("Got {} urls in database", known.len());

        Ok(urls
            .iter()
            .filter(|url| !known.contains(url.as_str()))
            .cloned()
            .collect())
    }

    /// Return the urls that have not been stored yet.
    ///
    /// Urls are grouped by website and each group is checked with a single
    /// lookup. Groups come back in order of first appearance, and urls keep
    /// their input order within a group.
    pub async fn filter_scraped_urls(&mut self, urls: &[String]) -> Result<Vec<String>> {
        ::log::debug!("Called filter_scraped_urls with {} urls", urls.len());
        let groups = group_by_website(urls)?;
        if groups.len() > 1 {
            ::log::warn!("Having multiple websites in urls list. Filtering for each website");
        }

        let mut unseen = Vec::new();
        for (website, website_urls) in &groups {
            let fresh = self.filter_website_scraped_urls(website, website_urls).await?;
            unseen.extend(fresh);
        }
        Ok(unseen)
    }

    pub async fn was_scraped(&mut self, url: &str) -> Result<bool> {
        let website = extract_website(url)?;
        let fresh = self
            .filter_website_scraped_urls(&website, &[url.to_string()])
            .await?;
        Ok(fresh.is_empty())
    }

    /// Store scraped records.
    ///
    /// The whole batch is rejected if any url cannot be attributed to a
    /// website. Urls already on record are stored again.
    pub async fn save(&mut self, records: &[ScrapedRecord]) -> Result<()> {
        let rows = records
            .iter()
            .map(DatabaseRow::encode)
            .collect::<Result<Vec<_>>>()?;
        self.database.append(rows).await
    }

    pub async fn delete(&mut self, urls: &[String]) -> Result<()> {
        self.database.delete(urls).await
    }

    /// Upload a local url list as `{run_id}/{destination}`
    pub async fn store_temp_urls(&self, source: &Path, destination: &str) -> Result<()> {
        let destination = format!("{}/{}", self.run_id, destination);
        self.urls_store()?.save(&destination, source).await
    }

    /// Names of the temporary files stored for this run
    pub async fn list_temp_urls(&self) -> Result<Vec<String>> {
        let prefix = format!("{}/", self.run_id);
        self.urls_store()?.list(Some(&prefix), None).await
    }

    /// Read a temporary file, by a name as returned from [`Self::list_temp_urls`]
    pub async fn get_temp_file(&self, name: &str) -> Result<Cursor<Vec<u8>>> {
        self.urls_store()?.read_as_stream(name).await
    }

    pub async fn list_classifiers(&self) -> Result<Vec<String>> {
        self.classifiers_store
            .list(Some(CLASSIFIERS_PREFIX), None)
            .await
    }

    fn urls_store(&self) -> Result<&dyn BlobStore> {
        self.urls_store
            .as_deref()
            .ok_or(PersistencyError::NoSecondaryStoreConfigured)
    }
}

/// Partition urls by website, keeping first-appearance order of websites
/// and input order within each group.
pub(crate) fn group_by_website(urls: &[String]) -> Result<Vec<(String, Vec<String>)>> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for url in urls {
        let website = extract_website(url)?;
        match positions.get(&website) {
            Some(&position) => groups[position].1.push(url.clone()),
            None => {
                positions.insert(website.clone(), groups.len());
                groups.push((website, vec![url.clone()]));
            }
        }
    }
    ::log::debug!(
        "Websites in urls list: {:?}",
        groups.iter().map(|(website, _)| website).collect::<Vec<_>>()
    );
    Ok(groups)
}
