//! Backing stores behind the persistency manager.
//!
//! [`QueryableStore`] holds one row per scraped page and answers filtered
//! queries; [`BlobStore`] holds arbitrary named files. Callers depend only on
//! these traits, one reference implementation of each lives alongside.

pub mod cache;
pub mod fs;
pub mod sqlite;

use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::records::DatabaseRow;

pub use cache::WebsiteUrlCache;
pub use fs::FsBlobStore;
pub use sqlite::SqliteStore;

/// Single pass iterator over rows fetched by [`QueryableStore::list_records`]
pub type RowIter = Box<dyn Iterator<Item = DatabaseRow> + Send>;

/// Structured store keyed by url
#[async_trait]
pub trait QueryableStore: Send + Sync {
    /// Fetch up to `limit` rows.
    ///
    /// `scraped` restricts the result to rows with (`Some(true)`) or without
    /// (`Some(false)`) content; `None` leaves it unfiltered.
    async fn list_records(&self, limit: usize, scraped: Option<bool>) -> Result<RowIter>;

    /// All urls on record for `website`.
    async fn known_urls(&mut self, website: &str) -> Result<Arc<HashSet<String>>>;

    /// Insert new rows. Inserting an existing url again creates a duplicate.
    async fn append(&mut self, rows: Vec<DatabaseRow>) -> Result<()>;

    /// Remove every row whose url is listed; absent urls are ignored.
    async fn delete(&mut self, urls: &[String]) -> Result<()>;
}

/// Named file storage, rooted under a fixed store-level prefix
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload the local file at `source` as `destination`
    async fn save(&self, destination: &str, source: &Path) -> Result<()>;

    /// List stored names starting with `prefix`.
    ///
    /// With a `delimiter`, only names with no further delimiter after the
    /// prefix are returned (one hierarchy level). Returned names include
    /// the store's root prefix.
    async fn list(&self, prefix: Option<&str>, delimiter: Option<&str>) -> Result<Vec<String>>;

    /// Fetch a blob fully into memory, positioned at offset 0.
    ///
    /// `name` may be given with or without the store's root prefix.
    async fn read_as_stream(&self, name: &str) -> Result<Cursor<Vec<u8>>>;
}
