//! Persistency layer for scraped pages.
//!
//! Tracks which urls have already been captured so crawls can skip them, and
//! stores scraped records and auxiliary files across a queryable store and a
//! blob store.

pub mod config;
pub mod error;
pub mod manager;
pub mod records;
pub mod stores;
pub mod website;

// Re-export commonly used types for convenience
pub use config::PersistencyConfig;
pub use error::{PersistencyError, Result};
pub use manager::{PersistencyManager, RecordIter};
pub use records::{DatabaseRow, ScrapedRecord};
pub use stores::{BlobStore, FsBlobStore, QueryableStore, SqliteStore};
pub use website::{content_filename, extract_website};
