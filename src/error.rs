//! Typed errors for the persistency layer.

use std::path::PathBuf;
use std::string::FromUtf8Error;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PersistencyError>;

/// Errors raised by the stores and the manager.
#[derive(Debug, Error)]
pub enum PersistencyError {
    /// The url cannot be attributed to a website
    #[error("no website found in url: {url}")]
    MalformedUrl { url: String },

    /// A stored byte field is not valid UTF-8
    #[error("cannot decode field `{field}` of {url}: {source}")]
    Decode {
        url: String,
        field: &'static str,
        #[source]
        source: FromUtf8Error,
    },

    /// A stored timestamp could not be parsed
    #[error("invalid last_scraped timestamp for {url}: {value}")]
    InvalidTimestamp { url: String, value: String },

    /// A stored categories column is not a JSON array of byte arrays
    #[error("invalid categories for {url}: {source}")]
    InvalidCategories {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Transient backend failure, safe to retry for reads and deletes
    #[error("store unavailable during {operation}: {source}")]
    StoreUnavailable {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The backend rejected the query itself
    #[error("query rejected during {operation}: {source}")]
    QuerySyntax {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid table name: {table}")]
    InvalidTableName { table: String },

    #[error("no storage service configured for temporary url lists")]
    NoSecondaryStoreConfigured,

    #[error("blob not found: {name}")]
    BlobNotFound { name: String },

    #[error("invalid blob name: {name}")]
    InvalidBlobName { name: String },

    /// A local source file could not be read
    #[error("local file {}: {source}", path.display())]
    LocalFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PersistencyError {
    /// Whether the failed operation may be retried by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }

    pub(crate) fn unavailable(
        operation: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::StoreUnavailable {
            operation,
            source: source.into(),
        }
    }

    /// Classify a database driver error.
    pub(crate) fn from_sqlx(operation: &'static str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::TypeNotFound { .. } => Self::QuerySyntax {
                operation,
                source: Box::new(err),
            },
            other => Self::unavailable(operation, other),
        }
    }
}
