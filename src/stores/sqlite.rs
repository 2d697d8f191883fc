//! SQL backed queryable store.
//!
//! Rows live in a single table named at construction. Text fields are kept
//! as BLOBs, categories as a JSON array of byte arrays and `last_scraped` as
//! RFC 3339 text. The table has no uniqueness constraint on `url`.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use sqlx::FromRow;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::{PersistencyError, Result};
use crate::records::DatabaseRow;
use crate::stores::{QueryableStore, RowIter, WebsiteUrlCache};

static TABLE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("table name pattern should be valid")
});

const COLUMNS: &str =
    "url, website, title, content, author, date, categories, last_scraped, label, source";

/// Upper bound of urls bound into a single delete statement
const DELETE_CHUNK: usize = 500;

/// Queryable store over an SQLite database
pub struct SqliteStore {
    pool: SqlitePool,
    table: String,
    cache: WebsiteUrlCache,
    url_queries: usize,
}

impl SqliteStore {
    /// Connect to `database_url` and make sure `table` exists.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - in-memory database (ephemeral)
    /// - `sqlite://./ledger.db` - file-based database, created if missing
    pub async fn connect(database_url: &str, table: &str) -> Result<Self> {
        if !TABLE_NAME_RE.is_match(table) {
            return Err(PersistencyError::InvalidTableName {
                table: table.to_string(),
            });
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| PersistencyError::Config(format!("database url {database_url}: {e}")))?
            .create_if_missing(true);

        // Every connection to an in-memory database sees its own database,
        // so keep exactly one alive for the lifetime of the pool.
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| PersistencyError::from_sqlx("connect", e))?;

        let store = Self {
            pool,
            table: table.to_string(),
            cache: WebsiteUrlCache::new(),
            url_queries: 0,
        };
        store.create_table().await?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub async fn in_memory(table: &str) -> Result<Self> {
        Self::connect("sqlite::memory:", table).await
    }

    /// Number of url-by-website queries sent to the database so far
    pub fn url_queries_issued(&self) -> usize {
        self.url_queries
    }

    async fn create_table(&self) -> Result<()> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                url TEXT NOT NULL,
                website TEXT NOT NULL,
                title BLOB NOT NULL,
                content BLOB NOT NULL,
                author BLOB NOT NULL,
                date BLOB NOT NULL,
                categories TEXT NOT NULL DEFAULT '[]',
                last_scraped TEXT NOT NULL,
                label TEXT,
                source TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_{table}_website ON {table}(website);
            CREATE INDEX IF NOT EXISTS idx_{table}_url ON {table}(url);
            "#,
            table = self.table
        );

        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| PersistencyError::from_sqlx("create_table", e))?;
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct StoredRow {
    url: String,
    website: String,
    title: Vec<u8>,
    content: Vec<u8>,
    author: Vec<u8>,
    date: Vec<u8>,
    categories: String,
    last_scraped: String,
    label: Option<String>,
    source: Option<String>,
}

impl StoredRow {
    fn into_database_row(self) -> Result<DatabaseRow> {
        let last_scraped = DateTime::parse_from_rfc3339(&self.last_scraped)
            .map_err(|_| PersistencyError::InvalidTimestamp {
                url: self.url.clone(),
                value: self.last_scraped.clone(),
            })?
            .with_timezone(&Utc);
        let categories: Vec<Vec<u8>> = serde_json::from_str(&self.categories).map_err(|source| {
            PersistencyError::InvalidCategories {
                url: self.url.clone(),
                source,
            }
        })?;

        Ok(DatabaseRow {
            url: self.url,
            website: self.website,
            title: self.title,
            content: self.content,
            author: self.author,
            date: self.date,
            categories,
            last_scraped,
            label: self.label,
            source: self.source,
        })
    }
}

#[async_trait]
impl QueryableStore for SqliteStore {
    async fn list_records(&self, limit: usize, scraped: Option<bool>) -> Result<RowIter> {
        let filter = match scraped {
            Some(true) => "WHERE length(content) > 0",
            Some(false) => "WHERE length(content) = 0",
            None => "",
        };
        let query = format!(
            "SELECT {} FROM {} {} ORDER BY rowid LIMIT ?",
            COLUMNS, self.table, filter
        );
        ::log::info!("Running query: {} [limit={}]", query, limit);

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let stored = sqlx::query_as::<_, StoredRow>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PersistencyError::from_sqlx("list_records", e))?;

        let rows = stored
            .into_iter()
            .map(StoredRow::into_database_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(rows.into_iter()))
    }

    async fn known_urls(&mut self, website: &str) -> Result<Arc<HashSet<String>>> {
        if let Some(urls) = self.cache.get(website) {
            ::log::debug!("Using cached urls for website {}", website);
            return Ok(urls);
        }

        let query = format!("SELECT url FROM {} WHERE website = ?", self.table);
        ::log::info!("Running query: {} [website={}]", query, website);
        self.url_queries += 1;

        let urls: Vec<String> = sqlx::query_scalar::<_, String>(&query)
            .bind(website)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PersistencyError::from_sqlx("known_urls", e))?;

        Ok(self.cache.replace(website, urls.into_iter().collect()))
    }

    async fn append(&mut self, rows: Vec<DatabaseRow>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.cache.invalidate();
        ::log::info!("Storing {} rows in {}", rows.len(), self.table);

        let insert = format!(
            "INSERT INTO {} ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.table, COLUMNS
        );
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PersistencyError::from_sqlx("append", e))?;

        for row in rows {
            let categories = serde_json::to_string(&row.categories)?;
            sqlx::query(&insert)
                .bind(row.url)
                .bind(row.website)
                .bind(row.title)
                .bind(row.content)
                .bind(row.author)
                .bind(row.date)
                .bind(categories)
                .bind(row.last_scraped.to_rfc3339())
                .bind(row.label)
                .bind(row.source)
                .execute(&mut *tx)
                .await
                .map_err(|e| PersistencyError::from_sqlx("append", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| PersistencyError::from_sqlx("append", e))?;
        Ok(())
    }

    async fn delete(&mut self, urls: &[String]) -> Result<()> {
        if urls.is_empty() {
            return Ok(());
        }
        self.cache.invalidate();
        ::log::info!("Deleting {} urls from {}", urls.len(), self.table);
        ::log::debug!("Deleted urls: \"{}\"", urls.join("\",\""));

        for chunk in urls.chunks(DELETE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let query = format!("DELETE FROM {} WHERE url IN ({placeholders})", self.table);

            let mut statement = sqlx::query(&query);
            for url in chunk {
                statement = statement.bind(url.as_str());
            }
            statement
                .execute(&self.pool)
                .await
                .map_err(|e| PersistencyError::from_sqlx("delete", e))?;
        }
        Ok(())
    }
}
