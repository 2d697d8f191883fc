use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PersistencyError, Result};
use crate::website::extract_website;

/// A captured page as handed over by the scraper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedRecord {
    /// URL of the page, unique within the queryable store
    pub url: String,

    pub title: String,

    /// Extracted text content
    pub content: String,

    pub author: String,

    /// Publication date as found on the page
    pub date: String,

    /// When the page was captured
    pub last_scraped: DateTime<Utc>,

    /// Category labels, in page order
    #[serde(default)]
    pub categories: Vec<String>,

    /// Classification label, assigned later in the pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Classification source, assigned later in the pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ScrapedRecord {
    /// Create a new record with no classification metadata
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        author: impl Into<String>,
        date: impl Into<String>,
        last_scraped: DateTime<Utc>,
        categories: Vec<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            content: content.into(),
            author: author.into(),
            date: date.into(),
            last_scraped,
            categories,
            label: None,
            source: None,
        }
    }
}

/// Storage form of a [`ScrapedRecord`]: text fields as UTF-8 bytes plus the
/// derived website key.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseRow {
    pub url: String,
    pub website: String,
    pub title: Vec<u8>,
    pub content: Vec<u8>,
    pub author: Vec<u8>,
    pub date: Vec<u8>,
    pub categories: Vec<Vec<u8>>,
    pub last_scraped: DateTime<Utc>,
    pub label: Option<String>,
    pub source: Option<String>,
}

impl DatabaseRow {
    /// Encode a record for storage.
    ///
    /// Classification metadata is never persisted at capture time, so
    /// `label` and `source` are always `None` here.
    pub fn encode(record: &ScrapedRecord) -> Result<Self> {
        Ok(Self {
            url: record.url.clone(),
            website: extract_website(&record.url)?,
            title: record.title.as_bytes().to_vec(),
            content: record.content.as_bytes().to_vec(),
            author: record.author.as_bytes().to_vec(),
            date: record.date.as_bytes().to_vec(),
            categories: record
                .categories
                .iter()
                .map(|category| category.as_bytes().to_vec())
                .collect(),
            last_scraped: record.last_scraped,
            label: None,
            source: None,
        })
    }

    /// Decode the stored bytes back into a record
    pub fn decode(self) -> Result<ScrapedRecord> {
        let url = self.url;
        let text = |field: &'static str, bytes: Vec<u8>| {
            String::from_utf8(bytes).map_err(|source| PersistencyError::Decode {
                url: url.clone(),
                field,
                source,
            })
        };

        let title = text("title", self.title)?;
        let content = text("content", self.content)?;
        let author = text("author", self.author)?;
        let date = text("date", self.date)?;
        let categories = self
            .categories
            .into_iter()
            .map(|category| text("categories", category))
            .collect::<Result<Vec<_>>>()?;

        Ok(ScrapedRecord {
            url,
            title,
            content,
            author,
            date,
            last_scraped: self.last_scraped,
            categories,
            label: self.label,
            source: self.source,
        })
    }
}
