use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PersistencyError, Result};

/// Dot separated label groups followed by a top label, e.g. `news.example.com`
static WEBSITE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+\.)+\w+").expect("website pattern should be valid"));

/// A website followed by at least one path segment
static CONTENT_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\w+\.)+\w+(/\w+)+").expect("content path pattern should be valid")
});

/// Extract the website key (host portion) of a url.
///
/// The first dot separated run of word characters is taken as the website,
/// so `https://news.example.com/a/b` yields `news.example.com`. Urls without
/// such a run cannot be attributed to a website and fail with
/// [`PersistencyError::MalformedUrl`].
pub fn extract_website(url: &str) -> Result<String> {
    WEBSITE_RE
        .find(url)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| PersistencyError::MalformedUrl {
            url: url.to_string(),
        })
}

/// Derive a flat filename for the content of a url.
///
/// `https://example.com/news/today` with suffix `txt` becomes
/// `example.com-news-today.txt`.
pub fn content_filename(url: &str, suffix: &str) -> Result<String> {
    let found = CONTENT_PATH_RE
        .find(url)
        .ok_or_else(|| PersistencyError::MalformedUrl {
            url: url.to_string(),
        })?;
    Ok(format!("{}.{}", found.as_str().replace('/', "-"), suffix))
}
