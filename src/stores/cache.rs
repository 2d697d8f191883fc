use std::collections::HashSet;
use std::sync::Arc;

/// Known urls of the most recently queried website.
///
/// Holds at most one entry and never expires on its own: a lookup for a
/// different website replaces it, and writes to the backing table clear it.
#[derive(Debug, Default)]
pub struct WebsiteUrlCache {
    entry: Option<(String, Arc<HashSet<String>>)>,
}

impl WebsiteUrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached url set, if `website` is the cached key
    pub fn get(&self, website: &str) -> Option<Arc<HashSet<String>>> {
        match &self.entry {
            Some((cached, urls)) if cached == website => Some(Arc::clone(urls)),
            _ => None,
        }
    }

    /// Replace the slot with a fresh result and hand it back
    pub fn replace(&mut self, website: &str, urls: HashSet<String>) -> Arc<HashSet<String>> {
        let urls = Arc::new(urls);
        self.entry = Some((website.to_string(), Arc::clone(&urls)));
        urls
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Website currently held in the slot
    pub fn website(&self) -> Option<&str> {
        self.entry.as_ref().map(|(website, _)| website.as_str())
    }
}
