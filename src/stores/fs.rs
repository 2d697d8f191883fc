//! Blob store over a local bucket directory.
//!
//! Blob names are `/` separated and map onto nested files below the bucket
//! directory. Listing follows object-store semantics: plain string prefix
//! matching, with an optional delimiter limiting results to one level.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{PersistencyError, Result};
use crate::stores::BlobStore;

/// Bucket directory plus a root prefix shared by every blob name
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    bucket: PathBuf,
    prefix: String,
}

impl FsBlobStore {
    /// Create a store rooted at `prefix` inside the `bucket` directory.
    /// The directory is created on first save.
    pub fn new(bucket: impl Into<PathBuf>, prefix: &str) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    /// Stored name for `name`, always rooted under the store prefix
    fn rooted_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.prefix, name)
        }
    }

    /// Stored name for a read, where `name` may already carry the root prefix
    fn resolve_name(&self, name: &str) -> String {
        if !self.prefix.is_empty() && name.starts_with(&format!("{}/", self.prefix)) {
            name.to_string()
        } else {
            self.rooted_name(name)
        }
    }

    /// Prefix used for listing; `None` lists everything under the root
    fn list_prefix(&self, prefix: Option<&str>) -> String {
        match prefix {
            Some(prefix) => self.rooted_name(prefix),
            None if self.prefix.is_empty() => String::new(),
            None => format!("{}/", self.prefix),
        }
    }

    fn blob_path(&self, blob_name: &str) -> Result<PathBuf> {
        let mut path = self.bucket.clone();
        for segment in blob_name.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                return Err(PersistencyError::InvalidBlobName {
                    name: blob_name.to_string(),
                });
            }
            path.push(segment);
        }
        Ok(path)
    }

    /// Every stored name in the bucket, sorted
    async fn all_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut pending = vec![(self.bucket.clone(), String::new())];

        while let Some((dir, relative)) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(PersistencyError::unavailable("list", e)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| PersistencyError::unavailable("list", e))?
            {
                let file_name = entry.file_name().to_string_lossy().into_owned();
                let name = if relative.is_empty() {
                    file_name
                } else {
                    format!("{relative}/{file_name}")
                };

                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| PersistencyError::unavailable("list", e))?;
                if file_type.is_dir() {
                    pending.push((entry.path(), name));
                } else {
                    names.push(name);
                }
            }
        }

        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn save(&self, destination: &str, source: &Path) -> Result<()> {
        let name = self.rooted_name(destination);
        let path = self.blob_path(&name)?;
        ::log::info!(
            "Bucket {}: Saving file with name: {}",
            self.bucket.display(),
            name
        );

        let bytes = tokio::fs::read(source)
            .await
            .map_err(|e| PersistencyError::LocalFile {
                path: source.to_path_buf(),
                source: e,
            })?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PersistencyError::unavailable("save", e))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| PersistencyError::unavailable("save", e))
    }

    async fn list(&self, prefix: Option<&str>, delimiter: Option<&str>) -> Result<Vec<String>> {
        let full_prefix = self.list_prefix(prefix);
        ::log::info!(
            "Bucket {}: Listing files with prefix: {}",
            self.bucket.display(),
            full_prefix
        );

        let names = self
            .all_names()
            .await?
            .into_iter()
            .filter(|name| match name.strip_prefix(full_prefix.as_str()) {
                Some(rest) => match delimiter {
                    Some(delimiter) if !delimiter.is_empty() => !rest.contains(delimiter),
                    _ => true,
                },
                None => false,
            })
            .collect();
        Ok(names)
    }

    async fn read_as_stream(&self, name: &str) -> Result<Cursor<Vec<u8>>> {
        let name = self.resolve_name(name);
        let path = self.blob_path(&name)?;
        ::log::info!(
            "Bucket {}: Retrieving file: {}",
            self.bucket.display(),
            name
        );

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Cursor::new(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PersistencyError::BlobNotFound { name })
            }
            Err(e) => Err(PersistencyError::unavailable("read_as_stream", e)),
        }
    }
}
