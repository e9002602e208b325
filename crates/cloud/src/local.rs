//! Object store rooted at a local directory.
//!
//! Keys map to relative paths. Modification times come from file metadata.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stash_core::storage::validate_key;
use stash_core::{ListWindow, ObjectStore, ObjectSummary, StorageError};

use crate::sort_newest_first;

pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    /// Every regular file under the root, as `(key, metadata)`.
    async fn walk(&self) -> Result<Vec<(String, std::fs::Metadata)>, StorageError> {
        let mut found = Vec::new();
        let mut pending = vec![(self.root.clone(), String::new())];

        while let Some((dir, key_prefix)) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                let key = format!("{key_prefix}{name}");
                let metadata = entry.metadata().await?;
                if metadata.is_dir() {
                    pending.push((entry.path(), format!("{key}/")));
                } else if metadata.is_file() {
                    found.push((key, metadata));
                }
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    fn backend(&self) -> &'static str {
        "local"
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "Stored object");
        Ok(())
    }

    async fn list(
        &self,
        prefix: &str,
        window: ListWindow,
    ) -> Result<Vec<ObjectSummary>, StorageError> {
        let mut objects: Vec<ObjectSummary> = self
            .walk()
            .await?
            .into_iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .filter_map(|(key, metadata)| {
                let last_modified = metadata.modified().ok().map(DateTime::<Utc>::from);
                window.contains(last_modified).then(|| ObjectSummary {
                    key,
                    size: metadata.len(),
                    last_modified,
                })
            })
            .collect();

        sort_newest_first(&mut objects);
        Ok(objects)
    }

    async fn presign(&self, _key: &str, _ttl: Duration) -> Result<String, StorageError> {
        Err(StorageError::Unsupported {
            backend: "local",
            operation: "presign",
        })
    }
}
