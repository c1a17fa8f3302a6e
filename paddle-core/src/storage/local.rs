//! Directory-backed object store
//!
//! Each bucket is a directory under the root; object keys are `/`-separated
//! paths relative to the bucket directory.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::{ObjectStore, Result};
use crate::domain::data::StoredObject;
use crate::error::StoreError;

/// Object store rooted at a local directory
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Creates a store rooted at `root`
    ///
    /// The directory does not need to exist until the first `put`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf> {
        if bucket.is_empty() || !is_plain_relative(bucket) || bucket.contains('/') {
            return Err(StoreError::InvalidKey(bucket.to_string()));
        }
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.ends_with('/') || !is_plain_relative(key) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.bucket_dir(bucket)?.join(key))
    }
}

/// Accepts only relative paths made of normal components
fn is_plain_relative(key: &str) -> bool {
    Path::new(key)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<StoredObject>> {
        let bucket_dir = self.bucket_dir(bucket)?;
        let mut objects = Vec::new();

        if !tokio::fs::try_exists(&bucket_dir)
            .await
            .map_err(|e| StoreError::io(&bucket_dir, e))?
        {
            return Ok(objects);
        }

        let mut pending = vec![bucket_dir.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| StoreError::io(&dir, e))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StoreError::io(&dir, e))?
            {
                let path = entry.path();
                let metadata = entry
                    .metadata()
                    .await
                    .map_err(|e| StoreError::io(&path, e))?;

                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Ok(relative) = path.strip_prefix(&bucket_dir) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");

                if key.starts_with(prefix) {
                    objects.push(StoredObject::new(key, metadata.len()));
                }
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        debug!(
            "Listed {} object(s) in {} under '{}'",
            objects.len(),
            bucket,
            prefix
        );
        Ok(objects)
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }

        tokio::fs::write(&path, body)
            .await
            .map_err(|e| StoreError::io(&path, e))?;

        debug!("Stored {}/{}", bucket, key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store
            .put("bucket", "a/b/c.txt", b"hello".to_vec())
            .await
            .unwrap();
        let body = store.get("bucket", "a/b/c.txt").await.unwrap();

        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn test_list_filters_by_prefix_and_sorts() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        for key in ["path/z.csv", "path/folder/a.csv", "other/x.csv", "path/b.csv"] {
            store.put("bucket", key, vec![1, 2, 3]).await.unwrap();
        }

        let listed = store.list("bucket", "path/").await.unwrap();
        let keys: Vec<&str> = listed.iter().map(|o| o.key.as_str()).collect();

        assert_eq!(keys, vec!["path/b.csv", "path/folder/a.csv", "path/z.csv"]);
        assert!(listed.iter().all(|o| o.size == 3));
    }

    #[tokio::test]
    async fn test_list_missing_bucket_is_empty() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        assert!(store.list("nothing", "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_object() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        let err = store.get("bucket", "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        for key in ["../x", "/abs", "a/../../b", ""] {
            let err = store.put("bucket", key, vec![]).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidKey(_)), "key {key:?}");
        }
        assert!(store.put("..", "x", vec![]).await.is_err());
    }
}
