//! Data transfer between the object store and local directories
//!
//! Outputs are committed under `<step>/<version>/<branch>/<commit>/` and the
//! branch's `HEAD` object is updated to name the new commit folder. Inputs are
//! fetched from `HEAD` or from an explicit commit folder, restricted by the
//! all-or-nothing key filter.

use chrono::{DateTime, Utc};
use paddle_core::domain::data::{DataRef, StoragePath, StoredObject};
use paddle_core::filter_objects;
use paddle_core::storage::ObjectStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::TransferError;

/// Result type alias for transfers
pub type Result<T> = std::result::Result<T, TransferError>;

/// Layout of commit folder names
pub const COMMIT_ID_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

/// Moves step data in and out of one default bucket
#[derive(Clone)]
pub struct DataTransfer {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl DataTransfer {
    /// Creates a transfer against `bucket`
    ///
    /// # Arguments
    /// * `store` - Object store to read from and write to
    /// * `bucket` - Default bucket; fetches may override it per input
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Resolves the commit folder a data reference points at
    pub async fn resolve(&self, data: &DataRef, bucket: &str) -> Result<String> {
        if !data.is_head() {
            return Ok(data.commit_prefix());
        }

        let head_key = data.head_key();
        let body = self.store.get(bucket, &head_key).await?;
        let folder = String::from_utf8_lossy(&body).trim().to_string();
        if folder.is_empty() {
            return Err(TransferError::InvalidHead(head_key));
        }

        debug!("{} resolves to {}", head_key, folder);
        Ok(if folder.ends_with('/') {
            folder
        } else {
            format!("{}/", folder)
        })
    }

    /// Downloads a step's data into `dest`
    ///
    /// With no `keys`, everything in the commit folder is downloaded.
    /// Otherwise every key must exist or nothing is downloaded at all.
    ///
    /// # Returns
    /// The objects that were downloaded
    pub async fn get(
        &self,
        data: &DataRef,
        bucket: Option<&str>,
        keys: &[String],
        dest: &Path,
    ) -> Result<Vec<StoredObject>> {
        let bucket = bucket.unwrap_or(self.bucket.as_str());
        let folder = self.resolve(data, bucket).await?;
        let location = StoragePath::new(bucket, folder);

        let listed = self.store.list(bucket, &location.path).await?;
        let selected = filter_objects(&location, &listed, keys)?;

        for object in &selected {
            let relative = object
                .key
                .strip_prefix(&location.path)
                .unwrap_or(&object.key);
            let target = dest.join(relative);

            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| TransferError::io(parent, e))?;
            }

            let body = self.store.get(bucket, &object.key).await?;
            tokio::fs::write(&target, body)
                .await
                .map_err(|e| TransferError::io(&target, e))?;
            debug!("Downloaded {} to {}", object.key, target.display());
        }

        info!(
            "Fetched {} object(s) of {} from {}",
            selected.len(),
            data,
            location
        );
        Ok(selected)
    }

    /// Uploads every file under `source` as a new commit of `data`
    ///
    /// # Returns
    /// The commit folder the files were written to
    pub async fn commit(&self, source: &Path, data: &DataRef) -> Result<String> {
        self.commit_at(source, data, Utc::now()).await
    }

    /// Same as [`DataTransfer::commit`] with an explicit commit time
    pub async fn commit_at(
        &self,
        source: &Path,
        data: &DataRef,
        at: DateTime<Utc>,
    ) -> Result<String> {
        let folder = format!("{}{}/", data.branch_prefix(), at.format(COMMIT_ID_FORMAT));
        let files = collect_files(source).await?;

        for (relative, path) in &files {
            let body = tokio::fs::read(path)
                .await
                .map_err(|e| TransferError::io(path, e))?;
            self.store
                .put(&self.bucket, &format!("{}{}", folder, relative), body)
                .await?;
        }

        self.store
            .put(&self.bucket, &data.head_key(), folder.clone().into_bytes())
            .await?;

        info!(
            "Committed {} file(s) from {} to {}/{}",
            files.len(),
            source.display(),
            self.bucket,
            folder
        );
        Ok(folder)
    }
}

/// Lists regular files under `root` as (`/`-joined relative key, path), sorted
async fn collect_files(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| TransferError::io(&dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| TransferError::io(&dir, e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| TransferError::io(&path, e))?;

            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                let Ok(relative) = path.strip_prefix(root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                files.push((key, path));
            }
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}
