//! Shared volume sentinels

use paddle_core::protocol::Sentinel;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time;
use tracing::{debug, info};

use crate::error::ProtocolError;

/// The pod volume both containers mount
#[derive(Debug, Clone)]
pub struct SharedVolume {
    root: PathBuf,
}

impl SharedVolume {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of a sentinel on this volume
    pub fn path(&self, sentinel: Sentinel) -> PathBuf {
        self.root.join(sentinel.file_name())
    }

    /// Whether the sentinel has been written
    pub async fn is_set(&self, sentinel: Sentinel) -> Result<bool, ProtocolError> {
        let path = self.path(sentinel);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| ProtocolError::io(path, e))
    }

    /// Writes a sentinel
    ///
    /// Sentinels are write-once: signalling one that already exists fails.
    pub async fn signal(&self, sentinel: Sentinel) -> Result<(), ProtocolError> {
        let path = self.path(sentinel);
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(_) => {
                info!("Signalled {}", sentinel.file_name());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(ProtocolError::AlreadySignalled(path))
            }
            Err(e) => Err(ProtocolError::io(path, e)),
        }
    }

    /// Polls until one of `candidates` exists
    ///
    /// Candidates are checked in order on every tick, so earlier entries win
    /// when several exist.
    pub async fn wait_for_any(
        &self,
        candidates: &[Sentinel],
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<Sentinel, ProtocolError> {
        match time::timeout(timeout, self.poll_until_any(candidates, poll_interval)).await {
            Ok(found) => found,
            Err(_) => Err(ProtocolError::Timeout {
                waiting_for: candidates
                    .iter()
                    .map(|s| s.file_name())
                    .collect::<Vec<_>>()
                    .join(" or "),
                after: timeout,
            }),
        }
    }

    async fn poll_until_any(
        &self,
        candidates: &[Sentinel],
        poll_interval: Duration,
    ) -> Result<Sentinel, ProtocolError> {
        let mut ticker = time::interval(poll_interval);

        loop {
            ticker.tick().await;

            for &sentinel in candidates {
                if self.is_set(sentinel).await? {
                    debug!("Observed {}", sentinel.file_name());
                    return Ok(sentinel);
                }
            }
        }
    }
}
