//! Error types for the runner

use paddle_core::{LookupError, StoreError};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while moving data between the store and local directories
#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The branch `HEAD` object does not name a commit folder
    #[error("HEAD object {0} does not point at a commit")]
    InvalidHead(String),

    /// Local filesystem failure
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransferError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by the protocol state machines
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The counterpart never wrote the awaited sentinel
    #[error("timed out after {after:?} waiting for {waiting_for}")]
    Timeout {
        waiting_for: String,
        after: Duration,
    },

    /// A write-once sentinel already exists
    #[error("sentinel {} was already written", .0.display())]
    AlreadySignalled(PathBuf),

    /// Shared volume I/O failure
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A step command could not be started at all
    #[error("failed to spawn command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

impl ProtocolError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if this error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
