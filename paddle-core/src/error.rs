//! Error types for Paddle core operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised when textual domain values cannot be parsed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Secret binding not in `NAME:STORE:KEY` form
    #[error("invalid secret '{0}': expected NAME:STORE:KEY")]
    InvalidSecret(String),

    /// Malformed data reference
    #[error("invalid data reference '{0}'")]
    InvalidDataRef(String),
}

/// A requested key set could not be fully resolved
///
/// The key filter is all-or-nothing: when this error is returned no objects
/// are selected at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("unable to find keys under {location}: {}", .keys.join(", "))]
    MissingKeys {
        /// Location that was searched
        location: String,
        /// Every requested key without a matching object
        keys: Vec<String>,
    },
}

/// Errors raised by an object store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Object does not exist
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Key cannot be mapped onto the store
    #[error("invalid object key '{0}'")]
    InvalidKey(String),

    /// Underlying I/O failure
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Wraps an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
