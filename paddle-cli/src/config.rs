//! Configuration module
//!
//! Handles CLI configuration for the object store location.

use anyhow::Result;
use std::path::PathBuf;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory backing the object store
    pub store_root: PathBuf,

    /// Default bucket, required by data commands
    pub bucket: Option<String>,
}

impl Config {
    /// The default bucket, or an error naming how to set it
    pub fn bucket(&self) -> Result<&str> {
        self.bucket
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| anyhow::anyhow!("no bucket configured: pass --bucket or set BUCKET"))
    }
}
