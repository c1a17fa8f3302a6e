//! Data location types
//!
//! A step's committed output lives in the object store under
//! `<step>/<version>/<branch>/<commit>/...`, with a `HEAD` object per branch
//! pointing at the latest commit folder.

use std::fmt;

use crate::domain::pipeline::InputReference;
use crate::error::DomainError;
use crate::naming::sanitize_name;

/// Path value that resolves through the branch's `HEAD` object
pub const HEAD: &str = "HEAD";

/// A bucket and a key prefix within it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath {
    pub bucket: String,
    pub path: String,
}

impl StoragePath {
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            path: path.into(),
        }
    }

    /// Full object key for a key relative to this path
    pub fn key(&self, relative: &str) -> String {
        format!("{}{}", self.path, relative)
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.path)
    }
}

/// An object as returned by a store listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub size: u64,
}

impl StoredObject {
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }
}

/// Identity of a step output: step, version, branch and a path inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRef {
    pub step: String,
    pub version: String,
    pub branch: String,
    /// Commit folder, or [`HEAD`] for the latest commit
    pub path: String,
}

impl DataRef {
    pub fn new(
        step: impl Into<String>,
        version: impl Into<String>,
        branch: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            step: step.into(),
            version: version.into(),
            branch: branch.into(),
            path: path.into(),
        }
    }

    /// Parses the `step/version` argument form used on the command line
    pub fn parse(
        step_version: &str,
        branch: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<Self, DomainError> {
        match step_version.split_once('/') {
            Some((step, version)) if !step.is_empty() && !version.is_empty() => {
                Ok(Self::new(step, version, branch, path))
            }
            _ => Err(DomainError::InvalidDataRef(step_version.to_string())),
        }
    }

    /// Key prefix holding every commit of this step/version/branch
    pub fn branch_prefix(&self) -> String {
        format!(
            "{}/{}/{}/",
            sanitize_name(&self.step),
            sanitize_name(&self.version),
            sanitize_name(&self.branch)
        )
    }

    /// Key of the object naming the latest commit folder
    pub fn head_key(&self) -> String {
        format!("{}{}", self.branch_prefix(), HEAD)
    }

    /// Whether the path resolves through `HEAD`
    pub fn is_head(&self) -> bool {
        self.path.is_empty() || self.path == HEAD
    }

    /// Key prefix of an explicit commit folder
    pub fn commit_prefix(&self) -> String {
        format!(
            "{}{}/",
            self.branch_prefix(),
            self.path.trim_matches('/')
        )
    }
}

impl From<&InputReference> for DataRef {
    fn from(input: &InputReference) -> Self {
        Self::new(&input.step, &input.version, &input.branch, &input.path)
    }
}

impl fmt::Display for DataRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} (branch {}, path {})",
            self.step, self.version, self.branch, self.path
        )
    }
}
