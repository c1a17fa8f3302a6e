//! Object store capability
//!
//! Data transfer only needs three operations from the remote store. Remote
//! implementations live outside this crate; [`LocalObjectStore`] maps buckets
//! onto directories for development and tests.

mod local;

pub use local::LocalObjectStore;

use async_trait::async_trait;

use crate::domain::data::StoredObject;
use crate::error::StoreError;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// List, get and put access to a bucketed object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists every object of `bucket` whose key starts with `prefix`
    ///
    /// Results are ordered by key.
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<StoredObject>>;

    /// Reads the whole body of an object
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Writes an object, replacing any previous body
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;
}
