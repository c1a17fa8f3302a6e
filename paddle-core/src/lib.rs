//! Paddle Core
//!
//! Core types and abstractions for the Paddle pipeline tooling.
//!
//! This crate contains:
//! - Domain types: pipeline definitions, steps, input references, data references
//! - Name sanitization shared by pod manifests and storage keys
//! - The object key filter used to select data for retrieval
//! - The object store capability consumed by data transfer
//! - Sentinel names of the two-container coordination protocol

pub mod domain;
pub mod error;
pub mod filter;
pub mod naming;
pub mod protocol;
pub mod storage;

pub use error::{DomainError, LookupError, StoreError};
pub use filter::filter_objects;
pub use naming::sanitize_name;
