//! Paddle Runner
//!
//! In-container runtime of a compiled pod step.
//!
//! - Protocol: the `main` and `paddle` state machines coordinating through
//!   sentinel files on the shared volume
//! - Transfer: fetching step inputs from and committing outputs to the object
//!   store, with per-branch `HEAD` tracking
//! - Configuration: environment-driven settings shared by both roles

pub mod config;
pub mod error;
pub mod protocol;
pub mod transfer;

pub use config::Config;
pub use error::{ProtocolError, TransferError};
pub use transfer::DataTransfer;
