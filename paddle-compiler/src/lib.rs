//! Paddle Compiler
//!
//! Turns pipeline documents into Kubernetes pod manifests.
//! It includes:
//! - YAML pipeline parsing with the legacy `default('...')` bucket adapter
//! - Pod definitions built per pipeline step
//! - Shell scripts for the main/sidecar sentinel protocol
//! - Deterministic manifest rendering

pub mod compat;
pub mod config;
pub mod error;
pub mod manifest;
pub mod parser;
pub mod pod;
pub mod script;

pub use config::{CompilerConfig, StoreVolume};
pub use error::{ParseError, RenderError};
pub use parser::{parse_pipeline, parse_pipeline_file};
pub use pod::PodDefinition;

pub use paddle_core::domain::pipeline::{
    InputReference, Overrides, PipelineDefinition, PipelineStep, ResourceRequest,
};
pub use paddle_core::domain::secret::PodSecret;
