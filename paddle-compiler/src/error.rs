//! Error types for pipeline compilation

use paddle_core::DomainError;
use std::path::PathBuf;
use thiserror::Error;

/// The pipeline document could not be turned into a definition
#[derive(Debug, Error)]
pub enum ParseError {
    /// Document is not valid YAML or does not match the pipeline structure
    #[error("failed to parse pipeline YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Pipeline file could not be read
    #[error("failed to read pipeline file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A declared secret binding is malformed
    #[error(transparent)]
    InvalidSecret(#[from] DomainError),

    /// Two steps share a name
    #[error("duplicate step '{0}' in pipeline")]
    DuplicateStep(String),
}

/// The pod manifest could not be produced
///
/// Manifests are built from typed structures, so this only happens on a
/// programming error.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to serialize pod manifest: {0}")]
    Serialize(#[from] serde_yaml::Error),
}
