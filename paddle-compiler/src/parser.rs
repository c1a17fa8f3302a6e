//! Pipeline definition parser
//!
//! This module decodes YAML pipeline documents into
//! [`PipelineDefinition`] values. The only normalization applied is the
//! legacy `default('...')` resolution of the bucket field.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use paddle_core::domain::pipeline::{PipelineDefinition, PipelineStep};
use paddle_core::domain::secret::PodSecret;

use crate::compat::DefaultedValue;
use crate::error::ParseError;

/// Result type alias for parsing
pub type Result<T> = std::result::Result<T, ParseError>;

/// Top-level document layout
#[derive(Debug, Deserialize)]
struct PipelineDocument {
    #[serde(default)]
    pipeline: String,
    #[serde(default)]
    bucket: DefaultedValue,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    steps: Vec<PipelineStep>,
    /// Secret bindings in `NAME:STORE:KEY` form
    #[serde(default)]
    secrets: Vec<String>,
}

/// Parse a pipeline definition from YAML bytes
///
/// # Arguments
/// * `data` - The YAML document
///
/// # Returns
/// The parsed pipeline definition
///
/// # Errors
/// Returns an error if:
/// - The document is not valid YAML or a field has the wrong type
/// - A secret binding is not in `NAME:STORE:KEY` form
/// - Two steps share the same name
///
/// # Example
/// ```
/// use paddle_compiler::parse_pipeline;
///
/// let yaml = br#"
/// pipeline: churn
/// bucket: "{{ bucket | default('canoe-data') }}"
/// namespace: modeltraining
/// steps:
///   - step: extract
///     version: v1
///     branch: master
///     image: extractor:latest
///     commands: ["python extract.py"]
/// "#;
///
/// let definition = parse_pipeline(yaml)?;
/// assert_eq!(definition.bucket, "canoe-data");
/// assert_eq!(definition.steps.len(), 1);
/// # Ok::<(), paddle_compiler::ParseError>(())
/// ```
pub fn parse_pipeline(data: &[u8]) -> Result<PipelineDefinition> {
    let document: PipelineDocument = serde_yaml::from_slice(data)?;

    let mut names = HashSet::new();
    for step in &document.steps {
        if !names.insert(step.step.as_str()) {
            return Err(ParseError::DuplicateStep(step.step.clone()));
        }
    }

    let secrets = document
        .secrets
        .iter()
        .map(|s| s.parse::<PodSecret>())
        .collect::<std::result::Result<Vec<_>, _>>()?;

    debug!(
        "Parsed pipeline '{}' with {} step(s)",
        document.pipeline,
        document.steps.len()
    );

    Ok(PipelineDefinition {
        pipeline: document.pipeline,
        bucket: document.bucket.into_inner(),
        namespace: document.namespace,
        steps: document.steps,
        secrets,
    })
}

/// Parse a pipeline definition from a YAML file
pub fn parse_pipeline_file(path: &Path) -> Result<PipelineDefinition> {
    let data = std::fs::read(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_pipeline(&data)
}
