//! Pipeline domain types and override operations

use serde::{Deserialize, Serialize};

use crate::domain::secret::PodSecret;

/// Pipeline definition
///
/// Parsed once per compilation run, mutated in place by overrides and then
/// read by the compiler once per step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub pipeline: String,
    pub bucket: String,
    pub namespace: String,
    pub steps: Vec<PipelineStep>,
    pub secrets: Vec<PodSecret>,
}

/// One unit of work, compiled into one pod
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineStep {
    pub step: String,
    pub version: String,
    pub branch: String,
    /// Container image in `repository:tag` form
    pub image: String,
    pub inputs: Vec<InputReference>,
    pub commands: Vec<String>,
    pub resources: ResourceRequest,
}

/// Pointer to another step's output artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputReference {
    pub step: String,
    pub version: String,
    pub branch: String,
    pub path: String,
    pub bucket: Option<String>,
}

/// Resource limits for the main container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceRequest {
    pub cpu: u32,
    pub memory: String,
    #[serde(rename = "storage-mb")]
    pub storage_mb: u32,
}

/// Values supplied by the caller to override what the document declares
///
/// Empty strings mean "do not change".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub tag: String,
    pub version: String,
    pub branch: String,
    /// Also rewrite version and branch on every input reference
    pub cascade_to_inputs: bool,
}

impl PipelineDefinition {
    /// Looks up a step by name
    pub fn step(&self, name: &str) -> Option<&PipelineStep> {
        self.steps.iter().find(|s| s.step == name)
    }

    /// Applies the overrides to every step
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        for step in &mut self.steps {
            step.apply_overrides(overrides);
        }
    }
}

impl PipelineStep {
    /// Applies tag, version and branch overrides in that order
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        self.override_tag(&overrides.tag);
        self.override_version(&overrides.version, overrides.cascade_to_inputs);
        self.override_branch(&overrides.branch, overrides.cascade_to_inputs);
    }

    /// Replaces the image tag
    ///
    /// Keeps everything before the first `:` and appends the new tag. Any
    /// further colon-delimited segment of the old reference is dropped.
    pub fn override_tag(&mut self, tag: &str) {
        if tag.is_empty() {
            return;
        }

        let repository = self
            .image
            .split_once(':')
            .map_or(self.image.as_str(), |(repository, _)| repository);
        self.image = format!("{}:{}", repository, tag);
    }

    /// Sets the step version, optionally on every input as well
    pub fn override_version(&mut self, version: &str, cascade_to_inputs: bool) {
        if version.is_empty() {
            return;
        }

        self.version = version.to_string();

        if cascade_to_inputs {
            for input in &mut self.inputs {
                input.version = version.to_string();
            }
        }
    }

    /// Sets the step branch, optionally on every input as well
    pub fn override_branch(&mut self, branch: &str, cascade_to_inputs: bool) {
        if branch.is_empty() {
            return;
        }

        self.branch = branch.to_string();

        if cascade_to_inputs {
            for input in &mut self.inputs {
                input.branch = branch.to_string();
            }
        }
    }
}

impl InputReference {
    /// Bucket to read this input from, when it differs from the pipeline's
    pub fn bucket_override(&self) -> Option<&str> {
        self.bucket.as_deref().filter(|b| !b.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_with_inputs() -> PipelineStep {
        PipelineStep {
            step: "train".to_string(),
            version: "v1".to_string(),
            branch: "master".to_string(),
            image: "registry/trainer:1.0".to_string(),
            inputs: vec![
                InputReference {
                    step: "extract".to_string(),
                    version: "v3".to_string(),
                    branch: "master".to_string(),
                    path: "HEAD".to_string(),
                    bucket: None,
                },
                InputReference {
                    step: "features".to_string(),
                    version: "v2".to_string(),
                    branch: "develop".to_string(),
                    path: "HEAD".to_string(),
                    bucket: Some("other".to_string()),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_override_tag_replaces_tag() {
        let mut step = step_with_inputs();
        step.override_tag("2.0");
        assert_eq!(step.image, "registry/trainer:2.0");
    }

    #[test]
    fn test_override_tag_drops_extra_segments() {
        let mut step = PipelineStep {
            image: "repo:old:extra".to_string(),
            ..Default::default()
        };
        step.override_tag("new");
        assert_eq!(step.image, "repo:new");
    }

    #[test]
    fn test_override_tag_without_existing_tag() {
        let mut step = PipelineStep {
            image: "repo".to_string(),
            ..Default::default()
        };
        step.override_tag("latest");
        assert_eq!(step.image, "repo:latest");
    }

    #[test]
    fn test_override_tag_empty_is_noop() {
        let mut step = step_with_inputs();
        step.override_tag("");
        assert_eq!(step.image, "registry/trainer:1.0");
    }

    #[test]
    fn test_override_version_with_cascade() {
        let mut step = step_with_inputs();
        step.override_version("v9", true);
        assert_eq!(step.version, "v9");
        assert!(step.inputs.iter().all(|i| i.version == "v9"));
    }

    #[test]
    fn test_override_version_without_cascade() {
        let mut step = step_with_inputs();
        step.override_version("v9", false);
        assert_eq!(step.version, "v9");
        assert_eq!(step.inputs[0].version, "v3");
        assert_eq!(step.inputs[1].version, "v2");
    }

    #[test]
    fn test_override_branch_with_cascade() {
        let mut step = step_with_inputs();
        step.override_branch("feature/x", true);
        assert_eq!(step.branch, "feature/x");
        assert!(step.inputs.iter().all(|i| i.branch == "feature/x"));
    }

    #[test]
    fn test_override_branch_empty_is_noop() {
        let mut step = step_with_inputs();
        let before = step.clone();
        step.override_branch("", true);
        step.override_version("", true);
        assert_eq!(step, before);
    }

    #[test]
    fn test_overrides_are_idempotent() {
        let overrides = Overrides {
            tag: "t".to_string(),
            version: "v".to_string(),
            branch: "b".to_string(),
            cascade_to_inputs: true,
        };

        let mut once = step_with_inputs();
        once.apply_overrides(&overrides);
        let mut twice = once.clone();
        twice.apply_overrides(&overrides);

        assert_eq!(once, twice);
        assert_eq!(once.image, "registry/trainer:t");
    }

    #[test]
    fn test_apply_overrides_to_every_step() {
        let mut definition = PipelineDefinition {
            pipeline: "p".to_string(),
            steps: vec![step_with_inputs(), step_with_inputs()],
            ..Default::default()
        };
        definition.apply_overrides(&Overrides {
            branch: "release".to_string(),
            ..Default::default()
        });

        assert!(definition.steps.iter().all(|s| s.branch == "release"));
        assert_eq!(definition.steps[0].inputs[1].branch, "develop");
    }

    #[test]
    fn test_bucket_override_ignores_empty() {
        let mut input = InputReference::default();
        assert_eq!(input.bucket_override(), None);
        input.bucket = Some(String::new());
        assert_eq!(input.bucket_override(), None);
        input.bucket = Some("b".to_string());
        assert_eq!(input.bucket_override(), Some("b"));
    }
}
