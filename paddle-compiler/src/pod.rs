//! Pod definitions
//!
//! A [`PodDefinition`] is built fresh for one (pipeline, step) pair. Every
//! identifier is sanitized while building it, so rendering only copies
//! already-clean values into the manifest.

use std::collections::BTreeMap;
use tracing::debug;

use paddle_core::domain::pipeline::{PipelineDefinition, PipelineStep};
use paddle_core::domain::secret::PodSecret;
use paddle_core::protocol::SHARED_VOLUME;
use paddle_core::sanitize_name;

use crate::config::CompilerConfig;
use crate::error::RenderError;
use crate::manifest::{
    Container, EnvVar, ObjectMeta, Pod, PodSpec, ResourceRequirements, Volume, VolumeMount,
};
use crate::script::{main_script, sidecar_script};

/// Name of the sidecar's object store volume
pub const STORE_VOLUME: &str = "paddle-store";

/// Render-ready description of the pod for one pipeline step
#[derive(Debug, Clone, PartialEq)]
pub struct PodDefinition {
    /// `<pipeline>-<step>-<branch>`, sanitized
    pub pod_name: String,
    pub step_name: String,
    pub step_version: String,
    pub branch_name: String,
    pub namespace: String,
    pub bucket: String,
    /// Extra secret bindings for both containers
    pub secrets: Vec<PodSecret>,
    pub step: PipelineStep,
}

impl PodDefinition {
    /// Builds the pod definition of `step`
    ///
    /// The secret list starts empty; callers add bindings before rendering.
    pub fn new(definition: &PipelineDefinition, step: &PipelineStep) -> Self {
        let step_name = sanitize_name(&step.step);
        let branch_name = sanitize_name(&step.branch);
        let step_version = sanitize_name(&step.version);
        let pod_name = format!(
            "{}-{}-{}",
            sanitize_name(&definition.pipeline),
            step_name,
            branch_name
        );

        Self {
            pod_name,
            step_name,
            step_version,
            branch_name,
            namespace: definition.namespace.clone(),
            bucket: definition.bucket.clone(),
            secrets: Vec::new(),
            step: step.clone(),
        }
    }

    /// Adds secret bindings to both containers
    pub fn with_secrets(mut self, secrets: impl IntoIterator<Item = PodSecret>) -> Self {
        self.secrets.extend(secrets);
        self
    }

    /// Builds the typed pod manifest
    pub fn to_manifest(&self, config: &CompilerConfig) -> Pod {
        let labels = BTreeMap::from([
            ("canoe.executor".to_string(), "paddle".to_string()),
            ("canoe.step.name".to_string(), self.step_name.clone()),
            ("canoe.step.branch".to_string(), self.branch_name.clone()),
            ("canoe.step.version".to_string(), self.step_version.clone()),
        ]);

        Pod {
            api_version: "v1".to_string(),
            kind: "Pod".to_string(),
            metadata: ObjectMeta {
                name: self.pod_name.clone(),
                namespace: self.namespace.clone(),
                labels,
            },
            spec: PodSpec {
                restart_policy: "Never".to_string(),
                volumes: self.volumes(config),
                containers: vec![self.main_container(config), self.sidecar_container(config)],
            },
        }
    }

    /// Renders the pod manifest as YAML
    ///
    /// Output depends only on the definition and the config, so rendering
    /// the same pair twice yields identical text.
    pub fn render(&self, config: &CompilerConfig) -> Result<String, RenderError> {
        let manifest = serde_yaml::to_string(&self.to_manifest(config))?;
        debug!("Rendered pod manifest {}", self.pod_name);
        Ok(manifest)
    }

    fn volumes(&self, config: &CompilerConfig) -> Vec<Volume> {
        let mut volumes = vec![Volume::empty_dir(SHARED_VOLUME)];
        if let Some(store) = &config.store_volume {
            volumes.push(Volume::claim(STORE_VOLUME, &store.claim_name));
        }
        volumes
    }

    fn main_container(&self, config: &CompilerConfig) -> Container {
        let resources = &self.step.resources;
        let mut limits = BTreeMap::from([
            ("cpu".to_string(), resources.cpu.to_string()),
            ("memory".to_string(), resources.memory.clone()),
        ]);
        if resources.storage_mb > 0 {
            limits.insert(
                "ephemeral-storage".to_string(),
                format!("{}Mi", resources.storage_mb),
            );
        }

        let mut env = vec![
            EnvVar::value("INPUT_PATH", config.input_path()),
            EnvVar::value("OUTPUT_PATH", config.output_path()),
        ];
        env.extend(credential_env(&config.main_credentials_secret));
        env.extend(self.secret_env());

        Container {
            name: "main".to_string(),
            image: self.step.image.clone(),
            volume_mounts: vec![shared_mount(config)],
            resources: Some(ResourceRequirements { limits }),
            command: shell_command(main_script(&self.step.commands, config)),
            env,
        }
    }

    fn sidecar_container(&self, config: &CompilerConfig) -> Container {
        let mut env = vec![
            EnvVar::value("BUCKET", &self.bucket),
            EnvVar::value("AWS_REGION", &config.aws_region),
            EnvVar::value("INPUT_PATH", config.input_path()),
            EnvVar::value("OUTPUT_PATH", config.output_path()),
        ];
        let mut volume_mounts = vec![shared_mount(config)];
        if let Some(store) = &config.store_volume {
            env.push(EnvVar::value("PADDLE_STORE_ROOT", &store.mount_path));
            volume_mounts.push(VolumeMount {
                name: STORE_VOLUME.to_string(),
                mount_path: store.mount_path.clone(),
            });
        }
        env.extend(credential_env(&config.sidecar_credentials_secret));
        env.extend(self.secret_env());

        let script = sidecar_script(
            &self.step.inputs,
            &self.step_name,
            &self.step_version,
            &self.branch_name,
            config,
        );

        Container {
            name: "paddle".to_string(),
            image: config.sidecar_image.clone(),
            volume_mounts,
            resources: None,
            command: shell_command(script),
            env,
        }
    }

    fn secret_env(&self) -> impl Iterator<Item = EnvVar> + '_ {
        self.secrets
            .iter()
            .map(|s| EnvVar::secret(&s.name, &s.store, &s.key))
    }
}

fn shared_mount(config: &CompilerConfig) -> VolumeMount {
    VolumeMount {
        name: SHARED_VOLUME.to_string(),
        mount_path: config.data_dir.clone(),
    }
}

fn credential_env(secret: &str) -> [EnvVar; 2] {
    [
        EnvVar::secret("AWS_ACCESS_KEY_ID", secret, "aws-access-key-id"),
        EnvVar::secret("AWS_SECRET_ACCESS_KEY", secret, "aws-secret-access-key"),
    ]
}

fn shell_command(script: String) -> Vec<String> {
    vec!["/bin/sh".to_string(), "-c".to_string(), script]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreVolume;
    use paddle_core::domain::pipeline::{InputReference, ResourceRequest};

    fn definition() -> PipelineDefinition {
        PipelineDefinition {
            pipeline: "Churn_Model".to_string(),
            bucket: "canoe-data".to_string(),
            namespace: "modeltraining".to_string(),
            steps: vec![PipelineStep {
                step: "Train_Step".to_string(),
                version: "V2".to_string(),
                branch: "feature/New_Thing".to_string(),
                image: "registry/trainer:1.0".to_string(),
                inputs: vec![InputReference {
                    step: "extract".to_string(),
                    version: "v1".to_string(),
                    branch: "master".to_string(),
                    path: "HEAD".to_string(),
                    bucket: None,
                }],
                commands: vec!["python train.py".to_string()],
                resources: ResourceRequest {
                    cpu: 2,
                    memory: "4Gi".to_string(),
                    storage_mb: 512,
                },
            }],
            secrets: Vec::new(),
        }
    }

    #[test]
    fn test_new_sanitizes_identifiers() {
        let definition = definition();
        let pod = PodDefinition::new(&definition, &definition.steps[0]);

        assert_eq!(pod.pod_name, "churn-model-train-step-feature-new-thing");
        assert_eq!(pod.step_name, "train-step");
        assert_eq!(pod.step_version, "v2");
        assert_eq!(pod.branch_name, "feature-new-thing");
        assert_eq!(pod.namespace, "modeltraining");
        assert_eq!(pod.bucket, "canoe-data");
        assert!(pod.secrets.is_empty());
        assert_eq!(pod.step, definition.steps[0]);
    }

    #[test]
    fn test_manifest_structure() {
        let definition = definition();
        let pod = PodDefinition::new(&definition, &definition.steps[0]);
        let manifest = pod.to_manifest(&CompilerConfig::default());

        assert_eq!(manifest.spec.restart_policy, "Never");
        assert_eq!(manifest.spec.volumes.len(), 1);
        assert_eq!(manifest.spec.volumes[0].name, "shared-data");

        let names: Vec<&str> = manifest
            .spec
            .containers
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["main", "paddle"]);

        for container in &manifest.spec.containers {
            assert_eq!(container.volume_mounts[0].mount_path, "/data");
            assert_eq!(container.command[0], "/bin/sh");
        }
    }

    #[test]
    fn test_main_container_resources() {
        let definition = definition();
        let pod = PodDefinition::new(&definition, &definition.steps[0]);
        let manifest = pod.to_manifest(&CompilerConfig::default());
        let limits = &manifest.spec.containers[0]
            .resources
            .as_ref()
            .unwrap()
            .limits;

        assert_eq!(limits["cpu"], "2");
        assert_eq!(limits["memory"], "4Gi");
        assert_eq!(limits["ephemeral-storage"], "512Mi");
        assert!(manifest.spec.containers[1].resources.is_none());
    }

    #[test]
    fn test_secrets_reach_both_containers() {
        let definition = definition();
        let pod = PodDefinition::new(&definition, &definition.steps[0]).with_secrets([PodSecret {
            name: "DB_URL".to_string(),
            store: "postgres".to_string(),
            key: "url".to_string(),
        }]);
        let manifest = pod.to_manifest(&CompilerConfig::default());

        for container in &manifest.spec.containers {
            let secret = container.env.iter().find(|e| e.name == "DB_URL").unwrap();
            let source = secret.value_from.as_ref().unwrap();
            assert_eq!(source.secret_key_ref.name, "postgres");
            assert_eq!(source.secret_key_ref.key, "url");
        }
    }

    #[test]
    fn test_sidecar_env_and_commit_identity() {
        let definition = definition();
        let pod = PodDefinition::new(&definition, &definition.steps[0]);
        let manifest = pod.to_manifest(&CompilerConfig::default());
        let sidecar = &manifest.spec.containers[1];

        let bucket = sidecar.env.iter().find(|e| e.name == "BUCKET").unwrap();
        assert_eq!(bucket.value.as_deref(), Some("canoe-data"));
        assert!(sidecar.command[2].contains("train-step/v2 -b feature-new-thing"));
    }

    #[test]
    fn test_store_volume_is_mounted_in_sidecar_only() {
        let definition = definition();
        let config = CompilerConfig {
            store_volume: Some(StoreVolume {
                claim_name: "paddle-data".to_string(),
                mount_path: "/var/lib/paddle/store".to_string(),
            }),
            ..Default::default()
        };
        let manifest = PodDefinition::new(&definition, &definition.steps[0]).to_manifest(&config);

        let claim = manifest.spec.volumes[1].persistent_volume_claim.as_ref().unwrap();
        assert_eq!(manifest.spec.volumes[1].name, STORE_VOLUME);
        assert_eq!(claim.claim_name, "paddle-data");

        let main = &manifest.spec.containers[0];
        assert_eq!(main.volume_mounts.len(), 1);
        assert!(main.env.iter().all(|e| e.name != "PADDLE_STORE_ROOT"));

        let sidecar = &manifest.spec.containers[1];
        assert_eq!(sidecar.volume_mounts[1].mount_path, "/var/lib/paddle/store");
        let root = sidecar.env.iter().find(|e| e.name == "PADDLE_STORE_ROOT").unwrap();
        assert_eq!(root.value.as_deref(), Some("/var/lib/paddle/store"));
    }

    #[test]
    fn test_without_store_volume_only_shared_volume() {
        let definition = definition();
        let manifest = PodDefinition::new(&definition, &definition.steps[0])
            .to_manifest(&CompilerConfig::default());

        assert_eq!(manifest.spec.volumes.len(), 1);
        assert!(manifest.spec.volumes[0].empty_dir.is_some());
        assert!(manifest.spec.containers[1].env.iter().all(|e| e.name != "PADDLE_STORE_ROOT"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let definition = definition();
        let config = CompilerConfig::default();

        let first = PodDefinition::new(&definition, &definition.steps[0])
            .render(&config)
            .unwrap();
        let second = PodDefinition::new(&definition, &definition.steps[0])
            .render(&config)
            .unwrap();

        assert_eq!(first, second);
    }
}
