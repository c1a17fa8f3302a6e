//! Pipeline command handlers
//!
//! Handles compiling pipeline documents into pod manifests and listing the
//! steps a document declares.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use paddle_compiler::{
    CompilerConfig, Overrides, PipelineDefinition, PodDefinition, PodSecret, StoreVolume,
    parse_pipeline_file,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::config::Config;

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// Compile pipeline steps into pod manifests
    Compile {
        /// Path to the pipeline YAML file
        file: PathBuf,

        /// Only compile this step
        #[arg(long)]
        step: Option<String>,

        /// Replace the image tag of every step
        #[arg(short, long, default_value = "")]
        tag: String,

        /// Replace the version of every step
        #[arg(short, long, default_value = "")]
        version: String,

        /// Replace the branch of every step
        #[arg(short, long, default_value = "")]
        branch: String,

        /// Also apply version and branch overrides to step inputs
        #[arg(long)]
        override_inputs: bool,

        /// Secret binding as NAME:STORE:KEY, repeatable
        #[arg(short, long = "secret")]
        secrets: Vec<PodSecret>,

        /// Write <pod-name>.yaml files into this directory instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Image of the paddle sidecar container
        #[arg(long)]
        sidecar_image: Option<String>,

        /// Sentinel poll interval in seconds
        #[arg(long)]
        poll_interval: Option<u64>,

        /// How long each container waits for the other, in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// PersistentVolumeClaim mounted at the store root in the sidecar
        #[arg(long)]
        store_claim: Option<String>,
    },
    /// List the steps of a pipeline
    Steps {
        /// Path to the pipeline YAML file
        file: PathBuf,
    },
}

/// Handle pipeline commands
///
/// # Arguments
/// * `command` - The pipeline command to execute
/// * `config` - The CLI configuration
pub async fn handle_pipeline_command(command: PipelineCommands, config: &Config) -> Result<()> {
    match command {
        PipelineCommands::Compile {
            file,
            step,
            tag,
            version,
            branch,
            override_inputs,
            secrets,
            output,
            sidecar_image,
            poll_interval,
            timeout,
            store_claim,
        } => {
            let overrides = Overrides {
                tag,
                version,
                branch,
                cascade_to_inputs: override_inputs,
            };

            let mut compiler = CompilerConfig::default();
            if let Some(image) = sidecar_image {
                compiler.sidecar_image = image;
            }
            if let Some(secs) = poll_interval {
                compiler.poll_interval = Duration::from_secs(secs);
            }
            if let Some(secs) = timeout {
                compiler.timeout = Duration::from_secs(secs);
            }
            compiler.store_volume = store_claim.map(|claim_name| StoreVolume {
                claim_name,
                mount_path: config.store_root.display().to_string(),
            });

            compile_pipeline(
                &file,
                step.as_deref(),
                &overrides,
                secrets,
                &compiler,
                output.as_deref(),
            )
            .await
        }
        PipelineCommands::Steps { file } => list_steps(&file),
    }
}

/// Compile a pipeline file and emit its manifests
async fn compile_pipeline(
    file: &Path,
    step: Option<&str>,
    overrides: &Overrides,
    secrets: Vec<PodSecret>,
    compiler: &CompilerConfig,
    output: Option<&Path>,
) -> Result<()> {
    let mut definition = parse_pipeline_file(file)
        .with_context(|| format!("Failed to load pipeline: {}", file.display()))?;
    definition.apply_overrides(overrides);

    let manifests = compile_manifests(&definition, step, &secrets, compiler)?;

    match output {
        Some(dir) => {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

            for (pod_name, manifest) in &manifests {
                let path = dir.join(format!("{}.yaml", pod_name));
                tokio::fs::write(&path, manifest)
                    .await
                    .with_context(|| format!("Failed to write manifest: {}", path.display()))?;
                println!(
                    "{} {}",
                    "✓".green().bold(),
                    path.display().to_string().cyan()
                );
            }
        }
        None => {
            let documents: Vec<&str> = manifests.iter().map(|(_, m)| m.as_str()).collect();
            print!("{}", documents.join("---\n"));
        }
    }

    Ok(())
}

/// Renders the selected steps as (pod name, manifest) pairs
///
/// Secrets declared in the document come first, then the ones passed in.
fn compile_manifests(
    definition: &PipelineDefinition,
    step: Option<&str>,
    secrets: &[PodSecret],
    compiler: &CompilerConfig,
) -> Result<Vec<(String, String)>> {
    let steps = match step {
        Some(name) => {
            let selected = definition.step(name).ok_or_else(|| {
                anyhow::anyhow!(
                    "step '{}' not found in pipeline '{}'",
                    name,
                    definition.pipeline
                )
            })?;
            vec![selected]
        }
        None => definition.steps.iter().collect(),
    };

    let mut manifests = Vec::with_capacity(steps.len());
    for step in steps {
        let pod = PodDefinition::new(definition, step)
            .with_secrets(definition.secrets.iter().cloned())
            .with_secrets(secrets.iter().cloned());

        let manifest = pod
            .render(compiler)
            .with_context(|| format!("Failed to render step '{}'", step.step))?;
        info!("Compiled step {} as pod {}", step.step, pod.pod_name);
        manifests.push((pod.pod_name, manifest));
    }

    Ok(manifests)
}

/// List the steps of a pipeline file
fn list_steps(file: &Path) -> Result<()> {
    let definition = parse_pipeline_file(file)
        .with_context(|| format!("Failed to load pipeline: {}", file.display()))?;

    if definition.steps.is_empty() {
        println!("{}", "No steps found.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "Pipeline {} ({} step(s)):",
            definition.pipeline,
            definition.steps.len()
        )
        .bold()
    );
    println!();
    for step in &definition.steps {
        println!("  {} {}", "▸".cyan(), step.step.bold());
        println!("    Version: {}", step.version.dimmed());
        println!("    Branch:  {}", step.branch.dimmed());
        println!("    Image:   {}", step.image.dimmed());
        if !step.inputs.is_empty() {
            let inputs = step
                .inputs
                .iter()
                .map(|i| format!("{}/{}", i.step, i.version))
                .collect::<Vec<_>>()
                .join(", ");
            println!("    Inputs:  {}", inputs.dimmed());
        }
        println!();
    }

    Ok(())
}
