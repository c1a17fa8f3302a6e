//! Paddle Runner
//!
//! Runs one side of a compiled pod step:
//!
//! - `main`: waits for staged inputs, runs the step commands, reports the outcome
//! - `sidecar`: stages inputs, signals main, commits outputs if main passes
//!
//! Exits 0 on success, 1 on a failed step and 124 when the counterpart never
//! answered within the configured timeout.

use anyhow::Result;
use clap::{Parser, Subcommand};
use paddle_core::domain::data::{DataRef, HEAD};
use paddle_core::protocol::TIMEOUT_EXIT_CODE;
use paddle_core::storage::LocalObjectStore;
use paddle_runner::config::Config;
use paddle_runner::protocol::{
    InputSpec, MainProcess, ShellCommandRunner, Sidecar, SidecarJob, SidecarOutcome,
};
use paddle_runner::{DataTransfer, ProtocolError};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "paddle-runner")]
#[command(about = "Container runtime for Paddle pipeline steps", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    role: Role,
}

#[derive(Subcommand)]
enum Role {
    /// Run the step commands once the inputs are staged
    Main {
        /// Step commands, run in order until one fails
        commands: Vec<String>,
    },

    /// Stage inputs, then commit outputs once main passes
    Sidecar {
        /// Step whose outputs are committed
        #[arg(long)]
        step: String,

        /// Step version
        #[arg(long)]
        version: String,

        /// Branch the outputs are committed to
        #[arg(short, long, default_value = "master")]
        branch: String,

        /// Input as [bucket:]step/version/branch[/path], repeatable
        #[arg(short, long = "input")]
        inputs: Vec<InputSpec>,

        /// Default bucket (overrides BUCKET)
        #[arg(long)]
        bucket: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paddle_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    config.validate()?;

    let code = match cli.role {
        Role::Main { commands } => {
            info!("Starting main with {} command(s)", commands.len());
            let runner = ShellCommandRunner::in_dir(&config.data_dir);
            let mut main = MainProcess::new(config.protocol(), commands, runner);
            exit_code(main.run().await.map(|outcome| outcome.exit_code()))?
        }
        Role::Sidecar {
            step,
            version,
            branch,
            inputs,
            bucket,
        } => {
            if bucket.is_some() {
                config.bucket = bucket;
            }
            let bucket = config.bucket()?.to_string();
            info!(
                "Starting sidecar for {}/{} on {} with {} input(s), bucket={}",
                step,
                version,
                branch,
                inputs.len(),
                bucket
            );

            let store = Arc::new(LocalObjectStore::new(&config.store_root));
            let transfer = DataTransfer::new(store, bucket);
            let job = SidecarJob {
                inputs,
                output: DataRef::new(step, version, branch, HEAD),
                input_dir: config.input_path.clone(),
                output_dir: config.output_path.clone(),
            };

            let mut sidecar = Sidecar::new(config.protocol(), transfer, job);
            let result = sidecar.run().await.map(|outcome| {
                if let SidecarOutcome::Committed { folder } = &outcome {
                    info!("Outputs committed to {}", folder);
                }
                outcome.exit_code()
            });
            exit_code(result)?
        }
    };

    std::process::exit(code)
}

/// Maps a protocol result to a process exit code
///
/// Timeouts exit with 124; any other protocol error is propagated.
fn exit_code(result: std::result::Result<i32, ProtocolError>) -> Result<i32> {
    match result {
        Ok(code) => Ok(code),
        Err(e) if e.is_timeout() => {
            error!("{}", e);
            Ok(TIMEOUT_EXIT_CODE)
        }
        Err(e) => Err(e.into()),
    }
}
