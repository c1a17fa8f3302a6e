//! Paddle CLI
//!
//! Compiles pipeline documents into pod manifests and moves step data in and
//! out of the object store.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "paddle")]
#[command(about = "Paddle pipeline CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory backing the object store
    #[arg(
        long,
        env = "PADDLE_STORE_ROOT",
        default_value = "/var/lib/paddle/store",
        global = true
    )]
    store_root: PathBuf,

    /// Default bucket for data commands
    #[arg(long, env = "BUCKET", global = true)]
    bucket: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so manifests on stdout stay pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paddle=info,paddle_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        store_root: cli.store_root,
        bucket: cli.bucket,
    };

    handle_command(cli.command, &config).await
}
