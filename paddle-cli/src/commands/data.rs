//! Data command handlers
//!
//! Handles fetching committed step data into a local directory and
//! committing a local directory as a new version of a step's data.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use paddle_core::domain::data::{DataRef, HEAD};
use paddle_core::storage::LocalObjectStore;
use paddle_runner::DataTransfer;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;

/// Data subcommands
#[derive(Subcommand)]
pub enum DataCommands {
    /// Download a step's committed data
    Get {
        /// Source as step/version
        source: String,

        /// Local destination directory
        dest: PathBuf,

        /// Branch to read from
        #[arg(short, long, default_value = "master")]
        branch: String,

        /// Commit folder, or HEAD for the latest commit
        #[arg(short, long, default_value = HEAD)]
        path: String,

        /// Only download these keys; all of them must exist
        #[arg(short, long = "key")]
        keys: Vec<String>,
    },
    /// Commit a local directory as a step's new data
    Commit {
        /// Local directory to upload
        source: PathBuf,

        /// Destination as step/version
        destination: String,

        /// Branch to commit to
        #[arg(short, long, default_value = "master")]
        branch: String,
    },
}

/// Handle data commands
///
/// # Arguments
/// * `command` - The data command to execute
/// * `config` - The CLI configuration
pub async fn handle_data_command(command: DataCommands, config: &Config) -> Result<()> {
    let store = Arc::new(LocalObjectStore::new(&config.store_root));
    let transfer = DataTransfer::new(store, config.bucket()?);

    match command {
        DataCommands::Get {
            source,
            dest,
            branch,
            path,
            keys,
        } => get_data(&transfer, &source, &dest, branch, path, &keys).await,
        DataCommands::Commit {
            source,
            destination,
            branch,
        } => commit_data(&transfer, &source, &destination, branch).await,
    }
}

/// Download a step's data into `dest`
async fn get_data(
    transfer: &DataTransfer,
    source: &str,
    dest: &Path,
    branch: String,
    path: String,
    keys: &[String],
) -> Result<()> {
    let data = DataRef::parse(source, branch, path)?;

    let fetched = transfer
        .get(&data, None, keys, dest)
        .await
        .with_context(|| format!("Failed to get {}", data))?;

    println!(
        "{}",
        format!("✓ Fetched {} object(s)", fetched.len()).green().bold()
    );
    println!("  Source: {}", data.to_string().cyan());
    println!("  Dest:   {}", dest.display().to_string().dimmed());

    Ok(())
}

/// Commit `source` as a new version of a step's data
async fn commit_data(
    transfer: &DataTransfer,
    source: &Path,
    destination: &str,
    branch: String,
) -> Result<()> {
    let data = DataRef::parse(destination, branch, HEAD)?;

    let folder = transfer
        .commit(source, &data)
        .await
        .with_context(|| format!("Failed to commit {}", source.display()))?;

    println!("{}", "✓ Data committed successfully!".green().bold());
    println!(
        "  Commit: {}",
        format!("{}/{}", transfer.bucket(), folder).cyan()
    );

    Ok(())
}
