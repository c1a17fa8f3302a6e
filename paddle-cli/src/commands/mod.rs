//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod data;
mod pipeline;

pub use data::DataCommands;
pub use pipeline::PipelineCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Pipeline compilation
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    /// Step data retrieval and commit
    Data {
        #[command(subcommand)]
        command: DataCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Pipeline { command } => pipeline::handle_pipeline_command(command, config).await,
        Commands::Data { command } => data::handle_data_command(command, config).await,
    }
}
