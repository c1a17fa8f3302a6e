//! Step command execution

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ProtocolError;

/// Runs a single step command
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `command` to completion
    ///
    /// # Returns
    /// `true` if the command exited successfully
    async fn run(&self, command: &str) -> Result<bool, ProtocolError>;
}

/// Runs commands with `/bin/sh -c`, inheriting the process environment
#[derive(Debug, Clone, Default)]
pub struct ShellCommandRunner {
    working_dir: Option<PathBuf>,
}

impl ShellCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every command from `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
        }
    }
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(&self, command: &str) -> Result<bool, ProtocolError> {
        debug!("Running: {}", command);

        let mut shell = Command::new("/bin/sh");
        shell.arg("-c").arg(command);
        if let Some(dir) = &self.working_dir {
            shell.current_dir(dir);
        }

        let status = shell.status().await.map_err(|source| ProtocolError::Spawn {
            command: command.to_string(),
            source,
        })?;

        if !status.success() {
            warn!(
                "Command '{}' failed with exit_code={}",
                command,
                status.code().unwrap_or(-1)
            );
        }

        Ok(status.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_shell_runner_reports_status() {
        let runner = ShellCommandRunner::new();
        assert!(runner.run("true").await.unwrap());
        assert!(!runner.run("exit 3").await.unwrap());
    }

    #[tokio::test]
    async fn test_shell_runner_uses_working_dir() {
        let dir = tempdir().unwrap();
        let runner = ShellCommandRunner::in_dir(dir.path());

        assert!(runner.run("echo hi > out.txt").await.unwrap());
        assert!(dir.path().join("out.txt").exists());
    }
}
