//! The `main` container state machine

use paddle_core::protocol::Sentinel;
use tracing::{error, info};

use super::command::CommandRunner;
use super::volume::SharedVolume;
use super::ProtocolConfig;
use crate::error::ProtocolError;

/// Terminal result of the step commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MainOutcome {
    Passed,
    Failed {
        /// First command that did not succeed
        command: String,
    },
}

impl MainOutcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            MainOutcome::Passed => 0,
            MainOutcome::Failed { .. } => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MainState {
    /// Waiting for the sidecar's `first-step.txt`
    WaitForInput,
    /// Running the step commands in order
    Run,
    /// Every command succeeded
    Passed,
    /// A command failed; later commands were skipped
    Failed { command: String },
    /// Outcome reported; `main.txt` is written on entry
    Done(MainOutcome),
}

/// Runs the step commands once the sidecar has staged the inputs
pub struct MainProcess<R> {
    volume: SharedVolume,
    config: ProtocolConfig,
    commands: Vec<String>,
    runner: R,
    state: MainState,
}

impl<R: CommandRunner> MainProcess<R> {
    /// Creates a main process in `WaitForInput`
    ///
    /// # Arguments
    /// * `config` - Shared volume location and timing
    /// * `commands` - Step commands, run in order
    /// * `runner` - Executes each command
    pub fn new(config: ProtocolConfig, commands: Vec<String>, runner: R) -> Self {
        Self {
            volume: SharedVolume::new(&config.data_dir),
            config,
            commands,
            runner,
            state: MainState::WaitForInput,
        }
    }

    pub fn state(&self) -> &MainState {
        &self.state
    }

    /// Drives the state machine to `Done`
    ///
    /// # Errors
    /// Returns [`ProtocolError::Timeout`] if the inputs are never signalled,
    /// or an I/O error if a sentinel cannot be written.
    pub async fn run(&mut self) -> Result<MainOutcome, ProtocolError> {
        loop {
            let next = match &self.state {
                MainState::WaitForInput => {
                    self.volume
                        .wait_for_any(
                            &[Sentinel::FirstStep],
                            self.config.poll_interval,
                            self.config.timeout,
                        )
                        .await?;
                    MainState::Run
                }
                MainState::Run => match self.run_commands().await {
                    None => MainState::Passed,
                    Some(command) => MainState::Failed { command },
                },
                MainState::Passed => {
                    self.volume.signal(Sentinel::MainPassed).await?;
                    MainState::Done(MainOutcome::Passed)
                }
                MainState::Failed { command } => {
                    self.volume.signal(Sentinel::MainFailed).await?;
                    MainState::Done(MainOutcome::Failed {
                        command: command.clone(),
                    })
                }
                MainState::Done(outcome) => {
                    self.volume.signal(Sentinel::MainDone).await?;
                    return Ok(outcome.clone());
                }
            };

            info!("main: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Runs commands in order, stopping at the first failure
    ///
    /// # Returns
    /// The failed command, or `None` if every command succeeded
    async fn run_commands(&self) -> Option<String> {
        for command in &self.commands {
            match self.runner.run(command).await {
                Ok(true) => {}
                Ok(false) => return Some(command.clone()),
                Err(e) => {
                    error!("{}", e);
                    return Some(command.clone());
                }
            }
        }
        None
    }
}
