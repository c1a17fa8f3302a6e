//! Sentinel coordination protocol
//!
//! The two containers of a compiled pod, modelled as explicit state machines:
//!
//! - [`MainProcess`]: `WaitForInput → Run → Passed | Failed → Done`
//! - [`Sidecar`]: `Fetch → Signal → WaitForResult → Commit | Abort`
//!
//! They share nothing but a [`SharedVolume`]. Every wait polls at a fixed
//! interval and fails with [`ProtocolError::Timeout`](crate::error::ProtocolError)
//! once the configured timeout elapses.

mod command;
mod main_process;
mod sidecar;
mod volume;

pub use command::{CommandRunner, ShellCommandRunner};
pub use main_process::{MainOutcome, MainProcess, MainState};
pub use sidecar::{InputSpec, Sidecar, SidecarJob, SidecarOutcome, SidecarState};
pub use volume::SharedVolume;

use std::path::PathBuf;
use std::time::Duration;

/// Timing and location shared by both state machines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Root of the shared volume
    pub data_dir: PathBuf,
    /// Delay between sentinel checks
    pub poll_interval: Duration,
    /// Longest time to wait for the counterpart
    pub timeout: Duration,
}
