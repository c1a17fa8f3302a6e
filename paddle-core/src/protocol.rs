//! Two-container coordination protocol
//!
//! A compiled pod runs two containers, `main` and `paddle`, that share one
//! ephemeral volume. They never talk to each other directly: each signal is a
//! zero-length sentinel file with exactly one writer, written at most once,
//! and readers only ever test for its existence.

/// Name of the shared pod volume
pub const SHARED_VOLUME: &str = "shared-data";

/// Mount point of the shared volume in both containers
pub const DATA_DIR: &str = "/data";

/// Where the sidecar stages inputs
pub const INPUT_PATH: &str = "/data/input";

/// Where the main container leaves outputs for commit
pub const OUTPUT_PATH: &str = "/data/output";

/// Exit code of a process that gave up waiting for its counterpart
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Sentinel files of the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    /// Sidecar to main: inputs are staged
    FirstStep,
    /// Main to sidecar: every command succeeded
    MainPassed,
    /// Main to sidecar: a command failed
    MainFailed,
    /// Main's unconditional done marker
    MainDone,
}

impl Sentinel {
    pub const fn file_name(self) -> &'static str {
        match self {
            Sentinel::FirstStep => "first-step.txt",
            Sentinel::MainPassed => "main-passed.txt",
            Sentinel::MainFailed => "main-failed.txt",
            Sentinel::MainDone => "main.txt",
        }
    }

    /// Path of the sentinel on a volume mounted at `data_dir`
    pub fn path_in(self, data_dir: &str) -> String {
        format!("{}/{}", data_dir.trim_end_matches('/'), self.file_name())
    }
}
