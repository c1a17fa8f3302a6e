//! Compiler configuration
//!
//! Fixed parts of the pod template that differ between deployments.

use paddle_core::protocol::DATA_DIR;
use std::time::Duration;

/// Persistent claim backing the sidecar's object store root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreVolume {
    /// Name of the PersistentVolumeClaim
    pub claim_name: String,

    /// Where the claim is mounted; exported as `PADDLE_STORE_ROOT`
    pub mount_path: String,
}

/// Settings shared by every pod the compiler renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Image of the `paddle` sidecar container
    pub sidecar_image: String,

    /// AWS region exported to the sidecar
    pub aws_region: String,

    /// Secret holding AWS credentials for the main container
    pub main_credentials_secret: String,

    /// Secret holding AWS credentials for the sidecar
    pub sidecar_credentials_secret: String,

    /// How often each container checks for its counterpart's sentinel
    pub poll_interval: Duration,

    /// How long each container waits for its counterpart before giving up
    pub timeout: Duration,

    /// Mount point of the shared volume in both containers
    pub data_dir: String,

    /// Store volume for the sidecar
    ///
    /// Without one the sidecar image must reach the object store on its own.
    pub store_volume: Option<StoreVolume>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            sidecar_image: "paddlecontainer:latest".to_string(),
            aws_region: "eu-west-1".to_string(),
            main_credentials_secret: "aws-credentials-training".to_string(),
            sidecar_credentials_secret: "aws-credentials".to_string(),
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(6 * 60 * 60),
            data_dir: DATA_DIR.to_string(),
            store_volume: None,
        }
    }
}

impl CompilerConfig {
    /// Poll interval in whole seconds, at least one
    pub fn poll_interval_secs(&self) -> u64 {
        self.poll_interval.as_secs().max(1)
    }

    /// Timeout in whole seconds, at least one poll interval
    pub fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs().max(self.poll_interval_secs())
    }

    /// Where the sidecar stages inputs
    pub fn input_path(&self) -> String {
        format!("{}/input", self.data_dir.trim_end_matches('/'))
    }

    /// Where main leaves outputs for commit
    pub fn output_path(&self) -> String {
        format!("{}/output", self.data_dir.trim_end_matches('/'))
    }
}
