//! Runner configuration
//!
//! Defines the shared volume layout, protocol timing and object store
//! location used by both container roles.

use paddle_core::protocol::{DATA_DIR, INPUT_PATH, OUTPUT_PATH};
use std::path::PathBuf;
use std::time::Duration;

use crate::protocol::ProtocolConfig;

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the volume shared by `main` and `paddle`
    pub data_dir: PathBuf,

    /// Where inputs are staged
    pub input_path: PathBuf,

    /// Where outputs are collected
    pub output_path: PathBuf,

    /// How often to check for sentinels
    pub poll_interval: Duration,

    /// Longest wait for the other container
    pub timeout: Duration,

    /// Default bucket for fetches and commits; only the sidecar needs one
    pub bucket: Option<String>,

    /// Directory backing the object store
    pub store_root: PathBuf,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(store_root: PathBuf) -> Self {
        Self {
            data_dir: PathBuf::from(DATA_DIR),
            input_path: PathBuf::from(INPUT_PATH),
            output_path: PathBuf::from(OUTPUT_PATH),
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(6 * 60 * 60), // 6 hours
            bucket: None,
            store_root,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - BUCKET (optional, required by the sidecar)
    /// - PADDLE_STORE_ROOT (optional, default: /var/lib/paddle/store)
    /// - PADDLE_DATA_DIR (optional, default: /data)
    /// - INPUT_PATH (optional, default: /data/input)
    /// - OUTPUT_PATH (optional, default: /data/output)
    /// - PADDLE_POLL_INTERVAL (optional, seconds, default: 1)
    /// - PADDLE_TIMEOUT (optional, seconds, default: 21600)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`
    ///
    /// Empty values count as unset. A duration that is not a whole number of
    /// seconds is an error naming the variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str| lookup(name).filter(|s| !s.is_empty());

        let store_root = var("PADDLE_STORE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(default_store_root);
        let mut config = Self::new(store_root);
        config.bucket = var("BUCKET");

        if let Some(data_dir) = var("PADDLE_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(input_path) = var("INPUT_PATH") {
            config.input_path = PathBuf::from(input_path);
        }
        if let Some(output_path) = var("OUTPUT_PATH") {
            config.output_path = PathBuf::from(output_path);
        }

        if let Some(raw) = var("PADDLE_POLL_INTERVAL") {
            config.poll_interval = parse_secs("PADDLE_POLL_INTERVAL", &raw)?;
        }
        if let Some(raw) = var("PADDLE_TIMEOUT") {
            config.timeout = parse_secs("PADDLE_TIMEOUT", &raw)?;
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.timeout < self.poll_interval {
            anyhow::bail!("timeout must not be shorter than poll_interval");
        }

        Ok(())
    }

    /// The default bucket, required before any transfer
    pub fn bucket(&self) -> anyhow::Result<&str> {
        self.bucket
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| anyhow::anyhow!("BUCKET environment variable not set"))
    }

    /// Timing and location for the protocol state machines
    pub fn protocol(&self) -> ProtocolConfig {
        ProtocolConfig {
            data_dir: self.data_dir.clone(),
            poll_interval: self.poll_interval,
            timeout: self.timeout,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(default_store_root())
    }
}

pub fn default_store_root() -> PathBuf {
    PathBuf::from("/var/lib/paddle/store")
}

fn parse_secs(name: &str, raw: &str) -> anyhow::Result<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| anyhow::anyhow!("{} must be a whole number of seconds, got '{}'", name, raw))
}
