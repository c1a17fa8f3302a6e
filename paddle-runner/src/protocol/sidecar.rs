//! The `paddle` sidecar state machine

use paddle_core::domain::data::{DataRef, HEAD};
use paddle_core::protocol::Sentinel;
use paddle_core::DomainError;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

use super::volume::SharedVolume;
use super::ProtocolConfig;
use crate::error::{ProtocolError, TransferError};
use crate::transfer::DataTransfer;

/// One input to stage, optionally from a bucket other than the default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub data: DataRef,
    pub bucket: Option<String>,
}

impl FromStr for InputSpec {
    type Err = DomainError;

    /// Parses `[bucket:]step/version/branch[/path]`
    ///
    /// The path defaults to `HEAD` and may itself contain `/`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidDataRef(s.to_string());

        let (bucket, reference) = match s.split_once(':') {
            Some((bucket, rest)) if !bucket.contains('/') => (Some(bucket), rest),
            _ => (None, s),
        };
        if bucket.is_some_and(str::is_empty) {
            return Err(invalid());
        }

        let mut parts = reference.splitn(4, '/');
        let (Some(step), Some(version), Some(branch)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        if step.is_empty() || version.is_empty() || branch.is_empty() {
            return Err(invalid());
        }
        let path = parts.next().filter(|p| !p.is_empty()).unwrap_or(HEAD);

        Ok(Self {
            data: DataRef::new(step, version, branch, path),
            bucket: bucket.map(str::to_string),
        })
    }
}

/// What the sidecar moves and where
#[derive(Debug, Clone)]
pub struct SidecarJob {
    /// Inputs staged before main may start
    pub inputs: Vec<InputSpec>,
    /// Identity the outputs are committed under
    pub output: DataRef,
    /// Where inputs are downloaded to
    pub input_dir: PathBuf,
    /// Where main leaves its outputs
    pub output_dir: PathBuf,
}

/// Terminal result of the sidecar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidecarOutcome {
    /// Main passed and the outputs were committed
    Committed { folder: String },
    /// Main failed; nothing was committed
    MainFailed,
}

impl SidecarOutcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            SidecarOutcome::Committed { .. } => 0,
            SidecarOutcome::MainFailed => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidecarState {
    /// Downloading every input; the first failure aborts
    Fetch,
    /// Writing `first-step.txt`
    Signal,
    /// Waiting for `main-failed.txt` or `main-passed.txt`
    WaitForResult,
    /// Uploading the outputs
    Commit,
    /// Main failed; outputs are left uncommitted
    Abort,
}

/// Stages inputs for main and commits its outputs once it passes
pub struct Sidecar {
    volume: SharedVolume,
    config: ProtocolConfig,
    transfer: DataTransfer,
    job: SidecarJob,
    state: SidecarState,
}

impl Sidecar {
    /// Creates a sidecar in `Fetch`
    pub fn new(config: ProtocolConfig, transfer: DataTransfer, job: SidecarJob) -> Self {
        Self {
            volume: SharedVolume::new(&config.data_dir),
            config,
            transfer,
            job,
            state: SidecarState::Fetch,
        }
    }

    pub fn state(&self) -> SidecarState {
        self.state
    }

    /// Drives the state machine to a terminal outcome
    ///
    /// # Errors
    /// Returns an error if any input cannot be fetched (main is never
    /// signalled in that case), if main does not report within the timeout,
    /// or if the commit fails.
    pub async fn run(&mut self) -> Result<SidecarOutcome, ProtocolError> {
        loop {
            let next = match self.state {
                SidecarState::Fetch => {
                    self.fetch_inputs().await?;
                    SidecarState::Signal
                }
                SidecarState::Signal => {
                    self.volume.signal(Sentinel::FirstStep).await?;
                    info!("first step finished");
                    SidecarState::WaitForResult
                }
                SidecarState::WaitForResult => {
                    let observed = self
                        .volume
                        .wait_for_any(
                            &[Sentinel::MainFailed, Sentinel::MainPassed],
                            self.config.poll_interval,
                            self.config.timeout,
                        )
                        .await?;
                    match observed {
                        Sentinel::MainFailed => SidecarState::Abort,
                        _ => SidecarState::Commit,
                    }
                }
                SidecarState::Commit => {
                    let folder = self
                        .transfer
                        .commit(&self.job.output_dir, &self.job.output)
                        .await?;
                    return Ok(SidecarOutcome::Committed { folder });
                }
                SidecarState::Abort => {
                    warn!("main failed, skipping commit");
                    return Ok(SidecarOutcome::MainFailed);
                }
            };

            info!("paddle: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    async fn fetch_inputs(&self) -> Result<(), ProtocolError> {
        for dir in [&self.job.input_dir, &self.job.output_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| TransferError::io(dir, e))?;
        }

        for input in &self.job.inputs {
            self.transfer
                .get(&input.data, input.bucket.as_deref(), &[], &self.job.input_dir)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paddle_core::storage::LocalObjectStore;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::tempdir;

    use crate::protocol::{MainOutcome, MainProcess, ShellCommandRunner};

    struct Fixture {
        _store: tempfile::TempDir,
        work: tempfile::TempDir,
        transfer: DataTransfer,
    }

    impl Fixture {
        fn new() -> Self {
            let store = tempdir().unwrap();
            let work = tempdir().unwrap();
            let transfer =
                DataTransfer::new(Arc::new(LocalObjectStore::new(store.path())), "bucket");
            Self {
                _store: store,
                work,
                transfer,
            }
        }

        fn data_dir(&self) -> PathBuf {
            self.work.path().join("data")
        }

        fn config(&self) -> ProtocolConfig {
            ProtocolConfig {
                data_dir: self.data_dir(),
                poll_interval: Duration::from_millis(5),
                timeout: Duration::from_secs(5),
            }
        }

        fn job(&self, inputs: Vec<InputSpec>) -> SidecarJob {
            SidecarJob {
                inputs,
                output: DataRef::new("train", "v1", "master", HEAD),
                input_dir: self.data_dir().join("input"),
                output_dir: self.data_dir().join("output"),
            }
        }

        async fn seed(&self, step: &str, file: &str, body: &str) {
            let source = self.work.path().join("seed").join(step);
            tokio::fs::create_dir_all(&source).await.unwrap();
            tokio::fs::write(source.join(file), body).await.unwrap();
            self.transfer
                .commit(&source, &DataRef::new(step, "v1", "master", HEAD))
                .await
                .unwrap();
        }
    }

    fn input(step: &str) -> InputSpec {
        InputSpec {
            data: DataRef::new(step, "v1", "master", HEAD),
            bucket: None,
        }
    }

    fn shell(commands: &[&str], cwd: &Path) -> (Vec<String>, ShellCommandRunner) {
        (
            commands.iter().map(|c| c.to_string()).collect(),
            ShellCommandRunner::in_dir(cwd),
        )
    }

    #[test]
    fn test_parse_input_spec() {
        let spec: InputSpec = "extract/v1/master".parse().unwrap();
        assert_eq!(spec.data, DataRef::new("extract", "v1", "master", HEAD));
        assert_eq!(spec.bucket, None);

        let spec: InputSpec = "other:extract/v1/master/2024_01_01/".parse().unwrap();
        assert_eq!(spec.data.path, "2024_01_01/");
        assert_eq!(spec.bucket.as_deref(), Some("other"));

        assert!("extract/v1".parse::<InputSpec>().is_err());
        assert!(":extract/v1/master".parse::<InputSpec>().is_err());
        assert!("extract//master".parse::<InputSpec>().is_err());
    }

    #[tokio::test]
    async fn test_full_handshake_commits_outputs() {
        let fixture = Fixture::new();
        fixture.seed("extract", "rows.csv", "a,b").await;
        let data_dir = fixture.data_dir();

        let mut sidecar = Sidecar::new(
            fixture.config(),
            fixture.transfer.clone(),
            fixture.job(vec![input("extract")]),
        );
        let (commands, runner) = shell(&["cp input/rows.csv output/model.csv"], &data_dir);
        let mut main = MainProcess::new(fixture.config(), commands, runner);

        let (sidecar_result, main_result) = tokio::join!(sidecar.run(), main.run());

        assert_eq!(main_result.unwrap(), MainOutcome::Passed);
        let folder = match sidecar_result.unwrap() {
            SidecarOutcome::Committed { folder } => folder,
            other => panic!("expected commit, got {:?}", other),
        };
        assert!(folder.starts_with("train/v1/master/"));

        let fetched = fixture.work.path().join("fetched");
        fixture
            .transfer
            .get(&DataRef::new("train", "v1", "master", HEAD), None, &[], &fetched)
            .await
            .unwrap();
        let model = tokio::fs::read_to_string(fetched.join("model.csv")).await.unwrap();
        assert_eq!(model, "a,b");
    }

    #[tokio::test]
    async fn test_main_failure_skips_commit() {
        let fixture = Fixture::new();
        let data_dir = fixture.data_dir();

        let mut sidecar = Sidecar::new(fixture.config(), fixture.transfer.clone(), fixture.job(vec![]));
        let (commands, runner) = shell(&["touch output/partial", "false"], &data_dir);
        let mut main = MainProcess::new(fixture.config(), commands, runner);

        let (sidecar_result, main_result) = tokio::join!(sidecar.run(), main.run());

        assert_eq!(main_result.unwrap().exit_code(), 1);
        let outcome = sidecar_result.unwrap();
        assert_eq!(outcome, SidecarOutcome::MainFailed);
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(sidecar.state(), SidecarState::Abort);

        let head = fixture
            .transfer
            .resolve(&DataRef::new("train", "v1", "master", HEAD), "bucket")
            .await;
        assert!(head.is_err());
    }

    #[tokio::test]
    async fn test_fetch_failure_never_signals_main() {
        let fixture = Fixture::new();
        fixture.seed("extract", "rows.csv", "a,b").await;

        let mut sidecar = Sidecar::new(
            fixture.config(),
            fixture.transfer.clone(),
            fixture.job(vec![input("extract"), input("missing")]),
        );
        let err = sidecar.run().await.unwrap_err();

        assert!(matches!(err, ProtocolError::Transfer(_)));
        assert_eq!(sidecar.state(), SidecarState::Fetch);
        let volume = SharedVolume::new(fixture.data_dir());
        assert!(!volume.is_set(Sentinel::FirstStep).await.unwrap());
    }

    #[tokio::test]
    async fn test_times_out_without_main() {
        let fixture = Fixture::new();
        let config = ProtocolConfig {
            timeout: Duration::from_millis(50),
            ..fixture.config()
        };

        let mut sidecar = Sidecar::new(config, fixture.transfer.clone(), fixture.job(vec![]));
        let err = sidecar.run().await.unwrap_err();

        assert!(err.is_timeout());
        let volume = SharedVolume::new(fixture.data_dir());
        assert!(volume.is_set(Sentinel::FirstStep).await.unwrap());
    }
}
