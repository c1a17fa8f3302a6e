//! Shell scripts for the two pod containers
//!
//! `main` waits for the sidecar's `first-step.txt`, runs the step commands as
//! one `&&` chain and reports the outcome through `main-passed.txt` or
//! `main-failed.txt`, followed by `main.txt` either way. The `paddle` sidecar
//! fetches every input as one `&&` chain, signals `first-step.txt`, then waits
//! for main's outcome and commits the outputs only on success.
//!
//! Both wait loops give up with exit code 124 after the configured timeout.

use paddle_core::domain::data::HEAD;
use paddle_core::domain::pipeline::InputReference;
use paddle_core::protocol::{Sentinel, TIMEOUT_EXIT_CODE};
use paddle_core::sanitize_name;

use crate::config::CompilerConfig;

/// Script run by the `main` container
pub fn main_script(commands: &[String], config: &CompilerConfig) -> String {
    let first_step = shell_quote(&Sentinel::FirstStep.path_in(&config.data_dir));
    let passed = shell_quote(&Sentinel::MainPassed.path_in(&config.data_dir));
    let failed = shell_quote(&Sentinel::MainFailed.path_in(&config.data_dir));
    let done = shell_quote(&Sentinel::MainDone.path_in(&config.data_dir));

    // Each command sits on its own lines so a trailing comment cannot swallow the `&&`
    let chain = if commands.is_empty() {
        "true".to_string()
    } else {
        commands
            .iter()
            .map(|c| format!("(\n{}\n)", c))
            .collect::<Vec<_>>()
            .join(" &&\n")
    };

    let mut script = wait_until_exists(&first_step, config);
    script.push_str(&format!(
        "if {chain}\nthen\n  touch {passed}; status=0\nelse\n  touch {failed}; status=1\nfi\n"
    ));
    script.push_str(&format!("touch {done}\nexit $status\n"));
    script
}

/// Script run by the `paddle` sidecar container
///
/// # Arguments
/// * `inputs` - Input references to stage before main may start
/// * `step`, `version`, `branch` - Sanitized identity the outputs are committed under
pub fn sidecar_script(
    inputs: &[InputReference],
    step: &str,
    version: &str,
    branch: &str,
    config: &CompilerConfig,
) -> String {
    let first_step = shell_quote(&Sentinel::FirstStep.path_in(&config.data_dir));
    let passed = shell_quote(&Sentinel::MainPassed.path_in(&config.data_dir));
    let failed = shell_quote(&Sentinel::MainFailed.path_in(&config.data_dir));
    let poll = config.poll_interval_secs();
    let timeout = config.timeout_secs();

    let mut fetch = vec!["mkdir -p \"$INPUT_PATH\" \"$OUTPUT_PATH\"".to_string()];
    fetch.extend(inputs.iter().map(fetch_command));
    fetch.push(format!("touch {first_step}"));
    fetch.push("echo first step finished".to_string());

    let mut script = format!("{} || exit 1\n", fetch.join(" &&\n  "));
    script.push_str("waited=0\nwhile true; do\n");
    script.push_str(&format!("  if [ -e {failed} ]; then\n    exit 1\n  fi\n"));
    script.push_str(&format!(
        "  if [ -e {passed} ]; then\n    paddle data commit \"$OUTPUT_PATH\" {}/{} -b {}\n    exit $?\n  fi\n",
        shell_quote(step),
        shell_quote(version),
        shell_quote(branch)
    ));
    script.push_str(&format!(
        "  if [ \"$waited\" -ge {timeout} ]; then\n    echo \"timed out waiting for main\" >&2\n    exit {TIMEOUT_EXIT_CODE}\n  fi\n"
    ));
    script.push_str(&format!(
        "  sleep {poll}\n  waited=$((waited + {poll}))\ndone\n"
    ));
    script
}

fn fetch_command(input: &InputReference) -> String {
    let path = if input.path.is_empty() {
        HEAD
    } else {
        input.path.as_str()
    };

    let mut command = format!(
        "paddle data get {}/{} \"$INPUT_PATH\" -b {} -p {}",
        shell_quote(&sanitize_name(&input.step)),
        shell_quote(&sanitize_name(&input.version)),
        shell_quote(&sanitize_name(&input.branch)),
        shell_quote(path)
    );
    if let Some(bucket) = input.bucket_override() {
        command.push_str(&format!(" --bucket {}", shell_quote(bucket)));
    }
    command
}

fn wait_until_exists(path: &str, config: &CompilerConfig) -> String {
    let poll = config.poll_interval_secs();
    let timeout = config.timeout_secs();
    format!(
        "waited=0\nuntil [ -e {path} ]; do\n  if [ \"$waited\" -ge {timeout} ]; then\n    echo \"timed out waiting for {path}\" >&2\n    exit {TIMEOUT_EXIT_CODE}\n  fi\n  sleep {poll}\n  waited=$((waited + {poll}))\ndone\n"
    )
}

/// Quotes a value for POSIX sh unless it is made only of safe characters
fn shell_quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '='));
    if safe {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}
