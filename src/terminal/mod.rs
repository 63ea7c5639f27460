//! Remote command execution
//!
//! Runs a shell command in the storage root on behalf of a signed-in user. Commands
//! containing a blocklisted fragment are refused without running, and every command is
//! killed after [`EXEC_TIMEOUT`].
//!
//! The blocklist is a plain substring match and is easy to get around; it only stops
//! the most obvious accidents.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

pub const BLOCKLIST: &[&str] = &[
    "rm -rf",
    "mkfs",
    "dd if=",
    ":(){:|:&};:",
    "shutdown",
    "reboot",
    "passwd",
];

pub const EXEC_TIMEOUT: Duration = Duration::from_secs(15);

pub const BLOCKED_OUTPUT: &str = "⛔ Command blocked for safety.";

/// Body of `POST /api/terminal/exec`
#[derive(Debug, Clone, Deserialize)]
pub struct ExecRequest {
    #[serde(default)]
    pub cmd: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    pub output: String,
    pub exit_code: i32,
}

impl ExecResult {
    fn failed(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            exit_code: 1,
        }
    }
}

pub fn is_blocked(cmd: &str) -> bool {
    BLOCKLIST.iter().any(|fragment| cmd.contains(fragment))
}

/// Runs `cmd` with the standard timeout
pub async fn run_command(working_dir: &Path, cmd: &str) -> ExecResult {
    run_command_with_timeout(working_dir, cmd, EXEC_TIMEOUT).await
}

pub async fn run_command_with_timeout(
    working_dir: &Path,
    cmd: &str,
    limit: Duration,
) -> ExecResult {
    if is_blocked(cmd) {
        warn!("Blocked terminal command: {:?}", cmd);
        return ExecResult::failed(BLOCKED_OUTPUT);
    }

    info!("Terminal exec in {}: {:?}", working_dir.display(), cmd);

    let child = Command::new("sh")
        .args(["-c", cmd])
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let child = match child {
        Ok(child) => child,
        Err(e) => {
            warn!("Failed to spawn terminal command: {}", e);
            return ExecResult::failed(e.to_string());
        }
    };

    // Dropping the child on timeout kills it
    let output = match timeout(limit, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return ExecResult::failed(e.to_string()),
        Err(_) => {
            warn!("Terminal command timed out: {:?}", cmd);
            return ExecResult::failed(format!(
                "Command timed out ({}s limit)",
                EXEC_TIMEOUT.as_secs()
            ));
        }
    };

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    if text.is_empty() {
        text = "(no output)".to_string();
    }

    ExecResult {
        output: text,
        exit_code: output.status.code().unwrap_or(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocklist_matches_substrings() {
        assert!(is_blocked("sudo rm -rf /"));
        assert!(is_blocked("echo x && shutdown now"));
        assert!(is_blocked("dd if=/dev/zero of=/dev/sda"));
        assert!(!is_blocked("ls -la"));
        assert!(!is_blocked("rm -r old"));
    }

    #[tokio::test]
    async fn blocked_command_does_not_run() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_command(dir.path(), "touch made && rm -rf made").await;
        assert_eq!(result, ExecResult::failed(BLOCKED_OUTPUT));
        assert!(!dir.path().join("made").exists());
    }

    #[tokio::test]
    async fn runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("part.stl"), b"x").unwrap();

        let result = run_command(dir.path(), "ls").await;
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output, "part.stl\n");
    }

    #[tokio::test]
    async fn captures_stderr_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_command(dir.path(), "echo out; echo err >&2; exit 3").await;
        assert_eq!(result.exit_code, 3);
        assert_eq!(result.output, "out\nerr\n");
    }

    #[tokio::test]
    async fn empty_output_is_marked() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_command(dir.path(), "true").await;
        assert_eq!(result.output, "(no output)");
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            run_command_with_timeout(dir.path(), "sleep 5", Duration::from_millis(200)).await;
        assert_eq!(result.output, "Command timed out (15s limit)");
        assert_eq!(result.exit_code, 1);
    }

    #[tokio::test]
    async fn missing_working_directory_fails_to_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_command(&dir.path().join("gone"), "ls").await;
        assert_eq!(result.exit_code, 1);
        assert!(!result.output.is_empty());
    }
}
