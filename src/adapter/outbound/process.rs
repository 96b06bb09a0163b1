//! Runs commands as child processes.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::port::{CommandLine, CommandOutput, CommandRunner};

/// [`CommandRunner`] that spawns the program directly, without a shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &CommandLine) -> CommandOutput {
        let result = Command::new(command.program())
            .args(command.argv())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        match result {
            Ok(output) => {
                let output = CommandOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    exit_code: output.status.code(),
                };
                debug!(command = %command, exit_code = ?output.exit_code, "Command finished");
                output
            }
            Err(e) => CommandOutput {
                stdout: String::new(),
                stderr: format!("failed to run {}: {e}", command.program()),
                exit_code: None,
            },
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let output = ProcessRunner::new()
            .run(&CommandLine::new("sh").args(["-c", "echo hello"]))
            .await;
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.error(), None);
    }

    #[tokio::test]
    async fn reports_failure_without_panicking() {
        let output = ProcessRunner::new()
            .run(&CommandLine::new("sh").args(["-c", "echo oops >&2; exit 3"]))
            .await;
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.error().as_deref(), Some("oops"));
    }

    #[tokio::test]
    async fn missing_program_is_an_error_output() {
        let output = ProcessRunner::new()
            .run(&CommandLine::new("definitely-not-a-real-program-xyz"))
            .await;
        assert_eq!(output.exit_code, None);
        assert!(output.error().unwrap().contains("failed to run"));
    }
}
