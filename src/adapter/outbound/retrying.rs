//! Retrying wrapper for [`CommandRunner`].
//!
//! Re-runs a command with a fixed delay only while its output carries the
//! transient-failure signature. Any other outcome, success or failure, is
//! returned straight away. When the attempts run out the last observed
//! output is returned rather than an error.

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::infrastructure::config::runner::RunnerConfig;
use crate::port::{CommandLine, CommandOutput, CommandRunner};

/// Wrapper that adds bounded retry on transient failures to any runner.
pub struct RetryingRunner<R: CommandRunner> {
    /// The underlying runner being wrapped.
    inner: R,
    /// Attempt bound, delay and signature.
    config: RunnerConfig,
}

impl<R: CommandRunner> RetryingRunner<R> {
    pub fn new(inner: R, config: RunnerConfig) -> Self {
        Self { inner, config }
    }

    fn is_transient(&self, output: &CommandOutput) -> bool {
        output.mentions(&self.config.transient_signature)
    }
}

#[async_trait]
impl<R: CommandRunner> CommandRunner for RetryingRunner<R> {
    async fn run(&self, command: &CommandLine) -> CommandOutput {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!(command = %command, attempt, "Running command");
            let output = self.inner.run(command).await;

            if !self.is_transient(&output) {
                if let Some(err) = output.error() {
                    error!(command = %command, error = %err, "Command failed");
                }
                return output;
            }

            if attempt >= max_attempts {
                error!(
                    command = %command,
                    attempts = attempt,
                    "Transient failure persisted, giving up"
                );
                return output;
            }

            warn!(
                command = %command,
                attempt,
                max_attempts,
                delay_secs = self.config.retry_delay.as_secs(),
                "Transient failure, retrying"
            );
            sleep(self.config.retry_delay).await;
            attempt += 1;
        }
    }
}
