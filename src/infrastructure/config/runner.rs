//! Control-plane command execution settings.

use std::time::Duration;

use serde::Deserialize;

/// Output text that marks a transient failure worth retrying.
pub const TLS_HANDSHAKE_TIMEOUT: &str = "tls handshake timeout";

/// How control-plane commands are run and retried.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Control-plane program, looked up on `PATH`.
    #[serde(default = "default_program")]
    pub program: String,
    /// Attempts made while the transient signature keeps appearing.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Wait between attempts.
    #[serde(default = "default_retry_delay", deserialize_with = "super::duration::deserialize")]
    pub retry_delay: Duration,
    /// Case-insensitive text that marks a retryable failure.
    #[serde(default = "default_transient_signature")]
    pub transient_signature: String,
}

fn default_program() -> String {
    "ibmcloud".to_string()
}

const fn default_max_attempts() -> u32 {
    5
}

const fn default_retry_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_transient_signature() -> String {
    TLS_HANDSHAKE_TIMEOUT.to_string()
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            max_attempts: default_max_attempts(),
            retry_delay: default_retry_delay(),
            transient_signature: default_transient_signature(),
        }
    }
}
