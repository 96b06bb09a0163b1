//! Dependency-ready (parallel) execution settings.

use std::time::Duration;

use serde::Deserialize;

use super::duration;

/// Upper bound for the default worker count.
const MAX_DEFAULT_WORKERS: usize = 32;

#[derive(Debug, Clone, Deserialize)]
pub struct ParallelConfig {
    /// Units running their lifecycle at the same time.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Wait before re-checking readiness when no unit was ready.
    #[serde(
        default = "default_readiness_interval",
        deserialize_with = "duration::deserialize"
    )]
    pub readiness_interval: Duration,
    /// How long pending units may stay un-ready before the run fails.
    #[serde(
        default = "default_readiness_timeout",
        deserialize_with = "duration::deserialize"
    )]
    pub readiness_timeout: Duration,
}

fn default_max_workers() -> usize {
    (num_cpus::get() + 4).min(MAX_DEFAULT_WORKERS)
}

const fn default_readiness_interval() -> Duration {
    Duration::from_secs(30)
}

const fn default_readiness_timeout() -> Duration {
    Duration::from_secs(60 * 60)
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            readiness_interval: default_readiness_interval(),
            readiness_timeout: default_readiness_timeout(),
        }
    }
}
