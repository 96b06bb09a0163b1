//! Per-phase timeouts and poll intervals.

use std::time::Duration;

use serde::Deserialize;

use super::duration;

/// Upper bound on how long each lifecycle phase may take.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_validate_timeout", deserialize_with = "duration::deserialize")]
    pub validate: Duration,
    #[serde(default = "default_approve_timeout", deserialize_with = "duration::deserialize")]
    pub approve: Duration,
    #[serde(default = "default_deploy_timeout", deserialize_with = "duration::deserialize")]
    pub deploy: Duration,
    #[serde(default = "default_deploy_timeout", deserialize_with = "duration::deserialize")]
    pub undeploy: Duration,
}

const fn default_validate_timeout() -> Duration {
    Duration::from_secs(30 * 60)
}

const fn default_approve_timeout() -> Duration {
    Duration::from_secs(5 * 60)
}

const fn default_deploy_timeout() -> Duration {
    Duration::from_secs(2 * 60 * 60)
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            validate: default_validate_timeout(),
            approve: default_approve_timeout(),
            deploy: default_deploy_timeout(),
            undeploy: default_deploy_timeout(),
        }
    }
}

/// Interval between state queries while a phase converges.
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_slow_interval", deserialize_with = "duration::deserialize")]
    pub validate: Duration,
    #[serde(default = "default_approve_interval", deserialize_with = "duration::deserialize")]
    pub approve: Duration,
    #[serde(default = "default_slow_interval", deserialize_with = "duration::deserialize")]
    pub deploy: Duration,
    #[serde(default = "default_slow_interval", deserialize_with = "duration::deserialize")]
    pub undeploy: Duration,
}

const fn default_slow_interval() -> Duration {
    Duration::from_secs(30)
}

const fn default_approve_interval() -> Duration {
    Duration::from_secs(5)
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            validate: default_slow_interval(),
            approve: default_approve_interval(),
            deploy: default_slow_interval(),
            undeploy: default_slow_interval(),
        }
    }
}

impl PollingConfig {
    /// Smallest configured interval; used for validation.
    #[must_use]
    pub fn min(&self) -> Duration {
        self.validate
            .min(self.approve)
            .min(self.deploy)
            .min(self.undeploy)
    }
}
