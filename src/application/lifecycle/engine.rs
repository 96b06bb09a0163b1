//! Per-unit lifecycle state machine.
//!
//! Each operation re-reads the unit, decides from its current state whether
//! any work is needed, issues at most one mutating call and then waits for
//! the platform to converge. Every operation is safe to re-run: a unit that
//! is already past a phase is skipped.

use std::time::Duration;

use tracing::{debug, info};

use super::poll::{poll_while, PollPolicy, Polled};
use crate::domain::{ConfigId, ConfigUnit, ProjectId, State};
use crate::error::{LifecycleError, Result};
use crate::port::ControlPlane;

/// Comment attached to every approval.
pub const APPROVAL_COMMENT: &str = "Approved by stackdeploy";

pub const DEFAULT_VALIDATE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_APPROVE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_DEPLOY_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);
pub const DEFAULT_UNDEPLOY_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

pub const DEFAULT_VALIDATE_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_APPROVE_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_DEPLOY_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_UNDEPLOY_INTERVAL: Duration = Duration::from_secs(30);

/// Poll settings for each lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    pub validate: PollPolicy,
    pub approve: PollPolicy,
    pub deploy: PollPolicy,
    pub undeploy: PollPolicy,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            validate: PollPolicy::new(DEFAULT_VALIDATE_INTERVAL, DEFAULT_VALIDATE_TIMEOUT),
            approve: PollPolicy::new(DEFAULT_APPROVE_INTERVAL, DEFAULT_APPROVE_TIMEOUT),
            deploy: PollPolicy::new(DEFAULT_DEPLOY_INTERVAL, DEFAULT_DEPLOY_TIMEOUT),
            undeploy: PollPolicy::new(DEFAULT_UNDEPLOY_INTERVAL, DEFAULT_UNDEPLOY_TIMEOUT),
        }
    }
}

/// Drives configuration units of one project through their lifecycle.
pub struct LifecycleEngine<C> {
    plane: C,
    project: ProjectId,
    policy: LifecyclePolicy,
}

impl<C: ControlPlane> LifecycleEngine<C> {
    pub fn new(plane: C, project: ProjectId, policy: LifecyclePolicy) -> Self {
        Self {
            plane,
            project,
            policy,
        }
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    pub fn plane(&self) -> &C {
        &self.plane
    }

    /// Current snapshot of a unit.
    ///
    /// # Errors
    ///
    /// Returns the control-plane error when the query fails.
    pub async fn observe(&self, config: &ConfigId) -> Result<ConfigUnit> {
        self.plane.get_config(&self.project, config).await
    }

    async fn wait_while<P>(&self, config: &ConfigId, policy: PollPolicy, waiting: P) -> Result<Polled<ConfigUnit>>
    where
        P: FnMut(&ConfigUnit) -> bool,
    {
        poll_while(policy, || self.observe(config), waiting).await
    }

    /// Validate a unit unless it is already past validation.
    ///
    /// # Errors
    ///
    /// A failed validate call is a generic control-plane error. A unit that
    /// does not end in `validated` yields [`LifecycleError::Validation`].
    pub async fn validate(&self, config: &ConfigId) -> Result<()> {
        let unit = self.observe(config).await?;
        if unit.state.skips_validation() {
            info!(config = %unit.name, config_id = %config, state = %unit.state, "Already validated, skipping");
            return Ok(());
        }

        self.plane.validate_config(&self.project, config).await?;
        info!(config = %unit.name, config_id = %config, "Validation started");

        let polled = self
            .wait_while(config, self.policy.validate, |u| {
                debug!(config = %u.name, state = %u.state, "Validating");
                u.state == State::Validating
            })
            .await?;
        let timed_out = polled.timed_out();
        let unit = polled.into_inner();
        if unit.state != State::Validated {
            return Err(LifecycleError::Validation {
                reason: outcome_reason(timed_out, self.policy.validate.timeout),
                name: unit.name,
                id: config.clone(),
                state: unit.state,
            }
            .into());
        }
        debug!(config = %unit.name, config_id = %config, "Config validated");
        Ok(())
    }

    /// Approve a validated unit.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Approval`] when the unit is in a state that
    /// cannot be approved, the approve call fails, or the unit does not
    /// reach `approved` in time.
    pub async fn approve(&self, config: &ConfigId) -> Result<()> {
        let unit = self.observe(config).await?;
        match unit.state {
            State::Deployed | State::DeployingFailed | State::Approved => {
                info!(config = %unit.name, config_id = %config, state = %unit.state, "Already approved, skipping");
                return Ok(());
            }
            State::Validated => {}
            state => {
                return Err(LifecycleError::Approval {
                    name: unit.name,
                    id: config.clone(),
                    state,
                    reason: "config is not validated".to_string(),
                }
                .into());
            }
        }

        info!(config = %unit.name, config_id = %config, "Approving config");
        if let Err(err) = self
            .plane
            .approve_config(&self.project, config, APPROVAL_COMMENT)
            .await
        {
            return Err(LifecycleError::Approval {
                name: unit.name,
                id: config.clone(),
                state: unit.state,
                reason: err.to_string(),
            }
            .into());
        }

        let polled = self
            .wait_while(config, self.policy.approve, |u| {
                debug!(config = %u.name, state = %u.state, "Approving");
                u.state != State::Approved
            })
            .await?;
        let timed_out = polled.timed_out();
        let unit = polled.into_inner();
        if unit.state != State::Approved {
            return Err(LifecycleError::Approval {
                reason: outcome_reason(timed_out, self.policy.approve.timeout),
                name: unit.name,
                id: config.clone(),
                state: unit.state,
            }
            .into());
        }
        info!(config = %unit.name, config_id = %config, "Config approved");
        Ok(())
    }

    /// Deploy an approved unit, or retry a failed deployment.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Deployment`] when the unit is not eligible,
    /// the deploy call fails, or the unit does not reach `deployed` in time.
    pub async fn deploy(&self, config: &ConfigId) -> Result<()> {
        let unit = self.observe(config).await?;
        match unit.state {
            State::Deployed => {
                info!(config = %unit.name, config_id = %config, "Already deployed, skipping");
                return Ok(());
            }
            State::Approved | State::DeployingFailed => {}
            state => {
                return Err(LifecycleError::Deployment {
                    name: unit.name,
                    id: config.clone(),
                    state,
                    reason: "config is not approved".to_string(),
                }
                .into());
            }
        }

        info!(config = %unit.name, config_id = %config, "Deploying config");
        if let Err(err) = self.plane.deploy_config(&self.project, config).await {
            return Err(LifecycleError::Deployment {
                name: unit.name,
                id: config.clone(),
                state: unit.state,
                reason: err.to_string(),
            }
            .into());
        }

        let polled = self
            .wait_while(config, self.policy.deploy, |u| {
                debug!(config = %u.name, state = %u.state, "Deploying");
                u.state == State::Deploying
            })
            .await?;
        let timed_out = polled.timed_out();
        let unit = polled.into_inner();
        if unit.state != State::Deployed {
            return Err(LifecycleError::Deployment {
                reason: outcome_reason(timed_out, self.policy.deploy.timeout),
                name: unit.name,
                id: config.clone(),
                state: unit.state,
            }
            .into());
        }
        info!(config = %unit.name, config_id = %config, "Config deployed");
        Ok(())
    }

    /// Undeploy the deployed version of a unit. Units with nothing deployed
    /// are skipped. An undeploy already in flight is waited on, not reissued.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Deployment`] when the undeploy call fails,
    /// the deployed state ends in `deployed` or `undeploying_failed`, or the
    /// wait times out.
    pub async fn undeploy(&self, config: &ConfigId) -> Result<()> {
        let unit = self.observe(config).await?;
        let deployed = unit.deployed_state;
        if !deployed.is_deployable() && deployed != State::Undeploying {
            info!(config = %unit.name, config_id = %config, deployed_state = %deployed, "Nothing deployed, skipping");
            return Ok(());
        }

        if deployed == State::Undeploying {
            info!(config = %unit.name, config_id = %config, "Undeploy already in progress");
        } else {
            info!(config = %unit.name, config_id = %config, "Undeploying config");
            if let Err(err) = self.plane.undeploy_config(&self.project, config).await {
                return Err(LifecycleError::Deployment {
                    name: unit.name,
                    id: config.clone(),
                    state: deployed,
                    reason: format!("undeploy request failed: {err}"),
                }
                .into());
            }
        }

        let polled = self
            .wait_while(config, self.policy.undeploy, |u| {
                debug!(config = %u.name, deployed_state = %u.deployed_state, "Undeploying");
                u.deployed_state == State::Undeploying
            })
            .await?;
        let timed_out = polled.timed_out();
        let unit = polled.into_inner();
        if timed_out || matches!(unit.deployed_state, State::Deployed | State::UndeployingFailed) {
            return Err(LifecycleError::Deployment {
                reason: if timed_out {
                    outcome_reason(true, self.policy.undeploy.timeout)
                } else {
                    "undeployment failed".to_string()
                },
                name: unit.name,
                id: config.clone(),
                state: unit.deployed_state,
            }
            .into());
        }
        info!(config = %unit.name, config_id = %config, "Config undeployed");
        Ok(())
    }

    /// Validate, approve and deploy a unit in order. The first error is
    /// returned unchanged and later phases are not attempted.
    ///
    /// # Errors
    ///
    /// Propagates the error of the first phase that fails.
    pub async fn validate_approve_deploy(&self, config: &ConfigId) -> Result<()> {
        self.validate(config).await?;
        self.approve(config).await?;
        self.deploy(config).await
    }
}

fn outcome_reason(timed_out: bool, timeout: Duration) -> String {
    if timed_out {
        format!("timed out after {}s", timeout.as_secs())
    } else {
        "unexpected final state".to_string()
    }
}
