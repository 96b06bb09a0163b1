//! Composition root: builds the platform client and turns configuration into
//! a run plan.

use std::sync::Arc;

use tracing::{debug, info};

use crate::adapter::outbound::ibmcloud::IbmCloud;
use crate::adapter::outbound::process::ProcessRunner;
use crate::adapter::outbound::retrying::RetryingRunner;
use crate::application::orchestration::{Action, Mode, RunPlan};
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Production control plane: the platform CLI run as a child process, with
/// transient failures retried.
pub type Platform = IbmCloud<RetryingRunner<ProcessRunner>>;

/// Run switches that only exist on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunFlags {
    pub parallel: bool,
    pub skip_stack_inputs: bool,
    pub stack_definition_update: bool,
}

/// Build the production platform client.
#[must_use]
pub fn build_platform(config: &Config) -> Arc<Platform> {
    let runner = RetryingRunner::new(ProcessRunner::new(), config.runner.clone());
    Arc::new(IbmCloud::new(runner, config.runner.program.clone()))
}

/// Verify tooling and make sure the CLI holds a session.
///
/// # Errors
///
/// Returns [`crate::error::Error::MissingTools`] when the program or a plugin
/// is absent, or the login error when no session could be established.
pub async fn prepare_session(platform: &Platform, config: &Config) -> Result<()> {
    platform.missing_tools().await.into_result()?;
    platform.ensure_session(|| config.api_key()).await
}

/// Turn configuration and flags into an executable plan.
///
/// Stack preparation only applies to deploys. Input values equal to the
/// credential sentinel are replaced with the API key here, so the key is
/// only read when it is actually needed.
///
/// # Errors
///
/// Returns a configuration error when names are missing, the definition
/// file does not exist, or the API key variable is unset.
pub fn build_plan(config: &Config, action: Action, flags: RunFlags) -> Result<RunPlan> {
    let (project, stack) = config.target()?;
    let mode = if flags.parallel { Mode::Parallel } else { Mode::Sequential };
    let mut plan = RunPlan::new(project, stack, action)
        .with_mode(mode)
        .with_config_order(config.config_order.clone())
        .with_lifecycle(config.lifecycle_policy())
        .with_parallel(config.parallel.clone());

    if action == Action::Undeploy {
        return Ok(plan);
    }

    if flags.stack_definition_update {
        plan = plan.with_definition(config.require_stack_definition()?);
    }

    if flags.skip_stack_inputs {
        info!("Skipping stack inputs");
    } else if !config.stack_inputs.is_empty() {
        let inputs = if config.stack_inputs.sentinel_keys().next().is_some() {
            debug!(
                keys = ?config.stack_inputs.sentinel_keys().collect::<Vec<_>>(),
                "Substituting API key into stack inputs"
            );
            config.stack_inputs.with_credential(&config.api_key()?)
        } else {
            config.stack_inputs.clone()
        };
        plan = plan.with_inputs(inputs);
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, Error};

    fn config() -> Config {
        let mut config = Config::default();
        config.project_name = Some("proj".into());
        config.stack_name = Some("stack".into());
        config
    }

    #[test]
    fn undeploy_ignores_inputs_and_definition() {
        let mut config = config();
        config.stack_inputs.insert("ibmcloud_api_key", "API_KEY");
        config.stack_api_key_env = "STACKDEPLOY_TEST_UNSET_KEY".into();

        let plan = build_plan(
            &config,
            Action::Undeploy,
            RunFlags {
                stack_definition_update: true,
                ..RunFlags::default()
            },
        )
        .unwrap();

        assert!(plan.inputs.is_none());
        assert!(plan.definition.is_none());
    }

    #[test]
    fn sentinel_requires_api_key_variable() {
        let mut config = config();
        config.stack_inputs.insert("ibmcloud_api_key", "API_KEY");
        config.stack_api_key_env = "STACKDEPLOY_TEST_UNSET_KEY".into();

        let result = build_plan(&config, Action::Deploy, RunFlags::default());

        assert!(matches!(result, Err(Error::Config(ConfigError::MissingEnv { .. }))));
    }

    #[test]
    fn inputs_without_sentinel_need_no_key() {
        let mut config = config();
        config.stack_inputs.insert("prefix", "dev");
        config.stack_api_key_env = "STACKDEPLOY_TEST_UNSET_KEY".into();

        let plan = build_plan(&config, Action::Deploy, RunFlags::default()).unwrap();

        assert_eq!(plan.inputs.unwrap().len(), 1);
    }

    #[test]
    fn substituted_key_is_masked_in_planned_inputs() {
        let mut config = config();
        config.stack_inputs.insert("apikey", "API_KEY");
        config.stack_api_key_env = "STACKDEPLOY_TEST_MASKED_KEY".into();
        std::env::set_var("STACKDEPLOY_TEST_MASKED_KEY", "TOPSECRET");

        let plan = build_plan(&config, Action::Deploy, RunFlags::default()).unwrap();

        let inputs = plan.inputs.unwrap();
        assert_eq!(inputs.to_json()["apikey"], "TOPSECRET");
        assert!(!inputs.masked().to_string().contains("TOPSECRET"));
    }

    #[test]
    fn skip_flag_drops_inputs() {
        let mut config = config();
        config.stack_inputs.insert("ibmcloud_api_key", "API_KEY");

        let plan = build_plan(
            &config,
            Action::Deploy,
            RunFlags {
                skip_stack_inputs: true,
                parallel: true,
                ..RunFlags::default()
            },
        )
        .unwrap();

        assert!(plan.inputs.is_none());
        assert_eq!(plan.mode, Mode::Parallel);
    }

    #[test]
    fn definition_update_requires_existing_file() {
        let mut config = config();
        config.stack_def_path = "/nonexistent/stack_definition.json".into();

        let result = build_plan(
            &config,
            Action::Deploy,
            RunFlags {
                stack_definition_update: true,
                ..RunFlags::default()
            },
        );

        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue { field: "stack_def_path", .. }))
        ));
    }
}
