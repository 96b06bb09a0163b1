//! Handlers for the `deploy` and `undeploy` commands.

use tracing::{debug, info};

use super::command::{DeployArgs, TargetArgs};
use super::output;
use crate::application::orchestration::{execute, Action, RunReport};
use crate::domain::MASK;
use crate::error::Result;
use crate::infrastructure::bootstrap::{self, RunFlags};
use crate::infrastructure::config::Config;

/// Load the run file, if any, and apply the shared overrides.
///
/// # Errors
///
/// Returns a configuration error when the file cannot be read or parsed, or
/// a value is out of range.
pub fn load_config(target: &TargetArgs) -> Result<Config> {
    let mut config = match &target.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(project) = &target.project_name {
        config.project_name = Some(project.clone());
    }
    if let Some(stack) = &target.stack_name {
        config.stack_name = Some(stack.clone());
    }
    if let Some(var) = &target.stack_api_key_env {
        config.stack_api_key_env = var.clone();
    }
    if target.debug {
        config.logging.level = "debug".into();
    }
    if target.json_logs {
        config.logging.format = "json".into();
    }
    config.validate()?;
    Ok(config)
}

/// Apply the deploy-only overrides.
pub fn apply_deploy_overrides(config: &mut Config, args: &DeployArgs) {
    let order: Vec<String> = args
        .config_order
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    if !order.is_empty() {
        config.config_order = order;
    }
    if let Some(path) = &args.stack_def_path {
        config.stack_def_path = path.clone();
    }
    if let Some(inputs) = &args.stack_inputs {
        config.stack_inputs = inputs.clone();
    }
}

/// Execute the deploy command.
///
/// # Errors
///
/// Returns fatal errors: configuration, session bootstrap, name resolution
/// and stack preparation. Lifecycle failures are in the report.
pub async fn execute_deploy(args: &DeployArgs) -> Result<RunReport> {
    let mut config = load_config(&args.target)?;
    apply_deploy_overrides(&mut config, args);
    let flags = RunFlags {
        parallel: args.parallel,
        skip_stack_inputs: args.skip_stack_inputs,
        stack_definition_update: args.stack_definition_update,
    };
    run(&config, Action::Deploy, flags, args.target.debug).await
}

/// Execute the undeploy command.
///
/// # Errors
///
/// Same as [`execute_deploy`].
pub async fn execute_undeploy(args: &TargetArgs) -> Result<RunReport> {
    let config = load_config(args)?;
    run(&config, Action::Undeploy, RunFlags::default(), args.debug).await
}

async fn run(config: &Config, action: Action, flags: RunFlags, debug_flag: bool) -> Result<RunReport> {
    config.init_logging();
    print_settings(config, action, flags, debug_flag);

    let plan = bootstrap::build_plan(config, action, flags)?;
    let platform = bootstrap::build_platform(config);
    bootstrap::prepare_session(&platform, config).await?;

    info!(action = ?action, mode = ?plan.mode, "Run started");
    let report = execute(platform, &plan).await?;
    info!(
        completed = report.completed.len(),
        failures = report.failures.len(),
        "Run finished"
    );
    Ok(report)
}

/// Print the effective settings. The key variable name is shown masked.
fn print_settings(config: &Config, action: Action, flags: RunFlags, debug_flag: bool) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Project name", config.project_name.as_deref().unwrap_or("-"));
    output::field("Stack name", config.stack_name.as_deref().unwrap_or("-"));
    output::field("API key environment variable", MASK);
    output::field("Undeploy", action == Action::Undeploy);
    if action == Action::Deploy {
        let order = if config.config_order.is_empty() {
            "(stack order)".to_string()
        } else {
            config.config_order.join(" | ")
        };
        output::field("Config order", order);
        output::field("Stack definition path", config.stack_def_path.display());
        output::field("Skip stack inputs", flags.skip_stack_inputs);
        output::field("Stack definition update", flags.stack_definition_update);
        output::field("Deploy in parallel", flags.parallel);
    }
    output::field("Debug", debug_flag);

    if !config.stack_inputs.is_empty() {
        debug!(inputs = %config.stack_inputs.masked(), "Stack inputs");
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::error::{ConfigError, Error};

    #[test]
    fn flags_override_run_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "project_name = \"from-file\"\nstack_name = \"stack\"\nconfig_order = [\"a\"]"
        )
        .unwrap();

        let args = DeployArgs {
            target: TargetArgs {
                config: Some(file.path().to_path_buf()),
                project_name: Some("from-flag".into()),
                debug: true,
                ..TargetArgs::default()
            },
            config_order: vec!["net".into(), " db ".into(), String::new()],
            ..DeployArgs::default()
        };

        let mut config = load_config(&args.target).unwrap();
        apply_deploy_overrides(&mut config, &args);

        assert_eq!(config.project_name.as_deref(), Some("from-flag"));
        assert_eq!(config.stack_name.as_deref(), Some("stack"));
        assert_eq!(config.config_order, vec!["net", "db"]);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn missing_run_file_is_config_error() {
        let args = TargetArgs {
            config: Some("/nonexistent/stackdeploy.toml".into()),
            ..TargetArgs::default()
        };
        assert!(matches!(
            load_config(&args),
            Err(Error::Config(ConfigError::ReadFile(_)))
        ));
    }

    #[tokio::test]
    async fn deploy_without_names_fails_before_touching_platform() {
        let args = DeployArgs::default();
        let result = execute_deploy(&args).await;
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::MissingField { field: "project_name" }))
        ));
    }
}
