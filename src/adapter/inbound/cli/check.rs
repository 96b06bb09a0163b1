//! Handler for the `check` command.

use super::command::TargetArgs;
use super::output;
use super::run::load_config;
use crate::error::Result;
use crate::infrastructure::bootstrap;

/// Report whether the platform CLI, its plugins and a session are present.
///
/// # Errors
///
/// Returns [`crate::error::Error::MissingTools`] when anything required is
/// absent, or a configuration error from the run file.
pub async fn execute(args: &TargetArgs) -> Result<()> {
    let config = load_config(args)?;
    config.init_logging();
    let platform = bootstrap::build_platform(&config);

    output::header(env!("CARGO_PKG_VERSION"));
    output::section("Tools");
    let missing = platform.missing_tools().await;
    if missing.is_empty() {
        output::success(&format!("{} and required plugins found", config.runner.program));
    } else {
        for tool in &missing.tools {
            output::error(&format!("{tool} not found on PATH"));
        }
        for plugin in &missing.plugins {
            output::error(&format!("plugin {plugin} not installed"));
        }
        return missing.into_result();
    }

    output::section("Session");
    if platform.is_logged_in().await {
        output::success("Logged in");
    } else if config.api_key().is_ok() {
        output::warning(&format!(
            "Not logged in; a run will log in with {}",
            config.stack_api_key_env
        ));
    } else {
        output::warning(&format!(
            "Not logged in and {} is not set",
            config.stack_api_key_env
        ));
    }
    Ok(())
}
