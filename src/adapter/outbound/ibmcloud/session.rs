//! Session bootstrap: required tooling and login.

use tracing::{debug, info};

use super::IbmCloud;
use crate::error::{Error, Result};
use crate::port::CommandRunner;

/// Plugins the control plane needs.
const REQUIRED_PLUGINS: [&str; 1] = ["project"];

/// Marker printed by `account show` without a session.
const NOT_LOGGED_IN: &str = "Not logged in";

/// Tools and plugins that could not be found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingTools {
    pub tools: Vec<String>,
    pub plugins: Vec<String>,
}

impl MissingTools {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty() && self.plugins.is_empty()
    }

    /// Convert a non-empty listing into an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingTools`] when anything is missing.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingTools {
                tools: self.tools,
                plugins: self.plugins,
            })
        }
    }
}

impl<R: CommandRunner> IbmCloud<R> {
    /// Check that the control-plane program is on `PATH` and its plugins
    /// are installed. Plugins are not checked when the program is missing.
    pub async fn missing_tools(&self) -> MissingTools {
        let mut missing = MissingTools::default();

        let which = self.runner.run(&self.commands.which()).await;
        if !which.success() {
            missing.tools.push(self.commands.program().to_string());
            return missing;
        }
        debug!(path = %which.stdout.trim(), "Found control-plane program");

        for plugin in REQUIRED_PLUGINS {
            let output = self.runner.run(&self.commands.plugin_show(plugin)).await;
            if !output.success() {
                missing.plugins.push(plugin.to_string());
            }
        }
        missing
    }

    /// Whether the CLI currently holds a session.
    pub async fn is_logged_in(&self) -> bool {
        let output = self.runner.run(&self.commands.account_show()).await;
        !output.mentions(NOT_LOGGED_IN)
    }

    /// Log in with an API key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ControlPlane`] when the login command fails.
    pub async fn login(&self, api_key: &str) -> Result<()> {
        let output = self.runner.run(&self.commands.login(api_key)).await;
        if let Some(err) = output.error() {
            return Err(Error::control_plane("login", err));
        }
        info!("Logged in to control plane");
        Ok(())
    }

    /// Log in unless a session already exists. The key is only read when a
    /// login is needed.
    ///
    /// # Errors
    ///
    /// Propagates failures from reading the key or logging in.
    pub async fn ensure_session<F>(&self, api_key: F) -> Result<()>
    where
        F: FnOnce() -> Result<String> + Send,
    {
        if self.is_logged_in().await {
            debug!("Existing control-plane session found");
            return Ok(());
        }
        let key = api_key()?;
        self.login(&key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::port::CommandOutput;
    use crate::testkit::runner::ScriptedRunner;

    #[tokio::test]
    async fn reports_missing_program_without_checking_plugins() {
        let runner = ScriptedRunner::new().with_outputs(vec![CommandOutput::failed("")]);
        let cloud = IbmCloud::new(runner.clone(), "ibmcloud");

        let missing = cloud.missing_tools().await;

        assert_eq!(missing.tools, vec!["ibmcloud"]);
        assert!(missing.plugins.is_empty());
        assert_eq!(runner.commands().len(), 1);
    }

    #[tokio::test]
    async fn reports_missing_plugin() {
        let runner = ScriptedRunner::new().with_outputs(vec![
            CommandOutput::ok("/usr/local/bin/ibmcloud"),
            CommandOutput::failed("Plug-in 'project' was not found"),
        ]);
        let cloud = IbmCloud::new(runner, "ibmcloud");

        let missing = cloud.missing_tools().await;

        assert!(missing.tools.is_empty());
        assert_eq!(missing.plugins, vec!["project"]);
        assert!(matches!(missing.into_result(), Err(Error::MissingTools { .. })));
    }

    #[tokio::test]
    async fn logs_in_only_without_session() {
        let runner = ScriptedRunner::new().with_outputs(vec![
            CommandOutput::failed("Not logged in. Use 'ibmcloud login' to log in."),
            CommandOutput::ok("OK"),
        ]);
        let cloud = IbmCloud::new(runner.clone(), "ibmcloud");

        cloud.ensure_session(|| Ok("s3cret".to_string())).await.unwrap();

        let commands = runner.commands();
        assert_eq!(commands.len(), 2);
        assert!(commands[1].starts_with("ibmcloud login --apikey"));
        assert!(!commands[1].contains("s3cret"));
    }

    #[tokio::test]
    async fn existing_session_skips_key_lookup() {
        let runner = ScriptedRunner::new().with_outputs(vec![CommandOutput::ok("Account: dev")]);
        let cloud = IbmCloud::new(runner, "ibmcloud");

        let result = cloud
            .ensure_session(|| Err(ConfigError::MissingEnv { var: "KEY".into() }.into()))
            .await;

        assert!(result.is_ok());
    }
}
