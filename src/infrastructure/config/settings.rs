//! Run configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings for a
//! deploy or undeploy run. Configuration is loaded from an optional TOML file
//! and then overridden by command-line flags. The API key itself is never
//! stored in the file: only the name of the environment variable holding it.
//!
//! # Example
//!
//! ```no_run
//! use stackdeploy::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("stackdeploy.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::lifecycle::{PollingConfig, TimeoutsConfig};
use super::logging::LoggingConfig;
use super::parallel::ParallelConfig;
use super::runner::RunnerConfig;
use crate::application::lifecycle::{LifecyclePolicy, PollPolicy};
use crate::domain::StackInputs;
use crate::error::{ConfigError, Result};

/// Main run configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Project containing the stack.
    #[serde(default)]
    pub project_name: Option<String>,

    /// Stack whose members are deployed.
    #[serde(default)]
    pub stack_name: Option<String>,

    /// Explicit member order for sequential deployment.
    ///
    /// Empty means the stack's declared member order.
    #[serde(default)]
    pub config_order: Vec<String>,

    /// Stack definition document used by a definition update.
    #[serde(default = "default_stack_def_path")]
    pub stack_def_path: PathBuf,

    /// Environment variable holding the platform API key.
    #[serde(default = "default_api_key_env")]
    pub stack_api_key_env: String,

    /// Input values applied to the stack before deployment.
    #[serde(default)]
    pub stack_inputs: StackInputs,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub parallel: ParallelConfig,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_stack_def_path() -> PathBuf {
    PathBuf::from("stack_definition.json")
}

fn default_api_key_env() -> String {
    "IBMCLOUD_API_KEY".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_name: None,
            stack_name: None,
            config_order: Vec::new(),
            stack_def_path: default_stack_def_path(),
            stack_api_key_env: default_api_key_env(),
            stack_inputs: StackInputs::default(),
            timeouts: TimeoutsConfig::default(),
            polling: PollingConfig::default(),
            parallel: ParallelConfig::default(),
            runner: RunnerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed, or validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate value ranges. Required names are checked separately by
    /// [`Config::target`], after command-line overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range setting.
    pub fn validate(&self) -> Result<()> {
        if self.parallel.max_workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_workers",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.runner.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_attempts",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.runner.program.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "program" }.into());
        }
        if self.polling.min().is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "polling",
                reason: "poll intervals must be greater than 0".to_string(),
            }
            .into());
        }
        if self.parallel.readiness_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "readiness_interval",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.stack_api_key_env.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "stack_api_key_env",
            }
            .into());
        }
        Ok(())
    }

    /// Project and stack names, both required for any run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when either is absent or blank.
    pub fn target(&self) -> Result<(&str, &str)> {
        let project = non_blank(self.project_name.as_deref())
            .ok_or(ConfigError::MissingField { field: "project_name" })?;
        let stack = non_blank(self.stack_name.as_deref())
            .ok_or(ConfigError::MissingField { field: "stack_name" })?;
        Ok((project, stack))
    }

    /// Check that the stack definition document exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the file is missing.
    pub fn require_stack_definition(&self) -> Result<&Path> {
        if self.stack_def_path.is_file() {
            Ok(&self.stack_def_path)
        } else {
            Err(ConfigError::InvalidValue {
                field: "stack_def_path",
                reason: format!("{} does not exist", self.stack_def_path.display()),
            }
            .into())
        }
    }

    /// Read the API key from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnv`] when the variable is unset or empty.
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.stack_api_key_env) {
            Ok(value) if !value.is_empty() => Ok(value),
            _ => Err(ConfigError::MissingEnv {
                var: self.stack_api_key_env.clone(),
            }
            .into()),
        }
    }

    /// Poll intervals and deadlines for the lifecycle engine.
    #[must_use]
    pub fn lifecycle_policy(&self) -> LifecyclePolicy {
        LifecyclePolicy {
            validate: PollPolicy::new(self.polling.validate, self.timeouts.validate),
            approve: PollPolicy::new(self.polling.approve, self.timeouts.approve),
            deploy: PollPolicy::new(self.polling.deploy, self.timeouts.deploy),
            undeploy: PollPolicy::new(self.polling.undeploy, self.timeouts.undeploy),
        }
    }

    /// Initialize the tracing subscriber from the logging section.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
