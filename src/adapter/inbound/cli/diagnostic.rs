//! Miette-based error diagnostics for CLI error presentation.
//!
//! Fatal run errors are converted into a [`RunDiagnostic`] carrying an error
//! code and, where one exists, a suggestion for fixing the problem.

use std::fmt::Display;

use miette::Diagnostic;
use thiserror::Error;

use crate::error::{ConfigError, Error, ResolutionError};

/// A fatal error ready for rendering.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RunDiagnostic {
    pub message: String,
    pub code: &'static str,
    pub help: Option<String>,
}

impl Diagnostic for RunDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(self.code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.help
            .as_ref()
            .map(|help| Box::new(help) as Box<dyn Display + 'a>)
    }
}

impl RunDiagnostic {
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            help: None,
        }
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl From<&Error> for RunDiagnostic {
    fn from(err: &Error) -> Self {
        let message = err.to_string();
        match err {
            Error::Config(ConfigError::MissingField { field }) => {
                Self::new("stackdeploy::config", message).with_help(format!(
                    "pass --{} or set {field} in the run file",
                    field.replace('_', "-")
                ))
            }
            Error::Config(ConfigError::MissingEnv { var }) => Self::new("stackdeploy::config", message)
                .with_help(format!("export {var} or add it to a .env file")),
            Error::Config(_) => Self::new("stackdeploy::config", message),
            Error::Resolution(ResolutionError::ConfigNotFound { .. }) => {
                Self::new("stackdeploy::resolution", message)
                    .with_help("check --config-order against the config names in the project")
            }
            Error::Resolution(_) => Self::new("stackdeploy::resolution", message)
                .with_help("names are matched exactly, including case"),
            Error::Lifecycle(_) => Self::new("stackdeploy::lifecycle", message),
            Error::ControlPlane { .. } => Self::new("stackdeploy::control_plane", message),
            Error::MissingTools { .. } => Self::new("stackdeploy::tools", message)
                .with_help("install the ibmcloud CLI and run `ibmcloud plugin install project`"),
            Error::Stalled { .. } => Self::new("stackdeploy::stalled", message),
            Error::Json(_) => Self::new("stackdeploy::json", message)
                .with_help("the platform CLI printed output that is not the expected JSON"),
            Error::Io(_) => Self::new("stackdeploy::io", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_suggests_flag() {
        let err: Error = ConfigError::MissingField { field: "project_name" }.into();
        let diag = RunDiagnostic::from(&err);
        assert_eq!(diag.code, "stackdeploy::config");
        assert!(diag.help.unwrap().contains("--project-name"));
    }

    #[test]
    fn missing_tools_has_install_hint() {
        let err = Error::MissingTools {
            tools: vec!["ibmcloud".into()],
            plugins: Vec::new(),
        };
        let diag = RunDiagnostic::from(&err);
        assert!(diag.message.contains("ibmcloud"));
        assert!(diag.help.is_some());
    }
}
