use std::time::Duration;

use thiserror::Error;

use crate::domain::{ConfigId, State};

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("environment variable {var} is not set")]
    MissingEnv { var: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Failures to map human-supplied names onto platform identifiers.
///
/// Always fatal, and always raised before any lifecycle work begins.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("project {name} not found")]
    ProjectNotFound { name: String },

    #[error("stack {name} not found")]
    StackNotFound { name: String },

    #[error(
        "config not found: expected {expected:?}, missing {missing:?}, unexpected {unexpected:?}"
    )]
    ConfigNotFound {
        expected: Vec<String>,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
}

/// Lifecycle phase a [`LifecycleError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validation,
    Approval,
    Deployment,
}

/// Phase-specific failure of one configuration unit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("[{name}] validation failed for config {id}: {reason} (state: {state})")]
    Validation {
        name: String,
        id: ConfigId,
        state: State,
        reason: String,
    },

    #[error("[{name}] approval failed for config {id}: {reason} (state: {state})")]
    Approval {
        name: String,
        id: ConfigId,
        state: State,
        reason: String,
    },

    #[error("[{name}] deployment failed for config {id}: {reason} (state: {state})")]
    Deployment {
        name: String,
        id: ConfigId,
        state: State,
        reason: String,
    },
}

impl LifecycleError {
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Validation { .. } => Phase::Validation,
            Self::Approval { .. } => Phase::Approval,
            Self::Deployment { .. } => Phase::Deployment,
        }
    }

    /// Name of the configuration that failed.
    #[must_use]
    pub fn config_name(&self) -> &str {
        match self {
            Self::Validation { name, .. }
            | Self::Approval { name, .. }
            | Self::Deployment { name, .. } => name,
        }
    }

    /// Last state observed before the failure.
    #[must_use]
    pub const fn state(&self) -> State {
        match self {
            Self::Validation { state, .. }
            | Self::Approval { state, .. }
            | Self::Deployment { state, .. } => *state,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// A control-plane call returned an error outside an expected context.
    #[error("{operation} failed: {message}")]
    ControlPlane { operation: String, message: String },

    #[error("missing required tools {tools:?} or plugins {plugins:?}")]
    MissingTools {
        tools: Vec<String>,
        plugins: Vec<String>,
    },

    #[error("no pending config became ready within {}s: {pending:?}", .waited.as_secs())]
    Stalled {
        pending: Vec<String>,
        waited: Duration,
    },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a control-plane error string as a generic failure.
    pub fn control_plane(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ControlPlane {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
