//! Platform-agnostic types: identifiers, lifecycle states, configuration
//! snapshots and stack inputs.

pub mod config;
pub mod id;
pub mod inputs;
pub mod state;

pub use config::{ConfigSummary, ConfigUnit, DeploymentModel, Member, ProjectSummary, UNKNOWN_NAME};
pub use id::{ConfigId, ProjectId};
pub use inputs::{mask_secret_fields, StackInputs, API_KEY_SENTINEL, MASK};
pub use state::{State, StateCode, DEPLOYABLE_STATES, READY_STATES, VALIDATION_STATES};
