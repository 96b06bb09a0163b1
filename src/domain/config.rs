//! Projects, stacks and the configuration units they contain.
//!
//! Nothing here is cached: every value is a snapshot of what the platform
//! reported at the moment it was queried.

use serde::{Deserialize, Serialize};

use super::id::{ConfigId, ProjectId};
use super::state::{State, StateCode};

/// Name used when the platform omits a configuration's name.
pub const UNKNOWN_NAME: &str = "UNKNOWN";

/// A project as listed by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
}

/// How a configuration is deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentModel {
    /// Groups other configurations as members.
    Stack,
    /// Deploys a single piece of content. Unrecognised models decode here.
    #[default]
    #[serde(other)]
    ProjectDeployed,
}

/// A configuration as listed in a project's config list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSummary {
    pub id: ConfigId,
    pub name: String,
    /// Opaque catalog reference plus version of the deployable content.
    pub locator: Option<String>,
    pub deployment_model: DeploymentModel,
}

impl ConfigSummary {
    /// True when this configuration is itself a stack.
    #[must_use]
    pub fn is_stack(&self) -> bool {
        self.deployment_model == DeploymentModel::Stack
    }
}

/// A member of a stack: its declared name and the configuration it points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Member {
    pub name: String,
    pub config_id: ConfigId,
}

impl Member {
    pub fn new(name: impl Into<String>, config_id: impl Into<ConfigId>) -> Self {
        Self {
            name: name.into(),
            config_id: config_id.into(),
        }
    }
}

/// Full snapshot of one configuration unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigUnit {
    pub id: ConfigId,
    pub name: String,
    pub locator: Option<String>,
    /// Phase of the current (possibly not yet deployed) revision.
    pub state: State,
    pub state_code: StateCode,
    /// Phase of the last deployed revision; drives undeploy eligibility.
    pub deployed_state: State,
    /// Declared members, in order. Empty unless the unit is a stack.
    pub members: Vec<Member>,
}

impl ConfigUnit {
    /// A bare unit in the given state with no deployed revision of its own.
    pub fn new(id: impl Into<ConfigId>, name: impl Into<String>, state: State) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            locator: None,
            state,
            state_code: StateCode::Unknown,
            deployed_state: state,
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_state_code(mut self, state_code: StateCode) -> Self {
        self.state_code = state_code;
        self
    }

    #[must_use]
    pub fn with_deployed_state(mut self, deployed_state: State) -> Self {
        self.deployed_state = deployed_state;
        self
    }

    #[must_use]
    pub fn with_members(mut self, members: Vec<Member>) -> Self {
        self.members = members;
        self
    }

    #[must_use]
    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = Some(locator.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_unit_mirrors_state_into_deployed_state() {
        let unit = ConfigUnit::new("id-1", "net", State::Approved);
        assert_eq!(unit.deployed_state, State::Approved);
        assert_eq!(unit.state_code, StateCode::Unknown);
    }

    #[test]
    fn deployment_model_falls_back_to_project_deployed() {
        let model: DeploymentModel = serde_json::from_str("\"stack\"").unwrap();
        assert_eq!(model, DeploymentModel::Stack);
        let model: DeploymentModel = serde_json::from_str("\"something_new\"").unwrap();
        assert_eq!(model, DeploymentModel::ProjectDeployed);
    }
}
