//! JSON documents printed by the platform CLI and their mapping onto domain
//! types.

use serde::Deserialize;
use tracing::warn;

use crate::domain::{
    ConfigId, ConfigSummary, ConfigUnit, DeploymentModel, Member, ProjectId, ProjectSummary,
    State, StateCode, UNKNOWN_NAME,
};

#[derive(Debug, Deserialize)]
pub struct ProjectList {
    #[serde(default)]
    pub projects: Vec<ProjectItem>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectItem {
    pub id: String,
    #[serde(default)]
    pub definition: Option<Definition>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigList {
    #[serde(default)]
    pub configs: Vec<ConfigItem>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigItem {
    pub id: String,
    #[serde(default)]
    pub deployment_model: DeploymentModel,
    #[serde(default)]
    pub definition: Option<Definition>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Definition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub locator_id: Option<String>,
    #[serde(default)]
    pub members: Vec<MemberItem>,
}

#[derive(Debug, Deserialize)]
pub struct MemberItem {
    pub name: String,
    pub config_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfigDetail {
    pub id: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub state_code: Option<String>,
    #[serde(default)]
    pub definition: Option<Definition>,
    #[serde(default)]
    pub deployed_version: Option<DeployedVersion>,
}

#[derive(Debug, Deserialize)]
pub struct DeployedVersion {
    #[serde(default)]
    pub state: Option<String>,
}

impl ProjectList {
    /// Projects that carry a name; unnamed entries cannot be resolved.
    pub fn into_summaries(self) -> Vec<ProjectSummary> {
        self.projects
            .into_iter()
            .filter_map(|project| {
                let name = project.definition?.name?;
                Some(ProjectSummary {
                    id: ProjectId::new(project.id),
                    name,
                })
            })
            .collect()
    }
}

impl ConfigList {
    pub fn into_summaries(self) -> Vec<ConfigSummary> {
        self.configs
            .into_iter()
            .filter_map(|config| {
                let definition = config.definition?;
                Some(ConfigSummary {
                    id: ConfigId::new(config.id),
                    name: definition.name?,
                    locator: definition.locator_id,
                    deployment_model: config.deployment_model,
                })
            })
            .collect()
    }
}

fn decode_state(raw: Option<&str>, config_id: &str) -> State {
    let raw = raw.unwrap_or_default();
    let state = State::parse(raw);
    if state == State::Unknown && !raw.trim().is_empty() {
        warn!(config_id, state = raw, "Unrecognised config state");
    }
    state
}

impl ConfigDetail {
    pub fn into_unit(self) -> ConfigUnit {
        let state = decode_state(self.state.as_deref(), &self.id);
        let state_code = StateCode::parse(self.state_code.as_deref().unwrap_or_default());

        // Without a deployed version the current state stands in for it.
        let deployed_state = match self
            .deployed_version
            .and_then(|version| version.state)
            .filter(|raw| !raw.trim().is_empty())
        {
            Some(raw) => decode_state(Some(&raw), &self.id),
            None => state,
        };

        let definition = self.definition.unwrap_or_default();
        let members = definition
            .members
            .into_iter()
            .map(|member| Member::new(member.name, member.config_id))
            .collect();

        ConfigUnit {
            id: ConfigId::new(self.id),
            name: definition.name.unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            locator: definition.locator_id,
            state,
            state_code,
            deployed_state,
            members,
        }
    }
}
