//! Lifecycle vocabulary reported by the platform for a configuration.
//!
//! [`State`] is the phase a configuration is in, [`StateCode`] is the
//! orthogonal readiness classifier reported next to it. Both are closed
//! enumerations: anything the platform sends that is not recognised decodes
//! to the local `Unknown` sentinel.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Draft,
    Validating,
    Validated,
    ValidatingFailed,
    Approved,
    Deploying,
    Deployed,
    DeployingFailed,
    Deleting,
    DeletingFailed,
    Undeploying,
    UndeployingFailed,
    Discarded,
    Superseded,
    Applied,
    ApplyFailed,
    /// The platform returned no recognisable state. Never sent by the platform.
    #[default]
    #[serde(other)]
    Unknown,
}

/// States in which validation has already happened and may be skipped.
pub const VALIDATION_STATES: [State; 4] = [
    State::Deployed,
    State::DeployingFailed,
    State::Validated,
    State::Approved,
];

/// States in which a deployed version exists and can be undeployed.
pub const DEPLOYABLE_STATES: [State; 3] = [
    State::Deployed,
    State::DeployingFailed,
    State::UndeployingFailed,
];

/// States from which lifecycle progression may resume in dependency-ready mode.
pub const READY_STATES: [State; 5] = [
    State::DeployingFailed,
    State::ValidatingFailed,
    State::ApplyFailed,
    State::Validated,
    State::Approved,
];

impl State {
    /// Wire representation of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Validating => "validating",
            Self::Validated => "validated",
            Self::ValidatingFailed => "validating_failed",
            Self::Approved => "approved",
            Self::Deploying => "deploying",
            Self::Deployed => "deployed",
            Self::DeployingFailed => "deploying_failed",
            Self::Deleting => "deleting",
            Self::DeletingFailed => "deleting_failed",
            Self::Undeploying => "undeploying",
            Self::UndeployingFailed => "undeploying_failed",
            Self::Discarded => "discarded",
            Self::Superseded => "superseded",
            Self::Applied => "applied",
            Self::ApplyFailed => "apply_failed",
            Self::Unknown => "unknown",
        }
    }

    /// Decode a platform state string. Empty or unrecognised input yields
    /// [`State::Unknown`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            return Self::Unknown;
        }
        serde_json::from_value(serde_json::Value::String(value.to_ascii_lowercase()))
            .unwrap_or(Self::Unknown)
    }

    /// Validation was already done for this state.
    #[must_use]
    pub fn skips_validation(self) -> bool {
        VALIDATION_STATES.contains(&self)
    }

    /// A deployed version exists that undeploy can act on.
    #[must_use]
    pub fn is_deployable(self) -> bool {
        DEPLOYABLE_STATES.contains(&self)
    }

    /// The unit may resume lifecycle progression.
    #[must_use]
    pub fn is_ready(self) -> bool {
        READY_STATES.contains(&self)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Readiness classifier reported alongside [`State`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateCode {
    AwaitingValidation,
    AwaitingPrerequisite,
    AwaitingInput,
    AwaitingMemberDeployment,
    AwaitingStackSetup,
    AwaitingApproval,
    AwaitingDeployment,
    AwaitingDeletion,
    AwaitingUndeployment,
    #[default]
    #[serde(other)]
    Unknown,
}

impl StateCode {
    /// Wire representation of the state code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingValidation => "awaiting_validation",
            Self::AwaitingPrerequisite => "awaiting_prerequisite",
            Self::AwaitingInput => "awaiting_input",
            Self::AwaitingMemberDeployment => "awaiting_member_deployment",
            Self::AwaitingStackSetup => "awaiting_stack_setup",
            Self::AwaitingApproval => "awaiting_approval",
            Self::AwaitingDeployment => "awaiting_deployment",
            Self::AwaitingDeletion => "awaiting_deletion",
            Self::AwaitingUndeployment => "awaiting_undeployment",
            Self::Unknown => "unknown",
        }
    }

    /// Decode a platform state code. Empty or unrecognised input yields
    /// [`StateCode::Unknown`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            return Self::Unknown;
        }
        serde_json::from_value(serde_json::Value::String(value.to_ascii_lowercase()))
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_every_wire_name() {
        for state in [
            State::Draft,
            State::Validating,
            State::ValidatingFailed,
            State::UndeployingFailed,
            State::ApplyFailed,
            State::Superseded,
        ] {
            assert_eq!(State::parse(state.as_str()), state);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(State::parse("DEPLOYED"), State::Deployed);
        assert_eq!(StateCode::parse("Awaiting_Prerequisite"), StateCode::AwaitingPrerequisite);
    }

    #[test]
    fn unrecognised_values_decode_to_unknown() {
        assert_eq!(State::parse(""), State::Unknown);
        assert_eq!(State::parse("exploded"), State::Unknown);
        assert_eq!(StateCode::parse("   "), StateCode::Unknown);

        let state: State = serde_json::from_str("\"mystery\"").unwrap();
        assert_eq!(state, State::Unknown);
    }

    #[test]
    fn classification_sets_match_lifecycle_policy() {
        assert!(State::Approved.skips_validation());
        assert!(!State::Draft.skips_validation());
        assert!(!State::ValidatingFailed.skips_validation());

        assert!(State::UndeployingFailed.is_deployable());
        assert!(!State::Undeploying.is_deployable());
        assert!(!State::Approved.is_deployable());

        assert!(State::ApplyFailed.is_ready());
        assert!(!State::Draft.is_ready());
        assert!(!State::Deployed.is_ready());
    }
}
