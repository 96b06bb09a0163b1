//! Readiness gating for dependency-ready execution.

use crate::domain::{ConfigUnit, State, StateCode};

/// Where a pending unit stands at the start of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Already deployed; drop it from the pending set.
    Done,
    /// Can start its lifecycle now.
    Ready,
    /// The platform reports an unmet prerequisite.
    Blocked,
    /// Neither ready nor blocked, for example mid-transition.
    Waiting,
}

impl Readiness {
    /// Classify a unit snapshot.
    #[must_use]
    pub fn of(unit: &ConfigUnit) -> Self {
        if unit.state == State::Deployed {
            return Self::Done;
        }
        if unit.state_code == StateCode::AwaitingPrerequisite {
            return Self::Blocked;
        }
        let fresh_draft =
            unit.state_code == StateCode::AwaitingValidation && unit.state == State::Draft;
        if fresh_draft || unit.state.is_ready() {
            Self::Ready
        } else {
            Self::Waiting
        }
    }
}
