//! Test utilities for unit and integration tests.
//!
//! Enabled under `cfg(test)` or the `testkit` feature.
//!
//! - [`control_plane::FakeControlPlane`] simulates a platform whose units
//!   move through scripted states as they are observed.
//! - [`runner::ScriptedRunner`] replays canned command outputs.

pub mod control_plane;
pub mod runner;

pub use control_plane::{FakeControlPlane, Operation, Step};
pub use runner::ScriptedRunner;
