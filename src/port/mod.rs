//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!   application (lifecycle, orchestration)
//!            │
//!            ▼
//!      ControlPlane ──▶ ibmcloud adapter ──▶ CommandRunner ──▶ process
//! ```
//!
//! # Available Ports
//!
//! - [`ControlPlane`] - Project, stack and configuration queries and mutations
//! - [`CommandRunner`] - Execution of a single control-plane command

pub mod outbound;

pub use outbound::control_plane::ControlPlane;
pub use outbound::runner::{Arg, CommandLine, CommandOutput, CommandRunner};
