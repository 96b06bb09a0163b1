//! Stackdeploy - drive the members of a platform stack through their
//! lifecycle.
//!
//! A stack groups configuration units. Each unit is validated, approved and
//! deployed, either one after another in a fixed order or in rounds as the
//! platform reports units ready. Undeploy walks the stack in reverse.
//!
//! # Modules
//!
//! - [`domain`] - Platform-independent types: ids, states, units, inputs
//! - [`port`] - Traits for the command runner and the control plane
//! - [`adapter`] - The CLI and the process-backed control plane
//! - [`application`] - Lifecycle engine and stack orchestration
//! - [`infrastructure`] - Configuration, logging and wiring
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `testkit` - Fake control plane and scripted command runner for tests
//!
//! # Example
//!
//! ```no_run
//! use stackdeploy::application::orchestration::{execute, Action, RunPlan};
//! use stackdeploy::infrastructure::bootstrap;
//! use stackdeploy::infrastructure::config::Config;
//!
//! # async fn demo() -> stackdeploy::error::Result<()> {
//! let config = Config::default();
//! let platform = bootstrap::build_platform(&config);
//! let plan = RunPlan::new("my-project", "my-stack", Action::Deploy);
//! let report = execute(platform, &plan).await?;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
