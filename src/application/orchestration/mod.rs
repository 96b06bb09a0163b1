//! Stack-level orchestration.
//!
//! # Modules
//!
//! - [`resolve`]: project, stack and member name resolution
//! - [`readiness`]: readiness gating for dependency-ready rounds
//! - [`orchestrator`]: sequential, dependency-ready and undeploy batches
//! - [`report`]: accumulated run outcome
//! - [`plan`]: the end-to-end run driver

pub mod orchestrator;
pub mod plan;
pub mod readiness;
pub mod report;
pub mod resolve;

pub use orchestrator::Orchestrator;
pub use plan::{execute, Action, Mode, RunPlan};
pub use readiness::Readiness;
pub use report::RunReport;
