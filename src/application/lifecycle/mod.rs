//! Lifecycle of a single configuration unit: validate, approve, deploy and
//! undeploy, each expressed as a bounded wait on platform state.

pub mod engine;
pub mod poll;

pub use engine::{LifecycleEngine, LifecyclePolicy, APPROVAL_COMMENT};
pub use poll::{poll_while, PollPolicy, Polled};
