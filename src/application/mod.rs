//! Application services (use cases).
//!
//! The lifecycle engine drives one configuration unit at a time; the
//! orchestration layer applies it across a stack.

pub mod lifecycle;
pub mod orchestration;
