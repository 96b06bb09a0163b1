//! CLI module graph.

pub mod check;
pub mod command;
pub mod diagnostic;
pub mod output;
pub mod run;
