//! Infrastructure configuration modules.

pub mod duration;
pub mod lifecycle;
pub mod logging;
pub mod parallel;
pub mod runner;
pub mod settings;

pub use settings::Config;
