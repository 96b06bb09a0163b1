//! Outcome of one deploy or undeploy run.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Accumulates per-unit outcomes and failure messages over a run.
///
/// Failures are reported once at the end; the run is unsuccessful when any
/// were recorded.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Units that finished their lifecycle operation, in completion order.
    pub completed: Vec<String>,
    /// Units already in the target state that needed no work.
    pub skipped: Vec<String>,
    pub failures: Vec<String>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            completed: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn record_completed(&mut self, name: impl Into<String>) {
        self.completed.push(name.into());
    }

    pub fn record_skipped(&mut self, name: impl Into<String>) {
        self.skipped.push(name.into());
    }

    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.failures.push(message.into());
    }

    pub fn extend_failures(&mut self, messages: impl IntoIterator<Item = String>) {
        self.failures.extend(messages);
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Stamp the end time.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration, once finished.
    #[must_use]
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}
