//! Bounded fixed-interval polling.
//!
//! The platform never pushes state changes, so every lifecycle wait is a
//! sleep-then-requery loop bounded by a deadline.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::error::Result;

/// Interval and deadline of one kind of wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Result of a bounded wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polled<T> {
    /// The condition stopped holding before the deadline.
    Settled(T),
    /// The deadline passed while the condition still held.
    TimedOut(T),
}

impl<T> Polled<T> {
    /// Last observed value, however the wait ended.
    pub fn into_inner(self) -> T {
        match self {
            Self::Settled(value) | Self::TimedOut(value) => value,
        }
    }

    #[must_use]
    pub const fn timed_out(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }
}

/// Observe with `fetch` until `waiting` is false or the policy's deadline
/// passes. The first observation is immediate; every later one follows a
/// sleep of `policy.interval`. Fetch errors end the wait.
///
/// # Errors
///
/// Propagates the first error returned by `fetch`.
pub async fn poll_while<T, F, Fut, P>(policy: PollPolicy, mut fetch: F, mut waiting: P) -> Result<Polled<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: FnMut(&T) -> bool,
{
    let deadline = Instant::now() + policy.timeout;
    let mut current = fetch().await?;
    while waiting(&current) {
        if Instant::now() >= deadline {
            return Ok(Polled::TimedOut(current));
        }
        sleep(policy.interval).await;
        current = fetch().await?;
    }
    Ok(Polled::Settled(current))
}
