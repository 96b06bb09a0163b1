//! Batch execution of the lifecycle over a stack's members.
//!
//! Three plans are supported:
//!
//! - **Sequential**: members run one after another; the first failure ends
//!   the batch.
//! - **Dependency-ready**: members whose platform state says they can start
//!   are dispatched together in rounds, bounded by a worker limit. A failure
//!   stops further rounds but never interrupts units already in flight.
//! - **Undeploy**: members are undeployed one at a time in reverse declared
//!   order. Failures are recorded and the batch continues.
//!
//! Failures never escape a batch: they are accumulated into the
//! [`RunReport`] for reporting at the end of the run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

use super::readiness::Readiness;
use super::report::RunReport;
use crate::application::lifecycle::LifecycleEngine;
use crate::domain::Member;
use crate::error::Error;
use crate::infrastructure::config::parallel::ParallelConfig;
use crate::port::ControlPlane;

/// Runs lifecycle batches for one project.
pub struct Orchestrator<C> {
    engine: LifecycleEngine<C>,
    parallel: ParallelConfig,
}

impl<C: ControlPlane> Orchestrator<C> {
    pub fn new(engine: LifecycleEngine<C>, parallel: ParallelConfig) -> Self {
        Self { engine, parallel }
    }

    pub fn engine(&self) -> &LifecycleEngine<C> {
        &self.engine
    }

    /// Validate, approve and deploy each member in order, stopping at the
    /// first failure.
    pub async fn deploy_sequential(&self, members: &[Member], report: &mut RunReport) {
        for (index, member) in members.iter().enumerate() {
            info!(
                config = %member.name,
                config_id = %member.config_id,
                position = index + 1,
                total = members.len(),
                "Starting config"
            );
            match self.engine.validate_approve_deploy(&member.config_id).await {
                Ok(()) => report.record_completed(&member.name),
                Err(err) => {
                    error!(config = %member.name, error = %err, "Config failed, stopping");
                    report.record_failure(err.to_string());
                    let remaining = members.len() - index - 1;
                    if remaining > 0 {
                        warn!(remaining, "Remaining configs not attempted");
                    }
                    return;
                }
            }
        }
    }

    /// Deploy members as the platform reports them ready, in concurrent
    /// rounds.
    pub async fn deploy_parallel(&self, members: Vec<Member>, report: &mut RunReport) {
        let stop = Arc::new(AtomicBool::new(false));
        let failures = Mutex::new(Vec::new());
        let completed = Mutex::new(Vec::new());
        let permits = Semaphore::new(self.parallel.max_workers.max(1));

        let mut pending = members;
        let mut idle_since = Instant::now();
        let mut round = 0_u32;

        while !pending.is_empty() && !stop.load(Ordering::SeqCst) {
            let (ready, waiting) = self.partition(pending, report).await;
            pending = waiting;

            if ready.is_empty() {
                if pending.is_empty() {
                    break;
                }
                let waited = idle_since.elapsed();
                if waited >= self.parallel.readiness_timeout {
                    let stalled = Error::Stalled {
                        pending: pending.iter().map(|m| m.name.clone()).collect(),
                        waited,
                    };
                    error!(error = %stalled, "Giving up on pending configs");
                    report.record_failure(stalled.to_string());
                    break;
                }
                info!(pending = pending.len(), "No configs ready for validation and deployment");
                sleep(self.parallel.readiness_interval).await;
                continue;
            }

            round += 1;
            info!(
                round,
                ready = ?ready.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
                "Dispatching ready configs"
            );

            let units = ready.iter().map(|member| {
                let stop = Arc::clone(&stop);
                let permits = &permits;
                let failures = &failures;
                let completed = &completed;
                async move {
                    let Ok(_permit) = permits.acquire().await else {
                        return;
                    };
                    if stop.load(Ordering::SeqCst) {
                        info!(config = %member.name, "Skipping config after earlier failure");
                        return;
                    }
                    match self.engine.validate_approve_deploy(&member.config_id).await {
                        Ok(()) => completed.lock().push(member.name.clone()),
                        Err(err) => {
                            error!(config = %member.name, error = %err, "Config failed");
                            failures.lock().push(err.to_string());
                            stop.store(true, Ordering::SeqCst);
                        }
                    }
                }
            });
            join_all(units).await;

            for name in completed.lock().drain(..) {
                report.record_completed(name);
            }
            idle_since = Instant::now();
        }

        report.extend_failures(failures.into_inner());
    }

    /// Split pending members into those ready now and those still waiting.
    /// Deployed members are dropped.
    async fn partition(&self, pending: Vec<Member>, report: &mut RunReport) -> (Vec<Member>, Vec<Member>) {
        let mut ready = Vec::new();
        let mut waiting = Vec::new();
        for member in pending {
            let readiness = match self.engine.observe(&member.config_id).await {
                Ok(unit) => Readiness::of(&unit),
                Err(err) => {
                    // the lifecycle run surfaces the real error
                    warn!(config = %member.name, error = %err, "No state found, trying to deploy");
                    Readiness::Ready
                }
            };
            match readiness {
                Readiness::Done => {
                    info!(config = %member.name, "Already deployed");
                    report.record_skipped(&member.name);
                }
                Readiness::Ready => ready.push(member),
                Readiness::Blocked => {
                    info!(config = %member.name, "Waiting on a prerequisite");
                    waiting.push(member);
                }
                Readiness::Waiting => {
                    info!(config = %member.name, "Not ready yet");
                    waiting.push(member);
                }
            }
        }
        (ready, waiting)
    }

    /// Undeploy members in reverse order, continuing past failures.
    pub async fn undeploy(&self, members: &[Member], report: &mut RunReport) {
        for member in members.iter().rev() {
            info!(config = %member.name, config_id = %member.config_id, "Undeploying");
            match self.engine.undeploy(&member.config_id).await {
                Ok(()) => report.record_completed(&member.name),
                Err(err) => {
                    error!(config = %member.name, error = %err, "Undeploy failed");
                    report.record_failure(err.to_string());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::application::lifecycle::LifecyclePolicy;
    use crate::domain::{ConfigId, ConfigUnit, ProjectId, State, StateCode};
    use crate::testkit::{FakeControlPlane, Operation, Step};

    const PROJECT: &str = "p1";

    fn draft(id: &str, name: &str) -> ConfigUnit {
        ConfigUnit::new(id, name, State::Draft).with_state_code(StateCode::AwaitingValidation)
    }

    fn stack_plane() -> FakeControlPlane {
        FakeControlPlane::new()
            .with_project(PROJECT, "demo")
            .with_unit(PROJECT, draft("c-net", "net"), "net")
            .with_unit(PROJECT, draft("c-db", "db"), "db")
            .with_unit(PROJECT, draft("c-app", "app"), "app")
    }

    fn members() -> Vec<Member> {
        vec![
            Member::new("net", "c-net"),
            Member::new("db", "c-db"),
            Member::new("app", "c-app"),
        ]
    }

    fn parallel(workers: usize) -> ParallelConfig {
        ParallelConfig {
            max_workers: workers,
            readiness_interval: Duration::from_secs(30),
            readiness_timeout: Duration::from_secs(600),
        }
    }

    fn orchestrator(plane: &FakeControlPlane, workers: usize) -> Orchestrator<FakeControlPlane> {
        let engine = LifecycleEngine::new(plane.clone(), ProjectId::new(PROJECT), LifecyclePolicy::default());
        Orchestrator::new(engine, parallel(workers))
    }

    fn ids(ids: &[&str]) -> Vec<ConfigId> {
        ids.iter().map(|id| ConfigId::new(*id)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_runs_in_order() {
        let plane = stack_plane();
        let mut report = RunReport::new();

        orchestrator(&plane, 4).deploy_sequential(&members(), &mut report).await;

        assert!(report.is_success());
        assert_eq!(report.completed, vec!["net", "db", "app"]);
        assert_eq!(plane.targets_of(Operation::Deploy), ids(&["c-net", "c-db", "c-app"]));
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_stops_at_first_failure() {
        let plane = stack_plane().react("c-db", Operation::Approve, Vec::new());
        let mut report = RunReport::new();

        orchestrator(&plane, 4).deploy_sequential(&members(), &mut report).await;

        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].contains("[db] approval failed"));
        assert!(plane.mutations_for("c-app").is_empty());
        assert_eq!(plane.query_count("c-app"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn undeploy_runs_in_reverse_and_continues_past_failures() {
        let plane = FakeControlPlane::new()
            .with_project(PROJECT, "demo")
            .with_unit(PROJECT, ConfigUnit::new("c-net", "net", State::Deployed), "net")
            .with_unit(PROJECT, ConfigUnit::new("c-db", "db", State::Deployed), "db")
            .with_unit(PROJECT, ConfigUnit::new("c-app", "app", State::Deployed), "app")
            .fail("c-db", Operation::Undeploy, "locked");
        let mut report = RunReport::new();

        orchestrator(&plane, 4).undeploy(&members(), &mut report).await;

        assert_eq!(plane.targets_of(Operation::Undeploy), ids(&["c-app", "c-db", "c-net"]));
        assert_eq!(report.completed, vec!["app", "net"]);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].contains("[db]"));
    }

    #[tokio::test(start_paused = true)]
    async fn parallel_follows_prerequisites() {
        let plane = stack_plane()
            .with_prerequisite("c-db", "c-net")
            .with_prerequisite("c-app", "c-db");
        let mut report = RunReport::new();

        orchestrator(&plane, 4).deploy_parallel(members(), &mut report).await;

        assert!(report.is_success(), "{:?}", report.failures);
        assert_eq!(plane.targets_of(Operation::Deploy), ids(&["c-net", "c-db", "c-app"]));
        assert_eq!(report.completed, vec!["net", "db", "app"]);
    }

    #[tokio::test(start_paused = true)]
    async fn parallel_dispatches_independent_units_together() {
        let plane = stack_plane();
        let start = Instant::now();
        let mut report = RunReport::new();

        orchestrator(&plane, 4).deploy_parallel(members(), &mut report).await;

        assert!(report.is_success());
        assert_eq!(report.completed.len(), 3);
        // one round: 30s validate wait plus 30s deploy wait, shared by all units
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn parallel_worker_limit_serialises_units() {
        let plane = stack_plane();
        let start = Instant::now();
        let mut report = RunReport::new();

        orchestrator(&plane, 1).deploy_parallel(members(), &mut report).await;

        assert!(report.is_success());
        assert_eq!(start.elapsed(), Duration::from_secs(180));
    }

    #[tokio::test(start_paused = true)]
    async fn parallel_failure_stops_later_rounds() {
        let plane = stack_plane()
            .with_prerequisite("c-app", "c-db")
            .react(
                "c-db",
                Operation::Deploy,
                vec![Step::state(State::Deploying), Step::state(State::DeployingFailed)],
            );
        let mut report = RunReport::new();

        orchestrator(&plane, 4).deploy_parallel(members(), &mut report).await;

        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].contains("[db] deployment failed"));
        // the sibling in the same round still finished
        assert_eq!(plane.snapshot("c-net").unwrap().state, State::Deployed);
        assert!(plane.mutations_for("c-app").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn parallel_skips_deployed_units() {
        let plane = stack_plane().queue("c-net", vec![Step::both(State::Deployed, State::Deployed)]);
        let mut report = RunReport::new();

        orchestrator(&plane, 4).deploy_parallel(members(), &mut report).await;

        assert_eq!(report.skipped, vec!["net"]);
        assert!(plane.mutations_for("c-net").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn parallel_gives_up_when_nothing_becomes_ready() {
        let plane = FakeControlPlane::new()
            .with_project(PROJECT, "demo")
            .with_unit(PROJECT, draft("c-app", "app"), "app")
            .with_prerequisite("c-app", "c-missing");
        let start = Instant::now();
        let mut report = RunReport::new();

        orchestrator(&plane, 4)
            .deploy_parallel(vec![Member::new("app", "c-app")], &mut report)
            .await;

        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].contains("app"));
        assert!(start.elapsed() >= Duration::from_secs(600));
        assert!(plane.mutations().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn parallel_query_error_is_surfaced_by_lifecycle() {
        let plane = stack_plane().fail_queries("c-db", "service unavailable");
        let mut report = RunReport::new();

        orchestrator(&plane, 4).deploy_parallel(members(), &mut report).await;

        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].contains("service unavailable"));
    }
}
