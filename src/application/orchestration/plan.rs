//! End-to-end run of one stack: resolve, prepare, then deploy or undeploy.

use std::path::PathBuf;

use tracing::{debug, info};

use super::orchestrator::Orchestrator;
use super::report::RunReport;
use super::resolve;
use crate::application::lifecycle::{LifecycleEngine, LifecyclePolicy};
use crate::domain::{ConfigId, ProjectId, StackInputs};
use crate::error::Result;
use crate::infrastructure::config::parallel::ParallelConfig;
use crate::port::ControlPlane;

/// What the run does to the stack's members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Deploy,
    Undeploy,
}

/// How deploy runs schedule members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Sequential,
    Parallel,
}

/// Everything a run needs, with names not yet resolved.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub project_name: String,
    pub stack_name: String,
    pub action: Action,
    pub mode: Mode,
    /// Explicit member order for sequential deploys. Empty means the
    /// stack's declared order.
    pub config_order: Vec<String>,
    /// Definition document applied to the stack before deploying.
    pub definition: Option<PathBuf>,
    /// Inputs applied to the stack before deploying, credential already
    /// substituted.
    pub inputs: Option<StackInputs>,
    pub lifecycle: LifecyclePolicy,
    pub parallel: ParallelConfig,
}

impl RunPlan {
    pub fn new(project_name: impl Into<String>, stack_name: impl Into<String>, action: Action) -> Self {
        Self {
            project_name: project_name.into(),
            stack_name: stack_name.into(),
            action,
            mode: Mode::Sequential,
            config_order: Vec::new(),
            definition: None,
            inputs: None,
            lifecycle: LifecyclePolicy::default(),
            parallel: ParallelConfig::default(),
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_config_order(mut self, order: Vec<String>) -> Self {
        self.config_order = order;
        self
    }

    #[must_use]
    pub fn with_definition(mut self, path: impl Into<PathBuf>) -> Self {
        self.definition = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_inputs(mut self, inputs: StackInputs) -> Self {
        self.inputs = Some(inputs);
        self
    }

    #[must_use]
    pub fn with_lifecycle(mut self, policy: LifecyclePolicy) -> Self {
        self.lifecycle = policy;
        self
    }

    #[must_use]
    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Execute a plan against a control plane.
///
/// Lifecycle failures are collected in the returned report.
///
/// # Errors
///
/// Name resolution failures and failed stack definition or input updates
/// are fatal and returned before any member is touched. Stack preparation
/// happens before member resolution, so a bad explicit order is reported
/// after the stack was updated.
pub async fn execute<C: ControlPlane>(plane: C, plan: &RunPlan) -> Result<RunReport> {
    let project = resolve::project_id(&plane, &plan.project_name).await?;
    let stack = resolve::stack_id(&plane, &project, &plan.stack_name).await?;
    if plan.action == Action::Deploy {
        // members are read afterwards so a new definition is honoured
        prepare_stack(&plane, &project, &stack, plan).await?;
    }
    let declared = resolve::config_ids_for_stack(&plane, &project, &stack).await?;
    info!(
        project = %plan.project_name,
        stack = %plan.stack_name,
        members = declared.len(),
        "Stack resolved"
    );

    let mut report = RunReport::new();
    match plan.action {
        Action::Undeploy => {
            orchestrator(plane, project, plan)
                .undeploy(&declared, &mut report)
                .await;
        }
        Action::Deploy => {
            let members = match plan.mode {
                Mode::Sequential if !plan.config_order.is_empty() => {
                    resolve::config_ids(&plane, &project, &plan.stack_name, &plan.config_order).await?
                }
                _ => declared,
            };
            let orchestrator = orchestrator(plane, project, plan);
            match plan.mode {
                Mode::Sequential => orchestrator.deploy_sequential(&members, &mut report).await,
                Mode::Parallel => orchestrator.deploy_parallel(members, &mut report).await,
            }
        }
    }
    report.finish();
    Ok(report)
}

fn orchestrator<C: ControlPlane>(plane: C, project: ProjectId, plan: &RunPlan) -> Orchestrator<C> {
    let engine = LifecycleEngine::new(plane, project, plan.lifecycle);
    Orchestrator::new(engine, plan.parallel.clone())
}

async fn prepare_stack<C: ControlPlane>(
    plane: &C,
    project: &ProjectId,
    stack: &ConfigId,
    plan: &RunPlan,
) -> Result<()> {
    if let Some(definition) = &plan.definition {
        info!(stack = %plan.stack_name, path = %definition.display(), "Updating stack definition");
        plane.update_stack_definition(project, stack, definition).await?;
    }
    if let Some(inputs) = plan.inputs.as_ref().filter(|inputs| !inputs.is_empty()) {
        info!(stack = %plan.stack_name, inputs = inputs.len(), "Setting stack inputs");
        debug!(inputs = %inputs.masked(), "Stack inputs");
        plane.set_stack_inputs(project, stack, inputs).await?;
    }
    Ok(())
}

