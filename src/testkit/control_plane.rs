//! In-memory [`ControlPlane`] that simulates platform state transitions.
//!
//! Each unit holds a current snapshot. Mutations enqueue the steps the
//! platform would go through; every `get_config` call first applies the next
//! queued step, so a unit moves one step further each time it is observed.
//! A queue that ends on a transitional state models an operation that never
//! converges.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{
    ConfigId, ConfigSummary, ConfigUnit, DeploymentModel, Member, ProjectId, ProjectSummary,
    StackInputs, State, StateCode,
};
use crate::error::{Error, Result};
use crate::port::ControlPlane;

/// Mutating control-plane operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Validate,
    Approve,
    Deploy,
    Undeploy,
    UpdateDefinition,
    SetInputs,
}

/// One observable change of a unit's snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Step {
    pub state: Option<State>,
    pub state_code: Option<StateCode>,
    pub deployed_state: Option<State>,
}

impl Step {
    /// Change the current state only.
    pub fn state(state: State) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    /// Change the deployed state only.
    pub fn deployed(state: State) -> Self {
        Self {
            deployed_state: Some(state),
            ..Self::default()
        }
    }

    /// Change both states.
    pub fn both(state: State, deployed_state: State) -> Self {
        Self {
            state: Some(state),
            deployed_state: Some(deployed_state),
            ..Self::default()
        }
    }

    /// Leave the snapshot as it is.
    pub fn unchanged() -> Self {
        Self::default()
    }

    fn apply(self, unit: &mut ConfigUnit) {
        if let Some(state) = self.state {
            unit.state = state;
        }
        if let Some(code) = self.state_code {
            unit.state_code = code;
        }
        if let Some(deployed) = self.deployed_state {
            unit.deployed_state = deployed;
        }
    }
}

struct FakeUnit {
    unit: ConfigUnit,
    queued: VecDeque<Step>,
    reactions: HashMap<Operation, Vec<Step>>,
    prerequisites: Vec<ConfigId>,
    query_failure: Option<String>,
}

#[derive(Default)]
struct FakeState {
    projects: Vec<ProjectSummary>,
    configs: HashMap<ProjectId, Vec<ConfigSummary>>,
    units: HashMap<ConfigId, FakeUnit>,
    failures: HashMap<(Operation, ConfigId), String>,
    mutations: Vec<(Operation, ConfigId)>,
    queries: HashMap<ConfigId, usize>,
    inputs: Option<StackInputs>,
    definition: Option<PathBuf>,
}

fn default_reaction(operation: Operation) -> Vec<Step> {
    match operation {
        Operation::Validate => vec![Step::state(State::Validating), Step::state(State::Validated)],
        Operation::Approve => vec![Step::state(State::Approved)],
        Operation::Deploy => vec![
            Step::state(State::Deploying),
            Step::both(State::Deployed, State::Deployed),
        ],
        Operation::Undeploy => vec![
            Step::deployed(State::Undeploying),
            Step::both(State::Approved, State::Approved),
        ],
        Operation::UpdateDefinition | Operation::SetInputs => Vec::new(),
    }
}

/// Simulated platform. Clones share state.
#[derive(Clone, Default)]
pub struct FakeControlPlane {
    state: Arc<Mutex<FakeState>>,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a project.
    #[must_use]
    pub fn with_project(self, id: &str, name: &str) -> Self {
        self.state.lock().projects.push(ProjectSummary {
            id: ProjectId::new(id),
            name: name.to_string(),
        });
        self
    }

    /// Register a stack in a project with its members in declared order.
    /// Members must be added separately with [`FakeControlPlane::with_unit`].
    #[must_use]
    pub fn with_stack(self, project: &str, id: &str, name: &str, members: &[(&str, &str)]) -> Self {
        let members = members
            .iter()
            .map(|(name, id)| Member::new(*name, *id))
            .collect();
        let stack = ConfigUnit::new(id, name, State::Deployed).with_members(members);
        {
            let mut state = self.state.lock();
            state
                .configs
                .entry(ProjectId::new(project))
                .or_default()
                .push(ConfigSummary {
                    id: ConfigId::new(id),
                    name: name.to_string(),
                    locator: None,
                    deployment_model: DeploymentModel::Stack,
                });
            state.units.insert(ConfigId::new(id), FakeUnit::new(stack));
        }
        self
    }

    /// Register a member unit, listed in the project under `listed_name`.
    #[must_use]
    pub fn with_unit(self, project: &str, unit: ConfigUnit, listed_name: &str) -> Self {
        {
            let mut state = self.state.lock();
            state
                .configs
                .entry(ProjectId::new(project))
                .or_default()
                .push(ConfigSummary {
                    id: unit.id.clone(),
                    name: listed_name.to_string(),
                    locator: unit.locator.clone(),
                    deployment_model: DeploymentModel::ProjectDeployed,
                });
            state.units.insert(unit.id.clone(), FakeUnit::new(unit));
        }
        self
    }

    /// Replace the steps a mutation enqueues for one unit.
    #[must_use]
    pub fn react(self, id: &str, operation: Operation, steps: Vec<Step>) -> Self {
        if let Some(unit) = self.state.lock().units.get_mut(&ConfigId::new(id)) {
            unit.reactions.insert(operation, steps);
        }
        self
    }

    /// Queue steps applied on the next observations of a unit, independent
    /// of any mutation.
    #[must_use]
    pub fn queue(self, id: &str, steps: Vec<Step>) -> Self {
        if let Some(unit) = self.state.lock().units.get_mut(&ConfigId::new(id)) {
            unit.queued.extend(steps);
        }
        self
    }

    /// Report `awaiting_prerequisite` for `dependent` until `prerequisite`
    /// is deployed.
    #[must_use]
    pub fn with_prerequisite(self, dependent: &str, prerequisite: &str) -> Self {
        if let Some(unit) = self.state.lock().units.get_mut(&ConfigId::new(dependent)) {
            unit.prerequisites.push(ConfigId::new(prerequisite));
        }
        self
    }

    /// Make a mutation fail with `message`.
    #[must_use]
    pub fn fail(self, id: &str, operation: Operation, message: &str) -> Self {
        self.state
            .lock()
            .failures
            .insert((operation, ConfigId::new(id)), message.to_string());
        self
    }

    /// Make every query of a unit fail with `message`.
    #[must_use]
    pub fn fail_queries(self, id: &str, message: &str) -> Self {
        if let Some(unit) = self.state.lock().units.get_mut(&ConfigId::new(id)) {
            unit.query_failure = Some(message.to_string());
        }
        self
    }

    /// Every mutation issued, in order.
    pub fn mutations(&self) -> Vec<(Operation, ConfigId)> {
        self.state.lock().mutations.clone()
    }

    /// Mutations issued against one unit.
    pub fn mutations_for(&self, id: &str) -> Vec<Operation> {
        let id = ConfigId::new(id);
        self.state
            .lock()
            .mutations
            .iter()
            .filter(|(_, target)| *target == id)
            .map(|(operation, _)| *operation)
            .collect()
    }

    /// Units that received `operation`, in order.
    pub fn targets_of(&self, operation: Operation) -> Vec<ConfigId> {
        self.state
            .lock()
            .mutations
            .iter()
            .filter(|(op, _)| *op == operation)
            .map(|(_, id)| id.clone())
            .collect()
    }

    /// Number of `get_config` calls made for a unit.
    pub fn query_count(&self, id: &str) -> usize {
        self.state
            .lock()
            .queries
            .get(&ConfigId::new(id))
            .copied()
            .unwrap_or(0)
    }

    /// Current snapshot of a unit, without advancing it.
    pub fn snapshot(&self, id: &str) -> Option<ConfigUnit> {
        self.state
            .lock()
            .units
            .get(&ConfigId::new(id))
            .map(|unit| unit.unit.clone())
    }

    /// Inputs received by the last `set_stack_inputs` call.
    pub fn last_inputs(&self) -> Option<StackInputs> {
        self.state.lock().inputs.clone()
    }

    /// Definition path received by the last `update_stack_definition` call.
    pub fn last_definition(&self) -> Option<PathBuf> {
        self.state.lock().definition.clone()
    }

    fn mutate(&self, operation: Operation, config: &ConfigId) -> Result<()> {
        let mut state = self.state.lock();
        state.mutations.push((operation, config.clone()));
        if let Some(message) = state.failures.get(&(operation, config.clone())) {
            return Err(Error::control_plane(format!("{operation:?}"), message.clone()));
        }
        let unit = state
            .units
            .get_mut(config)
            .ok_or_else(|| Error::control_plane(format!("{operation:?}"), format!("config {config} not found")))?;
        let steps = unit
            .reactions
            .get(&operation)
            .cloned()
            .unwrap_or_else(|| default_reaction(operation));
        unit.queued = steps.into();
        Ok(())
    }
}

impl FakeUnit {
    fn new(unit: ConfigUnit) -> Self {
        Self {
            unit,
            queued: VecDeque::new(),
            reactions: HashMap::new(),
            prerequisites: Vec::new(),
            query_failure: None,
        }
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn list_projects(&self) -> Result<Vec<ProjectSummary>> {
        Ok(self.state.lock().projects.clone())
    }

    async fn get_project_configs(&self, project: &ProjectId) -> Result<Vec<ConfigSummary>> {
        Ok(self
            .state
            .lock()
            .configs
            .get(project)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_config(&self, _project: &ProjectId, config: &ConfigId) -> Result<ConfigUnit> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        *state.queries.entry(config.clone()).or_default() += 1;

        let fake = state
            .units
            .get_mut(config)
            .ok_or_else(|| Error::control_plane("get config", format!("config {config} not found")))?;
        if let Some(message) = &fake.query_failure {
            return Err(Error::control_plane("get config", message.clone()));
        }
        if let Some(step) = fake.queued.pop_front() {
            step.apply(&mut fake.unit);
        }
        let mut snapshot = fake.unit.clone();
        let prerequisites = fake.prerequisites.clone();

        let blocked = prerequisites.iter().any(|prerequisite| {
            state
                .units
                .get(prerequisite)
                .map_or(true, |p| p.unit.state != State::Deployed)
        });
        if blocked {
            snapshot.state_code = StateCode::AwaitingPrerequisite;
        }
        Ok(snapshot)
    }

    async fn validate_config(&self, _project: &ProjectId, config: &ConfigId) -> Result<()> {
        self.mutate(Operation::Validate, config)
    }

    async fn approve_config(&self, _project: &ProjectId, config: &ConfigId, _comment: &str) -> Result<()> {
        self.mutate(Operation::Approve, config)
    }

    async fn deploy_config(&self, _project: &ProjectId, config: &ConfigId) -> Result<()> {
        self.mutate(Operation::Deploy, config)
    }

    async fn undeploy_config(&self, _project: &ProjectId, config: &ConfigId) -> Result<()> {
        self.mutate(Operation::Undeploy, config)
    }

    async fn update_stack_definition(
        &self,
        _project: &ProjectId,
        stack: &ConfigId,
        definition: &Path,
    ) -> Result<()> {
        self.mutate(Operation::UpdateDefinition, stack)?;
        self.state.lock().definition = Some(definition.to_path_buf());
        Ok(())
    }

    async fn set_stack_inputs(
        &self,
        _project: &ProjectId,
        stack: &ConfigId,
        inputs: &StackInputs,
    ) -> Result<()> {
        self.mutate(Operation::SetInputs, stack)?;
        self.state.lock().inputs = Some(inputs.clone());
        Ok(())
    }
}
