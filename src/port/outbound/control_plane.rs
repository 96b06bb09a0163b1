//! Control-plane port: the typed query and mutation surface of the
//! deployment platform.
//!
//! Every call is synchronous from the caller's point of view and safe to
//! re-issue. Lifecycle and orchestration logic depend only on this trait, so
//! they can be exercised against fakes without spawning any process.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ConfigId, ConfigSummary, ConfigUnit, ProjectId, ProjectSummary, StackInputs};
use crate::error::Result;

#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// All projects visible to the session.
    async fn list_projects(&self) -> Result<Vec<ProjectSummary>>;

    /// All configurations of a project, stacks included.
    async fn get_project_configs(&self, project: &ProjectId) -> Result<Vec<ConfigSummary>>;

    /// Current snapshot of one configuration.
    async fn get_config(&self, project: &ProjectId, config: &ConfigId) -> Result<ConfigUnit>;

    /// Start validating a configuration.
    async fn validate_config(&self, project: &ProjectId, config: &ConfigId) -> Result<()>;

    /// Approve a validated configuration.
    async fn approve_config(&self, project: &ProjectId, config: &ConfigId, comment: &str) -> Result<()>;

    /// Start deploying an approved configuration.
    async fn deploy_config(&self, project: &ProjectId, config: &ConfigId) -> Result<()>;

    /// Start undeploying a configuration's deployed version.
    async fn undeploy_config(&self, project: &ProjectId, config: &ConfigId) -> Result<()>;

    /// Replace a stack's definition with the document at `definition`.
    async fn update_stack_definition(
        &self,
        project: &ProjectId,
        stack: &ConfigId,
        definition: &Path,
    ) -> Result<()>;

    /// Set a stack's input values.
    async fn set_stack_inputs(
        &self,
        project: &ProjectId,
        stack: &ConfigId,
        inputs: &StackInputs,
    ) -> Result<()>;
}

#[async_trait]
impl<C: ControlPlane + ?Sized> ControlPlane for Arc<C> {
    async fn list_projects(&self) -> Result<Vec<ProjectSummary>> {
        (**self).list_projects().await
    }

    async fn get_project_configs(&self, project: &ProjectId) -> Result<Vec<ConfigSummary>> {
        (**self).get_project_configs(project).await
    }

    async fn get_config(&self, project: &ProjectId, config: &ConfigId) -> Result<ConfigUnit> {
        (**self).get_config(project, config).await
    }

    async fn validate_config(&self, project: &ProjectId, config: &ConfigId) -> Result<()> {
        (**self).validate_config(project, config).await
    }

    async fn approve_config(&self, project: &ProjectId, config: &ConfigId, comment: &str) -> Result<()> {
        (**self).approve_config(project, config, comment).await
    }

    async fn deploy_config(&self, project: &ProjectId, config: &ConfigId) -> Result<()> {
        (**self).deploy_config(project, config).await
    }

    async fn undeploy_config(&self, project: &ProjectId, config: &ConfigId) -> Result<()> {
        (**self).undeploy_config(project, config).await
    }

    async fn update_stack_definition(
        &self,
        project: &ProjectId,
        stack: &ConfigId,
        definition: &Path,
    ) -> Result<()> {
        (**self).update_stack_definition(project, stack, definition).await
    }

    async fn set_stack_inputs(
        &self,
        project: &ProjectId,
        stack: &ConfigId,
        inputs: &StackInputs,
    ) -> Result<()> {
        (**self).set_stack_inputs(project, stack, inputs).await
    }
}
