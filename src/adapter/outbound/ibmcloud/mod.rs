//! Control plane backed by the IBM Cloud `project` CLI plugin.
//!
//! Every call builds one command, runs it through the injected
//! [`CommandRunner`] and parses the JSON it prints. A non-empty error from the
//! runner becomes [`Error::ControlPlane`]; query failures are never swallowed.

mod command;
mod response;
mod session;

use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

pub use command::Commands;
pub use session::MissingTools;

use crate::domain::{ConfigId, ConfigSummary, ConfigUnit, ProjectId, ProjectSummary, StackInputs};
use crate::error::{Error, Result};
use crate::port::{CommandLine, CommandRunner, ControlPlane};
use response::{ConfigDetail, ConfigList, ProjectList};

/// [`ControlPlane`] implementation driving the platform CLI.
pub struct IbmCloud<R: CommandRunner> {
    runner: R,
    commands: Commands,
}

impl<R: CommandRunner> IbmCloud<R> {
    pub fn new(runner: R, program: impl Into<String>) -> Self {
        Self {
            runner,
            commands: Commands::new(program),
        }
    }

    #[must_use]
    pub fn commands(&self) -> &Commands {
        &self.commands
    }

    async fn query<T: DeserializeOwned>(&self, operation: &str, command: CommandLine) -> Result<T> {
        let output = self.runner.run(&command).await;
        if let Some(err) = output.error() {
            return Err(Error::control_plane(operation, err));
        }
        debug!(operation, bytes = output.stdout.len(), "Query succeeded");
        Ok(serde_json::from_str(&output.stdout)?)
    }

    async fn mutate(&self, operation: &str, command: CommandLine) -> Result<()> {
        let output = self.runner.run(&command).await;
        if let Some(err) = output.error() {
            return Err(Error::control_plane(operation, err));
        }
        debug!(operation, output = %output.stdout.trim(), "Mutation accepted");
        Ok(())
    }
}

#[async_trait]
impl<R: CommandRunner> ControlPlane for IbmCloud<R> {
    async fn list_projects(&self) -> Result<Vec<ProjectSummary>> {
        let list: ProjectList = self.query("list projects", self.commands.list_projects()).await?;
        Ok(list.into_summaries())
    }

    async fn get_project_configs(&self, project: &ProjectId) -> Result<Vec<ConfigSummary>> {
        let list: ConfigList = self
            .query("list project configs", self.commands.list_configs(project))
            .await?;
        Ok(list.into_summaries())
    }

    async fn get_config(&self, project: &ProjectId, config: &ConfigId) -> Result<ConfigUnit> {
        let detail: ConfigDetail = self
            .query("get config", self.commands.get_config(project, config))
            .await?;
        Ok(detail.into_unit())
    }

    async fn validate_config(&self, project: &ProjectId, config: &ConfigId) -> Result<()> {
        self.mutate("validate config", self.commands.validate(project, config))
            .await
    }

    async fn approve_config(&self, project: &ProjectId, config: &ConfigId, comment: &str) -> Result<()> {
        self.mutate("approve config", self.commands.approve(project, config, comment))
            .await
    }

    async fn deploy_config(&self, project: &ProjectId, config: &ConfigId) -> Result<()> {
        self.mutate("deploy config", self.commands.deploy(project, config))
            .await
    }

    async fn undeploy_config(&self, project: &ProjectId, config: &ConfigId) -> Result<()> {
        self.mutate("undeploy config", self.commands.undeploy(project, config))
            .await
    }

    async fn update_stack_definition(
        &self,
        project: &ProjectId,
        stack: &ConfigId,
        definition: &Path,
    ) -> Result<()> {
        self.mutate(
            "update stack definition",
            self.commands.update_definition(project, stack, definition),
        )
        .await
    }

    async fn set_stack_inputs(
        &self,
        project: &ProjectId,
        stack: &ConfigId,
        inputs: &StackInputs,
    ) -> Result<()> {
        self.mutate(
            "set stack inputs",
            self.commands.update_inputs(project, stack, inputs),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::State;
    use crate::port::CommandOutput;
    use crate::testkit::runner::ScriptedRunner;

    fn cloud(outputs: Vec<CommandOutput>) -> (IbmCloud<ScriptedRunner>, ScriptedRunner) {
        let runner = ScriptedRunner::new().with_outputs(outputs);
        (IbmCloud::new(runner.clone(), "ibmcloud"), runner)
    }

    #[tokio::test]
    async fn get_config_parses_snapshot() {
        let (cloud, runner) = cloud(vec![CommandOutput::ok(
            r#"{"id": "c-1", "state": "validating", "definition": {"name": "net"}}"#,
        )]);

        let unit = cloud
            .get_config(&ProjectId::new("p"), &ConfigId::new("c-1"))
            .await
            .unwrap();

        assert_eq!(unit.state, State::Validating);
        assert_eq!(unit.name, "net");
        assert_eq!(
            runner.commands(),
            vec!["ibmcloud project config --project-id p --id c-1 --output json"]
        );
    }

    #[tokio::test]
    async fn query_error_is_raised_not_swallowed() {
        let (cloud, _) = cloud(vec![CommandOutput::failed("FAILED: not authorized")]);

        let err = cloud.list_projects().await.unwrap_err();

        match err {
            Error::ControlPlane { operation, message } => {
                assert_eq!(operation, "list projects");
                assert!(message.contains("not authorized"));
            }
            other => panic!("expected control plane error, got {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let (cloud, _) = cloud(vec![CommandOutput::ok("not json")]);
        let err = cloud.get_project_configs(&ProjectId::new("p")).await.unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[tokio::test]
    async fn mutation_reports_stderr_as_failure() {
        let (cloud, _) = cloud(vec![CommandOutput::failed("config is locked")]);
        let err = cloud
            .deploy_config(&ProjectId::new("p"), &ConfigId::new("c"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("config is locked"));
    }
}
