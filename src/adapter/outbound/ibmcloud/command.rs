//! Builders for the `project`, `account`, `login` and `plugin` commands of the
//! platform CLI.

use std::path::Path;

use crate::domain::{ConfigId, ProjectId, StackInputs};
use crate::port::CommandLine;

const ALL_PAGES: &str = "--all-pages";
const OUTPUT: &str = "--output";
const JSON: &str = "json";

/// Command builder bound to one control-plane program.
#[derive(Debug, Clone)]
pub struct Commands {
    program: String,
}

impl Commands {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    fn project(&self, subcommand: &str) -> CommandLine {
        CommandLine::new(&self.program).args(["project", subcommand])
    }

    fn on_config(&self, subcommand: &str, project: &ProjectId, config: &ConfigId) -> CommandLine {
        self.project(subcommand)
            .args(["--project-id", project.as_str(), "--id", config.as_str()])
    }

    pub fn list_projects(&self) -> CommandLine {
        self.project("list").args([ALL_PAGES, OUTPUT, JSON])
    }

    pub fn list_configs(&self, project: &ProjectId) -> CommandLine {
        self.project("configs")
            .args(["--project-id", project.as_str(), ALL_PAGES, OUTPUT, JSON])
    }

    pub fn get_config(&self, project: &ProjectId, config: &ConfigId) -> CommandLine {
        self.on_config("config", project, config).args([OUTPUT, JSON])
    }

    pub fn validate(&self, project: &ProjectId, config: &ConfigId) -> CommandLine {
        self.on_config("config-validate", project, config)
    }

    pub fn approve(&self, project: &ProjectId, config: &ConfigId, comment: &str) -> CommandLine {
        self.on_config("config-approve", project, config)
            .args(["--comment", comment])
    }

    pub fn deploy(&self, project: &ProjectId, config: &ConfigId) -> CommandLine {
        self.on_config("config-deploy", project, config)
    }

    pub fn undeploy(&self, project: &ProjectId, config: &ConfigId) -> CommandLine {
        self.on_config("config-undeploy", project, config)
    }

    pub fn update_definition(
        &self,
        project: &ProjectId,
        stack: &ConfigId,
        definition: &Path,
    ) -> CommandLine {
        self.on_config("config-update", project, stack)
            .arg("--definition")
            .arg(format!("@{}", definition.display()))
    }

    /// Inputs are passed as JSON; fields whose key marks a secret are masked
    /// in the logged form.
    pub fn update_inputs(&self, project: &ProjectId, stack: &ConfigId, inputs: &StackInputs) -> CommandLine {
        self.on_config("config-update", project, stack)
            .arg("--definition-inputs")
            .secret_shown_as(inputs.to_json().to_string(), inputs.masked().to_string())
    }

    pub fn account_show(&self) -> CommandLine {
        CommandLine::new(&self.program).args(["account", "show"])
    }

    pub fn login(&self, api_key: &str) -> CommandLine {
        CommandLine::new(&self.program)
            .args(["login", "--apikey"])
            .secret(api_key)
            .arg("--no-region")
    }

    pub fn plugin_show(&self, plugin: &str) -> CommandLine {
        CommandLine::new(&self.program).args(["plugin", "show", plugin])
    }

    pub fn which(&self) -> CommandLine {
        CommandLine::new("which").arg(&self.program)
    }
}
