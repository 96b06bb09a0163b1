use std::time::Duration;

use stackdeploy::adapter::outbound::ibmcloud::IbmCloud;
use stackdeploy::adapter::outbound::retrying::RetryingRunner;
use stackdeploy::application::orchestration::{execute, Action, RunPlan};
use stackdeploy::error::Error;
use stackdeploy::infrastructure::config::runner::RunnerConfig;
use stackdeploy::port::CommandOutput;
use stackdeploy::testkit::ScriptedRunner;

const TLS: &str = "Get https://projects.cloud.ibm.com: net/http: TLS handshake timeout";

const PROJECTS: &str = r#"{"projects": [
    {"id": "p1", "definition": {"name": "demo"}},
    {"id": "p2"}
]}"#;

const CONFIGS: &str = r#"{"configs": [
    {"id": "s1", "deployment_model": "stack", "definition": {"name": "infra"}},
    {"id": "c-net", "deployment_model": "project_deployed", "definition": {"name": "infra-net"}}
]}"#;

const STACK: &str = r#"{
    "id": "s1",
    "state": "deployed",
    "definition": {"name": "infra", "members": [{"name": "net", "config_id": "c-net"}]}
}"#;

const NET_DEPLOYED: &str = r#"{
    "id": "c-net",
    "state": "deployed",
    "state_code": "",
    "definition": {"name": "net"},
    "deployed_version": {"state": "deployed"}
}"#;

fn platform(runner: ScriptedRunner) -> IbmCloud<RetryingRunner<ScriptedRunner>> {
    IbmCloud::new(RetryingRunner::new(runner, RunnerConfig::default()), "ibmcloud")
}

#[tokio::test(start_paused = true)]
async fn run_survives_transient_tls_failures() {
    let runner = ScriptedRunner::new()
        .with_outputs(vec![
            CommandOutput::failed(TLS),
            CommandOutput::ok(PROJECTS),
            CommandOutput::ok(CONFIGS),
            CommandOutput::ok(STACK),
        ])
        .with_default(CommandOutput::ok(NET_DEPLOYED));
    let plan = RunPlan::new("demo", "infra", Action::Deploy);

    let start = tokio::time::Instant::now();
    let report = execute(platform(runner.clone()), &plan).await.unwrap();

    assert!(report.is_success());
    assert_eq!(start.elapsed(), Duration::from_secs(30));
    let commands = runner.commands();
    assert_eq!(commands[0], commands[1]);
    assert!(commands.iter().all(|command| !command.contains("config-")));
}

#[tokio::test(start_paused = true)]
async fn persistent_query_failure_is_fatal() {
    let runner = ScriptedRunner::new().with_default(CommandOutput::failed("FAILED: not authorized"));
    let plan = RunPlan::new("demo", "infra", Action::Undeploy);

    let result = execute(platform(runner.clone()), &plan).await;

    match result {
        Err(Error::ControlPlane { message, .. }) => assert!(message.contains("not authorized")),
        other => panic!("expected control plane error, got {other:?}"),
    }
    assert_eq!(runner.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn unnamed_projects_are_not_matched() {
    let runner = ScriptedRunner::new().with_outputs(vec![CommandOutput::ok(PROJECTS)]);
    let plan = RunPlan::new("p2", "infra", Action::Deploy);

    let result = execute(platform(runner), &plan).await;

    assert!(matches!(result, Err(Error::Resolution(_))));
}
