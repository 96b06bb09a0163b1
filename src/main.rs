use std::process::ExitCode;

use clap::Parser;
use stackdeploy::adapter::inbound::cli::command::{Cli, Commands};
use stackdeploy::adapter::inbound::cli::diagnostic::RunDiagnostic;
use stackdeploy::adapter::inbound::cli::output::{self, OutputConfig};
use stackdeploy::adapter::inbound::cli::{check, run};
use stackdeploy::error::Error;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    output::configure(OutputConfig { json: cli.json }, &cli.color);

    let result = match &cli.command {
        Commands::Deploy(args) => run::execute_deploy(args).await.map(Some),
        Commands::Undeploy(args) => run::execute_undeploy(args).await.map(Some),
        Commands::Check(args) => check::execute(args).await.map(|()| None),
    };

    match result {
        Ok(Some(report)) => {
            output::summary(&report);
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(err) => {
            report_fatal(&err);
            ExitCode::FAILURE
        }
    }
}

fn report_fatal(err: &Error) {
    tracing::error!(error = %err, "Fatal error");
    if output::is_json() {
        output::error(&err.to_string());
    } else {
        eprintln!("{:?}", miette::Report::new(RunDiagnostic::from(err)));
    }
}
