//! Command-line interface definitions.
//!
//! Every setting can also come from a TOML run file (`-c/--config`); flags
//! given on the command line take precedence over the file.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::StackInputs;

/// Deploy and undeploy the members of a platform stack
#[derive(Parser, Debug)]
#[command(name = "stackdeploy")]
#[command(version, about)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate, approve and deploy every member of a stack
    Deploy(DeployArgs),

    /// Undeploy every member of a stack in reverse order
    Undeploy(TargetArgs),

    /// Check that the platform CLI and its plugins are installed
    Check(TargetArgs),
}

/// Arguments shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Path to a TOML run file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Project containing the stack.
    #[arg(short, long)]
    pub project_name: Option<String>,

    /// Stack whose members are deployed.
    #[arg(short, long)]
    pub stack_name: Option<String>,

    /// Environment variable holding the API key.
    #[arg(long)]
    pub stack_api_key_env: Option<String>,

    /// Log at debug level.
    #[arg(long)]
    pub debug: bool,

    /// Use JSON log format instead of pretty-printed logs.
    #[arg(long)]
    pub json_logs: bool,
}

/// Arguments for the `deploy` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct DeployArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Explicit member order, separated by `|` (e.g. "net|db|app").
    #[arg(short = 'o', long, value_delimiter = '|')]
    pub config_order: Vec<String>,

    /// Stack definition document used with --stack-definition-update.
    #[arg(long)]
    pub stack_def_path: Option<PathBuf>,

    /// Stack inputs as a JSON object, optionally wrapped in {"inputs": ...}.
    #[arg(long, value_parser = parse_stack_inputs)]
    pub stack_inputs: Option<StackInputs>,

    /// Do not apply stack inputs.
    #[arg(long)]
    pub skip_stack_inputs: bool,

    /// Replace the stack definition before deploying.
    #[arg(long)]
    pub stack_definition_update: bool,

    /// Deploy members as the platform reports them ready, concurrently.
    #[arg(long)]
    pub parallel: bool,
}

fn parse_stack_inputs(raw: &str) -> Result<StackInputs, String> {
    StackInputs::from_json(raw).map_err(|e| format!("stack inputs must be a JSON object: {e}"))
}
