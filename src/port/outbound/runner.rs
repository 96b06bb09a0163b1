//! Command runner port.
//!
//! A runner executes one control-plane command and reports what it printed.
//! It never fails: interpreting the output is the caller's job, and any
//! non-empty [`CommandOutput::error`] must be treated as a failure.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::MASK;

/// One command-line argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Plain(String),
    /// Passed to the process as `value` but logged as `shown`.
    Secret { value: String, shown: String },
}

impl Arg {
    /// Value handed to the process.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Plain(value) | Self::Secret { value, .. } => value,
        }
    }

    /// Value safe to log.
    #[must_use]
    pub fn shown(&self) -> &str {
        match self {
            Self::Plain(value) => value,
            Self::Secret { shown, .. } => shown,
        }
    }
}

/// A program invocation with its arguments, executed without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<Arg>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::Plain(arg.into()));
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|a| Arg::Plain(a.into())));
        self
    }

    /// Add an argument that is fully masked in logs.
    #[must_use]
    pub fn secret(self, value: impl Into<String>) -> Self {
        self.secret_shown_as(value, MASK)
    }

    /// Add an argument that is logged as `shown` instead of its real value.
    #[must_use]
    pub fn secret_shown_as(mut self, value: impl Into<String>, shown: impl Into<String>) -> Self {
        self.args.push(Arg::Secret {
            value: value.into(),
            shown: shown.into(),
        });
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Real argument values, in order.
    pub fn argv(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(Arg::value)
    }

    /// Command rendered for logging with secrets masked.
    #[must_use]
    pub fn redacted(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(Arg::shown))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// What a command printed and how it exited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process could not be started or was killed by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    /// Failed output with the given stderr.
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(1),
        }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// The error text, if the command failed or wrote to stderr.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return Some(stderr.to_string());
        }
        match self.exit_code {
            Some(0) => None,
            Some(code) => Some(format!("command exited with status {code}")),
            None => Some("command terminated without an exit status".to_string()),
        }
    }

    /// Case-insensitive search of both output streams.
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.to_ascii_lowercase();
        self.stdout.to_ascii_lowercase().contains(&needle)
            || self.stderr.to_ascii_lowercase().contains(&needle)
    }
}

/// Executes control-plane commands.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion.
    async fn run(&self, command: &CommandLine) -> CommandOutput;
}

#[async_trait]
impl<R: CommandRunner + ?Sized> CommandRunner for Arc<R> {
    async fn run(&self, command: &CommandLine) -> CommandOutput {
        (**self).run(command).await
    }
}
