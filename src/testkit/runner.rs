//! Mock [`CommandRunner`] with scripted outputs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::port::{CommandLine, CommandOutput, CommandRunner};

/// A runner that pops one scripted output per call.
///
/// When the script is exhausted every call returns the default output
/// (successful and empty unless overridden). Clones share the script and the
/// call log, so a clone can be handed to the code under test while the
/// original is kept for assertions.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    outputs: Arc<Mutex<VecDeque<CommandOutput>>>,
    default: Arc<Mutex<Option<CommandOutput>>>,
    calls: Arc<AtomicU32>,
    commands: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_outputs(self, outputs: Vec<CommandOutput>) -> Self {
        *self.outputs.lock() = outputs.into();
        self
    }

    #[must_use]
    pub fn with_default(self, output: CommandOutput) -> Self {
        *self.default.lock() = Some(output);
        self
    }

    /// Shared counter of `run` calls.
    pub fn call_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.calls)
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every command run so far, rendered with secrets masked.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &CommandLine) -> CommandOutput {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.commands.lock().push(command.redacted());
        let next = self.outputs.lock().pop_front();
        next.or_else(|| self.default.lock().clone())
            .unwrap_or_else(|| CommandOutput::ok(""))
    }
}
