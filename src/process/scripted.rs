//! Scripted runner for exercising sequencing without spawning processes.

use super::runner::{CommandOutput, CommandRunner};
use super::spec::CommandSpec;
use crate::errors::ProcessError;
use async_trait::async_trait;
use std::sync::Mutex;

type Responder = Box<dyn Fn(&CommandSpec) -> CommandOutput + Send + Sync>;

pub(crate) struct ScriptedRunner {
    responder: Responder,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub(crate) fn new(responder: impl Fn(&CommandSpec) -> CommandOutput + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every command succeeds.
    pub(crate) fn succeeding() -> Self {
        Self::new(|_| ok())
    }

    pub(crate) fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Space-joined args (program omitted) of every recorded call.
    pub(crate) fn call_lines(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|spec| spec.args.join(" "))
            .collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        self.calls.lock().unwrap().push(spec.clone());
        Ok((self.responder)(spec))
    }
}

pub(crate) fn ok() -> CommandOutput {
    CommandOutput {
        status: Some(0),
        ..Default::default()
    }
}

pub(crate) fn fail(code: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        status: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}
