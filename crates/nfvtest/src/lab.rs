//! Scripted command runner for tests.
//!
//! [`ScriptedRunner`] records every command line it is asked to run and
//! answers from scripted responses, so services and the HTTP router can be
//! exercised without root or real tools.
//!
//! Responses are keyed by the exact command line. Several responses for the
//! same command are consumed in order and the last one repeats. Unscripted
//! commands succeed with empty output.
//!
//! ```ignore
//! let runner = Arc::new(ScriptedRunner::new());
//! runner.on_stdout(&["ip", "-j", "-details", "netns", "list-id"], "[]");
//! let host = Host::new(runner.clone());
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::Result;
use crate::host::{BoxFuture, CommandOutput, Runner};

/// A [`Runner`] that replays canned output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: Mutex<HashMap<Vec<String>, VecDeque<CommandOutput>>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `output` for `argv`.
    pub fn on(&self, argv: &[&str], output: CommandOutput) -> &Self {
        let key = argv.iter().map(|s| s.to_string()).collect();
        let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        responses.entry(key).or_default().push_back(output);
        self
    }

    /// Queue a successful response printing `stdout`.
    pub fn on_stdout(&self, argv: &[&str], stdout: &str) -> &Self {
        self.on(
            argv,
            CommandOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
                status: Some(0),
            },
        )
    }

    /// Queue a failing response printing `stderr`.
    pub fn on_stderr(&self, argv: &[&str], stderr: &str) -> &Self {
        self.on(
            argv,
            CommandOutput {
                stdout: String::new(),
                stderr: stderr.to_string(),
                status: Some(1),
            },
        )
    }

    /// Every command line run so far.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Every command line run so far, joined with spaces.
    pub fn commands(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.join(" ")).collect()
    }

    /// Command lines that mutate state, i.e. everything but reads.
    pub fn mutations(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| !c.contains(" -j ") && !c.contains(" -details "))
            .collect()
    }

    /// Forget recorded calls, keeping scripted responses.
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn respond(&self, argv: &[String]) -> CommandOutput {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(argv.to_vec());

        let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        match responses.get_mut(argv) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => CommandOutput {
                status: Some(0),
                ..Default::default()
            },
        }
    }
}

impl Runner for ScriptedRunner {
    fn run<'a>(
        &'a self,
        argv: &'a [String],
        _timeout: Duration,
    ) -> BoxFuture<'a, Result<CommandOutput>> {
        let output = self.respond(argv);
        Box::pin(async move { Ok(output) })
    }
}
