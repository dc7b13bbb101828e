//! Command execution on the host, optionally inside a network namespace.
//!
//! Every read or write of network state goes through a [`Host`]. The host
//! formats the final command line (prefixing `ip netns exec <ns>` when bound
//! to a namespace), hands it to a [`Runner`] and enforces a timeout.
//!
//! # Example
//!
//! ```ignore
//! use nfvtest::Host;
//!
//! let host = Host::system();
//! let out = host.exec(&["ip", "-j", "link"]).await?;
//!
//! let blue = host.in_namespace("blue");
//! let out = blue.exec_checked(&["ip", "-j", "addr"]).await?;
//! ```

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{Error, Result, join_argv};
use crate::types::CommandStatus;

/// Default budget for a single command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Boxed future returned by [`Runner::run`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Captured output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when killed by a signal.
    pub status: Option<i32>,
}

impl CommandOutput {
    /// Whether the command exited with status 0.
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Whether the command wrote anything to stderr.
    pub fn has_stderr(&self) -> bool {
        !self.stderr.trim().is_empty()
    }
}

/// Something that can run an argv to completion.
pub trait Runner: Send + Sync {
    fn run<'a>(&'a self, argv: &'a [String], timeout: Duration)
    -> BoxFuture<'a, Result<CommandOutput>>;
}

/// Runs commands as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run<'a>(
        &'a self,
        argv: &'a [String],
        timeout: Duration,
    ) -> BoxFuture<'a, Result<CommandOutput>> {
        Box::pin(async move {
            let (program, args) = argv
                .split_first()
                .ok_or_else(|| Error::InvalidInput("empty command line".into()))?;

            let child = Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()?;

            // Dropping the wait future on timeout drops the child, which kills it.
            match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(output) => {
                    let output = output?;
                    Ok(CommandOutput {
                        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                        status: output.status.code(),
                    })
                }
                Err(_) => Err(Error::Timeout {
                    command: join_argv(argv),
                    timeout,
                }),
            }
        })
    }
}

/// A place where commands run: the root namespace or a named one.
#[derive(Clone)]
pub struct Host {
    namespace: Option<String>,
    runner: Arc<dyn Runner>,
    timeout: Duration,
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("namespace", &self.namespace)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Host {
    /// Create a root-namespace host backed by `runner`.
    pub fn new(runner: Arc<dyn Runner>) -> Self {
        Self {
            namespace: None,
            runner,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a root-namespace host that spawns real processes.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemRunner))
    }

    /// Set the default command timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get a host that runs commands inside namespace `name`.
    pub fn in_namespace(&self, name: &str) -> Self {
        Self {
            namespace: Some(name.to_string()),
            runner: Arc::clone(&self.runner),
            timeout: self.timeout,
        }
    }

    /// Get the root-namespace host sharing this host's runner.
    pub fn root(&self) -> Self {
        Self {
            namespace: None,
            runner: Arc::clone(&self.runner),
            timeout: self.timeout,
        }
    }

    /// The namespace commands run in, `None` for the root namespace.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The default command timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build the command line actually executed for `argv`.
    pub fn command_line(&self, argv: &[impl AsRef<str>]) -> Vec<String> {
        let mut line = Vec::with_capacity(argv.len() + 4);
        if let Some(ns) = &self.namespace {
            line.extend(["ip", "netns", "exec", ns.as_str()].map(String::from));
        }
        line.extend(argv.iter().map(|a| a.as_ref().to_string()));
        line
    }

    /// Run `argv` with the default timeout.
    pub async fn exec(&self, argv: &[impl AsRef<str>]) -> Result<CommandOutput> {
        self.exec_with_timeout(argv, self.timeout).await
    }

    /// Run `argv` with an explicit timeout.
    pub async fn exec_with_timeout(
        &self,
        argv: &[impl AsRef<str>],
        timeout: Duration,
    ) -> Result<CommandOutput> {
        let line = self.command_line(argv);
        tracing::debug!(command = %line.join(" "), ?timeout, "running command");
        let output = self.runner.run(&line, timeout).await?;
        if output.has_stderr() {
            tracing::debug!(command = %line.join(" "), stderr = %output.stderr.trim_end(), "command wrote to stderr");
        }
        Ok(output)
    }

    /// Run `argv` and return its stdout, failing if anything was written to stderr.
    pub async fn exec_checked(&self, argv: &[impl AsRef<str>]) -> Result<String> {
        let output = self.exec(argv).await?;
        if output.has_stderr() {
            return Err(Error::command_failed(&self.command_line(argv), output.stderr));
        }
        Ok(output.stdout)
    }

    /// Run `argv` and report its raw output.
    pub async fn status(&self, argv: &[impl AsRef<str>]) -> Result<CommandStatus> {
        let output = self.exec(argv).await?;
        Ok(CommandStatus {
            command: self.command_line(argv),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
