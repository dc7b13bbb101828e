//! Error types for host operations.

use std::io;
use std::time::Duration;

/// Result type for host operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while inspecting or mutating the host.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from process spawning or file access.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON error, usually from `ip -j` or `iperf3 -J` output.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error from simulator configs or `nr-cli` output.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// INI error from srsRAN configs.
    #[error("INI error: {0}")]
    Ini(#[from] ini::Error),

    /// A command wrote to stderr or exited with a failure status.
    #[error("command `{command}` failed: {stderr}")]
    CommandFailed {
        /// The full command line.
        command: String,
        /// What the command reported.
        stderr: String,
    },

    /// Command failure with operation context.
    #[error("{operation}: command `{command}` failed: {stderr}")]
    CommandFailedWithContext {
        /// The operation that failed.
        operation: String,
        /// The full command line.
        command: String,
        /// What the command reported.
        stderr: String,
    },

    /// A command did not finish in time and was killed.
    #[error("command `{command}` timed out after {timeout:?}")]
    Timeout {
        /// The full command line.
        command: String,
        /// The budget that was exceeded.
        timeout: Duration,
    },

    /// Interface not found.
    #[error("interface not found: {name}")]
    InterfaceNotFound {
        /// The interface name that was not found.
        name: String,
    },

    /// Namespace not found.
    #[error("namespace not found: {name}")]
    NamespaceNotFound {
        /// The namespace name (or id) that was not found.
        name: String,
    },

    /// Route not found.
    #[error("route not found: {destination}")]
    RouteNotFound {
        /// The route destination.
        destination: String,
    },

    /// Any other missing resource.
    #[error("{0}")]
    NotFound(String),

    /// The resource already exists or is in use.
    #[error("{0}")]
    Conflict(String),

    /// The request is malformed or inconsistent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Tool output could not be understood.
    #[error("parse error: {0}")]
    Parse(String),

    /// Operation not supported.
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// The host did not end up in the state a command should have produced.
    #[error("unexpected host state: {0}")]
    Unexpected(String),
}

impl Error {
    /// Create a command failure from an argv and its stderr.
    pub fn command_failed(argv: &[impl AsRef<str>], stderr: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: join_argv(argv),
            stderr: stderr.into().trim_end().to_string(),
        }
    }

    /// Add context to this error.
    ///
    /// Wraps command failures with operation context. Other errors are returned unchanged.
    pub fn with_context(self, operation: impl Into<String>) -> Self {
        match self {
            Self::CommandFailed { command, stderr } => Self::CommandFailedWithContext {
                operation: operation.into(),
                command,
                stderr,
            },
            other => other,
        }
    }

    /// Check if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::InterfaceNotFound { .. }
                | Self::NamespaceNotFound { .. }
                | Self::RouteNotFound { .. }
                | Self::NotFound(_)
        )
    }

    /// Check if this is a conflict with existing state.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Check if the caller supplied bad input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Check if a command ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Get what the failing command reported, if this is a command failure.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { stderr, .. } | Self::CommandFailedWithContext { stderr, .. } => {
                Some(stderr)
            }
            _ => None,
        }
    }
}

pub(crate) fn join_argv(argv: &[impl AsRef<str>]) -> String {
    argv.iter()
        .map(|a| a.as_ref())
        .collect::<Vec<_>>()
        .join(" ")
}
