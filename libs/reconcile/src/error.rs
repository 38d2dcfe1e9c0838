//! Error types for status parsing and control-interface calls.

use std::time::Duration;

use thiserror::Error;

/// The `cluster_status` output did not match the expected text layout.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// First line is not `Cluster status of node <NAME> ...`.
    #[error("unexpected header line: {line:?}")]
    Header { line: String },

    /// Last line does not start with `...done`.
    #[error("unexpected footer line: {line:?}")]
    Footer { line: String },

    /// The body has no `{nodes,[...]}` section.
    #[error("could not parse cluster info: {body:?}")]
    NodesSection { body: String },
}

/// A control-interface invocation did not complete successfully.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command ran and exited non-zero.
    #[error(
        "{command} exited with status {exit_code}\n    stdout: {stdout:?}\n    stderr: {stderr:?}"
    )]
    Failed {
        command: String,
        exit_code: i32,
        stdout: Vec<String>,
        stderr: String,
    },

    /// The command did not finish within the configured bound.
    #[error("{command} timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// The command could not be started.
    #[error("failed to execute {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl CommandError {
    /// The command line that failed.
    pub fn command(&self) -> &str {
        match self {
            Self::Failed { command, .. }
            | Self::Timeout { command, .. }
            | Self::Spawn { command, .. } => command,
        }
    }

    /// Exit code, if the command ran to completion.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Failed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}

/// The local node's cluster status could not be determined.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("cluster status query failed: {0}")]
    Command(#[from] CommandError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
