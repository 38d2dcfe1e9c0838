//! Control-interface execution boundary.
//!
//! Every `rabbitmqctl` call made by the reconciler goes through
//! [`CommandExecutor`], so the parser and controller can be driven by a
//! scripted executor in tests (the `testing` module) and by
//! [`crate::process::Rabbitmqctl`] in production.

use std::fmt;

use async_trait::async_trait;

use crate::error::CommandError;
use crate::node::NodeName;

/// Which node a command is directed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// The node the control interface talks to by default.
    Local,

    /// A named node (`rabbitmqctl -n <node>`).
    Node(&'a NodeName),
}

impl<'a> Target<'a> {
    /// The node name, if this is a remote target.
    pub fn node(&self) -> Option<&'a NodeName> {
        match *self {
            Self::Local => None,
            Self::Node(node) => Some(node),
        }
    }
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Node(node) => write!(f, "{node}"),
        }
    }
}

/// Captured result of a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Process exit code.
    pub exit_code: i32,

    /// Standard output, split into lines.
    pub stdout_lines: Vec<String>,

    /// Raw standard error.
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Builds a successful output from stdout lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            exit_code: 0,
            stdout_lines: lines.into_iter().map(Into::into).collect(),
            stderr: Vec::new(),
        }
    }
}

/// Runs the control interface.
///
/// Implementations map a non-zero exit to [`CommandError::Failed`].
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run the control interface with `args`, directed at `target`.
    async fn run(&self, args: &[&str], target: Target<'_>) -> Result<CommandOutput, CommandError>;
}

