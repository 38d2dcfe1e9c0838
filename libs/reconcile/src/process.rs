//! `rabbitmqctl` executor backed by a child process.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::CommandError;
use crate::executor::{CommandExecutor, CommandOutput, Target};

/// Default control-interface binary.
pub const DEFAULT_PROGRAM: &str = "rabbitmqctl";

/// Default bound on a single control-interface call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs `rabbitmqctl` (or a wrapper around it) as a child process.
#[derive(Debug, Clone)]
pub struct Rabbitmqctl {
    program: PathBuf,
    leading_args: Vec<OsString>,
    timeout: Duration,
}

impl Default for Rabbitmqctl {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl Rabbitmqctl {
    /// Create an executor for the given binary.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Parse a command string such as `sudo -u rabbitmq rabbitmqctl`.
    ///
    /// The first word is the program, the rest are passed before any
    /// control-interface arguments. Words are split on whitespace only:
    /// quotes are not interpreted, so a path containing spaces cannot be
    /// expressed this way (use [`Rabbitmqctl::new`] instead).
    pub fn from_command_line(command: &str) -> Self {
        let mut words = command.split_whitespace();
        let program = words.next().unwrap_or(DEFAULT_PROGRAM);
        Self::new(program).with_leading_args(words)
    }

    /// Arguments placed before the target flag and command arguments.
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn argv(&self, args: &[&str], target: Target<'_>) -> Vec<OsString> {
        let mut argv = self.leading_args.clone();
        if let Target::Node(node) = target {
            argv.push("-n".into());
            argv.push(node.as_str().into());
        }
        argv.extend(args.iter().map(OsString::from));
        argv
    }

    fn command_line(&self, argv: &[OsString]) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(argv.iter().map(OsString::as_os_str))
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl CommandExecutor for Rabbitmqctl {
    async fn run(&self, args: &[&str], target: Target<'_>) -> Result<CommandOutput, CommandError> {
        let argv = self.argv(args, target);
        let command = self.command_line(&argv);
        debug!(command = %command, "Executing");

        let child = Command::new(&self.program)
            .args(&argv)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => return Err(CommandError::Spawn { command, source }),
            Err(_) => {
                return Err(CommandError::Timeout {
                    command,
                    timeout: self.timeout,
                })
            }
        };

        let stdout_lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect();
        // Killed by a signal
        let exit_code = output.status.code().unwrap_or(-1);

        if !output.status.success() {
            return Err(CommandError::Failed {
                command,
                exit_code,
                stdout: stdout_lines,
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            });
        }

        Ok(CommandOutput {
            exit_code,
            stdout_lines,
            stderr: output.stderr,
        })
    }
}
