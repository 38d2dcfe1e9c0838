//! Exit status mapping and error display for the CLI.

use colored::Colorize;
use warren_reconcile::PassOutcome;

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Clustered correctly, or every change succeeded.
    Success,

    /// No join candidate accepted, or a node could not be forgotten.
    Unresolved,

    /// The cluster status could not be queried or parsed.
    StatusFailed,

    /// Invalid configuration.
    Startup,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Unresolved => 1,
            Self::StatusFailed => 2,
            Self::Startup => 3,
        }
    }
}

impl From<PassOutcome> for ExitStatus {
    fn from(outcome: PassOutcome) -> Self {
        match outcome {
            PassOutcome::Success => Self::Success,
            PassOutcome::Unresolved => Self::Unresolved,
        }
    }
}

/// Print a startup error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    if err.chain().any(|cause| cause.is::<::config::ConfigError>()) {
        eprintln!(
            "\n{}",
            "Hint: Check the [cluster] section of the config file.".yellow()
        );
    }
}
