//! RabbitMQ cluster membership reconciliation.
//!
//! Brings the local node's cluster membership in line with an expected set
//! of peers, observing and mutating it only through `rabbitmqctl`. A pass
//! consists of:
//!
//! - **Status**: `cluster_status` output is parsed into a [`ClusterStatus`].
//! - **Policy**: [`decide`] compares it with the expected set and picks one
//!   [`Decision`].
//! - **Controller**: [`ClusterController`] issues the commands for that
//!   decision and reports per-step outcomes.
//!
//! # Invariants
//!
//! - Passes are idempotent: re-running against a converged cluster issues
//!   only the status query
//! - Commands within a pass are strictly sequential
//! - A join sequence always attempts to restart the local application

pub mod controller;
pub mod error;
pub mod executor;
pub mod node;
pub mod policy;
pub mod process;
pub mod reconciler;
pub mod status;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use controller::{
    ApplyResult, ClusterController, ControllerConfig, ForgetOutcome, JoinAttempt, Step, StepRecord,
};
pub use error::{CommandError, ParseError, StatusError};
pub use executor::{CommandExecutor, CommandOutput, Target};
pub use node::{NodeName, NodeSet};
pub use policy::{decide, Decision, NoOpReason};
pub use process::Rabbitmqctl;
pub use reconciler::{PassOutcome, PassReport, Reconciler};
pub use status::{parse, query_status, ClusterStatus};
