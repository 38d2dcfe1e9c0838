//! A single reconciliation pass: query, decide, apply.

use tracing::{error, info, warn};

use crate::controller::{ApplyResult, ClusterController, ControllerConfig};
use crate::error::StatusError;
use crate::executor::CommandExecutor;
use crate::node::{display_set, NodeSet};
use crate::policy::{decide, Decision};
use crate::status::{query_status, ClusterStatus};

/// Overall result of a pass that got past the status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Nothing needed doing, or everything that was attempted succeeded.
    Success,

    /// Some required step failed: no join candidate accepted, or a node
    /// could not be forgotten.
    Unresolved,
}

/// Everything a pass observed and did.
#[derive(Debug)]
pub struct PassReport {
    pub status: ClusterStatus,
    pub decision: Decision,
    pub result: ApplyResult,
}

impl PassReport {
    pub fn outcome(&self) -> PassOutcome {
        if self.result.is_success() {
            PassOutcome::Success
        } else {
            PassOutcome::Unresolved
        }
    }
}

/// Runs reconciliation passes for the local node.
pub struct Reconciler<E> {
    controller: ClusterController<E>,
}

impl<E: CommandExecutor> Reconciler<E> {
    pub fn new(executor: E, config: ControllerConfig) -> Self {
        Self {
            controller: ClusterController::new(executor, config),
        }
    }

    pub fn executor(&self) -> &E {
        self.controller.executor()
    }

    /// Run one pass.
    ///
    /// Only a failed status query is an error; failed membership changes are
    /// reported through [`PassReport::outcome`].
    pub async fn run_pass(
        &self,
        expected: &NodeSet,
        forget: &NodeSet,
    ) -> Result<PassReport, StatusError> {
        let status = query_status(self.controller.executor())
            .await
            .inspect_err(|e| error!(error = %e, "Could not determine cluster status"))?;

        let mut known = expected.clone();
        known.insert(status.local_node().clone());

        info!(node = %status.local_node(), "Local cluster node");
        info!(nodes = %display_set(status.members()), "Current cluster nodes");
        info!(nodes = %display_set(&known), "Known cluster nodes");

        let decision = decide(&status, expected, forget);
        match &decision {
            Decision::AlreadyClustered => info!("This node is clustered correctly"),
            Decision::NoOp { .. } => warn!(%decision, "Membership differs but no action applies"),
            _ => info!(%decision, "Reconciling membership"),
        }

        let result = self.controller.apply(&decision).await;

        Ok(PassReport {
            status,
            decision,
            result,
        })
    }
}
