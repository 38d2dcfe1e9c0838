//! Executes a [`Decision`] against the control interface.
//!
//! Per-target failures are returned as values inside [`ApplyResult`]; the
//! controller itself never fails. Each call it issued is kept as a
//! [`StepRecord`] so callers can log or inspect the full action trail.

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::error::CommandError;
use crate::executor::{CommandExecutor, Target};
use crate::node::{NodeName, NodeSet};
use crate::policy::Decision;

/// A single control-interface operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    StopApp,
    JoinCluster,
    StartApp,
    ForgetClusterNode,
    Reset,
}

impl Step {
    /// The `rabbitmqctl` subcommand for this step.
    pub fn command(self) -> &'static str {
        match self {
            Self::StopApp => "stop_app",
            Self::JoinCluster => "join_cluster",
            Self::StartApp => "start_app",
            Self::ForgetClusterNode => "forget_cluster_node",
            Self::Reset => "reset",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

/// Outcome of one issued step.
#[derive(Debug)]
pub struct StepRecord {
    pub step: Step,

    /// Node the step was directed at; `None` for the local node.
    pub target: Option<NodeName>,

    pub error: Option<CommandError>,
}

impl StepRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// One run of the join sequence against a candidate.
#[derive(Debug)]
pub struct JoinAttempt {
    pub candidate: NodeName,
    pub steps: Vec<StepRecord>,
}

impl JoinAttempt {
    /// The attempt succeeded if both stop and join succeeded.
    ///
    /// A failed restart afterwards is logged but does not undo the join.
    pub fn succeeded(&self) -> bool {
        let ok = |step: Step| {
            self.steps
                .iter()
                .any(|record| record.step == step && record.succeeded())
        };
        ok(Step::StopApp) && ok(Step::JoinCluster)
    }
}

/// Result of removing one node.
#[derive(Debug)]
pub struct ForgetOutcome {
    pub target: NodeName,
    pub steps: Vec<StepRecord>,
}

impl ForgetOutcome {
    /// True if `forget_cluster_node` succeeded for the target.
    pub fn forgotten(&self) -> bool {
        self.steps
            .iter()
            .any(|record| record.step == Step::ForgetClusterNode && record.succeeded())
    }
}

/// What applying a decision achieved.
#[derive(Debug)]
pub enum ApplyResult {
    /// The decision required no commands.
    NothingToDo,

    /// Joined the cluster through `node`.
    Joined {
        node: NodeName,
        attempts: Vec<JoinAttempt>,
    },

    /// Every join candidate failed.
    Unresolvable { attempts: Vec<JoinAttempt> },

    /// Per-target forget outcomes, in target order.
    Forgot { outcomes: Vec<ForgetOutcome> },
}

impl ApplyResult {
    /// Returns true if everything the decision asked for was done.
    pub fn is_success(&self) -> bool {
        match self {
            Self::NothingToDo | Self::Joined { .. } => true,
            Self::Unresolvable { .. } => false,
            Self::Forgot { outcomes } => outcomes.iter().all(ForgetOutcome::forgotten),
        }
    }

    /// Every step issued, in order.
    pub fn steps(&self) -> Vec<&StepRecord> {
        match self {
            Self::NothingToDo => Vec::new(),
            Self::Joined { attempts, .. } | Self::Unresolvable { attempts } => {
                attempts.iter().flat_map(|a| a.steps.iter()).collect()
            }
            Self::Forgot { outcomes } => outcomes.iter().flat_map(|o| o.steps.iter()).collect(),
        }
    }
}

/// Controller settings.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Reset a forgotten node's persisted state before restarting it.
    pub reset_forgotten: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            reset_forgotten: true,
        }
    }
}

/// Drives membership changes through a [`CommandExecutor`].
pub struct ClusterController<E> {
    executor: E,
    config: ControllerConfig,
}

impl<E: CommandExecutor> ClusterController<E> {
    pub fn new(executor: E, config: ControllerConfig) -> Self {
        Self { executor, config }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Apply a decision, issuing commands strictly in sequence.
    pub async fn apply(&self, decision: &Decision) -> ApplyResult {
        match decision {
            Decision::AlreadyClustered | Decision::NoOp { .. } => ApplyResult::NothingToDo,
            Decision::Join { candidates } => self.join(candidates).await,
            Decision::Forget { targets } => self.forget(targets).await,
        }
    }

    async fn join(&self, candidates: &[NodeName]) -> ApplyResult {
        let mut attempts = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            info!(node = %candidate, "Attempting to join with node");
            let attempt = self.join_sequence(candidate).await;

            if attempt.succeeded() {
                info!(node = %candidate, "Joined cluster");
                attempts.push(attempt);
                return ApplyResult::Joined {
                    node: candidate.clone(),
                    attempts,
                };
            }

            attempts.push(attempt);
        }

        warn!(candidates = candidates.len(), "Node could not be clustered");
        ApplyResult::Unresolvable { attempts }
    }

    /// stop_app, join_cluster, then start_app no matter what happened before.
    async fn join_sequence(&self, candidate: &NodeName) -> JoinAttempt {
        let mut steps = Vec::with_capacity(3);

        let stop = self.step(Step::StopApp, &[], Target::Local).await;
        if let Some(e) = &stop.error {
            error!(node = %candidate, error = %e, "Failed to stop local application before join");
        }
        let stopped = stop.succeeded();
        steps.push(stop);

        if stopped {
            let join = self
                .step(Step::JoinCluster, &[candidate.as_str()], Target::Local)
                .await;
            if let Some(e) = &join.error {
                error!(node = %candidate, error = %e, "Join request failed");
            }
            steps.push(join);
        }

        let start = self.step(Step::StartApp, &[], Target::Local).await;
        if let Some(e) = &start.error {
            error!(error = %e, "Failed to restart local application");
        }
        steps.push(start);

        JoinAttempt {
            candidate: candidate.clone(),
            steps,
        }
    }

    async fn forget(&self, targets: &NodeSet) -> ApplyResult {
        let mut outcomes = Vec::with_capacity(targets.len());
        for target in targets {
            outcomes.push(self.forget_one(target).await);
        }
        ApplyResult::Forgot { outcomes }
    }

    async fn forget_one(&self, target: &NodeName) -> ForgetOutcome {
        info!(node = %target, "Forgetting cluster node");
        let remote = Target::Node(target);
        let mut steps = Vec::with_capacity(4);

        // The node may already be down.
        let stop = self.step(Step::StopApp, &[], remote).await;
        if let Some(e) = &stop.error {
            warn!(node = %target, error = %e, "Could not stop application on forgotten node");
        }
        steps.push(stop);

        let forget = self
            .step(Step::ForgetClusterNode, &[target.as_str()], Target::Local)
            .await;
        if let Some(e) = &forget.error {
            // Still a member: leave it stopped rather than reset it.
            error!(node = %target, error = %e, "Failed to forget cluster node");
            steps.push(forget);
            return ForgetOutcome {
                target: target.clone(),
                steps,
            };
        }
        info!(node = %target, "Forgot cluster node");
        steps.push(forget);

        if self.config.reset_forgotten {
            let reset = self.step(Step::Reset, &[], remote).await;
            if let Some(e) = &reset.error {
                warn!(node = %target, error = %e, "Could not reset forgotten node");
            }
            steps.push(reset);
        }

        let start = self.step(Step::StartApp, &[], remote).await;
        if let Some(e) = &start.error {
            warn!(node = %target, error = %e, "Could not start application on forgotten node");
        }
        steps.push(start);

        ForgetOutcome {
            target: target.clone(),
            steps,
        }
    }

    async fn step(&self, step: Step, extra: &[&str], target: Target<'_>) -> StepRecord {
        let mut args = Vec::with_capacity(extra.len() + 1);
        args.push(step.command());
        args.extend_from_slice(extra);

        debug!(%step, %target, "Issuing step");
        let error = self.executor.run(&args, target).await.err();
        if let Some(e) = &error {
            debug!(command = e.command(), exit_code = ?e.exit_code(), "Step failed");
        }

        StepRecord {
            step,
            target: target.node().cloned(),
            error,
        }
    }
}
