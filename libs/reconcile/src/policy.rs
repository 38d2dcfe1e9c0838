//! Membership policy: what to do given a status report and the expected set.
//!
//! Rules are evaluated in priority order:
//!
//! 1. An explicit forget request always wins.
//! 2. Members equal to the expected set means the node is clustered.
//! 3. A standalone node joins one of the other expected nodes.
//! 4. Members that are a strict superset of the expected set are pruned.
//! 5. Anything else is reported and left alone.
//!
//! The local node is always added to the expected set before comparison.

use std::fmt;

use crate::node::{display_set, NodeName, NodeSet};
use crate::status::ClusterStatus;

/// Why no action was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoOpReason {
    /// The node is standalone and no other node is expected.
    NothingToJoin,

    /// Clustered, but membership differs in a way the policy does not repair.
    PartialMembership {
        /// Expected nodes the cluster does not list.
        missing: NodeSet,
        /// Listed nodes that are not expected.
        unexpected: NodeSet,
    },
}

/// The single action chosen for a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Membership already matches.
    AlreadyClustered,

    /// Join the first candidate that accepts, in order.
    Join { candidates: Vec<NodeName> },

    /// Remove each target from the cluster.
    Forget { targets: NodeSet },

    /// Nothing to act on.
    NoOp { reason: NoOpReason },
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyClustered => f.write_str("already clustered"),
            Self::Join { candidates } => {
                let names: Vec<&str> = candidates.iter().map(NodeName::as_str).collect();
                write!(f, "join one of [{}]", names.join(", "))
            }
            Self::Forget { targets } => write!(f, "forget [{}]", display_set(targets)),
            Self::NoOp {
                reason: NoOpReason::NothingToJoin,
            } => f.write_str("no-op (standalone, no other nodes expected)"),
            Self::NoOp {
                reason: NoOpReason::PartialMembership {
                    missing,
                    unexpected,
                },
            } => write!(
                f,
                "no-op (missing [{}], unexpected [{}])",
                display_set(missing),
                display_set(unexpected)
            ),
        }
    }
}

/// Choose the action for this pass.
///
/// Join candidates are the expected nodes other than the local node, in the
/// set's lexicographic order.
pub fn decide(status: &ClusterStatus, expected: &NodeSet, forget: &NodeSet) -> Decision {
    if !forget.is_empty() {
        return Decision::Forget {
            targets: forget.clone(),
        };
    }

    let local = status.local_node();
    let members = status.members();

    let mut expected = expected.clone();
    expected.insert(local.clone());

    if *members == expected {
        return Decision::AlreadyClustered;
    }

    if status.is_standalone() {
        let candidates: Vec<NodeName> = expected.into_iter().filter(|n| n != local).collect();
        if candidates.is_empty() {
            return Decision::NoOp {
                reason: NoOpReason::NothingToJoin,
            };
        }
        return Decision::Join { candidates };
    }

    if members.is_superset(&expected) {
        return Decision::Forget {
            targets: members.difference(&expected).cloned().collect(),
        };
    }

    Decision::NoOp {
        reason: NoOpReason::PartialMembership {
            missing: expected.difference(members).cloned().collect(),
            unexpected: members.difference(&expected).cloned().collect(),
        },
    }
}
