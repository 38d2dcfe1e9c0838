//! Node names as reported by `rabbitmqctl`.

use std::collections::BTreeSet;
use std::fmt;

/// Name of a cluster participant, conventionally `name@host`.
///
/// Names are compared by exact string equality. Values coming from
/// `rabbitmqctl` output are quote-trimmed first (see [`NodeName::from_raw`]).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeName(String);

impl NodeName {
    /// Creates a node name from an exact string.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a node name from raw control-interface output.
    ///
    /// Strips one surrounding pair of single quotes. A lone stray quote on
    /// either side is kept as part of the name.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        Self(trim_quotes(raw).to_string())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn trim_quotes(raw: &str) -> &str {
    raw.strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .unwrap_or(raw)
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for NodeName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Ordered set of node names.
pub type NodeSet = BTreeSet<NodeName>;

/// Joins a set of names for log output.
pub fn display_set(nodes: &NodeSet) -> String {
    nodes
        .iter()
        .map(NodeName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
