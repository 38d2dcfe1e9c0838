//! Parsing of `rabbitmqctl cluster_status` output.
//!
//! The report has three parts:
//!
//! ```text
//! Cluster status of node 'rabbit@a' ...
//! [{nodes,[{disc,['rabbit@a','rabbit@b']},{ram,['rabbit@c']}]},
//!  {running_nodes,['rabbit@a','rabbit@b','rabbit@c']}]
//! ...done.
//! ```
//!
//! The body is a single Erlang term that the formatter may wrap over several
//! lines, so body lines are joined before matching.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{ParseError, StatusError};
use crate::executor::{CommandExecutor, Target};
use crate::node::{NodeName, NodeSet};

static HEADER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Cluster status of node (.*) \.\.\.$").expect("Invalid regex pattern")
});

static FOOTER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.\.\.done").expect("Invalid regex pattern"));

static NODES_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{nodes,\[((?:\{.*?\[.*?\]\},?)+)\]\}").expect("Invalid regex pattern")
});

static GROUP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{.*?,\[(.*?)\]\}").expect("Invalid regex pattern"));

/// A node's view of cluster membership at the time of the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterStatus {
    local_node: NodeName,
    members: NodeSet,
}

impl ClusterStatus {
    pub fn new(local_node: NodeName, members: NodeSet) -> Self {
        Self {
            local_node,
            members,
        }
    }

    /// The node that answered the query.
    pub fn local_node(&self) -> &NodeName {
        &self.local_node
    }

    /// Every node listed in the `{nodes,[...]}` section.
    pub fn members(&self) -> &NodeSet {
        &self.members
    }

    /// Returns true if the node is running on its own.
    pub fn is_standalone(&self) -> bool {
        self.members.len() == 1
    }
}

/// Parses the lines of a `cluster_status` report.
pub fn parse<S: AsRef<str>>(lines: &[S]) -> Result<ClusterStatus, ParseError> {
    let header: &str = lines.first().map(|line| line.as_ref()).unwrap_or_default();
    let local_node = HEADER_REGEX
        .captures(header)
        .and_then(|caps| caps.get(1))
        .map(|name| NodeName::from_raw(name.as_str()))
        .ok_or_else(|| ParseError::Header {
            line: header.to_string(),
        })?;

    let footer: &str = lines.last().map(|line| line.as_ref()).unwrap_or_default();
    if lines.len() < 2 || !FOOTER_REGEX.is_match(footer) {
        return Err(ParseError::Footer {
            line: footer.to_string(),
        });
    }

    let body: String = lines[1..lines.len() - 1]
        .iter()
        .map(|line| line.as_ref())
        .collect();

    let groups = NODES_REGEX
        .captures(&body)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| ParseError::NodesSection { body: body.clone() })?;

    let mut members = NodeSet::new();
    for group in GROUP_REGEX.captures_iter(groups.as_str()) {
        let names = group.get(1).map(|m| m.as_str()).unwrap_or_default();
        members.extend(
            names
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(NodeName::from_raw),
        );
    }

    Ok(ClusterStatus::new(local_node, members))
}

/// Asks the local node for its cluster status.
pub async fn query_status<E>(executor: &E) -> Result<ClusterStatus, StatusError>
where
    E: CommandExecutor + ?Sized,
{
    let output = executor.run(&["cluster_status"], Target::Local).await?;
    let status = parse(output.stdout_lines.as_slice())?;

    debug!(
        local_node = %status.local_node(),
        members = status.members().len(),
        "Parsed cluster status"
    );

    Ok(status)
}
