//! Test support: a scripted executor and a status report renderer.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::CommandError;
use crate::executor::{CommandExecutor, CommandOutput, Target};
use crate::node::NodeName;
use crate::status::ClusterStatus;

/// A recorded control-interface invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Call {
    pub target: Option<NodeName>,
    pub args: Vec<String>,
}

impl Call {
    /// A call directed at the local node.
    pub fn local(args: &[&str]) -> Self {
        Self {
            target: None,
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// A call directed at `node`.
    pub fn remote(node: &str, args: &[&str]) -> Self {
        Self {
            target: Some(NodeName::from(node)),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn command_line(&self) -> String {
        let mut parts = vec!["rabbitmqctl".to_string()];
        if let Some(node) = &self.target {
            parts.push("-n".to_string());
            parts.push(node.to_string());
        }
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

#[derive(Debug, Default)]
struct Script {
    calls: Vec<Call>,
    failures: HashSet<Call>,
    responses: HashMap<Call, Vec<String>>,
}

/// Executor that records calls and replays scripted responses.
///
/// Calls succeed with empty output unless a response or failure was
/// scripted for them.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    script: Mutex<Script>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// An executor whose local `cluster_status` reports `status`.
    pub fn with_status(status: &ClusterStatus) -> Self {
        let executor = Self::new();
        executor.respond(
            Call::local(&["cluster_status"]),
            render_status(status).lines().map(str::to_string).collect(),
        );
        executor
    }

    /// Reply to `call` with `lines` on stdout.
    pub fn respond(&self, call: Call, lines: Vec<String>) {
        self.lock().responses.insert(call, lines);
    }

    /// Make `call` exit non-zero.
    pub fn fail_on(&self, call: Call) {
        self.lock().failures.insert(call);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().expect("scripted executor lock poisoned")
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn run(&self, args: &[&str], target: Target<'_>) -> Result<CommandOutput, CommandError> {
        let call = Call {
            target: target.node().cloned(),
            args: args.iter().map(|a| a.to_string()).collect(),
        };

        let mut script = self.lock();
        script.calls.push(call.clone());

        if script.failures.contains(&call) {
            return Err(CommandError::Failed {
                command: call.command_line(),
                exit_code: 1,
                stdout: Vec::new(),
                stderr: "scripted failure".to_string(),
            });
        }

        let lines = script.responses.get(&call).cloned().unwrap_or_default();
        Ok(CommandOutput::from_lines(lines))
    }
}

/// Render `status` the way `rabbitmqctl cluster_status` prints it.
pub fn render_status(status: &ClusterStatus) -> String {
    let members = status
        .members()
        .iter()
        .map(|node| format!("'{node}'"))
        .collect::<Vec<_>>()
        .join(",");

    format!(
        "Cluster status of node '{local}' ...\n\
         [{{nodes,[{{disc,[{members}]}}]}},\n \
         {{running_nodes,[{members}]}}]\n\
         ...done.\n",
        local = status.local_node(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::parse;

    #[test]
    fn test_render_status_layout() {
        let status = ClusterStatus::new(
            NodeName::from("rabbit@a"),
            [NodeName::from("rabbit@a"), NodeName::from("rabbit@b")]
                .into_iter()
                .collect(),
        );

        let text = render_status(&status);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Cluster status of node 'rabbit@a' ...");
        assert_eq!(lines[1], "[{nodes,[{disc,['rabbit@a','rabbit@b']}]},");
        assert_eq!(lines[2], " {running_nodes,['rabbit@a','rabbit@b']}]");
        assert_eq!(lines[3], "...done.");
        assert_eq!(parse(&lines).unwrap(), status);
    }

    #[tokio::test]
    async fn test_scripted_failure_and_recording() {
        let executor = ScriptedExecutor::new();
        let node = NodeName::from("rabbit@b");
        executor.fail_on(Call::remote("rabbit@b", &["stop_app"]));

        let err = executor
            .run(&["stop_app"], Target::Node(&node))
            .await
            .unwrap_err();
        assert_eq!(err.command(), "rabbitmqctl -n rabbit@b stop_app");

        executor.run(&["start_app"], Target::Local).await.unwrap();
        assert_eq!(
            executor.calls(),
            vec![
                Call::remote("rabbit@b", &["stop_app"]),
                Call::local(&["start_app"])
            ]
        );
    }
}
