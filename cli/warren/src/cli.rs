//! Command-line interface.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::debug;
use warren_reconcile::{ControllerConfig, Rabbitmqctl, Reconciler};

use crate::config::Settings;
use crate::error::ExitStatus;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Checks the current cluster status of the local RabbitMQ node. If the
/// node is unclustered, tries to cluster it with the given nodes; nodes the
/// cluster knows about but that are no longer expected are forgotten.
#[derive(Debug, Parser)]
#[command(name = "warren")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Nodes expected in the cluster (e.g. rabbit@mq2).
    #[arg(value_name = "NODES")]
    pub nodes: Vec<String>,

    /// Config file with a [cluster] section.
    #[arg(short, long, env = "WARREN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Remove a node from the cluster. May be repeated.
    #[arg(long, value_name = "NODE")]
    pub forget: Vec<String>,

    /// Control interface command, optionally with a wrapper
    /// (e.g. "sudo -u rabbitmq rabbitmqctl"). Split on whitespace.
    #[arg(long, env = "WARREN_RABBITMQCTL")]
    pub rabbitmqctl: Option<String>,

    /// Timeout in seconds for each control interface call.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Do not reset forgotten nodes before restarting them.
    #[arg(long)]
    pub no_reset: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Run one reconciliation pass.
    pub async fn run(self) -> Result<ExitStatus> {
        let settings = Settings::load(&self)?;
        debug!(?settings, "Settings resolved");

        let executor =
            Rabbitmqctl::from_command_line(&settings.rabbitmqctl).with_timeout(settings.timeout);
        let reconciler = Reconciler::new(
            executor,
            ControllerConfig {
                reset_forgotten: settings.reset_forgotten,
            },
        );

        let status = match reconciler
            .run_pass(&settings.expected, &settings.forget)
            .await
        {
            Ok(report) => ExitStatus::from(report.outcome()),
            Err(_) => ExitStatus::StatusFailed,
        };

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::CommandFactory;

    use super::*;

    const STANDALONE_STATUS: &str = r#"
        echo "Cluster status of node 'rabbit@a' ..."
        echo "[{nodes,[{disc,['rabbit@a']}]},{running_nodes,['rabbit@a']}]"
        echo "...done."
    "#;

    /// Shell script standing in for rabbitmqctl.
    fn stand_in(script: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".sh").tempfile().unwrap();
        file.write_all(script.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn cli_with(script: &tempfile::NamedTempFile, nodes: &[&str]) -> Cli {
        let mut args = vec![
            "warren".to_string(),
            "--rabbitmqctl".to_string(),
            format!("sh {}", script.path().display()),
        ];
        args.extend(nodes.iter().map(|n| n.to_string()));
        Cli::parse_from(args)
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_full_flag_set() {
        let cli = Cli::try_parse_from([
            "warren",
            "-v",
            "--log-format",
            "json",
            "--forget",
            "rabbit@x",
            "--forget",
            "rabbit@y",
            "--timeout",
            "10",
            "rabbit@b",
            "rabbit@c",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.forget, vec!["rabbit@x", "rabbit@y"]);
        assert_eq!(cli.timeout, Some(10));
        assert_eq!(cli.nodes, vec!["rabbit@b", "rabbit@c"]);
        assert!(!cli.no_reset);
    }

    #[test]
    fn test_rejects_bad_timeout() {
        assert!(Cli::try_parse_from(["warren", "--timeout", "soon"]).is_err());
        assert!(Cli::try_parse_from(["warren", "--timeout", "0"]).is_err());
    }

    #[tokio::test]
    async fn test_run_clustered_node_succeeds() {
        let script = stand_in(&format!(
            "case \"$1\" in cluster_status) {} ;; *) exit 1 ;; esac\n",
            r#"echo "Cluster status of node 'rabbit@a' ..."; echo "[{nodes,[{disc,['rabbit@a','rabbit@b']}]}]"; echo "...done.""#
        ));

        let status = cli_with(&script, &["rabbit@b"]).run().await.unwrap();

        assert_eq!(status, ExitStatus::Success);
    }

    #[tokio::test]
    async fn test_run_failed_join_is_unresolved() {
        let script = stand_in(&format!(
            "case \"$1\" in\n  cluster_status) {STANDALONE_STATUS} ;;\n  join_cluster) exit 1 ;;\nesac\n"
        ));

        let status = cli_with(&script, &["rabbit@b"]).run().await.unwrap();

        assert_eq!(status, ExitStatus::Unresolved);
        assert_eq!(status.code(), 1);
    }

    #[tokio::test]
    async fn test_run_failed_status_query() {
        let script = stand_in("echo 'Error: unable to connect to node' >&2\nexit 69\n");

        let status = cli_with(&script, &["rabbit@b"]).run().await.unwrap();

        assert_eq!(status, ExitStatus::StatusFailed);
        assert_eq!(status.code(), 2);
    }

    #[tokio::test]
    async fn test_run_unparseable_status() {
        let script = stand_in("echo 'Cluster status of node rabbit@a ...'\necho 'Error: oops'\n");

        let status = cli_with(&script, &[]).run().await.unwrap();

        assert_eq!(status, ExitStatus::StatusFailed);
    }
}
