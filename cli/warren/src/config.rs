//! Configuration file loading and merging with command-line flags.
//!
//! The file is optional. Anything other than `.toml`, `.json` or `.yaml`
//! is read as INI, e.g.:
//!
//! ```ini
//! [cluster]
//! nodes = rabbit@mq1, rabbit@mq2 rabbit@mq3
//! rabbitmqctl = /usr/sbin/rabbitmqctl
//! timeout_secs = 30
//! reset_forgotten = true
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use ::config::{File, FileFormat};
use serde::Deserialize;
use warren_reconcile::process::{DEFAULT_PROGRAM, DEFAULT_TIMEOUT};
use warren_reconcile::{NodeName, NodeSet};

use crate::cli::Cli;

/// Contents of the config file.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub cluster: ClusterSection,
}

/// The `[cluster]` section.
#[derive(Debug, Default, Deserialize)]
pub struct ClusterSection {
    #[serde(default)]
    pub nodes: Option<NodeList>,

    #[serde(default)]
    pub rabbitmqctl: Option<String>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub reset_forgotten: Option<bool>,
}

/// Node list given either as one delimited string or as an array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NodeList {
    Delimited(String),
    List(Vec<String>),
}

impl NodeList {
    /// Node names, split on commas and whitespace.
    pub fn names(&self) -> Vec<NodeName> {
        let split = |s: &str| -> Vec<NodeName> {
            s.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|part| !part.is_empty())
                .map(NodeName::from_raw)
                .collect()
        };

        match self {
            Self::Delimited(s) => split(s),
            Self::List(items) => items.iter().flat_map(|s| split(s)).collect(),
        }
    }
}

impl FileConfig {
    /// Load a config file, picking the format from its extension.
    pub fn load(path: &Path) -> Result<Self> {
        let format = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("json") => FileFormat::Json,
            Some("yaml" | "yml") => FileFormat::Yaml,
            _ => FileFormat::Ini,
        };
        let name = path
            .to_str()
            .with_context(|| format!("Config path is not valid UTF-8: {:?}", path))?;

        ::config::Config::builder()
            .add_source(File::new(name, format))
            .build()
            .with_context(|| format!("Failed to read config from {:?}", path))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse config from {:?}", path))
    }
}

/// Effective settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub expected: NodeSet,
    pub forget: NodeSet,
    pub rabbitmqctl: String,
    pub timeout: Duration,
    pub reset_forgotten: bool,
}

impl Settings {
    /// Merge flags over the config file. Node lists are unioned.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self> {
        let section = file.cluster;

        let mut expected: NodeSet = cli.nodes.iter().map(|n| NodeName::from_raw(n)).collect();
        if let Some(nodes) = &section.nodes {
            expected.extend(nodes.names());
        }

        let forget = cli.forget.iter().map(|n| NodeName::from_raw(n)).collect();

        let rabbitmqctl = cli
            .rabbitmqctl
            .clone()
            .or(section.rabbitmqctl)
            .unwrap_or_else(|| DEFAULT_PROGRAM.to_string());

        let timeout = match cli.timeout.or(section.timeout_secs) {
            Some(0) => bail!("timeout_secs must be at least 1"),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TIMEOUT,
        };

        let reset_forgotten = !cli.no_reset && section.reset_forgotten.unwrap_or(true);

        Ok(Self {
            expected,
            forget,
            rabbitmqctl,
            timeout,
            reset_forgotten,
        })
    }

    /// Load the config file named by `cli`, if any, and merge.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, file)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;

    use super::*;

    fn names(list: &[&str]) -> NodeSet {
        list.iter().map(|n| NodeName::from(*n)).collect()
    }

    fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_ini() {
        let file = write_config(
            ".conf",
            "[cluster]\nnodes = rabbit@b, rabbit@c rabbit@d\ntimeout_secs = 15\nreset_forgotten = false\n",
        );

        let config = FileConfig::load(file.path()).unwrap();

        let nodes = config.cluster.nodes.unwrap().names();
        assert_eq!(
            nodes.into_iter().collect::<NodeSet>(),
            names(&["rabbit@b", "rabbit@c", "rabbit@d"])
        );
        assert_eq!(config.cluster.timeout_secs, Some(15));
        assert_eq!(config.cluster.reset_forgotten, Some(false));
    }

    #[test]
    fn test_load_toml_array() {
        let file = write_config(
            ".toml",
            "[cluster]\nnodes = [\"rabbit@b\", \"rabbit@c\"]\nrabbitmqctl = \"/opt/rabbitmqctl\"\n",
        );

        let config = FileConfig::load(file.path()).unwrap();

        let nodes = config.cluster.nodes.unwrap().names();
        assert_eq!(nodes, vec![NodeName::from("rabbit@b"), NodeName::from("rabbit@c")]);
        assert_eq!(config.cluster.rabbitmqctl.as_deref(), Some("/opt/rabbitmqctl"));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = FileConfig::load(Path::new("/nonexistent/warren.conf")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn test_resolve_unions_nodes_and_prefers_flags() {
        let cli = Cli::parse_from([
            "warren",
            "--timeout",
            "5",
            "--rabbitmqctl",
            "sudo rabbitmqctl",
            "rabbit@a",
            "'rabbit@b'",
        ]);
        let file = FileConfig {
            cluster: ClusterSection {
                nodes: Some(NodeList::Delimited("rabbit@b,rabbit@c".to_string())),
                rabbitmqctl: Some("/usr/sbin/rabbitmqctl".to_string()),
                timeout_secs: Some(30),
                reset_forgotten: None,
            },
        };

        let settings = Settings::resolve(&cli, file).unwrap();

        assert_eq!(settings.expected, names(&["rabbit@a", "rabbit@b", "rabbit@c"]));
        assert_eq!(settings.rabbitmqctl, "sudo rabbitmqctl");
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert!(settings.reset_forgotten);
        assert!(settings.forget.is_empty());
    }

    #[test]
    fn test_resolve_defaults() {
        let cli = Cli::parse_from(["warren", "--no-reset", "--forget", "rabbit@x"]);

        let settings = Settings::resolve(&cli, FileConfig::default()).unwrap();

        assert!(settings.expected.is_empty());
        assert_eq!(settings.forget, names(&["rabbit@x"]));
        assert_eq!(settings.rabbitmqctl, DEFAULT_PROGRAM);
        assert_eq!(settings.timeout, DEFAULT_TIMEOUT);
        assert!(!settings.reset_forgotten);
    }

    #[test]
    fn test_resolve_rejects_zero_file_timeout() {
        let cli = Cli::parse_from(["warren"]);
        let file = write_config(".conf", "[cluster]\ntimeout_secs = 0\n");

        let err = Settings::resolve(&cli, FileConfig::load(file.path()).unwrap()).unwrap_err();

        assert!(err.to_string().contains("timeout_secs"));
    }
}
