//! Collector configuration
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - CM-6: Configuration Settings - Validated YAML configuration
//! - CM-7: Least Functionality - Only explicitly listed devices are queried

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::catalog::DEFAULT_NAMESPACE;
use crate::client::{CommandClient, FileClient, ShellClient};
use crate::error::{CollectorError, Result};

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectorConfig {
    /// Metric name prefix
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Default `tracing` filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            log_level: default_log_level(),
            targets: Vec::new(),
        }
    }
}

/// One device to poll
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Value of the `target` label
    pub name: String,
    /// Directory of captured replies
    #[serde(default)]
    pub fixtures: Option<PathBuf>,
    /// Transport program and arguments, e.g. `[ssh, router1]`
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

impl CollectorConfig {
    /// Load and validate a YAML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Parse and validate YAML configuration text
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(CollectorError::config("namespace must not be empty"));
        }
        if self.targets.is_empty() {
            return Err(CollectorError::config("at least one target is required"));
        }
        for target in &self.targets {
            target.validate()?;
        }
        Ok(())
    }
}

impl TargetConfig {
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(CollectorError::config("target name must not be empty"));
        }
        match (&self.fixtures, &self.command) {
            (Some(_), None) => Ok(()),
            (None, Some(argv)) if !argv.is_empty() => Ok(()),
            (None, Some(_)) => Err(CollectorError::config(format!(
                "target '{}': command must not be empty",
                self.name
            ))),
            _ => Err(CollectorError::config(format!(
                "target '{}': exactly one of fixtures or command is required",
                self.name
            ))),
        }
    }

    /// Transport for this target
    pub fn client(&self) -> Result<Box<dyn CommandClient>> {
        self.validate()?;
        match (&self.fixtures, &self.command) {
            (Some(dir), _) => Ok(Box::new(FileClient::new(dir.clone()))),
            (None, Some(argv)) => Ok(Box::new(ShellClient::new(argv)?)),
            (None, None) => Err(CollectorError::config(format!(
                "target '{}' has no transport",
                self.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CollectorConfig::from_yaml_str(
            r#"
targets:
  - name: router1
    fixtures: /tmp/router1
"#,
        )
        .unwrap();
        assert_eq!(config.namespace, "junos_fpc_");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.targets.len(), 1);
        assert_eq!(
            config.targets[0].fixtures.as_deref(),
            Some(Path::new("/tmp/router1"))
        );
    }

    #[test]
    fn test_full_config() {
        let config = CollectorConfig::from_yaml_str(
            r#"
namespace: lab_fpc_
log_level: debug
targets:
  - name: router1
    fixtures: /tmp/router1
  - name: router2
    command: [ssh, -o, BatchMode=yes, router2]
"#,
        )
        .unwrap();
        assert_eq!(config.namespace, "lab_fpc_");
        assert_eq!(config.log_level, "debug");
        assert_eq!(
            config.targets[1].command.as_deref(),
            Some(&["ssh".to_string(), "-o".into(), "BatchMode=yes".into(), "router2".into()][..])
        );
    }

    #[test]
    fn test_validation_errors() {
        assert!(CollectorConfig::from_yaml_str("targets: []").is_err());
        assert!(CollectorConfig::from_yaml_str(
            "namespace: ''\ntargets:\n  - name: r\n    fixtures: /tmp"
        )
        .is_err());
        assert!(CollectorConfig::from_yaml_str("targets:\n  - name: r").is_err());
        assert!(CollectorConfig::from_yaml_str(
            "targets:\n  - name: r\n    fixtures: /tmp\n    command: [ssh, r]"
        )
        .is_err());
        assert!(CollectorConfig::from_yaml_str("targets:\n  - name: r\n    command: []").is_err());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = CollectorConfig::from_yaml_str(
            "interval: 30\ntargets:\n  - name: r\n    fixtures: /tmp",
        )
        .unwrap_err();
        assert!(matches!(err, CollectorError::ConfigFormat(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collector.yaml");
        std::fs::write(&path, "targets:\n  - name: r\n    command: [ssh, r]\n").unwrap();
        let config = CollectorConfig::from_file(&path).unwrap();
        assert!(config.targets[0].client().is_ok());

        let err = CollectorConfig::from_file(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, CollectorError::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }
}
