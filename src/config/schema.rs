//! Configuration schema definitions.
//!
//! This module contains the structs that map to the agent configuration
//! file and to job description files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::steps::Step;

/// Agent-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Mount point of the object storage; also holds local repository copies.
    pub storage_path: PathBuf,

    /// Directory holding one `<id>.yaml` file per variable set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_sets_dir: Option<PathBuf>,

    /// Known code hosts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code_hosts: Vec<CodeHost>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            variable_sets_dir: None,
            code_hosts: Vec::new(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    std::env::temp_dir().join("pipewright").join("storage")
}

/// A source code host the agent can download values files from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeHost {
    /// Identifier referenced by repository coordinates.
    pub id: i64,

    /// Host flavour.
    #[serde(rename = "type")]
    pub kind: CodeHostKind,

    /// Base address, e.g. `https://gitlab.example.com`.
    pub address: String,

    /// Default namespace on the host.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    /// API token.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_token: String,
}

/// Flavour of a code host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeHostKind {
    Github,
    Gitlab,
    Gitee,
    /// Plain git remote; files are read from a local working copy.
    Other,
}

/// A job handed to the agent: where to run and which steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    /// Working directory shared by every step.
    pub workspace: PathBuf,

    /// Extra search paths prepended to `PATH`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<PathBuf>,

    /// Plain `KEY=VALUE` environment entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub envs: Vec<String>,

    /// Secret `KEY=VALUE` environment entries; their values are masked.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secret_envs: Vec<String>,

    /// Persist masked output to this file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// Ordered steps.
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_config_parses_code_hosts() {
        let yaml = r#"
storage_path: /data/storage
code_hosts:
  - id: 1
    type: gitlab
    address: https://gitlab.example.com
    access_token: glpat-123
  - id: 2
    type: other
    address: https://git.internal
"#;
        let config: AgentConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.storage_path, PathBuf::from("/data/storage"));
        assert_eq!(config.code_hosts.len(), 2);
        assert_eq!(config.code_hosts[0].kind, CodeHostKind::Gitlab);
        assert_eq!(config.code_hosts[1].kind, CodeHostKind::Other);
        assert!(config.code_hosts[1].access_token.is_empty());
    }

    #[test]
    fn agent_config_defaults_when_empty() {
        let config: AgentConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.code_hosts.is_empty());
        assert!(config.storage_path.ends_with("storage"));
    }

    #[test]
    fn job_spec_parses_steps_in_order() {
        let yaml = r#"
workspace: /workspace
envs: [CI=true]
secret_envs: [TOKEN=abc]
steps:
  - name: checkout
    type: git
    spec:
      repos: []
  - name: build
    type: shell
    spec:
      scripts: [make]
  - name: report
    type: junit_report
    on_failure: true
    spec:
      report_dir: reports
"#;
        let job: JobSpec = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(job.steps.len(), 3);
        assert_eq!(job.steps[0].name, "checkout");
        assert_eq!(job.steps[1].step_type, "shell");
        assert!(!job.steps[1].on_failure);
        assert!(job.steps[2].on_failure);
        assert_eq!(job.secret_envs, vec!["TOKEN=abc".to_string()]);
        assert!(job.log_file.is_none());
    }
}
