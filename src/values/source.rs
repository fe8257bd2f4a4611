//! Descriptors for where a values file comes from.

use serde::{Deserialize, Serialize};

use crate::error::{PipewrightError, Result};

/// Location of a repository on a code host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RepoCoordinates {
    #[serde(rename = "codehostID")]
    pub codehost_id: i64,
    pub namespace: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Direct link to a public repository; bypasses code host lookup.
    pub repo_link: String,
}

impl RepoCoordinates {
    /// The namespace when set, otherwise the owner.
    pub fn namespace_or_owner(&self) -> &str {
        if self.namespace.is_empty() {
            &self.owner
        } else {
            &self.namespace
        }
    }
}

/// Origin of a stored values document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum YamlSource {
    /// Unset; treated as a git repository.
    #[default]
    Default,
    GitRepo,
    VariableSet,
    /// Any origin this agent does not sync from.
    Other(String),
}

impl YamlSource {
    /// Whether values come from a git repository.
    pub fn is_git_repo(&self) -> bool {
        matches!(self, YamlSource::Default | YamlSource::GitRepo)
    }
}

impl From<String> for YamlSource {
    fn from(value: String) -> Self {
        match value.as_str() {
            "" => YamlSource::Default,
            "gitRepo" => YamlSource::GitRepo,
            "variableSet" => YamlSource::VariableSet,
            _ => YamlSource::Other(value),
        }
    }
}

impl From<YamlSource> for String {
    fn from(source: YamlSource) -> Self {
        match source {
            YamlSource::Default => String::new(),
            YamlSource::GitRepo => "gitRepo".to_string(),
            YamlSource::VariableSet => "variableSet".to_string(),
            YamlSource::Other(other) => other,
        }
    }
}

/// A values document together with where it should be kept in sync from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomYaml {
    pub source: YamlSource,
    pub auto_sync: bool,
    /// Variable set id, for variable-set sources.
    #[serde(rename = "sourceID")]
    pub source_id: String,
    /// Origin-specific detail; decoded with [`CustomYaml::source_detail`].
    #[serde(rename = "sourceDetail", skip_serializing_if = "Option::is_none")]
    pub raw_source_detail: Option<serde_json::Value>,
}

impl CustomYaml {
    /// Decode the source detail. Missing detail decodes to the default.
    pub fn source_detail(&self) -> Result<SourceDetail> {
        match &self.raw_source_detail {
            None | Some(serde_json::Value::Null) => Ok(SourceDetail::default()),
            Some(raw) => serde_json::from_value(raw.clone()).map_err(|e| {
                PipewrightError::SourceDetailInvalid {
                    message: e.to_string(),
                }
            }),
        }
    }
}

/// Detail of a git-hosted values file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SourceDetail {
    pub git_repo_config: Option<GitRepoConfig>,
    /// File path inside the repository.
    pub load_path: String,
}

/// Repository holding a values file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GitRepoConfig {
    #[serde(rename = "codehostID")]
    pub codehost_id: i64,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub namespace: String,
}

impl From<&GitRepoConfig> for RepoCoordinates {
    fn from(config: &GitRepoConfig) -> Self {
        Self {
            codehost_id: config.codehost_id,
            namespace: config.namespace.clone(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            repo_link: String::new(),
        }
    }
}
