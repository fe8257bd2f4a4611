//! Drift detection between a stored values document and its source.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{FetchError, PipewrightError, Result};
use crate::values::codehost::CodeHostLookup;
use crate::values::download::RepoDownloader;
use crate::values::equality::documents_equal;
use crate::values::source::{CustomYaml, RepoCoordinates, YamlSource};
use crate::values::variable_set::VariableSetStore;

/// Result of a sync check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Whether the source differs from the stored value.
    pub changed: bool,
    /// The source's document when changed, empty otherwise.
    pub value: String,
}

impl SyncOutcome {
    fn unchanged() -> Self {
        Self::default()
    }

    fn changed(value: String) -> Self {
        Self {
            changed: true,
            value,
        }
    }
}

/// Compares stored values documents against the source they were loaded from.
pub struct ValueSourceSyncer<'a> {
    code_hosts: &'a dyn CodeHostLookup,
    downloader: &'a dyn RepoDownloader,
    variable_sets: &'a dyn VariableSetStore,
}

impl<'a> ValueSourceSyncer<'a> {
    pub fn new(
        code_hosts: &'a dyn CodeHostLookup,
        downloader: &'a dyn RepoDownloader,
        variable_sets: &'a dyn VariableSetStore,
    ) -> Self {
        Self {
            code_hosts,
            downloader,
            variable_sets,
        }
    }

    /// Check whether `current` has drifted from `source`.
    ///
    /// Only sources with auto sync enabled are checked. A git source without
    /// repository detail is reported as unchanged.
    pub fn sync_yaml_from_source(
        &self,
        source: Option<&CustomYaml>,
        current: &str,
    ) -> Result<SyncOutcome> {
        let Some(source) = source.filter(|s| s.auto_sync) else {
            return Ok(SyncOutcome::unchanged());
        };

        match &source.source {
            YamlSource::VariableSet => self.sync_from_variable_set(source, current),
            s if s.is_git_repo() => self.sync_from_git(source, current),
            other => {
                debug!("Values source {:?} is not synced", other);
                Ok(SyncOutcome::unchanged())
            }
        }
    }

    fn sync_from_variable_set(&self, source: &CustomYaml, current: &str) -> Result<SyncOutcome> {
        let set = self.variable_sets.find(&source.source_id)?.ok_or_else(|| {
            PipewrightError::LookupError {
                kind: "variable set".to_string(),
                id: source.source_id.clone(),
            }
        })?;

        compare(set.variable_yaml, current)
    }

    fn sync_from_git(&self, source: &CustomYaml, current: &str) -> Result<SyncOutcome> {
        let detail = source.source_detail()?;
        let Some(repo) = &detail.git_repo_config else {
            warn!("Git repo config is missing; skipping values sync");
            return Ok(SyncOutcome::unchanged());
        };

        let coords = RepoCoordinates::from(repo);
        let host = self.code_hosts.code_host(coords.codehost_id)?;
        let content = self
            .downloader
            .download(Some(&host), &coords, &detail.load_path)
            .map_err(|source| FetchError::Download {
                path: detail.load_path.clone(),
                source,
            })?;

        compare(String::from_utf8_lossy(&content).into_owned(), current)
    }
}

fn compare(latest: String, current: &str) -> Result<SyncOutcome> {
    if documents_equal(&latest, current)? {
        Ok(SyncOutcome::unchanged())
    } else {
        Ok(SyncOutcome::changed(latest))
    }
}
