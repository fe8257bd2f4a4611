//! Sync command implementation.
//!
//! The `pipewright sync` command checks whether a stored values document has
//! drifted from its source.

use std::fs;

use crate::cli::args::SyncArgs;
use crate::config::AgentConfig;
use crate::error::{PipewrightError, Result};
use crate::values::{CustomYaml, DirVariableSetStore, HttpRepoDownloader, ValueSourceSyncer};

use super::dispatcher::{Command, CommandResult};

/// The sync command implementation.
pub struct SyncCommand<'a> {
    config: &'a AgentConfig,
    args: SyncArgs,
}

impl<'a> SyncCommand<'a> {
    /// Create a new sync command.
    pub fn new(config: &'a AgentConfig, args: SyncArgs) -> Self {
        Self { config, args }
    }

    fn load_source(&self) -> Result<CustomYaml> {
        let content = fs::read_to_string(&self.args.source)?;
        serde_yaml::from_str(&content).map_err(|e| PipewrightError::ConfigParseError {
            path: self.args.source.clone(),
            message: e.to_string(),
        })
    }
}

impl Command for SyncCommand<'_> {
    fn execute(&self) -> Result<CommandResult> {
        let source = self.load_source()?;
        let current = fs::read_to_string(&self.args.current)?;

        let downloader = HttpRepoDownloader::new()?;
        let sets_dir = self
            .config
            .variable_sets_dir
            .clone()
            .unwrap_or_else(|| self.config.storage_path.join("variable_sets"));
        let variable_sets = DirVariableSetStore::new(sets_dir);
        let syncer = ValueSourceSyncer::new(self.config, &downloader, &variable_sets);

        let outcome = syncer.sync_yaml_from_source(Some(&source), &current)?;

        if self.args.json {
            let json = serde_json::to_string_pretty(&outcome).map_err(anyhow::Error::from)?;
            println!("{}", json);
        } else if outcome.changed {
            println!("changed");
            print!("{}", outcome.value);
        } else {
            println!("unchanged");
        }

        Ok(CommandResult::success())
    }
}
