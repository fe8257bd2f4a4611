//! Merge command implementation.
//!
//! The `pipewright merge` command fetches values files from one repository
//! and prints them merged, later files taking precedence.

use crate::cli::args::MergeArgs;
use crate::config::AgentConfig;
use crate::error::{PipewrightError, Result};
use crate::values::{ConcurrentFetchMerger, GitWorkingCopy, HttpRepoDownloader, RepoCoordinates};

use super::dispatcher::{Command, CommandResult};
use super::display::Theme;

/// The merge command implementation.
pub struct MergeCommand<'a> {
    config: &'a AgentConfig,
    theme: &'a Theme,
    args: MergeArgs,
}

impl<'a> MergeCommand<'a> {
    /// Create a new merge command.
    pub fn new(config: &'a AgentConfig, theme: &'a Theme, args: MergeArgs) -> Self {
        Self {
            config,
            theme,
            args,
        }
    }

    /// Repository coordinates from the arguments.
    pub fn coordinates(&self) -> RepoCoordinates {
        RepoCoordinates {
            codehost_id: self.args.codehost_id,
            namespace: self.args.namespace.clone(),
            owner: self.args.owner.clone(),
            repo: self.args.repo.clone(),
            branch: self.args.branch.clone(),
            repo_link: self.args.repo_link.clone(),
        }
    }
}

impl Command for MergeCommand<'_> {
    fn execute(&self) -> Result<CommandResult> {
        let downloader = HttpRepoDownloader::new()?;
        let working_copy = GitWorkingCopy::new(&self.config.storage_path);
        let merger = ConcurrentFetchMerger::new(
            &self.config.storage_path,
            self.config,
            &downloader,
            &working_copy,
        );

        match merger.merge(&self.args.paths, &self.coordinates()) {
            Ok(merged) => {
                print!("{}", merged);
                Ok(CommandResult::success())
            }
            Err(PipewrightError::AggregatedFetch(failures)) => {
                let header = format!("{} values file(s) could not be fetched:", failures.len());
                eprintln!("{}", self.theme.error.apply_to(header));
                for failure in failures.failures() {
                    eprintln!("  {} {}", self.theme.error.apply_to("✗"), failure);
                }
                Ok(CommandResult::failure(1))
            }
            Err(e) => Err(e),
        }
    }
}
