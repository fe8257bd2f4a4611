//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use crate::cli::args::{Cli, Commands};
use crate::config::{load_agent_config, AgentConfig};
use crate::error::Result;

use super::display::Theme;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command.
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    config: AgentConfig,
    theme: Theme,
}

impl CommandDispatcher {
    /// Create a dispatcher around an already loaded agent config.
    pub fn new(config: AgentConfig, theme: Theme) -> Self {
        Self { config, theme }
    }

    /// Load the agent config named on the command line.
    pub fn from_cli(cli: &Cli, theme: Theme) -> Result<Self> {
        let config = load_agent_config(cli.config.as_deref())?;
        Ok(Self::new(config, theme))
    }

    /// The agent config commands run with.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli) -> Result<CommandResult> {
        match &cli.command {
            Commands::Run(args) => {
                let cmd = super::run::RunCommand::new(&self.config, &self.theme, args.clone());
                cmd.execute()
            }
            Commands::Merge(args) => {
                let cmd = super::merge::MergeCommand::new(&self.config, &self.theme, args.clone());
                cmd.execute()
            }
            Commands::Sync(args) => {
                let cmd = super::sync::SyncCommand::new(&self.config, args.clone());
                cmd.execute()
            }
        }
    }
}
