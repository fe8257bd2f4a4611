//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pipewright - CI job agent.
#[derive(Debug, Parser)]
#[command(name = "pipewright")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the agent config file
    #[arg(short, long, global = true, env = "PIPEWRIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the steps of a job
    Run(RunArgs),

    /// Fetch values files from a repository and merge them
    Merge(MergeArgs),

    /// Check a stored values document against its source
    Sync(SyncArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Job description file
    #[arg(short, long)]
    pub job: PathBuf,
}

/// Arguments for the `merge` command.
#[derive(Debug, Clone, clap::Args)]
pub struct MergeArgs {
    /// Code host id from the agent config
    #[arg(long, default_value_t = 0)]
    pub codehost_id: i64,

    /// Repository owner
    #[arg(long, default_value = "")]
    pub owner: String,

    /// Repository name
    #[arg(long, default_value = "")]
    pub repo: String,

    /// Branch to read from
    #[arg(long, default_value = "")]
    pub branch: String,

    /// Namespace (defaults to the owner)
    #[arg(long, default_value = "")]
    pub namespace: String,

    /// Link to a public repository, instead of a code host
    #[arg(long, default_value = "")]
    pub repo_link: String,

    /// Values files, lowest precedence first
    #[arg(required = true)]
    pub paths: Vec<String>,
}

/// Arguments for the `sync` command.
#[derive(Debug, Clone, clap::Args)]
pub struct SyncArgs {
    /// Values source descriptor (YAML)
    #[arg(long)]
    pub source: PathBuf,

    /// File holding the currently stored values
    #[arg(long)]
    pub current: PathBuf,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}
