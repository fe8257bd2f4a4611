//! Command-line interface for pipewright.
//!
//! # Architecture
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, MergeArgs, RunArgs, SyncArgs};
pub use commands::{Command, CommandDispatcher, CommandResult};
