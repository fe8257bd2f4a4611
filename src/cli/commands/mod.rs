//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results. Commands are
//! routed by [`CommandDispatcher`], which also loads the agent config once
//! for all of them.

pub mod dispatcher;
pub mod display;
pub mod merge;
pub mod run;
pub mod sync;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
