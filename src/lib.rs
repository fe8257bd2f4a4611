//! Pipewright - CI job agent.
//!
//! Pipewright runs the ordered steps of a CI job inside one workspace,
//! masking secrets in everything it prints, and resolves Helm-style values
//! files by fetching them concurrently from code hosts and merging them.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Agent and job configuration, YAML merging
//! - [`error`] - Error types and result aliases
//! - [`runner`] - Sequential step execution with on-failure semantics
//! - [`secrets`] - Secret masking
//! - [`shell`] - Command execution with redacted live output
//! - [`steps`] - Step kinds and their executors
//! - [`values`] - Values file merging and drift detection
//!
//! # Example
//!
//! ```
//! use pipewright::secrets::{mask_secret_envs, mask_secrets};
//!
//! assert_eq!(mask_secrets("token123 visiting", &["token123"]), "******** visiting");
//! assert_eq!(
//!     mask_secret_envs("export KEY=SECRETVAL\n", &["KEY=SECRETVAL"]),
//!     "export KEY=********\n"
//! );
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod secrets;
pub mod shell;
pub mod steps;
pub mod values;

pub use error::{PipewrightError, Result};
