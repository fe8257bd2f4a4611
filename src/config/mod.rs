//! Configuration loading and YAML merging.
//!
//! - Schema definitions in [`schema`]
//! - File loading and validation in [`loader`]
//! - Deep merging of values files in [`merger`]
//!
//! # Example
//!
//! ```
//! use pipewright::config::load_job;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let job_file = temp.path().join("job.yaml");
//! fs::write(&job_file, "workspace: ws\nsteps: []\n").unwrap();
//!
//! let job = load_job(&job_file).unwrap();
//! assert!(job.steps.is_empty());
//! ```

pub mod loader;
pub mod merger;
pub mod schema;

pub use loader::{load_agent_config, load_job, validate_agent_config, STORAGE_PATH_ENV};
pub use merger::{deep_merge, merge_configs, merge_yaml_documents};
pub use schema::{AgentConfig, CodeHost, CodeHostKind, JobSpec};
