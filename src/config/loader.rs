//! Configuration file loading and validation.
//!
//! Agent configuration is optional: without a file the defaults apply.
//! Job files are always required.

use crate::config::schema::{AgentConfig, JobSpec};
use crate::error::{PipewrightError, Result};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding [`AgentConfig::storage_path`].
pub const STORAGE_PATH_ENV: &str = "PIPEWRIGHT_STORAGE_PATH";

/// Parse a YAML file into `T`.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
fn load_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(PipewrightError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|e| PipewrightError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load the agent configuration.
///
/// With no path the defaults are used. Environment overrides are applied
/// afterwards and the result is validated.
pub fn load_agent_config(path: Option<&Path>) -> Result<AgentConfig> {
    let mut config = match path {
        Some(path) => load_yaml_file(path)?,
        None => AgentConfig::default(),
    };

    if let Ok(storage) = std::env::var(STORAGE_PATH_ENV) {
        if !storage.is_empty() {
            config.storage_path = PathBuf::from(storage);
        }
    }

    validate_agent_config(&config)?;
    Ok(config)
}

/// Check an agent configuration for structural problems.
pub fn validate_agent_config(config: &AgentConfig) -> Result<()> {
    if config.storage_path.as_os_str().is_empty() {
        return Err(PipewrightError::ConfigValidationError {
            message: "storage_path must not be empty".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for host in &config.code_hosts {
        if !seen.insert(host.id) {
            return Err(PipewrightError::ConfigValidationError {
                message: format!("duplicate code host id {}", host.id),
            });
        }
        if host.address.trim().is_empty() {
            return Err(PipewrightError::ConfigValidationError {
                message: format!("code host {} has no address", host.id),
            });
        }
    }

    Ok(())
}

/// Load a job description.
///
/// A relative workspace is resolved against the job file's directory.
pub fn load_job(path: &Path) -> Result<JobSpec> {
    let mut job: JobSpec = load_yaml_file(path)?;

    if job.workspace.is_relative() {
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        job.workspace = base.join(&job.workspace);
    }

    for step in &job.steps {
        if step.name.trim().is_empty() {
            return Err(PipewrightError::ConfigValidationError {
                message: format!("a step of type '{}' has no name", step.step_type),
            });
        }
    }

    Ok(job)
}
