//! Error types for pipewright operations.
//!
//! This module defines [`PipewrightError`], the primary error type used
//! throughout the agent, the per-fragment [`FetchError`], the
//! [`AggregatedFetchError`] produced by the values merger, and a [`Result`]
//! type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `PipewrightError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `PipewrightError::Other`) for unexpected errors
//! - Fetch failures always carry the path that failed

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pipewright operations.
#[derive(Debug, Error)]
pub enum PipewrightError {
    /// Job referenced a step type no executor is registered for.
    #[error("Step '{step}': step type '{step_type}' does not match any known type")]
    StepTypeUnknown { step: String, step_type: String },

    /// Step payload could not be decoded for its declared type.
    #[error("Step '{step}' has an invalid spec: {message}")]
    InvalidStepSpec { step: String, message: String },

    /// Step execution failed.
    #[error("Step '{step}' failed: {message}")]
    StepExecutionError { step: String, message: String },

    /// Command exited unsuccessfully.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// Command could not be started or waited on.
    #[error("Failed to run {command}: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A single values file could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// One or more values files could not be fetched.
    #[error(transparent)]
    AggregatedFetch(#[from] AggregatedFetchError),

    /// The YAML merge rejected the combined input.
    #[error("Failed to merge files: {message}")]
    MergeError { message: String },

    /// A referenced record does not exist.
    #[error("{kind} '{id}' not found")]
    LookupError { kind: String, id: String },

    /// Structural comparison of two documents failed.
    #[error("Failed to compare yaml documents: {message}")]
    CompareError { message: String },

    /// The source detail attached to a values source could not be decoded.
    #[error("Invalid source detail: {message}")]
    SourceDetailInvalid { message: String },

    /// No code host is configured under the given id.
    #[error("Code host {id} is not configured")]
    CodeHostNotFound { id: i64 },

    /// Materialising the local working copy of a repository failed.
    #[error("Failed to sync working copy of '{repo}': {message}")]
    WorkingCopySync { repo: String, message: String },

    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for pipewright operations.
pub type Result<T> = std::result::Result<T, PipewrightError>;

/// Failure to fetch one values file.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Remote download from a git host failed.
    #[error("failed to download file from git, path {path}: {source}")]
    Download {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// Reading the file from the local working copy failed.
    #[error("failed to read file from git repo, relative path {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// The path the failed fetch was for, as displayed to users.
    pub fn path(&self) -> String {
        match self {
            FetchError::Download { path, .. } => path.clone(),
            FetchError::Read { path, .. } => path.display().to_string(),
        }
    }
}

/// Every failure of a concurrent fetch, in caller order.
#[derive(Debug)]
pub struct AggregatedFetchError {
    failures: Vec<FetchError>,
}

impl AggregatedFetchError {
    /// Wrap a non-empty list of failures.
    pub fn new(failures: Vec<FetchError>) -> Self {
        Self { failures }
    }

    /// All failures.
    pub fn failures(&self) -> &[FetchError] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for AggregatedFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.failures.len() == 1 {
            "error"
        } else {
            "errors"
        };
        write!(f, "{} {} occurred:", self.failures.len(), noun)?;
        for failure in &self.failures {
            write!(f, "\n\t* {}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregatedFetchError {}
