//! Step records as they appear in a job description.

use serde::{Deserialize, Serialize};

/// One unit of pipeline work.
///
/// The payload stays untyped until dispatch, where it is decoded into a
/// [`StepKind`](super::StepKind) according to `step_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Display name.
    pub name: String,

    /// Type tag selecting the executor.
    #[serde(rename = "type")]
    pub step_type: String,

    /// Executor-specific payload.
    #[serde(default)]
    pub spec: serde_yaml::Value,

    /// Run this step even after an earlier step failed.
    #[serde(default)]
    pub on_failure: bool,
}

impl Step {
    /// Convenience constructor.
    pub fn new(
        name: impl Into<String>,
        step_type: impl Into<String>,
        spec: serde_yaml::Value,
    ) -> Self {
        Self {
            name: name.into(),
            step_type: step_type.into(),
            spec,
            on_failure: false,
        }
    }

    /// Mark the step to run regardless of earlier failures.
    pub fn always_run(mut self) -> Self {
        self.on_failure = true;
        self
    }
}
