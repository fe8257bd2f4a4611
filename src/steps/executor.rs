//! The executor capability and per-step reporting.

use crate::error::Result;
use crate::steps::context::JobContext;
use std::time::Duration;

/// Something that can run one kind of step to completion.
///
/// Executors block until done; there is no per-step timeout or cancellation.
pub trait StepExecutor {
    /// Run the step named `step` inside `ctx`.
    fn run(&self, step: &str, ctx: &mut JobContext) -> Result<()>;
}

/// Outcome of a step within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Step ran and succeeded.
    Completed,

    /// Step ran and failed.
    Failed,

    /// Step was not dispatched because an earlier step failed.
    Skipped,
}

impl StepStatus {
    /// Get a display character for this status.
    pub fn display_char(&self) -> char {
        match self {
            StepStatus::Completed => '✓',
            StepStatus::Failed => '✗',
            StepStatus::Skipped => '⊘',
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}

/// What happened to one step.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Step name.
    pub name: String,

    /// Declared step type.
    pub step_type: String,

    /// Final status.
    pub status: StepStatus,

    /// Execution duration (zero when skipped).
    pub duration: Duration,

    /// Error message (if failed).
    pub error: Option<String>,
}

impl StepReport {
    /// Generate a summary line for display.
    pub fn summary_line(&self) -> String {
        match self.status {
            StepStatus::Completed => format!(
                "{} {} ({})",
                self.status.display_char(),
                self.name,
                format_duration(self.duration)
            ),
            StepStatus::Skipped => {
                format!("{} {} (skipped)", self.status.display_char(), self.name)
            }
            StepStatus::Failed => {
                let error = self.error.as_deref().unwrap_or("unknown error");
                format!("{} {} - {}", self.status.display_char(), self.name, error)
            }
        }
    }
}

/// Format a duration for summaries.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}.{}s", secs, millis / 100)
    } else {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    }
}
