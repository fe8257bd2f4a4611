//! Shared display helpers for command output.

use console::Style;

use crate::steps::{format_duration, StepReport, StepStatus};

/// Styles used for command summaries.
#[derive(Debug, Clone)]
pub struct Theme {
    pub success: Style,
    pub error: Style,
    pub warning: Style,
    pub dim: Style,
    pub header: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}

impl Theme {
    /// Colored theme.
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            error: Style::new().red().bold(),
            warning: Style::new().color256(208),
            dim: Style::new().dim(),
            header: Style::new().bold().magenta(),
        }
    }

    /// Theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            error: Style::new(),
            warning: Style::new(),
            dim: Style::new(),
            header: Style::new(),
        }
    }

    /// Colored on a terminal, plain otherwise.
    pub fn detect(no_color: bool) -> Self {
        if no_color || !console::Term::stdout().is_term() {
            Self::plain()
        } else {
            Self::new()
        }
    }

    fn for_status(&self, status: StepStatus) -> &Style {
        match status {
            StepStatus::Completed => &self.success,
            StepStatus::Failed => &self.error,
            StepStatus::Skipped => &self.warning,
        }
    }
}

/// One summary line for a step, styled by status.
pub fn step_line(theme: &Theme, report: &StepReport) -> String {
    let line = report.summary_line();
    format!("  {}", theme.for_status(report.status).apply_to(line))
}

/// Totals line for a run.
pub fn totals_line(theme: &Theme, reports: &[StepReport], elapsed: chrono::Duration) -> String {
    let count = |status| reports.iter().filter(|r| r.status == status).count();
    let elapsed = elapsed.to_std().unwrap_or_default();
    format!(
        "{} completed, {} failed, {} skipped {}",
        count(StepStatus::Completed),
        count(StepStatus::Failed),
        count(StepStatus::Skipped),
        theme.dim.apply_to(format!("in {}", format_duration(elapsed)))
    )
}
