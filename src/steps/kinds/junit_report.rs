//! JUnit report collection.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipewrightError, Result};
use crate::steps::context::JobContext;
use crate::steps::executor::StepExecutor;
use crate::steps::kinds::archive::upload_file;

/// Collects JUnit XML reports and uploads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JunitReportStep {
    /// Report directory, relative to the workspace; searched recursively.
    pub report_dir: String,
    /// Destination directory, relative to the storage mount.
    pub dest_dir: String,
}

impl Default for JunitReportStep {
    fn default() -> Self {
        Self {
            report_dir: String::new(),
            dest_dir: "junit".to_string(),
        }
    }
}

/// Test counts read from a set of reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JunitSummary {
    pub tests: usize,
    pub failures: usize,
}

impl JunitSummary {
    /// Count test cases and failures in one report's text.
    pub fn from_report(xml: &str) -> Self {
        Self {
            tests: xml.matches("<testcase").count(),
            failures: xml.matches("<failure").count() + xml.matches("<error").count(),
        }
    }
}

impl StepExecutor for JunitReportStep {
    fn run(&self, step: &str, ctx: &mut JobContext) -> Result<()> {
        let report_dir = ctx.resolve(&self.report_dir);
        let reports = find_reports(&report_dir)?;
        if reports.is_empty() {
            return Err(PipewrightError::StepExecutionError {
                step: step.to_string(),
                message: format!("no junit report found in {}", report_dir.display()),
            });
        }

        let dest_dir = ctx.storage(&self.dest_dir);
        let mut summary = JunitSummary::default();
        for report in &reports {
            let text = fs::read_to_string(report)?;
            let counts = JunitSummary::from_report(&text);
            summary.tests += counts.tests;
            summary.failures += counts.failures;
            let nested = report
                .strip_prefix(&report_dir)
                .ok()
                .and_then(Path::parent)
                .map_or_else(|| dest_dir.clone(), |parent| dest_dir.join(parent));
            upload_file(step, report, &nested)?;
        }

        ctx.output.emit(&format!(
            "Collected {} junit report(s): {} tests, {} failures",
            reports.len(),
            summary.tests,
            summary.failures
        ));
        Ok(())
    }
}

fn find_reports(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut reports = Vec::new();
    if !dir.is_dir() {
        return Ok(reports);
    }

    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "xml") {
                reports.push(path);
            }
        }
    }

    reports.sort();
    Ok(reports)
}
