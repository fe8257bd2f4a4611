//! Tool installation steps.
//!
//! Install scripts run with `TOOL_NAME`, `TOOL_VERSION` and
//! `TOOL_INSTALL_DIR` set. On success the tool's bin directory is added
//! to the search paths of every later step in the same run.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::{PipewrightError, Result};
use crate::shell::run_script;
use crate::steps::context::JobContext;
use crate::steps::executor::StepExecutor;
use crate::steps::kinds::ShellStep;

/// Installs a versioned tool under the workspace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolInstallStep {
    pub name: String,
    pub version: String,
    /// Install script lines.
    pub scripts: Vec<String>,
    /// Bin directory relative to the install dir; defaults to `bin`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin_path: Option<String>,
}

impl ToolInstallStep {
    /// Where this tool version is installed.
    pub fn install_dir(&self, ctx: &JobContext) -> PathBuf {
        ctx.resolve(".pipewright")
            .join("tools")
            .join(&self.name)
            .join(&self.version)
    }
}

impl StepExecutor for ToolInstallStep {
    fn run(&self, step: &str, ctx: &mut JobContext) -> Result<()> {
        if self.name.is_empty() || self.version.is_empty() {
            return Err(PipewrightError::StepExecutionError {
                step: step.to_string(),
                message: "tool name and version are required".to_string(),
            });
        }

        let install_dir = self.install_dir(ctx);
        fs::create_dir_all(&install_dir)?;

        ctx.output.emit(&format!("Installing {} {}", self.name, self.version));

        let mut options = ctx.command_options(None);
        options.env.extend([
            ("TOOL_NAME".to_string(), self.name.clone()),
            ("TOOL_VERSION".to_string(), self.version.clone()),
            (
                "TOOL_INSTALL_DIR".to_string(),
                install_dir.to_string_lossy().into_owned(),
            ),
        ]);

        let script = ShellStep {
            scripts: self.scripts.clone(),
        };
        if !self.scripts.is_empty() {
            run_script(&script.script(), &options, &ctx.output)?;
        }

        let bin_dir = install_dir.join(self.bin_path.as_deref().unwrap_or("bin"));
        if !ctx.paths.contains(&bin_dir) {
            ctx.paths.insert(0, bin_dir);
        }
        Ok(())
    }
}
