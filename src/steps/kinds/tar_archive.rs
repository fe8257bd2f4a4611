//! Tarball upload steps.

use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{PipewrightError, Result};
use crate::shell::run_checked;
use crate::steps::context::JobContext;
use crate::steps::executor::StepExecutor;

/// Packs workspace directories into a gzipped tarball on the storage mount.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TarArchiveStep {
    /// Directories relative to the workspace.
    pub result_dirs: Vec<String>,
    /// Tarball file name.
    pub file_name: String,
    /// Destination directory, relative to the storage mount.
    pub dest_dir: String,
}

impl StepExecutor for TarArchiveStep {
    fn run(&self, step: &str, ctx: &mut JobContext) -> Result<()> {
        if self.file_name.is_empty() || self.result_dirs.is_empty() {
            return Err(PipewrightError::StepExecutionError {
                step: step.to_string(),
                message: "file_name and result_dirs are required".to_string(),
            });
        }

        let dest_dir = ctx.storage(&self.dest_dir);
        fs::create_dir_all(&dest_dir)?;
        let dest = dest_dir.join(&self.file_name);

        let mut args = vec![
            "czf".to_string(),
            dest.to_string_lossy().into_owned(),
            "-C".to_string(),
            ctx.workspace.to_string_lossy().into_owned(),
        ];
        args.extend(self.result_dirs.iter().cloned());

        run_checked("tar", &args, &ctx.command_options(None), &ctx.output)?;
        ctx.output.emit(&format!("Archived to {}", dest.display()));
        Ok(())
    }
}
