//! File upload steps targeting the object storage mount.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipewrightError, Result};
use crate::steps::context::JobContext;
use crate::steps::executor::StepExecutor;

/// Copies workspace files into the object storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveStep {
    pub upload_detail: Vec<UploadDetail>,
}

/// One file to upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadDetail {
    /// Source file, relative to the workspace.
    pub file_path: String,
    /// Destination directory, relative to the storage mount.
    pub dest_dir: String,
}

impl StepExecutor for ArchiveStep {
    fn run(&self, step: &str, ctx: &mut JobContext) -> Result<()> {
        for upload in &self.upload_detail {
            let source = ctx.resolve(&upload.file_path);
            let dest_dir = ctx.storage(&upload.dest_dir);
            let dest = upload_file(step, &source, &dest_dir)?;
            ctx.output.emit(&format!(
                "Uploaded {} to {}",
                upload.file_path,
                dest.display()
            ));
        }
        Ok(())
    }
}

/// Copy `source` into `dest_dir`, keeping its file name.
pub(crate) fn upload_file(step: &str, source: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .ok_or_else(|| PipewrightError::StepExecutionError {
            step: step.to_string(),
            message: format!("{} is not a file", source.display()),
        })?;

    if !source.is_file() {
        return Err(PipewrightError::StepExecutionError {
            step: step.to_string(),
            message: format!("file {} not found", source.display()),
        });
    }

    fs::create_dir_all(dest_dir)?;
    let dest = dest_dir.join(file_name);
    fs::copy(source, &dest)?;
    Ok(dest)
}
