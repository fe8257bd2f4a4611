//! The closed set of step kinds.

use serde::de::DeserializeOwned;

use crate::error::{PipewrightError, Result};
use crate::steps::executor::StepExecutor;
use crate::steps::kinds::{
    ArchiveStep, DockerBuildStep, GitStep, JunitReportStep, ShellStep, SonarCheckStep,
    TarArchiveStep, ToolInstallStep,
};
use crate::steps::step::Step;

/// A step decoded into its typed payload.
///
/// New kinds are added here; there is no string-keyed registry.
#[derive(Debug, Clone)]
pub enum StepKind {
    Shell(ShellStep),
    Git(GitStep),
    DockerBuild(DockerBuildStep),
    ToolInstall(ToolInstallStep),
    Archive(ArchiveStep),
    JunitReport(JunitReportStep),
    TarArchive(TarArchiveStep),
    SonarCheck(SonarCheckStep),
}

impl StepKind {
    /// Decode a step's payload according to its type tag.
    ///
    /// # Errors
    ///
    /// `StepTypeUnknown` for an unrecognised tag, `InvalidStepSpec` when the
    /// payload does not fit the tagged kind.
    pub fn from_step(step: &Step) -> Result<Self> {
        let kind = match step.step_type.as_str() {
            "shell" => StepKind::Shell(decode(step)?),
            "git" => StepKind::Git(decode(step)?),
            "docker_build" => StepKind::DockerBuild(decode(step)?),
            "tools" | "tool_install" => StepKind::ToolInstall(decode(step)?),
            "archive" => StepKind::Archive(decode(step)?),
            "junit_report" => StepKind::JunitReport(decode(step)?),
            "tar_archive" => StepKind::TarArchive(decode(step)?),
            "sonar_check" => StepKind::SonarCheck(decode(step)?),
            other => {
                return Err(PipewrightError::StepTypeUnknown {
                    step: step.name.clone(),
                    step_type: other.to_string(),
                })
            }
        };
        Ok(kind)
    }

    /// Canonical type tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            StepKind::Shell(_) => "shell",
            StepKind::Git(_) => "git",
            StepKind::DockerBuild(_) => "docker_build",
            StepKind::ToolInstall(_) => "tools",
            StepKind::Archive(_) => "archive",
            StepKind::JunitReport(_) => "junit_report",
            StepKind::TarArchive(_) => "tar_archive",
            StepKind::SonarCheck(_) => "sonar_check",
        }
    }

    /// The executor for this kind.
    pub fn executor(&self) -> &dyn StepExecutor {
        match self {
            StepKind::Shell(s) => s,
            StepKind::Git(s) => s,
            StepKind::DockerBuild(s) => s,
            StepKind::ToolInstall(s) => s,
            StepKind::Archive(s) => s,
            StepKind::JunitReport(s) => s,
            StepKind::TarArchive(s) => s,
            StepKind::SonarCheck(s) => s,
        }
    }
}

fn decode<T: DeserializeOwned>(step: &Step) -> Result<T> {
    // A missing spec decodes like an empty mapping so all-default kinds work.
    let spec = if step.spec.is_null() {
        serde_yaml::Value::Mapping(Default::default())
    } else {
        step.spec.clone()
    };

    serde_yaml::from_value(spec).map_err(|e| PipewrightError::InvalidStepSpec {
        step: step.name.clone(),
        message: e.to_string(),
    })
}
