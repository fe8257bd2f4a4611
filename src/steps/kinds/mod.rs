//! Executors for each step kind.

pub mod archive;
pub mod docker_build;
pub mod git;
pub mod junit_report;
pub mod shell;
pub mod sonar_check;
pub mod tar_archive;
pub mod tool_install;

pub use archive::{ArchiveStep, UploadDetail};
pub use docker_build::{DockerBuildStep, DockerRegistry};
pub use git::{GitRepo, GitStep};
pub use junit_report::{JunitReportStep, JunitSummary};
pub use shell::ShellStep;
pub use sonar_check::SonarCheckStep;
pub use tar_archive::TarArchiveStep;
pub use tool_install::ToolInstallStep;
