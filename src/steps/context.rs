//! Execution context shared by every step of one run.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::JobSpec;
use crate::secrets::SecretMasker;
use crate::shell::{parse_env_entries, CommandOptions, OutputChannel};

/// Workspace, environment and output wiring for one job run.
///
/// A context belongs to exactly one run; concurrent jobs each build their own.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Working directory shared by all steps.
    pub workspace: PathBuf,

    /// Search paths prepended to `PATH`, in order.
    pub paths: Vec<PathBuf>,

    /// Plain `KEY=VALUE` entries.
    pub envs: Vec<String>,

    /// Secret `KEY=VALUE` entries.
    pub secret_envs: Vec<String>,

    /// Object storage mount used by upload-style steps.
    pub storage_path: PathBuf,

    /// Masked live output, optionally persisted.
    pub output: OutputChannel,
}

impl JobContext {
    /// Build a context that streams to stdout.
    pub fn new(workspace: impl Into<PathBuf>, storage_path: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            paths: Vec::new(),
            envs: Vec::new(),
            secret_envs: Vec::new(),
            storage_path: storage_path.into(),
            output: OutputChannel::stdout(SecretMasker::new()),
        }
    }

    /// Build the context for a job description.
    pub fn from_job(job: &JobSpec, storage_path: impl Into<PathBuf>) -> Self {
        let mut output = OutputChannel::stdout(SecretMasker::from_secret_envs(&job.secret_envs));
        output.log_file = job.log_file.clone();

        Self {
            workspace: job.workspace.clone(),
            paths: job.paths.clone(),
            envs: job.envs.clone(),
            secret_envs: job.secret_envs.clone(),
            storage_path: storage_path.into(),
            output,
        }
    }

    /// Replace the output channel.
    pub fn with_output(mut self, output: OutputChannel) -> Self {
        self.output = output;
        self
    }

    /// Resolve a workspace-relative path.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.workspace.join(relative)
    }

    /// Resolve a path under the storage mount.
    pub fn storage(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.storage_path.join(relative)
    }

    /// Environment for child processes: plain entries, then secrets, then `PATH`.
    pub fn command_env(&self) -> Vec<(String, String)> {
        let mut env = parse_env_entries(&self.envs);
        env.extend(parse_env_entries(&self.secret_envs));

        if !self.paths.is_empty() {
            let mut entries: Vec<OsString> = self
                .paths
                .iter()
                .map(|p| p.clone().into_os_string())
                .collect();
            if let Some(current) = std::env::var_os("PATH") {
                entries.extend(std::env::split_paths(&current).map(PathBuf::into_os_string));
            }
            if let Ok(joined) = std::env::join_paths(entries) {
                env.push(("PATH".to_string(), joined.to_string_lossy().into_owned()));
            }
        }

        env
    }

    /// Command options rooted at the workspace, or at `dir` inside it.
    pub fn command_options(&self, dir: Option<&str>) -> CommandOptions {
        let cwd = match dir {
            Some(dir) if !dir.is_empty() => self.resolve(dir),
            _ => self.workspace.clone(),
        };
        CommandOptions::new(cwd, self.command_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_env_keeps_order_and_includes_secrets() {
        let mut ctx = JobContext::new("/ws", "/storage");
        ctx.envs = vec!["A=1".into(), "B=2".into()];
        ctx.secret_envs = vec!["TOKEN=xyz".into()];

        let env = ctx.command_env();

        assert_eq!(env[0], ("A".to_string(), "1".to_string()));
        assert_eq!(env[1], ("B".to_string(), "2".to_string()));
        assert_eq!(env[2], ("TOKEN".to_string(), "xyz".to_string()));
        assert!(!env.iter().any(|(k, _)| k == "PATH"));
    }

    #[test]
    #[cfg(unix)]
    fn search_paths_are_prepended_to_path() {
        let mut ctx = JobContext::new("/ws", "/storage");
        ctx.paths = vec![PathBuf::from("/opt/tools/bin")];

        let env = ctx.command_env();
        let (_, path) = env.iter().find(|(k, _)| k == "PATH").unwrap();

        assert!(path.starts_with("/opt/tools/bin"));
    }

    #[test]
    fn command_options_resolve_dir_inside_workspace() {
        let ctx = JobContext::new("/ws", "/storage");

        assert_eq!(ctx.command_options(None).cwd, Some(PathBuf::from("/ws")));
        assert_eq!(ctx.command_options(Some("")).cwd, Some(PathBuf::from("/ws")));
        assert_eq!(
            ctx.command_options(Some("app")).cwd,
            Some(PathBuf::from("/ws/app"))
        );
    }

    #[test]
    fn from_job_masks_secret_envs() {
        let job: JobSpec = serde_yaml::from_str(
            "workspace: /ws\nsecret_envs: [PASSWORD=hunter2]\nlog_file: /tmp/job.log\n",
        )
        .unwrap();

        let ctx = JobContext::from_job(&job, "/storage");

        assert_eq!(ctx.output.masker.mask("hunter2"), "********");
        assert_eq!(ctx.output.log_file, Some(PathBuf::from("/tmp/job.log")));
    }
}
