//! Container image build steps.

use serde::{Deserialize, Serialize};

use crate::error::{PipewrightError, Result};
use crate::shell::run_checked;
use crate::steps::context::JobContext;
use crate::steps::executor::StepExecutor;

/// Builds an image from a Dockerfile and pushes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerBuildStep {
    /// Build context, relative to the workspace.
    pub work_dir: String,
    /// Dockerfile path, relative to the build context.
    pub docker_file: String,
    /// Extra arguments appended to `docker build`, whitespace separated.
    pub build_args: String,
    /// Full image reference, including tag.
    pub image_name: String,
    /// Skip the layer cache.
    pub ignore_cache: bool,
    /// Registry to log into before pushing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_registry: Option<DockerRegistry>,
}

/// Registry credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerRegistry {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl DockerBuildStep {
    /// Arguments for `docker build`.
    pub fn build_command(&self) -> Vec<String> {
        let docker_file = if self.docker_file.is_empty() {
            "Dockerfile"
        } else {
            &self.docker_file
        };

        let mut args = vec!["build".to_string(), "--rm=true".to_string()];
        if self.ignore_cache {
            args.push("--no-cache".to_string());
        }
        args.extend(["-t".to_string(), self.image_name.clone()]);
        args.extend(["-f".to_string(), docker_file.to_string()]);
        args.extend(self.build_args.split_whitespace().map(String::from));
        args.push(".".to_string());
        args
    }

    /// Arguments for `docker login`, when credentials are present.
    pub fn login_command(&self) -> Option<Vec<String>> {
        let registry = self.docker_registry.as_ref()?;
        if registry.username.is_empty() || registry.password.is_empty() {
            return None;
        }
        let mut args = vec![
            "login".to_string(),
            "-u".to_string(),
            registry.username.clone(),
            "-p".to_string(),
            registry.password.clone(),
        ];
        if !registry.host.is_empty() {
            args.push(registry.host.clone());
        }
        Some(args)
    }
}

impl StepExecutor for DockerBuildStep {
    fn run(&self, step: &str, ctx: &mut JobContext) -> Result<()> {
        if self.image_name.is_empty() {
            return Err(PipewrightError::StepExecutionError {
                step: step.to_string(),
                message: "image_name is required".to_string(),
            });
        }

        let password = self
            .docker_registry
            .as_ref()
            .map(|r| r.password.clone())
            .unwrap_or_default();
        let output = ctx.output.with_secrets([password]);
        let options = ctx.command_options(Some(&self.work_dir));

        if let Some(login) = self.login_command() {
            run_checked("docker", &login, &options, &output)?;
        }

        run_checked("docker", &self.build_command(), &options, &output)?;
        run_checked(
            "docker",
            &["push".to_string(), self.image_name.clone()],
            &options,
            &output,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step() -> DockerBuildStep {
        serde_yaml::from_str(
            r#"
work_dir: services/api
image_name: registry.example.com/api:1.0
build_args: --build-arg VERSION=1.0 --pull
docker_registry:
  host: registry.example.com
  username: ci
  password: p@ss
"#,
        )
        .unwrap()
    }

    #[test]
    fn build_command_includes_tag_file_and_args() {
        assert_eq!(
            step().build_command(),
            vec![
                "build",
                "--rm=true",
                "-t",
                "registry.example.com/api:1.0",
                "-f",
                "Dockerfile",
                "--build-arg",
                "VERSION=1.0",
                "--pull",
                "."
            ]
        );
    }

    #[test]
    fn ignore_cache_adds_no_cache() {
        let mut s = step();
        s.ignore_cache = true;
        assert!(s.build_command().contains(&"--no-cache".to_string()));
    }

    #[test]
    fn login_command_targets_registry_host() {
        let login = step().login_command().unwrap();
        assert_eq!(login.last().unwrap(), "registry.example.com");
        assert!(login.contains(&"p@ss".to_string()));
    }

    #[test]
    fn login_skipped_without_credentials() {
        let mut s = step();
        s.docker_registry.as_mut().unwrap().password.clear();
        assert!(s.login_command().is_none());

        s.docker_registry = None;
        assert!(s.login_command().is_none());
    }

    #[test]
    fn missing_image_name_fails_before_running_docker() {
        let mut ctx = JobContext::new("/nonexistent", "/nonexistent");
        let err = DockerBuildStep::default().run("image", &mut ctx).unwrap_err();
        assert!(err.to_string().contains("image_name is required"));
    }
}
