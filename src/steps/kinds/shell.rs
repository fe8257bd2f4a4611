//! Shell script steps.
//!
//! When GitHub or GitLab deploy keys exist under `$HOME/.ssh`, the script is
//! prefixed with lines that start an `ssh-agent` and load them, so scripts
//! can clone private repositories over SSH.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::shell::run_script;
use crate::steps::context::JobContext;
use crate::steps::executor::StepExecutor;

/// Deploy keys loaded before shell scripts, relative to `$HOME`.
const DEPLOY_KEYS: [&str; 2] = [".ssh/id_rsa.github", ".ssh/id_rsa.gitlab"];

/// Runs a list of script lines as one shell script, stopping at the first failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellStep {
    /// Script lines, joined with newlines.
    pub scripts: Vec<String>,
}

impl ShellStep {
    /// The script handed to the shell.
    pub fn script(&self) -> String {
        self.script_with_prelude(&[])
    }

    /// The script with `prelude` lines run before `set -e` takes effect.
    pub fn script_with_prelude(&self, prelude: &[String]) -> String {
        let mut script = String::new();
        for line in prelude {
            script.push_str(line);
            script.push('\n');
        }
        script.push_str("set -e\n");
        for line in &self.scripts {
            script.push_str(line);
            script.push('\n');
        }
        script
    }
}

/// Lines that start an ssh-agent and add every deploy key found under `home`.
///
/// Empty when no deploy key exists. Failures are silenced.
pub fn ssh_agent_prelude(home: &Path) -> Vec<String> {
    let keys: Vec<PathBuf> = DEPLOY_KEYS
        .iter()
        .map(|key| home.join(key))
        .filter(|key| key.is_file())
        .collect();
    if keys.is_empty() {
        return Vec::new();
    }

    let mut lines = vec!["eval \"$(ssh-agent -s)\" > /dev/null 2>&1".to_string()];
    for key in keys {
        lines.push(format!(
            "ssh-add {} > /dev/null 2>&1",
            single_quoted(&key.to_string_lossy())
        ));
    }
    lines
}

fn single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// `HOME` as the step's child processes will see it.
fn step_home(ctx: &JobContext) -> Option<PathBuf> {
    ctx.command_env()
        .into_iter()
        .rev()
        .find(|(key, _)| key == "HOME")
        .map(|(_, value)| PathBuf::from(value))
        .or_else(|| std::env::var_os("HOME").map(PathBuf::from))
}

impl StepExecutor for ShellStep {
    fn run(&self, _step: &str, ctx: &mut JobContext) -> Result<()> {
        if self.scripts.iter().all(|s| s.trim().is_empty()) {
            return Ok(());
        }
        let prelude = step_home(ctx)
            .map(|home| ssh_agent_prelude(&home))
            .unwrap_or_default();
        run_script(
            &self.script_with_prelude(&prelude),
            &ctx.command_options(None),
            &ctx.output,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipewrightError;
    use crate::secrets::SecretMasker;
    use crate::shell::{OutputChannel, SharedSink};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn context(temp: &TempDir, secret_envs: &[&str]) -> (Arc<Mutex<Vec<u8>>>, JobContext) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink: SharedSink = buffer.clone();
        let mut ctx = JobContext::new(temp.path(), temp.path().join("storage"));
        ctx.secret_envs = secret_envs.iter().map(|s| s.to_string()).collect();
        let masker = SecretMasker::from_secret_envs(&ctx.secret_envs);
        let ctx = ctx.with_output(OutputChannel {
            masker,
            sink,
            log_file: None,
        });
        (buffer, ctx)
    }

    #[test]
    fn script_starts_with_set_e() {
        let step = ShellStep {
            scripts: vec!["make".into(), "make test".into()],
        };
        assert_eq!(step.script(), "set -e\nmake\nmake test\n");
    }

    #[test]
    fn prelude_loads_only_existing_deploy_keys() {
        let temp = TempDir::new().unwrap();
        assert!(ssh_agent_prelude(temp.path()).is_empty());

        std::fs::create_dir_all(temp.path().join(".ssh")).unwrap();
        std::fs::write(temp.path().join(".ssh/id_rsa.gitlab"), "key").unwrap();
        let prelude = ssh_agent_prelude(temp.path());

        assert_eq!(prelude.len(), 2);
        assert!(prelude[0].contains("ssh-agent -s"));
        assert!(prelude[1].starts_with("ssh-add '"));
        assert!(prelude[1].contains("id_rsa.gitlab"));
        assert!(!prelude.iter().any(|l| l.contains("id_rsa.github")));
    }

    #[test]
    fn prelude_runs_before_set_e() {
        let step = ShellStep {
            scripts: vec!["make".into()],
        };
        let script = step.script_with_prelude(&["ssh-add k".to_string()]);
        assert_eq!(script, "ssh-add k\nset -e\nmake\n");
    }

    #[test]
    #[cfg(unix)]
    fn deploy_key_setup_does_not_break_the_script() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("home");
        std::fs::create_dir_all(home.join(".ssh")).unwrap();
        std::fs::write(home.join(".ssh/id_rsa.github"), "not a real key").unwrap();
        let (buffer, mut ctx) = context(&temp, &[]);
        ctx.envs = vec![format!("HOME={}", home.display())];
        let step = ShellStep {
            scripts: vec!["echo home is $HOME".into()],
        };

        step.run("build", &mut ctx).unwrap();

        let out = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(out.contains(&format!("home is {}", home.display())));
        assert!(home.join(".ssh/id_rsa.github").exists());
    }

    #[test]
    #[cfg(unix)]
    fn runs_in_workspace_and_masks_secret_env() {
        let temp = TempDir::new().unwrap();
        let (buffer, mut ctx) = context(&temp, &["DEPLOY_KEY=k3y-value"]);
        let step = ShellStep {
            scripts: vec!["touch marker".into(), "echo key is $DEPLOY_KEY".into()],
        };

        step.run("build", &mut ctx).unwrap();

        assert!(temp.path().join("marker").exists());
        let out = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(out.contains("key is ********"));
        assert!(!out.contains("k3y-value"));
    }

    #[test]
    #[cfg(unix)]
    fn stops_at_first_failing_line() {
        let temp = TempDir::new().unwrap();
        let (_buffer, mut ctx) = context(&temp, &[]);
        let step = ShellStep {
            scripts: vec!["false".into(), "touch never".into()],
        };

        let err = step.run("build", &mut ctx).unwrap_err();

        assert!(matches!(err, PipewrightError::CommandFailed { .. }));
        assert!(!temp.path().join("never").exists());
    }

    #[test]
    fn empty_script_succeeds_without_spawning() {
        let temp = TempDir::new().unwrap();
        let (buffer, mut ctx) = context(&temp, &[]);

        ShellStep::default().run("noop", &mut ctx).unwrap();

        assert!(buffer.lock().unwrap().is_empty());
    }
}
