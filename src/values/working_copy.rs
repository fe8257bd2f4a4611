//! Local working copies of plain git repositories.
//!
//! Repositories on `other` code hosts have no file API, so their values files
//! are read from a checkout kept under the storage mount.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::config::CodeHost;
use crate::error::{PipewrightError, Result};
use crate::secrets::mask_secrets;
use crate::values::source::RepoCoordinates;

type GitResult = std::result::Result<(), String>;

/// Materialises a repository at `<storage>/<repo>`.
pub trait WorkingCopySync: Send + Sync {
    fn sync(&self, host: &CodeHost, coords: &RepoCoordinates) -> Result<()>;
}

/// Clones or fast-forwards working copies with the `git` binary.
#[derive(Debug, Clone)]
pub struct GitWorkingCopy {
    storage_path: PathBuf,
}

impl GitWorkingCopy {
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
        }
    }

    /// Where the working copy of `repo` lives.
    pub fn repo_path(&self, repo: &str) -> PathBuf {
        self.storage_path.join(repo)
    }

    /// Clone URL with the host's token embedded when present.
    pub fn remote_url(host: &CodeHost, coords: &RepoCoordinates) -> String {
        let address = host.address.trim_end_matches('/');
        let owner = coords.namespace_or_owner();
        if host.access_token.is_empty() {
            return format!("{}/{}/{}.git", address, owner, coords.repo);
        }
        match address.split_once("://") {
            Some((scheme, rest)) => format!(
                "{}://oauth2:{}@{}/{}/{}.git",
                scheme, host.access_token, rest, owner, coords.repo
            ),
            None => format!("{}/{}/{}.git", address, owner, coords.repo),
        }
    }

    fn clone_repo(&self, url: &str, path: &Path, branch: &str) -> GitResult {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let mut cmd = Command::new("git");
        cmd.args(["clone", "-q", "--depth", "1"]);
        if !branch.is_empty() {
            cmd.args(["--branch", branch]);
        }
        cmd.arg(url).arg(path);
        run_git(cmd, "clone")
    }

    fn update_repo(&self, url: &str, path: &Path, branch: &str) -> GitResult {
        let refspec = if branch.is_empty() { "HEAD" } else { branch };

        let mut fetch = Command::new("git");
        fetch
            .args(["fetch", "-q", "--depth", "1", url, refspec])
            .current_dir(path);
        run_git(fetch, "fetch")?;

        let mut reset = Command::new("git");
        reset
            .args(["reset", "-q", "--hard", "FETCH_HEAD"])
            .current_dir(path);
        run_git(reset, "reset")
    }
}

fn run_git(mut cmd: Command, what: &str) -> GitResult {
    let output = cmd.output().map_err(|e| e.to_string())?;
    if !output.status.success() {
        return Err(format!(
            "git {} failed: {}",
            what,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(())
}

impl WorkingCopySync for GitWorkingCopy {
    fn sync(&self, host: &CodeHost, coords: &RepoCoordinates) -> Result<()> {
        let url = Self::remote_url(host, coords);
        let path = self.repo_path(&coords.repo);

        let result = if path.join(".git").exists() {
            debug!("Updating working copy {}", path.display());
            self.update_repo(&url, &path, &coords.branch)
        } else {
            debug!("Cloning {} into {}", coords.repo, path.display());
            self.clone_repo(&url, &path, &coords.branch)
        };

        result.map_err(|message| PipewrightError::WorkingCopySync {
            repo: coords.repo.clone(),
            message: mask_secrets(&message, &[host.access_token.as_str()]),
        })
    }
}
