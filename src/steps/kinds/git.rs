//! Repository checkout steps.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::shell::{run_checked, CommandOptions, OutputChannel};
use crate::steps::context::JobContext;
use crate::steps::executor::StepExecutor;

/// Checks one or more repositories out into the workspace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GitStep {
    pub repos: Vec<GitRepo>,
}

/// One repository to check out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GitRepo {
    /// Host base address, e.g. `https://github.com`.
    pub address: String,
    pub owner: String,
    pub name: String,
    pub branch: String,
    /// Tag to check out instead of the branch head.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Exact commit to check out; wins over tag and branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
    /// Directory inside the workspace; defaults to the repo name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_name: Option<String>,
    /// Token embedded into the clone URL; always masked in output.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub oauth_token: String,
}

impl GitRepo {
    /// Remote URL, with the token embedded when one is set.
    pub fn remote_url(&self) -> String {
        let address = self.address.trim_end_matches('/');
        let url = format!("{}/{}/{}.git", address, self.owner, self.name);
        if self.oauth_token.is_empty() {
            return url;
        }
        match url.split_once("://") {
            Some((scheme, rest)) => format!("{}://oauth2:{}@{}", scheme, self.oauth_token, rest),
            None => url,
        }
    }

    /// The ref to fetch.
    pub fn fetch_ref(&self) -> String {
        if let Some(commit) = self.commit_id.as_deref().filter(|c| !c.is_empty()) {
            return commit.to_string();
        }
        if let Some(tag) = self.tag.as_deref().filter(|t| !t.is_empty()) {
            return format!("refs/tags/{}", tag);
        }
        if self.branch.is_empty() {
            "HEAD".to_string()
        } else {
            format!("refs/heads/{}", self.branch)
        }
    }

    fn remote(&self) -> &str {
        self.remote_name
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or("origin")
    }

    fn checkout_dir(&self) -> &str {
        self.checkout_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.name)
    }
}

impl StepExecutor for GitStep {
    fn run(&self, _step: &str, ctx: &mut JobContext) -> Result<()> {
        for repo in &self.repos {
            let output = ctx.output.with_secrets([repo.oauth_token.clone()]);
            let dir = ctx.resolve(repo.checkout_dir());
            fs::create_dir_all(&dir)?;

            output.emit(&format!(
                "Checking out {}/{} ({})",
                repo.owner,
                repo.name,
                repo.fetch_ref()
            ));
            checkout(repo, &dir, CommandOptions::new(&dir, ctx.command_env()), &output)?;
        }
        Ok(())
    }
}

fn checkout(
    repo: &GitRepo,
    dir: &Path,
    options: CommandOptions,
    output: &OutputChannel,
) -> Result<()> {
    let git = |args: &[&str]| -> Result<()> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        run_checked("git", &args, &options, output)?;
        Ok(())
    };

    let url = repo.remote_url();
    if dir.join(".git").exists() {
        git(&["remote", "set-url", repo.remote(), &url])?;
    } else {
        git(&["init", "-q"])?;
        git(&["remote", "add", repo.remote(), &url])?;
    }

    git(&["fetch", "-q", "--depth", "1", repo.remote(), &repo.fetch_ref()])?;
    git(&["checkout", "-qf", "FETCH_HEAD"])
}
