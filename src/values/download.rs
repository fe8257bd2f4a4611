//! Downloading single files from hosted repositories.

use anyhow::{anyhow, bail, Context};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

use crate::config::{CodeHost, CodeHostKind};
use crate::values::source::RepoCoordinates;

const GITHUB_API: &str = "https://api.github.com";
const GITHUB_RAW: &str = "https://raw.githubusercontent.com";

/// Fetches one file from a repository.
pub trait RepoDownloader: Send + Sync {
    /// Download `path` at the coordinates' branch.
    ///
    /// `host` is `None` only when the coordinates carry a public repo link.
    fn download(
        &self,
        host: Option<&CodeHost>,
        coords: &RepoCoordinates,
        path: &str,
    ) -> anyhow::Result<Vec<u8>>;
}

/// Downloads through the GitHub, GitLab and Gitee HTTP APIs.
#[derive(Debug, Clone)]
pub struct HttpRepoDownloader {
    client: Client,
    raw_base: String,
}

impl HttpRepoDownloader {
    /// Create a downloader with a 30-second timeout.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a downloader with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("pipewright")
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            raw_base: GITHUB_RAW.to_string(),
        })
    }

    /// Serve public repo links from `base` instead of raw.githubusercontent.com.
    pub fn with_raw_base(mut self, base: impl Into<String>) -> Self {
        self.raw_base = base.into();
        self
    }

    fn fetch(&self, request: RequestBuilder, what: &str) -> anyhow::Result<Vec<u8>> {
        let response = request
            .send()
            .with_context(|| format!("request for {} failed", what))?;

        if !response.status().is_success() {
            bail!("HTTP {} fetching {}", response.status(), what);
        }

        Ok(response.bytes()?.to_vec())
    }
}

/// URL of a file in a public GitHub repository given by link.
pub fn public_link_url(
    raw_base: &str,
    repo_link: &str,
    branch: &str,
    path: &str,
) -> anyhow::Result<String> {
    let link = repo_link.trim_end_matches('/').trim_end_matches(".git");
    let mut parts = link.rsplit('/');
    let (repo, owner) = match (parts.next(), parts.next()) {
        (Some(repo), Some(owner)) if !repo.is_empty() && !owner.is_empty() => (repo, owner),
        _ => bail!("invalid repo link {}", repo_link),
    };
    let branch = if branch.is_empty() { "HEAD" } else { branch };
    Ok(format!(
        "{}/{}/{}/{}/{}",
        raw_base.trim_end_matches('/'),
        owner,
        repo,
        branch,
        path.trim_start_matches('/')
    ))
}

/// GitHub contents API URL. `address` is the API base for enterprise hosts.
pub fn github_url(address: &str, coords: &RepoCoordinates, path: &str) -> anyhow::Result<Url> {
    let base = if address.is_empty() || address.contains("github.com") {
        GITHUB_API
    } else {
        address
    };
    let mut url = api_url(
        base,
        ["repos", coords.namespace_or_owner(), &coords.repo, "contents"],
    )?;
    push_path(&mut url, path)?;
    if !coords.branch.is_empty() {
        url.query_pairs_mut().append_pair("ref", &coords.branch);
    }
    Ok(url)
}

/// GitLab raw file API URL; the project and file path are single encoded segments.
pub fn gitlab_url(address: &str, coords: &RepoCoordinates, path: &str) -> anyhow::Result<Url> {
    let project = format!("{}/{}", coords.namespace_or_owner(), coords.repo);
    let file = path.trim_start_matches('/');
    let mut url = api_url(
        address,
        ["api", "v4", "projects", &project, "repository", "files", file, "raw"],
    )?;
    let branch = if coords.branch.is_empty() { "HEAD" } else { &coords.branch };
    url.query_pairs_mut().append_pair("ref", branch);
    Ok(url)
}

/// Gitee raw file API URL.
pub fn gitee_url(address: &str, coords: &RepoCoordinates, path: &str) -> anyhow::Result<Url> {
    let base = if address.is_empty() { "https://gitee.com" } else { address };
    let mut url = api_url(
        base,
        ["api", "v5", "repos", coords.namespace_or_owner(), &coords.repo, "raw"],
    )?;
    push_path(&mut url, path)?;
    if !coords.branch.is_empty() {
        url.query_pairs_mut().append_pair("ref", &coords.branch);
    }
    Ok(url)
}

fn api_url<'s>(base: &str, segments: impl IntoIterator<Item = &'s str>) -> anyhow::Result<Url> {
    let mut url =
        Url::parse(base).with_context(|| format!("invalid code host address {}", base))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("code host address {} cannot be a base", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn push_path(url: &mut Url, path: &str) -> anyhow::Result<()> {
    url.path_segments_mut()
        .map_err(|_| anyhow!("cannot append {} to a non-base url", path))?
        .extend(path.split('/').filter(|s| !s.is_empty()));
    Ok(())
}

impl RepoDownloader for HttpRepoDownloader {
    fn download(
        &self,
        host: Option<&CodeHost>,
        coords: &RepoCoordinates,
        path: &str,
    ) -> anyhow::Result<Vec<u8>> {
        if !coords.repo_link.is_empty() {
            let url = public_link_url(&self.raw_base, &coords.repo_link, &coords.branch, path)?;
            debug!("Downloading {} from public link", path);
            return self.fetch(self.client.get(&url), &url);
        }

        let host = host.ok_or_else(|| anyhow!("no code host for {}", coords.repo))?;
        let request = match host.kind {
            CodeHostKind::Github => {
                let url = github_url(&host.address, coords, path)?;
                let mut request = self
                    .client
                    .get(url)
                    .header("Accept", "application/vnd.github.raw");
                if !host.access_token.is_empty() {
                    request = request.bearer_auth(&host.access_token);
                }
                request
            }
            CodeHostKind::Gitlab => {
                let url = gitlab_url(&host.address, coords, path)?;
                let mut request = self.client.get(url);
                if !host.access_token.is_empty() {
                    request = request.header("PRIVATE-TOKEN", &host.access_token);
                }
                request
            }
            CodeHostKind::Gitee => {
                let mut url = gitee_url(&host.address, coords, path)?;
                if !host.access_token.is_empty() {
                    url.query_pairs_mut()
                        .append_pair("access_token", &host.access_token);
                }
                self.client.get(url)
            }
            CodeHostKind::Other => {
                bail!("code host {} has no download API", host.id)
            }
        };

        debug!("Downloading {} from code host {}", path, host.id);
        self.fetch(request, path)
    }
}
