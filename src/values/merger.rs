//! Concurrent fetch and merge of values files.
//!
//! Every requested path is fetched on its own thread. The merge waits for
//! all of them, reports every failure at once, and never returns a partial
//! result. Documents are merged in the order the caller listed them, no
//! matter which fetch finished first.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::thread;
use tracing::{debug, error};

use crate::config::{merge_yaml_documents, CodeHost, CodeHostKind};
use crate::error::{AggregatedFetchError, FetchError, Result};
use crate::values::codehost::CodeHostLookup;
use crate::values::download::RepoDownloader;
use crate::values::source::RepoCoordinates;
use crate::values::working_copy::WorkingCopySync;

/// Where the fragments of one merge are read from.
enum FetchMode<'h> {
    /// Per-path download; `None` host for public repo links.
    Remote(Option<&'h CodeHost>),
    /// Reads from `<storage>/<repo>` after a one-time sync.
    Local(PathBuf),
}

/// Fetches values files concurrently and merges them.
pub struct ConcurrentFetchMerger<'a> {
    storage_path: PathBuf,
    code_hosts: &'a dyn CodeHostLookup,
    downloader: &'a dyn RepoDownloader,
    working_copy: &'a dyn WorkingCopySync,
}

impl<'a> ConcurrentFetchMerger<'a> {
    pub fn new(
        storage_path: impl Into<PathBuf>,
        code_hosts: &'a dyn CodeHostLookup,
        downloader: &'a dyn RepoDownloader,
        working_copy: &'a dyn WorkingCopySync,
    ) -> Self {
        Self {
            storage_path: storage_path.into(),
            code_hosts,
            downloader,
            working_copy,
        }
    }

    /// Fetch `paths` from the repository at `coords` and merge them in order.
    ///
    /// Later files override earlier ones on conflicting keys.
    ///
    /// # Errors
    ///
    /// `AggregatedFetch` naming every path that failed, `MergeError` when the
    /// fetched documents cannot be merged, or the error from resolving the
    /// code host and syncing its working copy.
    pub fn merge(&self, paths: &[String], coords: &RepoCoordinates) -> Result<String> {
        let host = if coords.repo_link.is_empty() {
            Some(self.code_hosts.code_host(coords.codehost_id).inspect_err(|e| {
                error!("Failed to resolve code host {}: {}", coords.codehost_id, e)
            })?)
        } else {
            None
        };

        let mode = match &host {
            Some(host) if host.kind == CodeHostKind::Other => {
                self.working_copy.sync(host, coords).inspect_err(|e| {
                    error!("Failed to sync working copy of {}: {}", coords.repo, e)
                })?;
                FetchMode::Local(self.storage_path.join(&coords.repo))
            }
            host => FetchMode::Remote(host.as_ref()),
        };

        let contents = self.fetch_all(paths, coords, &mode)?;
        merge_yaml_documents(&contents)
    }

    /// Fetch every path concurrently; contents come back in caller order.
    fn fetch_all(
        &self,
        paths: &[String],
        coords: &RepoCoordinates,
        mode: &FetchMode<'_>,
    ) -> Result<Vec<Vec<u8>>> {
        let contents: Mutex<HashMap<usize, Vec<u8>>> = Mutex::new(HashMap::new());
        let failures: Mutex<Vec<(usize, FetchError)>> = Mutex::new(Vec::new());

        thread::scope(|scope| {
            for (index, path) in paths.iter().enumerate() {
                let contents = &contents;
                let failures = &failures;
                scope.spawn(move || match self.fetch_one(path, coords, mode) {
                    Ok(content) => {
                        debug!("Fetched values file {} ({} bytes)", path, content.len());
                        contents
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .insert(index, content);
                    }
                    Err(e) => {
                        failures
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push((index, e));
                    }
                });
            }
        });

        let mut failures = failures.into_inner().unwrap_or_else(PoisonError::into_inner);
        if !failures.is_empty() {
            failures.sort_by_key(|(index, _)| *index);
            let failures = failures.into_iter().map(|(_, e)| e).collect();
            return Err(AggregatedFetchError::new(failures).into());
        }

        let mut contents = contents.into_inner().unwrap_or_else(PoisonError::into_inner);
        Ok((0..paths.len())
            .filter_map(|index| contents.remove(&index))
            .collect())
    }

    fn fetch_one(
        &self,
        path: &str,
        coords: &RepoCoordinates,
        mode: &FetchMode<'_>,
    ) -> std::result::Result<Vec<u8>, FetchError> {
        match mode {
            FetchMode::Remote(host) => self
                .downloader
                .download(*host, coords, path)
                .map_err(|source| FetchError::Download {
                    path: path.to_string(),
                    source,
                }),
            FetchMode::Local(base) => {
                let Some(full) = within_repo(base, path) else {
                    return Err(FetchError::Read {
                        path: PathBuf::from(path),
                        source: io::Error::new(
                            io::ErrorKind::InvalidInput,
                            "path escapes the repository",
                        ),
                    });
                };
                fs::read(&full).map_err(|source| FetchError::Read { path: full, source })
            }
        }
    }
}

/// Join `path` under `base`, treating it as repository-relative.
///
/// Leading separators are dropped and `..` may not climb above `base`.
fn within_repo(base: &Path, path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::ParentDir => {
                if !relative.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
        }
    }
    Some(base.join(relative))
}
