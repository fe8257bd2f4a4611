//! Variable set storage.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// A named, independently stored values document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSet {
    pub id: String,
    pub variable_yaml: String,
}

/// Looks up variable sets by id.
pub trait VariableSetStore: Send + Sync {
    /// `Ok(None)` when no set with `id` exists.
    fn find(&self, id: &str) -> Result<Option<VariableSet>>;
}

/// Variable sets stored as `<dir>/<id>.yaml`.
#[derive(Debug, Clone)]
pub struct DirVariableSetStore {
    dir: PathBuf,
}

impl DirVariableSetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Option<PathBuf> {
        let valid = !id.is_empty()
            && !id.contains(['/', '\\'])
            && id != "."
            && id != "..";
        valid.then(|| self.dir.join(format!("{}.yaml", id)))
    }
}

impl VariableSetStore for DirVariableSetStore {
    fn find(&self, id: &str) -> Result<Option<VariableSet>> {
        let Some(path) = self.path_for(id) else {
            return Ok(None);
        };

        match fs::read_to_string(&path) {
            Ok(variable_yaml) => Ok(Some(VariableSet {
                id: id.to_string(),
                variable_yaml,
            })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
