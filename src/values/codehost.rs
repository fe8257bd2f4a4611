//! Code host lookup.

use crate::config::{AgentConfig, CodeHost};
use crate::error::{PipewrightError, Result};

/// Resolves a code host by id.
pub trait CodeHostLookup: Send + Sync {
    fn code_host(&self, id: i64) -> Result<CodeHost>;
}

impl CodeHostLookup for AgentConfig {
    fn code_host(&self, id: i64) -> Result<CodeHost> {
        self.code_hosts
            .iter()
            .find(|host| host.id == id)
            .cloned()
            .ok_or(PipewrightError::CodeHostNotFound { id })
    }
}

impl CodeHostLookup for Vec<CodeHost> {
    fn code_host(&self, id: i64) -> Result<CodeHost> {
        self.iter()
            .find(|host| host.id == id)
            .cloned()
            .ok_or(PipewrightError::CodeHostNotFound { id })
    }
}
