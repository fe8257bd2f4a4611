//! Literal secret redaction.
//!
//! Two redaction modes share one fixed mask token:
//!
//! - literal mode ([`mask_secrets`]) replaces every occurrence of each
//!   registered secret string
//! - key=value mode ([`mask_secret_envs`]) takes `KEY=VALUE` entries and
//!   replaces occurrences of `VALUE` only, leaving `KEY=` untouched
//!
//! Matching is plain substring replacement, never regex.

/// Token that replaces every redacted secret.
pub const SECRET_MASK: &str = "********";

/// Replace every occurrence of each non-empty secret with [`SECRET_MASK`].
///
/// # Example
///
/// ```
/// use pipewright::secrets::mask_secrets;
///
/// assert_eq!(mask_secrets("token123 visiting", &["token123"]), "******** visiting");
/// ```
pub fn mask_secrets<S: AsRef<str>>(message: &str, secrets: &[S]) -> String {
    let mut out = message.to_string();
    for secret in secrets {
        let secret = secret.as_ref();
        if secret.is_empty() {
            continue;
        }
        out = out.replace(secret, SECRET_MASK);
    }
    out
}

/// Replace the value part of each well-formed `KEY=VALUE` entry.
///
/// Entries that are not exactly one non-empty key and one non-empty value
/// separated by a single `=` are skipped, so their values stay visible.
///
/// # Example
///
/// ```
/// use pipewright::secrets::mask_secret_envs;
///
/// let out = mask_secret_envs("export KEY=SECRETVAL\n", &["KEY=SECRETVAL"]);
/// assert_eq!(out, "export KEY=********\n");
///
/// // Values containing '=' are never redacted.
/// assert_eq!(mask_secret_envs("A=B=C", &["A=B=C"]), "A=B=C");
/// ```
pub fn mask_secret_envs<S: AsRef<str>>(message: &str, secret_envs: &[S]) -> String {
    let mut out = message.to_string();
    for entry in secret_envs {
        if let Some(value) = secret_env_value(entry.as_ref()) {
            out = out.replace(value, SECRET_MASK);
        }
    }
    out
}

/// The maskable value of a `KEY=VALUE` entry, if the entry qualifies.
fn secret_env_value(entry: &str) -> Option<&str> {
    let (key, value) = entry.split_once('=')?;
    if key.is_empty() || value.is_empty() || value.contains('=') {
        return None;
    }
    Some(value)
}

/// Masks a fixed set of secrets collected from several sources.
///
/// Secrets are applied in registration order; duplicates and empty strings
/// are ignored.
///
/// # Example
///
/// ```
/// use pipewright::secrets::SecretMasker;
///
/// let mut masker = SecretMasker::from_secret_envs(&["GITHUB_TOKEN=ghp_abc"]);
/// masker.add_secret("hunter2");
///
/// let output = masker.mask("token ghp_abc, password hunter2");
/// assert_eq!(output, "token ********, password ********");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SecretMasker {
    secrets: Vec<String>,
}

impl SecretMasker {
    /// Create a masker with no secrets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a masker from `KEY=VALUE` secret environment entries.
    pub fn from_secret_envs<S: AsRef<str>>(secret_envs: &[S]) -> Self {
        let mut masker = Self::new();
        for entry in secret_envs {
            if let Some(value) = secret_env_value(entry.as_ref()) {
                masker.add_secret(value);
            }
        }
        masker
    }

    /// Register a literal secret.
    ///
    /// Empty strings are ignored.
    pub fn add_secret(&mut self, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() && !self.secrets.contains(&value) {
            self.secrets.push(value);
        }
    }

    /// Register several literal secrets.
    pub fn add_secrets(&mut self, values: impl IntoIterator<Item = impl Into<String>>) {
        for value in values {
            self.add_secret(value);
        }
    }

    /// A copy of this masker that also hides `extra`.
    pub fn with_secrets(&self, extra: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut masker = self.clone();
        masker.add_secrets(extra);
        masker
    }

    /// Mask any registered secret in the given text.
    pub fn mask(&self, input: &str) -> String {
        mask_secrets(input, &self.secrets)
    }

    /// Mask raw bytes without assuming they are UTF-8.
    ///
    /// Bytes outside any secret pass through unchanged.
    pub fn mask_bytes(&self, input: &[u8]) -> Vec<u8> {
        let mut out = input.to_vec();
        for secret in &self.secrets {
            out = replace_bytes(&out, secret.as_bytes(), SECRET_MASK.as_bytes());
        }
        out
    }

    /// Number of registered secrets.
    pub fn secret_count(&self) -> usize {
        self.secrets.len()
    }
}

fn replace_bytes(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Vec<u8> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return haystack.to_vec();
    }
    let mut out = Vec::with_capacity(haystack.len());
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(needle) {
            out.extend_from_slice(replacement);
            i += needle.len();
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }
    out
}
