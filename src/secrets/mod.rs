//! Secret masking.
//!
//! - [`mask_secrets`] - Redact literal secret strings
//! - [`mask_secret_envs`] - Redact the values of `KEY=VALUE` secret entries
//! - [`SecretMasker`] - A reusable set of secrets applied to every output line
//!
//! # Example
//!
//! ```
//! use pipewright::secrets::{mask_secret_envs, SecretMasker};
//!
//! let line = mask_secret_envs("curl -H 'token: abc123'", &["API_TOKEN=abc123"]);
//! assert!(!line.contains("abc123"));
//!
//! let masker = SecretMasker::from_secret_envs(&["API_TOKEN=abc123"]);
//! assert_eq!(masker.mask("abc123"), "********");
//! ```

pub mod mask;

pub use mask::{mask_secret_envs, mask_secrets, SecretMasker, SECRET_MASK};
