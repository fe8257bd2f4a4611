//! Values file resolution.
//!
//! - [`ConcurrentFetchMerger`] fetches several values files from one
//!   repository in parallel and merges them in the order given
//! - [`ValueSourceSyncer`] decides whether a stored values document has
//!   drifted from the git repository or variable set it came from
//!
//! Both talk to the outside world only through the collaborator traits
//! [`CodeHostLookup`], [`RepoDownloader`], [`WorkingCopySync`] and
//! [`VariableSetStore`].

pub mod codehost;
pub mod download;
pub mod equality;
pub mod merger;
pub mod source;
pub mod syncer;
pub mod variable_set;
pub mod working_copy;

pub use codehost::CodeHostLookup;
pub use download::{HttpRepoDownloader, RepoDownloader};
pub use equality::documents_equal;
pub use merger::ConcurrentFetchMerger;
pub use source::{CustomYaml, GitRepoConfig, RepoCoordinates, SourceDetail, YamlSource};
pub use syncer::{SyncOutcome, ValueSourceSyncer};
pub use variable_set::{DirVariableSetStore, VariableSet, VariableSetStore};
pub use working_copy::{GitWorkingCopy, WorkingCopySync};
