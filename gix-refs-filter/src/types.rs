//! Common types shared across the filtering pipeline.

use bstr::BString;
use gix_hash::ObjectId;
use std::sync::Arc;

/// A repository as threaded through the filter and cache keys.
///
/// The handle is `Send + Sync`; use sites convert to a thread-local
/// [`gix::Repository`] before touching the ref store or object database.
pub type RepositoryHandle = Arc<gix::ThreadSafeRepository>;

/// A candidate reference with its object id and fully qualified name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefRecord {
    /// The object id the reference points to.
    pub id: ObjectId,
    /// The fully qualified reference name.
    pub name: BString,
}

impl RefRecord {
    /// Create a new reference record.
    pub fn new(id: ObjectId, name: impl Into<BString>) -> Self {
        Self { id, name: name.into() }
    }
}

/// The name of the project (repository) a ref advertisement is served for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectName(String);

impl ProjectName {
    /// Create a project name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The project name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectName {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for ProjectName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// The numeric identifier of a code-review change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChangeId(u64);

impl ChangeId {
    /// Create a change id from its number.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The change number.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ChangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
