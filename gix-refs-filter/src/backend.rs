//! Capability-gated integration with the host's authorization pipeline.
//!
//! The host exposes one caller-scoped surface for ref filtering; this module
//! wraps it with a decorator that further restricts the advertised set for
//! callers holding the [`HIDE_CLOSED_CHANGES_REFS`] capability. Composition
//! instead of inheritance: the wrapper holds the default backend and
//! delegates everything except the one operation it tightens.

use crate::error::Result;
use crate::filter::RefsFilter;
use crate::types::{ProjectName, RefRecord, RepositoryHandle};
use std::sync::Arc;

/// Name of the capability that opts a caller into closed-change ref filtering.
pub const HIDE_CLOSED_CHANGES_REFS: &str = "hideClosedChangesRefs";

/// Human-readable description of [`HIDE_CLOSED_CHANGES_REFS`].
pub const HIDE_CLOSED_CHANGES_REFS_DESCRIPTION: &str = "Filter out closed changes refs";

/// Options forwarded to the host's own ref filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefFilterOptions {
    /// Ask the host to also drop refs it classifies as internal metadata.
    pub filter_meta: bool,
}

/// The caller-scoped slice of the host's permission system.
///
/// An instance is already bound to one (caller, connection) pair by the
/// host; `can` answers capability questions for that caller and
/// `filter_refs` applies the host's own visibility rules (ACLs and the
/// like) for one project.
pub trait PermissionBackend: Send + Sync {
    /// True if the caller holds the named global capability.
    fn can(&self, capability: &str) -> bool;

    /// The host's own ref filtering for `project`.
    fn filter_refs(
        &self,
        project: &ProjectName,
        repo: &RepositoryHandle,
        refs: Vec<RefRecord>,
        opts: RefFilterOptions,
    ) -> Result<Vec<RefRecord>>;
}

/// Decorator that hides closed-change refs from capable callers.
///
/// Delegates every operation to the wrapped backend; `filter_refs` lets the
/// default filtering run first and only then drops refs of closed changes,
/// so this can only ever narrow what the host would advertise.
pub struct FilteringBackend<B> {
    inner: B,
    refs_filter: Arc<RefsFilter>,
}

impl<B> FilteringBackend<B> {
    /// Wrap the host backend.
    pub fn new(inner: B, refs_filter: Arc<RefsFilter>) -> Self {
        Self { inner, refs_filter }
    }

    /// The wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: PermissionBackend> PermissionBackend for FilteringBackend<B> {
    fn can(&self, capability: &str) -> bool {
        self.inner.can(capability)
    }

    fn filter_refs(
        &self,
        project: &ProjectName,
        repo: &RepositoryHandle,
        refs: Vec<RefRecord>,
        opts: RefFilterOptions,
    ) -> Result<Vec<RefRecord>> {
        let refs = self.inner.filter_refs(project, repo, refs, opts)?;
        if !self.inner.can(HIDE_CLOSED_CHANGES_REFS) {
            return Ok(refs);
        }
        Ok(self.refs_filter.filter(refs, repo, project))
    }
}
