//! Boundary to the change-metadata store.
//!
//! The host owns the actual store (review metadata kept alongside the
//! repository); this crate only needs to ask it two questions per change,
//! and does so through [`ChangeStore`].

use crate::types::{ChangeId, ProjectName};
use gix_hash::ObjectId;
use std::time::SystemTime;

/// Review state of a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    /// The change is under review.
    New,
    /// The change was submitted.
    Merged,
    /// The change was abandoned.
    Abandoned,
}

impl ChangeStatus {
    /// True while the change is still under review.
    pub fn is_open(&self) -> bool {
        matches!(self, ChangeStatus::New)
    }
}

/// Metadata of one change as produced by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeMetadata {
    /// Current review state.
    pub status: ChangeStatus,
    /// When the change was last updated (new patch set, review, submit, abandon).
    pub last_updated: SystemTime,
}

/// Error raised by a [`ChangeStore`] lookup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The change is not (or no longer) present in the store.
    ///
    /// This is a normal outcome for stale refs or races with change deletion
    /// and is absorbed by the caches, never surfaced to filtering callers.
    #[error("change {change} does not exist")]
    NotFound {
        /// The change that could not be found.
        change: ChangeId,
    },
    /// The store could not be read at all.
    #[error("change metadata store failure")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Read access to change metadata, scoped to one lookup at a time.
///
/// `create_checked` verifies that `change` exists in `project` at
/// `change_revision` (the change's meta-ref tip, when known) and returns its
/// metadata. Implementations are expected to be cheap to call only insofar
/// as the caches in front of them allow; a lookup may read the repository.
pub trait ChangeStore: Send + Sync {
    /// Load the metadata of `change`, verifying it exists.
    fn create_checked(
        &self,
        repo: &gix::ThreadSafeRepository,
        project: &ProjectName,
        change: ChangeId,
        change_revision: Option<ObjectId>,
    ) -> Result<ChangeMetadata, Error>;
}
