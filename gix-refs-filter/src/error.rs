//! Error types for ref-filtering operations.

use crate::store;
use crate::types::{ChangeId, ProjectName};
use std::sync::Arc;

/// Result type alias for ref-filtering operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error raised on the filtering path.
///
/// Note that per-ref failures never surface through [`crate::RefsFilter`];
/// they are logged and resolve to a keep decision for the affected ref.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Loading change state through a cache failed for a reason other than
    /// the change being absent.
    #[error("failed to load state of change {change} from the metadata store")]
    ChangeLoad {
        /// The change whose state could not be loaded.
        change: ChangeId,
        /// The underlying store failure, shared with all waiters of the load.
        #[source]
        source: Arc<store::Error>,
    },

    /// A grace-period value could not be parsed.
    #[error("invalid grace period value {value:?}")]
    InvalidGracePeriod {
        /// The rejected configuration text.
        value: String,
    },

    /// Per-project configuration could not be resolved.
    #[error("no configuration available for project {project}")]
    ProjectNotFound {
        /// The project that could not be resolved.
        project: ProjectName,
    },

    /// Failure raised by the host's own permission backend.
    #[error("permission backend failure")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap a host backend failure.
    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend(err.into())
    }
}
