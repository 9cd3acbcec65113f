//! Advertised-ref filtering for closed code-review changes.
//!
//! Code-review servers accumulate one ref per patch set plus a metadata ref
//! per change. Clients fetching from a busy repository pay for every one of
//! them on every advertisement, even though most point at changes that were
//! merged or abandoned long ago. This crate filters a candidate ref set
//! down to what is worth advertising:
//!
//! - per-user and auto-merge cache namespaces are never advertised;
//! - configurable hide/show name prefixes, where a show entry always wins;
//! - change meta refs are dropped;
//! - refs of closed changes are dropped once a per-project grace period has
//!   elapsed since the change was last touched.
//!
//! The open/closed and last-updated questions are answered by two shared
//! read-through caches keyed by the change's meta-ref tip, so a mutated
//! change never reuses a stale answer and an unchanged one is never
//! re-queried. Lookup failures always fail open: a ref is kept rather than
//! silently hidden because of an infrastructure fault.
//!
//! Hosts integrate via [`FilteringBackend`], a decorator over their own
//! permission backend that applies [`RefsFilter`] only for callers holding
//! the [`HIDE_CLOSED_CHANGES_REFS`] capability.

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod refname;
pub mod store;
mod types;

pub use backend::{
    FilteringBackend, PermissionBackend, RefFilterOptions, HIDE_CLOSED_CHANGES_REFS,
};
pub use cache::{CacheOptions, ChangeCacheKey, ChangeTsCache, OpenChangesCache};
pub use config::{FilterRefsConfig, ProjectConfigSource, StaticProjectConfig};
pub use error::{Error, Result};
pub use filter::RefsFilter;
pub use store::{ChangeMetadata, ChangeStatus, ChangeStore};
pub use types::{ChangeId, ProjectName, RefRecord, RepositoryHandle};

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
