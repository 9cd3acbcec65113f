//! The ref-filtering orchestrator.
//!
//! [`RefsFilter`] decides, ref by ref, whether a candidate reference may be
//! advertised. Decisions fall out of a fixed evaluation order: private
//! namespaces first, then the configured show/hide prefixes, then the
//! change-specific rules backed by the two caches.
//!
//! Every failure along the way resolves to *keep* for the one affected ref.
//! Hiding data must never be a side effect of an infrastructure fault, and
//! one unreadable change must not abort a whole advertisement.

use crate::cache::{epoch_millis, ChangeCacheKey, ChangeTsCache, OpenChangesCache};
use crate::config::{FilterRefsConfig, ProjectConfigSource};
use crate::refname;
use crate::types::{ChangeId, ProjectName, RefRecord, RepositoryHandle};
use bstr::ByteSlice;
use gix_hash::ObjectId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::warn;

/// Filters candidate refs down to the subset that may be advertised.
///
/// Holds no per-request state; the caches are process-wide and shared with
/// every other connection.
pub struct RefsFilter {
    config: FilterRefsConfig,
    project_config: Arc<dyn ProjectConfigSource>,
    open_changes: OpenChangesCache,
    change_ts: ChangeTsCache,
}

impl RefsFilter {
    /// Create a filter over the shared caches.
    pub fn new(
        config: FilterRefsConfig,
        project_config: Arc<dyn ProjectConfigSource>,
        open_changes: OpenChangesCache,
        change_ts: ChangeTsCache,
    ) -> Self {
        Self {
            config,
            project_config,
            open_changes,
            change_ts,
        }
    }

    /// Return the subset of `refs` to advertise for `project`.
    ///
    /// Surviving refs keep their input order. This never fails as a whole;
    /// per-ref lookup failures are logged and the affected ref is kept.
    pub fn filter(
        &self,
        refs: Vec<RefRecord>,
        repo: &RepositoryHandle,
        project: &ProjectName,
    ) -> Vec<RefRecord> {
        let grace = self.grace_period(project);
        let meta_revisions = meta_revision_index(&refs);
        refs.into_iter()
            .filter(|r| self.keep(r, &meta_revisions, repo, project, grace))
            .collect()
    }

    fn grace_period(&self, project: &ProjectName) -> Duration {
        match self.project_config.closed_change_grace(project) {
            Ok(grace) => grace,
            Err(err) => {
                warn!(
                    %project,
                    %err,
                    "cannot resolve closed-change grace period, hiding closed changes immediately"
                );
                Duration::ZERO
            }
        }
    }

    fn keep(
        &self,
        rec: &RefRecord,
        meta_revisions: &HashMap<ChangeId, ObjectId>,
        repo: &RepositoryHandle,
        project: &ProjectName,
        grace: Duration,
    ) -> bool {
        let name = rec.name.as_bstr();
        if refname::is_user_ref(name) || refname::is_automerge_ref(name) {
            return false;
        }
        if !self.config.is_ref_to_show(name) {
            return false;
        }
        if !refname::is_change_ref(name) {
            return true;
        }
        let change = refname::change_id(name);
        if refname::is_change_meta_ref(name) {
            // internal bookkeeping, only names we cannot attribute to a change stay visible
            return change.is_none();
        }
        let Some(change) = change else {
            return true;
        };
        let revision = match meta_revisions.get(&change) {
            Some(revision) => Some(*revision),
            None => match meta_revision_from_refdb(repo, change) {
                Ok(revision) => revision,
                Err(err) => {
                    warn!(%change, refname = %name, %err, "cannot resolve change meta ref, keeping its ref");
                    return true;
                }
            },
        };
        let key = ChangeCacheKey::new(repo.clone(), change, revision, project.clone());
        match self.open_changes.lookup(&key) {
            Ok(true) => true,
            Ok(false) => !grace.is_zero() && self.updated_within(&key, grace),
            Err(err) => {
                warn!(%change, refname = %name, %err, "cannot determine change state, keeping its ref");
                true
            }
        }
    }

    /// Whether the change behind `key` was updated within `grace` of now.
    fn updated_within(&self, key: &ChangeCacheKey, grace: Duration) -> bool {
        match self.change_ts.lookup(key) {
            Ok(last_updated) => {
                let cutoff =
                    epoch_millis(SystemTime::now()).saturating_sub(grace.as_millis() as u64);
                last_updated > cutoff
            }
            Err(err) => {
                warn!(change = %key.change(), %err, "cannot determine change recency, keeping its refs");
                true
            }
        }
    }
}

/// One pass over the candidate set: change id -> meta-ref tip.
///
/// Gives each change's content revision for the cache key without a second
/// ref-database query.
fn meta_revision_index(refs: &[RefRecord]) -> HashMap<ChangeId, ObjectId> {
    refs.iter()
        .filter(|r| refname::is_change_meta_ref(r.name.as_bstr()))
        .filter_map(|r| refname::change_id(r.name.as_bstr()).map(|change| (change, r.id)))
        .collect()
}

/// Exact meta-ref lookup for changes whose meta ref was not in the candidate set.
fn meta_revision_from_refdb(
    repo: &RepositoryHandle,
    change: ChangeId,
) -> Result<Option<ObjectId>, gix::refs::file::find::Error> {
    let local = repo.to_thread_local();
    let meta = refname::meta_ref(change);
    Ok(local
        .refs
        .try_find(meta.as_bstr())?
        .and_then(|r| r.target.try_id().map(ToOwned::to_owned)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstr::ByteSlice;

    fn rec(name: &str) -> RefRecord {
        RefRecord::new(ObjectId::null(gix_hash::Kind::Sha1), name)
    }

    #[test]
    fn meta_revision_index_only_picks_meta_refs() {
        let refs = vec![
            rec("refs/heads/main"),
            rec("refs/changes/01/1/1"),
            rec("refs/changes/01/1/meta"),
            rec("refs/changes/34/1234/meta"),
        ];
        let index = meta_revision_index(&refs);
        assert_eq!(index.len(), 2);
        assert!(index.contains_key(&ChangeId::new(1)));
        assert!(index.contains_key(&ChangeId::new(1234)));
    }

    #[test]
    fn meta_revision_index_skips_unparseable_meta_names() {
        let refs = vec![rec("refs/changes/01/x/meta")];
        assert!(meta_revision_index(&refs).is_empty());
        assert!(refname::is_change_meta_ref(b"refs/changes/01/x/meta".as_bstr()));
    }
}
