//! Process-wide caches for change openness and last-update times.
//!
//! Both caches are read-through: a miss asks the [`ChangeStore`] for the
//! change's metadata and remembers the answer. They are created once at
//! process start and shared by every connection; the change revision inside
//! the key means entries go stale-free on their own — a change that mutates
//! gets a new meta-ref tip and therefore a new key.

use crate::error::Error;
use crate::store::{self, ChangeStore};
use crate::types::{ChangeId, ProjectName, RepositoryHandle};
use gix_hash::ObjectId;
use moka::sync::Cache;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Key identifying one cached change-state lookup.
///
/// The repository handle is carried so the loader has a repository to query
/// on a miss; it never participates in equality or hashing. Keys built for
/// the same `(change, change_revision, project)` by different connections
/// must collide, otherwise every connection would pay its own loads.
#[derive(Clone)]
pub struct ChangeCacheKey {
    repo: RepositoryHandle,
    change: ChangeId,
    change_revision: Option<ObjectId>,
    project: ProjectName,
}

impl ChangeCacheKey {
    /// Create a key for one change lookup.
    pub fn new(
        repo: RepositoryHandle,
        change: ChangeId,
        change_revision: Option<ObjectId>,
        project: ProjectName,
    ) -> Self {
        Self {
            repo,
            change,
            change_revision,
            project,
        }
    }

    /// The repository the loader queries on a miss.
    pub fn repo(&self) -> &RepositoryHandle {
        &self.repo
    }

    /// The change this key refers to.
    pub fn change(&self) -> ChangeId {
        self.change
    }

    /// The change's meta-ref tip at key construction time, when known.
    pub fn change_revision(&self) -> Option<ObjectId> {
        self.change_revision
    }

    /// The project the change belongs to.
    pub fn project(&self) -> &ProjectName {
        &self.project
    }
}

impl PartialEq for ChangeCacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.change == other.change
            && self.change_revision == other.change_revision
            && self.project == other.project
    }
}

impl Eq for ChangeCacheKey {}

impl Hash for ChangeCacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.change.hash(state);
        self.change_revision.hash(state);
        self.project.hash(state);
    }
}

impl std::fmt::Debug for ChangeCacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeCacheKey")
            .field("change", &self.change)
            .field("change_revision", &self.change_revision)
            .field("project", &self.project)
            .finish_non_exhaustive()
    }
}

/// Tuning knobs for one cache tier.
///
/// Eviction is a resource concern, not a correctness one: entries are
/// immutable once computed and keyed by the change revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// Maximum number of retained entries.
    pub capacity: u64,
    /// Optional wall-clock expiry for entries.
    pub time_to_live: Option<Duration>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            capacity: 1024,
            time_to_live: None,
        }
    }
}

impl CacheOptions {
    fn build<V>(self) -> Cache<ChangeCacheKey, V>
    where
        V: Clone + Send + Sync + 'static,
    {
        let mut builder = Cache::builder().max_capacity(self.capacity);
        if let Some(ttl) = self.time_to_live {
            builder = builder.time_to_live(ttl);
        }
        builder.build()
    }
}

/// Cache answering "is this change currently open".
///
/// A change the store cannot find loads as closed: absent and closed have
/// the same visibility consequence.
#[derive(Clone)]
pub struct OpenChangesCache {
    inner: Cache<ChangeCacheKey, bool>,
    store: Arc<dyn ChangeStore>,
}

impl OpenChangesCache {
    /// Create the cache over the given metadata store.
    pub fn new(store: Arc<dyn ChangeStore>, options: CacheOptions) -> Self {
        Self {
            inner: options.build(),
            store,
        }
    }

    /// Whether the change behind `key` is open, loading on a miss.
    pub fn lookup(&self, key: &ChangeCacheKey) -> Result<bool, Error> {
        self.inner
            .try_get_with(key.clone(), || {
                match self.store.create_checked(
                    key.repo(),
                    key.project(),
                    key.change(),
                    key.change_revision(),
                ) {
                    Ok(meta) => Ok(meta.status.is_open()),
                    Err(store::Error::NotFound { change }) => {
                        debug!(%change, "change does not exist, hiding from the advertised refs");
                        Ok(false)
                    }
                    Err(err) => Err(err),
                }
            })
            .map_err(|source| Error::ChangeLoad {
                change: key.change(),
                source,
            })
    }

    /// The cached value for `key`, without triggering a load.
    pub fn cached(&self, key: &ChangeCacheKey) -> Option<bool> {
        self.inner.get(key)
    }

    /// Number of retained entries, after flushing pending maintenance.
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

/// Cache answering "when was this change last updated", in epoch milliseconds.
///
/// A change the store cannot find loads as the zero epoch, which any
/// positive grace period treats as not recent.
#[derive(Clone)]
pub struct ChangeTsCache {
    inner: Cache<ChangeCacheKey, u64>,
    store: Arc<dyn ChangeStore>,
}

impl ChangeTsCache {
    /// Create the cache over the given metadata store.
    pub fn new(store: Arc<dyn ChangeStore>, options: CacheOptions) -> Self {
        Self {
            inner: options.build(),
            store,
        }
    }

    /// Epoch milliseconds of the change's last update, loading on a miss.
    pub fn lookup(&self, key: &ChangeCacheKey) -> Result<u64, Error> {
        self.inner
            .try_get_with(key.clone(), || {
                match self.store.create_checked(
                    key.repo(),
                    key.project(),
                    key.change(),
                    key.change_revision(),
                ) {
                    Ok(meta) => Ok(epoch_millis(meta.last_updated)),
                    Err(store::Error::NotFound { change }) => {
                        debug!(%change, "change does not exist, returning zero epoch");
                        Ok(0)
                    }
                    Err(err) => Err(err),
                }
            })
            .map_err(|source| Error::ChangeLoad {
                change: key.change(),
                source,
            })
    }

    /// The cached value for `key`, without triggering a load.
    pub fn cached(&self, key: &ChangeCacheKey) -> Option<u64> {
        self.inner.get(key)
    }

    /// Number of retained entries, after flushing pending maintenance.
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

pub(crate) fn epoch_millis(t: std::time::SystemTime) -> u64 {
    t.duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn scratch_repo(dir: &std::path::Path) -> RepositoryHandle {
        std::fs::create_dir_all(dir.join("objects")).unwrap();
        std::fs::create_dir_all(dir.join("refs")).unwrap();
        std::fs::write(dir.join("HEAD"), "ref: refs/heads/main\n").unwrap();
        std::fs::write(
            dir.join("config"),
            "[core]\n\trepositoryformatversion = 0\n\tbare = true\n",
        )
        .unwrap();
        Arc::new(gix::open(dir).unwrap().into_sync())
    }

    fn hash_of(key: &ChangeCacheKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn keys_ignore_the_repository_handle() {
        let tmp = tempfile::tempdir().unwrap();
        let repo_a = scratch_repo(&tmp.path().join("a"));
        let repo_b = scratch_repo(&tmp.path().join("b"));
        let revision = Some(ObjectId::null(gix_hash::Kind::Sha1));

        let key_a = ChangeCacheKey::new(repo_a, ChangeId::new(10_000), revision, "test_repo".into());
        let key_b = ChangeCacheKey::new(repo_b, ChangeId::new(10_000), revision, "test_repo".into());

        assert_eq!(key_a, key_b);
        assert_eq!(hash_of(&key_a), hash_of(&key_b));
    }

    #[test]
    fn keys_differ_on_change_revision_and_project() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = scratch_repo(tmp.path());
        let revision = Some(ObjectId::null(gix_hash::Kind::Sha1));

        let key = ChangeCacheKey::new(repo.clone(), ChangeId::new(1), revision, "p".into());
        let other_change = ChangeCacheKey::new(repo.clone(), ChangeId::new(2), revision, "p".into());
        let other_revision = ChangeCacheKey::new(repo.clone(), ChangeId::new(1), None, "p".into());
        let other_project = ChangeCacheKey::new(repo, ChangeId::new(1), revision, "q".into());

        assert_ne!(key, other_change);
        assert_ne!(key, other_revision);
        assert_ne!(key, other_project);
    }
}
