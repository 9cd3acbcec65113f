//! Recognition and parsing of structural ref name patterns.
//!
//! Everything in here is pure and deterministic: classification never fails,
//! it only answers "is this name shaped like X". Malformed names are an
//! expected input, not an error.

use crate::types::ChangeId;
use bstr::{BStr, BString, ByteSlice};

/// Namespace holding one ref per change patch set plus the change meta ref.
pub const REFS_CHANGES: &str = "refs/changes/";
/// Namespace holding per-user working state (account data, change edits).
pub const REFS_USERS: &str = "refs/users/";
/// Namespace caching merge results computed during review.
pub const REFS_CACHE_AUTOMERGE: &str = "refs/cache-automerge/";
/// Last path segment of a change's meta ref.
pub const META_SUFFIX: &str = "/meta";

/// True iff `name` lies in the change-ref namespace.
pub fn is_change_ref(name: &BStr) -> bool {
    name.starts_with_str(REFS_CHANGES)
}

/// True iff `name` is a change's meta ref, the ref tracking its review metadata.
pub fn is_change_meta_ref(name: &BStr) -> bool {
    is_change_ref(name) && name.ends_with_str(META_SUFFIX)
}

/// True iff `name` lies in the per-user namespace.
pub fn is_user_ref(name: &BStr) -> bool {
    name.starts_with_str(REFS_USERS)
}

/// True iff `name` lies in the auto-merge cache namespace.
pub fn is_automerge_ref(name: &BStr) -> bool {
    name.starts_with_str(REFS_CACHE_AUTOMERGE)
}

/// Extract the change number encoded in a change ref's path.
///
/// Change refs are laid out as `refs/changes/<shard>/<id>/<rest>` where
/// `<shard>` is the id modulo 100 and `<rest>` is a patch-set number or
/// `meta`. Returns `None` for names outside the namespace or whose id
/// segment is not a number.
pub fn change_id(name: &BStr) -> Option<ChangeId> {
    let rest = name.strip_prefix(REFS_CHANGES.as_bytes())?;
    let mut segments = rest.split(|b| *b == b'/');
    let _shard = segments.next()?;
    let id = segments.next()?;
    if id.is_empty() || !id.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let id = std::str::from_utf8(id).ok()?.parse().ok()?;
    Some(ChangeId::new(id))
}

/// The name of the meta ref for `change`, e.g. `refs/changes/34/1234/meta`.
pub fn meta_ref(change: ChangeId) -> BString {
    format!(
        "{}{:02}/{}{}",
        REFS_CHANGES,
        change.get() % 100,
        change.get(),
        META_SUFFIX
    )
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstr::ByteSlice;

    fn id(n: u64) -> Option<ChangeId> {
        Some(ChangeId::new(n))
    }

    #[test]
    fn change_refs_are_recognized_by_prefix() {
        assert!(is_change_ref(b"refs/changes/01/1/1".as_bstr()));
        assert!(is_change_ref(b"refs/changes/34/1234/meta".as_bstr()));
        assert!(!is_change_ref(b"refs/heads/main".as_bstr()));
        assert!(!is_change_ref(b"refs/changesx/01/1/1".as_bstr()));
    }

    #[test]
    fn meta_refs_require_both_prefix_and_suffix() {
        assert!(is_change_meta_ref(b"refs/changes/01/1/meta".as_bstr()));
        assert!(!is_change_meta_ref(b"refs/changes/01/1/1".as_bstr()));
        assert!(!is_change_meta_ref(b"refs/heads/meta-analysis/meta".as_bstr()));
    }

    #[test]
    fn change_id_parses_the_second_segment() {
        assert_eq!(change_id(b"refs/changes/01/1/1".as_bstr()), id(1));
        assert_eq!(change_id(b"refs/changes/34/1234/meta".as_bstr()), id(1234));
        assert_eq!(change_id(b"refs/changes/99/100099/7".as_bstr()), id(100_099));
    }

    #[test]
    fn change_id_is_absent_for_malformed_names() {
        assert_eq!(change_id(b"refs/heads/main".as_bstr()), None);
        assert_eq!(change_id(b"refs/changes/01".as_bstr()), None);
        assert_eq!(change_id(b"refs/changes/01/x/meta".as_bstr()), None);
        assert_eq!(change_id(b"refs/changes/01//1".as_bstr()), None);
        assert_eq!(change_id(b"refs/changes/".as_bstr()), None);
    }

    #[test]
    fn meta_ref_shards_by_the_last_two_digits() {
        assert_eq!(meta_ref(ChangeId::new(1)), "refs/changes/01/1/meta");
        assert_eq!(meta_ref(ChangeId::new(1234)), "refs/changes/34/1234/meta");
        assert_eq!(meta_ref(ChangeId::new(100)), "refs/changes/00/100/meta");
    }
}
