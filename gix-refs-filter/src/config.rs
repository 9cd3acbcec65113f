//! Show/hide rules and per-project grace-period resolution.
//!
//! # Configuration Keys
//!
//! - `refsfilter.hideRefs`: multi-valued list of ref-name prefixes to hide
//!   from advertisements; a leading `!` turns an entry into a show override
//!   that wins over every hide entry.
//! - `refsfilter.closedChangeGrace`: duration during which a closed change's
//!   refs stay advertised, e.g. `24 hours` or `500 ms`. Bare numbers are
//!   seconds. Unset means zero: hide closed changes immediately.

use crate::error::Error;
use crate::types::ProjectName;
use bstr::{BStr, ByteSlice};
use std::collections::HashMap;
use std::time::Duration;

/// Multi-valued git-config key carrying hide/show ref prefixes.
pub const KEY_HIDE_REFS: &str = "refsfilter.hideRefs";
/// Git-config key carrying the closed-change grace period.
pub const KEY_CLOSED_CHANGE_GRACE: &str = "refsfilter.closedChangeGrace";

/// Server-wide show/hide prefix rules.
///
/// Rules are plain name prefixes. An entry starting with `!` is a show
/// override; show entries are consulted first and win regardless of how
/// specific the competing hide entry is. A name matching neither list is
/// shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRefsConfig {
    hide_refs: Vec<String>,
    show_refs: Vec<String>,
}

impl FilterRefsConfig {
    /// Split raw pattern strings into hide and show lists.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut hide_refs = Vec::new();
        let mut show_refs = Vec::new();
        for pattern in patterns {
            let pattern = pattern.into();
            let pattern = pattern.trim();
            if pattern.is_empty() {
                continue;
            }
            if let Some(rest) = pattern.strip_prefix('!') {
                show_refs.push(rest.trim().to_owned());
            } else {
                hide_refs.push(pattern.to_owned());
            }
        }
        Self { hide_refs, show_refs }
    }

    /// Load the rule set from a repository's configuration.
    pub fn from_repository(repo: &gix::Repository) -> Self {
        let config = repo.config_snapshot();
        let mut patterns = Vec::new();
        if let Some(values) = config.strings(KEY_HIDE_REFS) {
            for value in values {
                patterns.push(value.to_string());
            }
        }
        Self::new(patterns)
    }

    /// Whether the configured prefix rules leave `name` visible.
    pub fn is_ref_to_show(&self, name: &BStr) -> bool {
        for prefix in &self.show_refs {
            if name.starts_with_str(prefix) {
                return true;
            }
        }
        for prefix in &self.hide_refs {
            if name.starts_with_str(prefix) {
                return false;
            }
        }
        true
    }
}

/// Parse a grace-period duration with an optional unit suffix.
///
/// Accepted units: milliseconds (`ms`, `millis`, …), seconds, minutes,
/// hours, days and weeks, long or short form. A bare number is seconds.
pub fn parse_grace(text: &str) -> Result<Duration, Error> {
    let text = text.trim();
    let digits = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(digits);
    let invalid = || Error::InvalidGracePeriod {
        value: text.to_owned(),
    };
    let value: u64 = number.parse().map_err(|_| invalid())?;
    let millis = match unit.trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => value.saturating_mul(1_000),
        "ms" | "msec" | "msecs" | "milli" | "millis" | "millisecond" | "milliseconds" => value,
        "m" | "min" | "mins" | "minute" | "minutes" => value.saturating_mul(60_000),
        "h" | "hr" | "hrs" | "hour" | "hours" => value.saturating_mul(3_600_000),
        "d" | "day" | "days" => value.saturating_mul(86_400_000),
        "w" | "week" | "weeks" => value.saturating_mul(604_800_000),
        _ => return Err(invalid()),
    };
    Ok(Duration::from_millis(millis))
}

/// Read the closed-change grace period from a repository's configuration.
///
/// Returns `None` when the key is unset; hosts resolving inherited project
/// configuration call this per repository and fall back along their own
/// inheritance chain.
pub fn grace_from_repository(repo: &gix::Repository) -> Result<Option<Duration>, Error> {
    let config = repo.config_snapshot();
    match config.string(KEY_CLOSED_CHANGE_GRACE) {
        Some(value) => parse_grace(&value.to_string()).map(Some),
        None => Ok(None),
    }
}

/// Resolver of per-project filter configuration.
///
/// Callers treat a resolution failure as "hide closed changes immediately":
/// the error is logged and filtering proceeds with zero grace.
pub trait ProjectConfigSource: Send + Sync {
    /// The grace period during which a closed change's refs stay advertised.
    fn closed_change_grace(&self, project: &ProjectName) -> Result<Duration, Error>;
}

/// A fixed per-project table with a default, for embedders that resolve
/// project configuration up front.
#[derive(Debug, Clone, Default)]
pub struct StaticProjectConfig {
    default: Duration,
    projects: HashMap<ProjectName, Duration>,
}

impl StaticProjectConfig {
    /// Zero grace everywhere: closed changes disappear immediately.
    pub fn hide_immediately() -> Self {
        Self::default()
    }

    /// Use `grace` for every project without an explicit entry.
    pub fn with_default(grace: Duration) -> Self {
        Self {
            default: grace,
            projects: HashMap::new(),
        }
    }

    /// Set the grace period for one project.
    pub fn with_project(mut self, project: impl Into<ProjectName>, grace: Duration) -> Self {
        self.projects.insert(project.into(), grace);
        self
    }
}

impl ProjectConfigSource for StaticProjectConfig {
    fn closed_change_grace(&self, project: &ProjectName) -> Result<Duration, Error> {
        Ok(self.projects.get(project).copied().unwrap_or(self.default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstr::ByteSlice;

    #[test]
    fn patterns_split_into_hide_and_show() {
        let config = FilterRefsConfig::new(["refs/heads/sandbox/", " !refs/heads/sandbox/mine ", ""]);
        assert!(!config.is_ref_to_show(b"refs/heads/sandbox/foo".as_bstr()));
        assert!(config.is_ref_to_show(b"refs/heads/sandbox/mine".as_bstr()));
    }

    #[test]
    fn show_overrides_hide_regardless_of_specificity() {
        let config = FilterRefsConfig::new(["refs/heads/sandbox/mine/private", "!refs/heads/sandbox/"]);
        assert!(config.is_ref_to_show(b"refs/heads/sandbox/mine/private/x".as_bstr()));
    }

    #[test]
    fn unmatched_names_default_to_show() {
        let config = FilterRefsConfig::new(["refs/heads/sandbox/"]);
        assert!(config.is_ref_to_show(b"refs/heads/main".as_bstr()));
        assert!(config.is_ref_to_show(b"refs/tags/v1.0".as_bstr()));
    }

    #[test]
    fn empty_config_shows_everything() {
        let config = FilterRefsConfig::default();
        assert!(config.is_ref_to_show(b"refs/heads/main".as_bstr()));
    }

    #[test]
    fn grace_accepts_unit_suffixes() {
        assert_eq!(parse_grace("0").unwrap(), Duration::ZERO);
        assert_eq!(parse_grace("90").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_grace("500 ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_grace("500 milliseconds").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_grace("15 minutes").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_grace("24 hours").unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_grace("1w").unwrap(), Duration::from_secs(604_800));
    }

    #[test]
    fn grace_rejects_garbage() {
        assert!(parse_grace("").is_err());
        assert!(parse_grace("soon").is_err());
        assert!(parse_grace("10 fortnights").is_err());
        assert!(parse_grace("-5 s").is_err());
    }

    #[test]
    fn static_source_falls_back_to_its_default() {
        let source = StaticProjectConfig::with_default(Duration::from_secs(60))
            .with_project("special", Duration::from_secs(3600));
        assert_eq!(
            source.closed_change_grace(&"special".into()).unwrap(),
            Duration::from_secs(3600)
        );
        assert_eq!(
            source.closed_change_grace(&"other".into()).unwrap(),
            Duration::from_secs(60)
        );
    }
}
