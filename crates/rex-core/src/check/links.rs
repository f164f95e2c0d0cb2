//! Per-check link registry and the descent policy.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

/// Tag category that is recorded but never descended into.
pub const ANCHOR_TAG: &str = "a";

/// Decides whether a link sighting spawns a child check.
///
/// Pure: the caller looks up `already_seen` in the registry before recording
/// the sighting, then enqueues separately.
pub fn should_descend(descend: bool, tag: &str, already_seen: bool) -> bool {
    descend && tag != ANCHOR_TAG && !already_seen
}

/// Why a link could not become a child check target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// `base` or the joined reference is not a valid URL.
    Invalid(url::ParseError),
    /// Resolved fine but the scheme is not fetchable over HTTP.
    UnsupportedScheme(String),
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::Invalid(e) => write!(f, "{}", e),
            ResolveError::UnsupportedScheme(s) => write!(f, "unsupported scheme {:?}", s),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Resolve `link` against `base`, keeping only http(s) targets.
pub fn resolve_link(base: &str, link: &str) -> Result<String, ResolveError> {
    let base = Url::parse(base).map_err(ResolveError::Invalid)?;
    let joined = base.join(link).map_err(ResolveError::Invalid)?;
    match joined.scheme() {
        "http" | "https" => Ok(joined.into()),
        other => Err(ResolveError::UnsupportedScheme(other.to_string())),
    }
}

/// Tag → unique link values, plus the count of every sighting.
///
/// Sets are created lazily the first time a tag is observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkRegistry {
    links: BTreeMap<String, BTreeSet<String>>,
    link_count: usize,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sighting. Returns true if `(tag, link)` had not been seen before.
    pub fn observe(&mut self, tag: &str, link: &str) -> bool {
        self.link_count += 1;
        self.links
            .entry(tag.to_string())
            .or_default()
            .insert(link.to_string())
    }

    pub fn contains(&self, tag: &str, link: &str) -> bool {
        self.links.get(tag).is_some_and(|set| set.contains(link))
    }

    /// Total sightings, duplicates included.
    pub fn link_count(&self) -> usize {
        self.link_count
    }

    /// Number of distinct `(tag, link)` pairs.
    pub fn unique_count(&self) -> usize {
        self.links.values().map(BTreeSet::len).sum()
    }

    pub fn get(&self, tag: &str) -> Option<&BTreeSet<String>> {
        self.links.get(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.links.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.links
    }
}
