//! Commit records and the identifiers that key them.
//!
//! A [`Sha`] is a plain hex string handle; the all-zero sha is reserved for
//! the synthetic work-in-progress commit. Child back-references are stored
//! as sha handles, never as pointers, so re-inserting a commit can never
//! invalidate another commit's links.

use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::LaneType;

/// A commit identifier, as produced by the log output of the git tool.
///
/// No length or charset validation is applied: the cache trusts the
/// upstream tool and treats the sha as an opaque key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sha(String);

impl Sha {
    /// The reserved sha of the work-in-progress pseudo-commit.
    pub const ZERO: &'static str = "0000000000000000000000000000000000000000";

    pub fn new(sha: impl Into<String>) -> Self {
        Self(sha.into())
    }

    /// The sha of the work-in-progress pseudo-commit.
    pub fn zero() -> Self {
        Self(Self::ZERO.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Self::ZERO
    }

    /// short form used in log output
    pub fn short(&self) -> &str {
        self.0.get(..7).unwrap_or(&self.0)
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Sha {
    fn from(sha: &str) -> Self {
        Self(sha.to_string())
    }
}

/// Allows sha-keyed map lookups with a plain `&str`.
impl Borrow<str> for Sha {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Sha {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A single commit as held by the cache.
///
/// Identity fields come from the log output; the lane sequence and the
/// child set are derived by the cache during a refresh. Equality compares
/// identity only, so a commit re-read from the tool compares equal to its
/// cached counterpart even before lanes are assigned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitInfo {
    sha: Sha,
    parents: Vec<Sha>,
    boundary: Option<char>,
    committer: String,
    author: String,
    date: DateTime<Utc>,
    short_log: String,
    long_log: String,
    signed: bool,
    gpg_key: String,
    lanes: Vec<LaneType>,
    children: Vec<Sha>,
}

impl CommitInfo {
    pub fn new(
        sha: Sha,
        parents: Vec<Sha>,
        committer: impl Into<String>,
        author: impl Into<String>,
        date: DateTime<Utc>,
        short_log: impl Into<String>,
        long_log: impl Into<String>,
    ) -> Self {
        Self {
            sha,
            parents,
            boundary: None,
            committer: committer.into(),
            author: author.into(),
            date,
            short_log: short_log.into(),
            long_log: long_log.into(),
            signed: false,
            gpg_key: String::new(),
            lanes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn sha(&self) -> &Sha {
        &self.sha
    }

    pub fn parents(&self) -> &[Sha] {
        &self.parents
    }

    pub fn parents_count(&self) -> usize {
        self.parents.len()
    }

    pub fn parent(&self, idx: usize) -> Option<&Sha> {
        self.parents.get(idx)
    }

    pub fn committer(&self) -> &str {
        &self.committer
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn short_log(&self) -> &str {
        &self.short_log
    }

    pub fn long_log(&self) -> &str {
        &self.long_log
    }

    /// short log plus trimmed long log, for detail views
    pub fn full_log(&self) -> String {
        format!("{}\n\n{}", self.short_log, self.long_log.trim())
    }

    /// Boundary marker from the log output (`-` flags a boundary commit).
    pub fn set_boundary(&mut self, marker: char) {
        self.boundary = Some(marker);
    }

    pub fn is_boundary(&self) -> bool {
        self.boundary == Some('-')
    }

    pub fn set_signature(&mut self, signed: bool, gpg_key: impl Into<String>) {
        self.signed = signed;
        self.gpg_key = gpg_key.into();
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn gpg_key(&self) -> &str {
        &self.gpg_key
    }

    pub fn is_valid(&self) -> bool {
        !self.sha.is_empty()
    }

    pub fn is_wip(&self) -> bool {
        self.sha.is_zero()
    }

    /// Case-insensitive full-text match used by the search surface.
    pub fn contains(&self, text: &str) -> bool {
        let needle = text.to_lowercase();
        self.short_log.to_lowercase().contains(&needle)
            || self.long_log.to_lowercase().contains(&needle)
            || self.author.to_lowercase().contains(&needle)
            || self.committer.to_lowercase().contains(&needle)
            || self.sha.as_str().to_lowercase().starts_with(&needle)
    }

    pub fn set_lanes(&mut self, lanes: Vec<LaneType>) {
        self.lanes = lanes;
    }

    pub fn lanes(&self) -> &[LaneType] {
        &self.lanes
    }

    pub fn lane(&self, idx: usize) -> Option<LaneType> {
        self.lanes.get(idx).copied()
    }

    pub fn lanes_count(&self) -> usize {
        self.lanes.len()
    }

    /// The lane this commit's node sits on, if lanes have been assigned.
    pub fn active_lane(&self) -> Option<usize> {
        self.lanes.iter().position(|lane| lane.is_active())
    }

    pub(crate) fn add_child(&mut self, child: Sha) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub fn children(&self) -> &[Sha] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

impl PartialEq for CommitInfo {
    fn eq(&self, other: &Self) -> bool {
        self.sha == other.sha
            && self.parents == other.parents
            && self.committer == other.committer
            && self.author == other.author
            && self.date == other.date
            && self.short_log == other.short_log
            && self.long_log == other.long_log
    }
}

impl Eq for CommitInfo {}

/// Everything the cache needs to (re)build the work-in-progress row.
///
/// The untracked list is an explicit input here rather than cache state,
/// so a stale list can never leak between refreshes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WipInfo {
    /// Current HEAD sha, empty for an unborn branch.
    pub parent_sha: Sha,
    /// Raw name-status diff of the working tree against the index.
    pub diff_index: String,
    /// Raw name-status diff of the index against HEAD.
    pub diff_index_cached: String,
    /// Paths git reports as untracked.
    pub untracked: Vec<String>,
}

impl WipInfo {
    pub fn is_valid(&self) -> bool {
        !self.parent_sha.is_empty()
            || !self.diff_index.is_empty()
            || !self.diff_index_cached.is_empty()
    }
}
