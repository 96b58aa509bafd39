//! Branch and tag reference indexing.
//!
//! Maps a commit sha to the set of reference names pointing at it,
//! grouped by kind. A name is unique within its kind across the whole
//! index: inserting a name that already lives under another sha moves
//! it. Adds are idempotent, removals of absent names are no-ops, and
//! per-sha containers are pruned once empty so membership queries stay
//! accurate.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::Sha;

/// The kind of a reference name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RefKind {
    LocalBranch,
    RemoteBranch,
    LocalTag,
    RemoteTag,
}

/// All reference names attached to one commit, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    by_kind: BTreeMap<RefKind, Vec<String>>,
}

impl References {
    /// Add a name under a kind; adding an existing name is a no-op.
    pub fn add(&mut self, kind: RefKind, name: impl Into<String>) {
        let name = name.into();
        let names = self.by_kind.entry(kind).or_default();
        if !names.contains(&name) {
            names.push(name);
        }
    }

    /// Remove a name; absent names are a no-op.
    pub fn remove(&mut self, kind: RefKind, name: &str) {
        if let Some(names) = self.by_kind.get_mut(&kind) {
            names.retain(|n| n != name);
            if names.is_empty() {
                self.by_kind.remove(&kind);
            }
        }
    }

    pub fn of_kind(&self, kind: RefKind) -> Vec<String> {
        self.by_kind.get(&kind).cloned().unwrap_or_default()
    }

    pub fn contains(&self, kind: RefKind, name: &str) -> bool {
        self.by_kind
            .get(&kind)
            .is_some_and(|names| names.iter().any(|n| n == name))
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}

/// sha -> references lookup for the whole repository.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    by_sha: HashMap<Sha, References>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `name` to `sha`, detaching it from any sha that held it.
    pub fn insert(&mut self, sha: Sha, kind: RefKind, name: impl Into<String>) {
        let name = name.into();
        debug!(sha = %sha.short(), ?kind, %name, "adding reference");

        self.remove_name(kind, &name);
        self.by_sha.entry(sha).or_default().add(kind, name);
    }

    /// Remove one name from one sha, pruning the container if emptied.
    pub fn remove(&mut self, sha: &Sha, kind: RefKind, name: &str) {
        if let Some(refs) = self.by_sha.get_mut(sha) {
            refs.remove(kind, name);
            if refs.is_empty() {
                self.by_sha.remove(sha);
            }
        }
    }

    /// Detach `name` of `kind` from whichever sha currently holds it.
    fn remove_name(&mut self, kind: RefKind, name: &str) {
        let holder = self
            .by_sha
            .iter()
            .find(|(_, refs)| refs.contains(kind, name))
            .map(|(sha, _)| sha.clone());

        if let Some(sha) = holder {
            self.remove(&sha, kind, name);
        }
    }

    pub fn has_references(&self, sha: &Sha) -> bool {
        self.by_sha.get(sha).is_some_and(|refs| !refs.is_empty())
    }

    pub fn references(&self, sha: &Sha, kind: RefKind) -> Vec<String> {
        self.by_sha
            .get(sha)
            .map(|refs| refs.of_kind(kind))
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.by_sha.clear();
    }

    /// Every sha with at least one name of `kind`, sorted by sha.
    pub fn branches(&self, kind: RefKind) -> Vec<(Sha, Vec<String>)> {
        let mut result: Vec<(Sha, Vec<String>)> = self
            .by_sha
            .iter()
            .map(|(sha, refs)| (sha.clone(), refs.of_kind(kind)))
            .filter(|(_, names)| !names.is_empty())
            .collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }

    /// name -> sha map over every local tag in the index.
    pub fn local_tags(&self) -> BTreeMap<String, Sha> {
        let mut tags = BTreeMap::new();
        for (sha, refs) in &self.by_sha {
            for name in refs.of_kind(RefKind::LocalTag) {
                tags.insert(name, sha.clone());
            }
        }
        tags
    }
}
