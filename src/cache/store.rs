//! The commit cache orchestrator.
//!
//! [`RepoCache`] owns the ordered row table and the sha-keyed commit
//! map, drives the lane engine during insertion, wires child
//! back-references through a pending-children table (children arrive
//! before their parents in newest-first order), and maintains the
//! synthetic work-in-progress row.
//!
//! Every public operation takes the single internal lock exactly once;
//! all cross-calls happen on private, already-locked helpers. `configure`
//! is the longest critical section since it walks the whole history, so
//! callers wanting a responsive UI should refresh off the interactive
//! thread.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::cache::{CacheError, CacheResult, CommitInfo, Sha, WipInfo};
use crate::diff::{self, NameInterner, RevisionFiles};
use crate::graph::{LaneType, Lanes};
use crate::refs::{RefKind, ReferenceIndex};

/// Direction of a full-text commit search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

type UpdateCallback = Arc<dyn Fn() + Send + Sync>;

/// The in-memory history cache backing a graph view.
#[derive(Default)]
pub struct RepoCache {
    state: Mutex<CacheState>,
    observers: Mutex<Vec<UpdateCallback>>,
}

/// Everything guarded by the cache lock.
#[derive(Default)]
struct CacheState {
    configured: bool,
    // the map owns every commit; rows and children refer to it by sha
    commits: HashMap<Sha, CommitInfo>,
    rows: Vec<Option<Sha>>,
    pending_children: HashMap<Sha, Vec<Sha>>,
    revision_files: HashMap<(Sha, Sha), RevisionFiles>,
    interner: NameInterner,
    lanes: Lanes,
    references: ReferenceIndex,
    remote_tags: BTreeMap<String, Sha>,
    wip_untracked: usize,
}

impl RepoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the cache from a full, newest-first commit listing plus
    /// the current working-tree state. Idempotent for identical input:
    /// the WIP row re-uses the lane sequence of the previous refresh so
    /// it never jumps columns between otherwise identical refreshes.
    pub fn configure(&self, wip: &WipInfo, commits: Vec<CommitInfo>) {
        let mut state = self.state.lock();
        let total = commits.len() + 1;

        debug!(total, "configuring the cache");
        state.reset_for_refresh(total);

        debug!("adding WIP revision");
        state.insert_wip(wip);

        debug!("adding committed revisions");
        let mut row = 1;
        for commit in commits {
            if commit.is_valid() {
                state.insert_commit(commit, row);
                row += 1;
            }
        }

        // slots past the last insertion are leftovers of a longer history
        for slot in state.rows.iter_mut().skip(row) {
            *slot = None;
        }
        state.prune_stale_commits();
        state.configured = true;
    }

    /// Rebuild only the WIP row. Fails until the first `configure`
    /// completes, signalling that the refresh is not ready yet.
    pub fn update_wip(&self, wip: &WipInfo) -> CacheResult<()> {
        let mut state = self.state.lock();
        if !state.configured {
            return Err(CacheError::NotConfigured);
        }
        state.insert_wip(wip);
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.state.lock().configured
    }

    /// Number of rows, the WIP row included.
    pub fn count(&self) -> usize {
        self.state.lock().rows.len()
    }

    /// Commit at a graph row; `None` for empty or out-of-range rows.
    pub fn commit_by_row(&self, row: usize) -> Option<CommitInfo> {
        self.state.lock().commit_at(row).cloned()
    }

    /// Exact sha lookup with unique-prefix fallback. An ambiguous prefix
    /// behaves as not-found.
    pub fn commit_by_sha(&self, sha: &str) -> Option<CommitInfo> {
        self.state.lock().commit_by_sha(sha).cloned()
    }

    /// Row of the commit whose sha starts with `sha`.
    pub fn commit_row(&self, sha: &str) -> Option<usize> {
        let state = self.state.lock();
        if sha.is_empty() {
            return None;
        }
        state
            .rows
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|s| s.starts_with(sha)))
    }

    /// Full-text search over commit content, wrapping to the opposite
    /// end when nothing matches before the boundary. Forward searches
    /// include `start_row`; backward searches begin at the row above it,
    /// so "find previous" never returns the row it started from.
    pub fn search(
        &self,
        text: &str,
        start_row: usize,
        direction: SearchDirection,
    ) -> Option<CommitInfo> {
        self.state.lock().search(text, start_row, direction).cloned()
    }

    /// File changes between two revisions; an empty record when the pair
    /// has not been parsed.
    pub fn revision_files(&self, sha1: &Sha, sha2: &Sha) -> RevisionFiles {
        self.state
            .lock()
            .revision_files
            .get(&(sha1.clone(), sha2.clone()))
            .cloned()
            .unwrap_or_default()
    }

    /// Store a parsed record under `(sha1, sha2)`. Reports whether it was
    /// stored: pairs with an empty sha (other than the WIP pair) and
    /// unchanged records are skipped.
    pub fn insert_revision_files(&self, sha1: Sha, sha2: Sha, files: RevisionFiles) -> bool {
        self.state.lock().insert_revision_files(sha1, sha2, files)
    }

    pub fn contains_revision_files(&self, sha1: &Sha, sha2: &Sha) -> bool {
        self.state
            .lock()
            .revision_files
            .contains_key(&(sha1.clone(), sha2.clone()))
    }

    /// Parse a raw name-status diff on demand, interning paths through
    /// the shared tables.
    pub fn parse_diff(&self, text: &str) -> RevisionFiles {
        let mut state = self.state.lock();
        diff::parse_diff(text, &mut state.interner)
    }

    /// Whether the working tree holds changes beyond untracked files.
    pub fn pending_local_changes(&self) -> bool {
        self.state.lock().pending_local_changes()
    }

    pub fn insert_reference(&self, sha: Sha, kind: RefKind, name: impl Into<String>) {
        self.state.lock().references.insert(sha, kind, name);
    }

    pub fn has_references(&self, sha: &Sha) -> bool {
        self.state.lock().references.has_references(sha)
    }

    pub fn references(&self, sha: &Sha, kind: RefKind) -> Vec<String> {
        self.state.lock().references.references(sha, kind)
    }

    pub fn clear_references(&self) {
        self.state.lock().references.clear();
    }

    /// Every sha holding references of `kind`, sorted by sha.
    pub fn branches(&self, kind: RefKind) -> Vec<(Sha, Vec<String>)> {
        self.state.lock().references.branches(kind)
    }

    /// Tag name -> sha map. Local tags are read from the reference
    /// index, any other kind returns the wholesale remote tag map.
    pub fn tags(&self, kind: RefKind) -> BTreeMap<String, Sha> {
        let state = self.state.lock();
        match kind {
            RefKind::LocalTag => state.references.local_tags(),
            _ => state.remote_tags.clone(),
        }
    }

    /// Replace the remote tag map and notify subscribers.
    pub fn update_remote_tags(&self, tags: BTreeMap<String, Sha>) {
        {
            let mut state = self.state.lock();
            state.remote_tags = tags;
        }
        self.notify_update();
    }

    /// Move the current local branch to its new head sha.
    pub fn update_current_branch(&self, branch: &str, sha: Sha) {
        self.state
            .lock()
            .references
            .insert(sha, RefKind::LocalBranch, branch);
    }

    /// Register a callback fired when auxiliary data is replaced
    /// wholesale. Callbacks run outside the cache lock.
    pub fn on_cache_update(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.observers.lock().push(Arc::new(callback));
    }

    fn notify_update(&self) {
        // snapshot first so a callback may register further observers
        let observers: Vec<UpdateCallback> = self.observers.lock().clone();
        for callback in observers {
            callback();
        }
    }
}

impl CacheState {
    fn reset_for_refresh(&mut self, total: usize) {
        self.configured = false;
        self.interner.clear();
        self.revision_files.clear();
        self.lanes.clear();
        self.pending_children.clear();
        // kept slots still point at the previous refresh's commits so
        // the WIP row can re-use its old lane sequence
        self.rows.resize(total, None);
    }

    /// Insert one commit at `row`, assigning lanes and resolving child
    /// links in both directions.
    fn insert_commit(&mut self, mut commit: CommitInfo, row: usize) {
        if self.configured {
            return;
        }

        let lanes = self.calculate_lanes(&commit);
        commit.set_lanes(lanes);

        let sha = commit.sha().clone();

        // the WIP row declared its parent before that parent was seen
        let wip_parent = self
            .commits
            .get(Sha::ZERO)
            .and_then(|wip| wip.parent(0).cloned());
        if wip_parent.as_ref() == Some(&sha) {
            commit.add_child(Sha::zero());
        }

        if let Some(children) = self.pending_children.remove(sha.as_str()) {
            for child in children {
                commit.add_child(child);
            }
        }

        for parent in commit.parents() {
            self.pending_children
                .entry(parent.clone())
                .or_default()
                .push(sha.clone());
        }

        self.commits.insert(sha.clone(), commit);
        if let Some(slot) = self.rows.get_mut(row) {
            *slot = Some(sha);
        }
    }

    /// Build and place the WIP pseudo-commit at row 0.
    fn insert_wip(&mut self, wip: &WipInfo) {
        debug!(parent = %wip.parent_sha.short(), "updating the WIP commit");

        let rev_files = diff::build_workdir_files(
            &wip.diff_index,
            &wip.diff_index_cached,
            &wip.untracked,
            &mut self.interner,
        );
        self.wip_untracked = wip.untracked.len();

        let no_local_changes = rev_files.count() == wip.untracked.len();
        self.insert_revision_files(Sha::zero(), wip.parent_sha.clone(), rev_files);

        let log = if no_local_changes {
            "No local changes"
        } else {
            "Local changes"
        };
        let parents = if wip.parent_sha.is_empty() {
            Vec::new()
        } else {
            vec![wip.parent_sha.clone()]
        };

        let mut commit = CommitInfo::new(Sha::zero(), parents, "-", "-", Utc::now(), log, "");

        if self.lanes.is_empty() {
            self.lanes.init(commit.sha());
        }
        let lanes = self.calculate_lanes(&commit);
        commit.set_lanes(lanes);

        // re-use the previous refresh's row-0 lanes to avoid visual jitter
        let previous_lanes = self
            .rows
            .first()
            .and_then(|slot| slot.as_ref())
            .and_then(|sha| self.commits.get(sha.as_str()))
            .map(|previous| previous.lanes().to_vec());
        if let Some(lanes) = previous_lanes {
            commit.set_lanes(lanes);
        }

        self.commits.insert(Sha::zero(), commit);
        if let Some(slot) = self.rows.get_mut(0) {
            *slot = Some(Sha::zero());
        }
    }

    /// Run the lane engine for one commit and snapshot its row.
    fn calculate_lanes(&mut self, commit: &CommitInfo) -> Vec<LaneType> {
        let sha = commit.sha();
        trace!(sha = %sha.short(), "updating lanes");

        let (is_fork, is_discontinuity) = self.lanes.is_fork(sha);
        let is_merge = commit.parents_count() > 1;

        if is_discontinuity {
            // uses the previous boundary state
            self.lanes.change_active_lane(sha);
        }
        self.lanes.set_boundary(commit.is_boundary());

        if is_fork {
            self.lanes.set_fork(sha);
        }
        if is_merge {
            self.lanes.set_merge(commit.parents());
        }
        if commit.parents_count() == 0 {
            self.lanes.set_initial();
        }

        let lanes = self.lanes.lanes();
        self.reset_lanes(commit, is_fork);
        lanes
    }

    /// Advance the engine past the processed commit.
    fn reset_lanes(&mut self, commit: &CommitInfo, is_fork: bool) {
        let next = commit.parent(0).cloned().unwrap_or_default();
        self.lanes.next_parent(&next);

        if commit.parents_count() > 1 {
            self.lanes.after_merge();
        }
        if is_fork {
            self.lanes.after_fork();
        }
        if self.lanes.is_branch() {
            self.lanes.after_branch();
        }
    }

    fn insert_revision_files(&mut self, sha1: Sha, sha2: Sha, files: RevisionFiles) -> bool {
        let both_set = !sha1.is_empty() && !sha2.is_empty();
        let is_wip = sha1.is_zero();
        if !(both_set || is_wip) {
            return false;
        }

        let key = (sha1, sha2);
        if self.revision_files.get(&key) == Some(&files) {
            return false;
        }

        debug!(sha1 = %key.0.short(), sha2 = %key.1.short(), "adding revision files");
        self.revision_files.insert(key, files);
        true
    }

    fn commit_at(&self, row: usize) -> Option<&CommitInfo> {
        self.rows
            .get(row)?
            .as_ref()
            .and_then(|sha| self.commits.get(sha.as_str()))
    }

    fn commit_by_sha(&self, sha: &str) -> Option<&CommitInfo> {
        if sha.is_empty() {
            return None;
        }
        if let Some(commit) = self.commits.get(sha) {
            return Some(commit);
        }

        let mut found = None;
        for (key, commit) in &self.commits {
            if key.starts_with(sha) {
                if found.is_some() {
                    // ambiguous prefix behaves as not-found
                    return None;
                }
                found = Some(commit);
            }
        }
        found
    }

    fn search(
        &self,
        text: &str,
        start_row: usize,
        direction: SearchDirection,
    ) -> Option<&CommitInfo> {
        if self.rows.is_empty() {
            return None;
        }
        let last = self.rows.len() - 1;

        match direction {
            SearchDirection::Forward => self
                .scan(start_row..=last, text)
                .or_else(|| self.scan(0..=last, text)),
            SearchDirection::Backward => self
                .scan((0..start_row.min(self.rows.len())).rev(), text)
                .or_else(|| self.scan((0..=last).rev(), text)),
        }
    }

    fn scan(&self, rows: impl IntoIterator<Item = usize>, text: &str) -> Option<&CommitInfo> {
        rows.into_iter()
            .find_map(|row| self.commit_at(row).filter(|commit| commit.contains(text)))
    }

    fn pending_local_changes(&self) -> bool {
        let Some(wip) = self.commits.get(Sha::ZERO) else {
            return false;
        };
        let parent = wip.parent(0).cloned().unwrap_or_default();
        self.revision_files
            .get(&(Sha::zero(), parent))
            .is_some_and(|files| files.count() > self.wip_untracked)
    }

    /// Drop map entries no live row points at. The map stays the sole
    /// owner; rows and child links always resolve through it.
    fn prune_stale_commits(&mut self) {
        let live: HashSet<Sha> = self.rows.iter().flatten().cloned().collect();
        self.commits.retain(|sha, _| live.contains(sha));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sha(c: char) -> Sha {
        Sha::new(c.to_string().repeat(40))
    }

    fn commit(id: char, parents: &[char], subject: &str) -> CommitInfo {
        CommitInfo::new(
            sha(id),
            parents.iter().map(|&p| sha(p)).collect(),
            "committer",
            "author",
            Utc::now(),
            subject,
            "",
        )
    }

    fn wip_for(head: char) -> WipInfo {
        WipInfo {
            parent_sha: sha(head),
            ..Default::default()
        }
    }

    /// c1 <- c2 <- c3, supplied newest first.
    fn linear_cache() -> RepoCache {
        let cache = RepoCache::new();
        cache.configure(
            &wip_for('3'),
            vec![
                commit('3', &['2'], "third change"),
                commit('2', &['1'], "second change"),
                commit('1', &[], "first change"),
            ],
        );
        cache
    }

    #[test]
    fn test_linear_configure() {
        let cache = linear_cache();

        assert!(cache.is_configured());
        assert_eq!(cache.count(), 4);

        let wip = cache.commit_by_row(0).unwrap();
        assert!(wip.is_wip());
        assert_eq!(wip.parent(0), Some(&sha('3')));

        assert_eq!(cache.commit_by_row(1).unwrap().sha(), &sha('3'));
        assert_eq!(cache.commit_by_row(2).unwrap().sha(), &sha('2'));
        assert_eq!(cache.commit_by_row(3).unwrap().sha(), &sha('1'));

        // a linear history never leaves the first lane
        for row in 0..4 {
            assert_eq!(cache.commit_by_row(row).unwrap().lanes_count(), 1);
        }

        assert!(!cache.pending_local_changes());
    }

    #[test]
    fn test_row_out_of_range_is_none() {
        let cache = linear_cache();
        assert!(cache.commit_by_row(4).is_none());
        assert!(cache.commit_by_row(usize::MAX).is_none());
    }

    #[test]
    fn test_row_hash_consistency() {
        let cache = linear_cache();
        for row in 0..cache.count() {
            let by_row = cache.commit_by_row(row).unwrap();
            let by_sha = cache.commit_by_sha(by_row.sha().as_str()).unwrap();
            assert_eq!(by_row, by_sha);
        }
    }

    #[test]
    fn test_child_back_references() {
        let cache = linear_cache();

        let c1 = cache.commit_by_sha(sha('1').as_str()).unwrap();
        assert_eq!(c1.children(), &[sha('2')]);

        let c2 = cache.commit_by_sha(sha('2').as_str()).unwrap();
        assert_eq!(c2.children(), &[sha('3')]);

        // the head commit's child is the WIP row
        let c3 = cache.commit_by_sha(sha('3').as_str()).unwrap();
        assert_eq!(c3.children(), &[Sha::zero()]);
    }

    #[test]
    fn test_prefix_lookup() {
        let cache = RepoCache::new();
        let shared_a = Sha::new(format!("{}1", "a".repeat(39)));
        let shared_b = Sha::new(format!("{}2", "a".repeat(39)));
        cache.configure(
            &WipInfo {
                parent_sha: shared_a.clone(),
                ..Default::default()
            },
            vec![
                CommitInfo::new(shared_a.clone(), vec![shared_b.clone()], "c", "a", Utc::now(), "top", ""),
                CommitInfo::new(shared_b.clone(), vec![], "c", "a", Utc::now(), "root", ""),
            ],
        );

        // unique prefixes resolve
        assert_eq!(
            cache.commit_by_sha(shared_a.as_str()).unwrap().sha(),
            &shared_a
        );
        assert_eq!(
            cache
                .commit_by_sha(&format!("{}2", "a".repeat(39)))
                .unwrap()
                .sha(),
            &shared_b
        );
        assert_eq!(cache.commit_by_sha("0000").unwrap().sha(), &Sha::zero());

        // ambiguous and unknown prefixes are not found
        assert!(cache.commit_by_sha("aaaa").is_none());
        assert!(cache.commit_by_sha("ffff").is_none());
        assert!(cache.commit_by_sha("").is_none());
    }

    #[test]
    fn test_commit_row_by_prefix() {
        let cache = linear_cache();
        assert_eq!(cache.commit_row("333"), Some(1));
        assert_eq!(cache.commit_row("111"), Some(3));
        assert_eq!(cache.commit_row("0"), Some(0));
        assert_eq!(cache.commit_row("fff"), None);
    }

    #[test]
    fn test_search_forward_with_wraparound() {
        let cache = linear_cache();

        let hit = cache.search("second", 0, SearchDirection::Forward).unwrap();
        assert_eq!(hit.sha(), &sha('2'));

        // starting past the match wraps to the beginning
        let wrapped = cache.search("second", 3, SearchDirection::Forward).unwrap();
        assert_eq!(wrapped.sha(), &sha('2'));

        assert!(cache.search("no such text", 0, SearchDirection::Forward).is_none());
    }

    #[test]
    fn test_search_backward_with_wraparound() {
        let cache = linear_cache();

        let hit = cache.search("first", 4, SearchDirection::Backward).unwrap();
        assert_eq!(hit.sha(), &sha('1'));

        // the starting row is excluded, so this is a true "find previous"
        let previous = cache.search("change", 2, SearchDirection::Backward).unwrap();
        assert_eq!(previous.sha(), &sha('3'));

        // nothing above row 0 matches, so the search wraps to the end
        let wrapped = cache.search("third", 0, SearchDirection::Backward).unwrap();
        assert_eq!(wrapped.sha(), &sha('3'));
    }

    #[test]
    fn test_merge_commit_lanes() {
        // m merges a and b, both children of root r
        let cache = RepoCache::new();
        cache.configure(
            &wip_for('m'),
            vec![
                commit('m', &['a', 'b'], "merge branch"),
                commit('a', &['r'], "left side"),
                commit('b', &['r'], "right side"),
                commit('r', &[], "root"),
            ],
        );

        let merge = cache.commit_by_sha(sha('m').as_str()).unwrap();
        assert_eq!(merge.lanes(), &[LaneType::MergeForkL, LaneType::HeadR]);

        // both parents continue on their own lanes
        let left = cache.commit_by_sha(sha('a').as_str()).unwrap();
        assert_eq!(left.lanes(), &[LaneType::Active, LaneType::NotActive]);
        let right = cache.commit_by_sha(sha('b').as_str()).unwrap();
        assert_eq!(right.lanes(), &[LaneType::NotActive, LaneType::Active]);

        // the root closes the fork
        let root = cache.commit_by_sha(sha('r').as_str()).unwrap();
        assert_eq!(root.lanes(), &[LaneType::MergeForkL, LaneType::TailR]);

        // merge parents are attached as children of both sides
        assert_eq!(left.children(), &[sha('m')]);
        assert_eq!(right.children(), &[sha('m')]);
        let root_children = root.children();
        assert!(root_children.contains(&sha('a')) && root_children.contains(&sha('b')));
    }

    #[test]
    fn test_boundary_commit_lanes() {
        // a shallow clone: the oldest listed commit carries the '-'
        // marker and its parent lies outside the clone
        let cache = RepoCache::new();
        let mut shallow = commit('1', &['p'], "below the clone depth");
        shallow.set_boundary('-');
        cache.configure(&wip_for('2'), vec![commit('2', &['1'], "tip"), shallow]);

        let row = cache.commit_by_row(2).unwrap();
        assert!(row.is_boundary());
        assert_eq!(row.lanes(), &[LaneType::Boundary]);

        // rows above the boundary keep their ordinary markers
        assert_eq!(cache.commit_by_row(1).unwrap().lanes(), &[LaneType::Active]);
    }

    #[test]
    fn test_boundary_merge_commit_lanes() {
        // a merge sitting on the clone boundary degrades to a plain
        // greyed-out line instead of opening head lanes
        let cache = RepoCache::new();
        let mut merge = commit('m', &['a', 'b'], "merge at the boundary");
        merge.set_boundary('-');
        cache.configure(&wip_for('m'), vec![merge]);

        let row = cache.commit_by_row(1).unwrap();
        assert!(row.is_boundary());
        assert_eq!(row.lanes(), &[LaneType::Boundary]);
    }

    #[test]
    fn test_lane_determinism() {
        let lanes_of = |cache: &RepoCache| -> Vec<Vec<LaneType>> {
            (0..cache.count())
                .map(|row| cache.commit_by_row(row).unwrap().lanes().to_vec())
                .collect()
        };
        assert_eq!(lanes_of(&linear_cache()), lanes_of(&linear_cache()));
    }

    #[test]
    fn test_wip_lanes_stable_across_updates() {
        let cache = linear_cache();
        let before = cache.commit_by_row(0).unwrap().lanes().to_vec();

        cache.update_wip(&wip_for('3')).unwrap();
        assert_eq!(cache.commit_by_row(0).unwrap().lanes(), &before[..]);

        // a full reconfigure with identical input keeps them too
        cache.configure(
            &wip_for('3'),
            vec![
                commit('3', &['2'], "third change"),
                commit('2', &['1'], "second change"),
                commit('1', &[], "first change"),
            ],
        );
        assert_eq!(cache.commit_by_row(0).unwrap().lanes(), &before[..]);
    }

    #[test]
    fn test_update_wip_requires_configuration() {
        let cache = RepoCache::new();
        assert_eq!(
            cache.update_wip(&wip_for('3')),
            Err(CacheError::NotConfigured)
        );

        let cache = linear_cache();
        assert!(cache.update_wip(&wip_for('3')).is_ok());
    }

    #[test]
    fn test_reconfigure_shrinks_rows() {
        let cache = linear_cache();
        assert_eq!(cache.count(), 4);

        cache.configure(&wip_for('1'), vec![commit('1', &[], "first change")]);
        assert_eq!(cache.count(), 2);
        assert!(cache.commit_by_sha(sha('3').as_str()).is_none());
    }

    #[test]
    fn test_revision_files_lookup_never_fails() {
        let cache = linear_cache();
        assert!(cache.revision_files(&sha('8'), &sha('9')).is_empty());
    }

    #[test]
    fn test_insert_revision_files_rules() {
        let cache = linear_cache();
        let files = cache.parse_diff(&format!(
            ":100644 100644 {} {} M\tsrc/lib.rs",
            "a".repeat(40),
            "0".repeat(40)
        ));

        assert!(cache.insert_revision_files(sha('2'), sha('3'), files.clone()));
        assert!(cache.contains_revision_files(&sha('2'), &sha('3')));
        assert_eq!(cache.revision_files(&sha('2'), &sha('3')), files);

        // unchanged records and half-empty keys are rejected
        assert!(!cache.insert_revision_files(sha('2'), sha('3'), files.clone()));
        assert!(!cache.insert_revision_files(Sha::default(), sha('3'), files));
    }

    #[test]
    fn test_pending_local_changes() {
        let diff_line = format!(
            ":100644 100644 {} {} M\tsrc/lib.rs",
            "a".repeat(40),
            "0".repeat(40)
        );
        let cache = RepoCache::new();
        cache.configure(
            &WipInfo {
                parent_sha: sha('1'),
                diff_index: diff_line,
                ..Default::default()
            },
            vec![commit('1', &[], "first change")],
        );
        assert!(cache.pending_local_changes());
        assert_eq!(cache.commit_by_row(0).unwrap().short_log(), "Local changes");

        // untracked files alone are not pending changes
        cache
            .update_wip(&WipInfo {
                parent_sha: sha('1'),
                untracked: vec!["scratch.txt".to_string()],
                ..Default::default()
            })
            .unwrap();
        assert!(!cache.pending_local_changes());
        assert_eq!(
            cache.commit_by_row(0).unwrap().short_log(),
            "No local changes"
        );
    }

    #[test]
    fn test_reference_surface() {
        let cache = linear_cache();

        cache.insert_reference(sha('3'), RefKind::LocalBranch, "main");
        cache.insert_reference(sha('2'), RefKind::LocalTag, "v1.0");
        assert!(cache.has_references(&sha('3')));
        assert_eq!(cache.references(&sha('3'), RefKind::LocalBranch), vec!["main"]);

        // branch head moved: present at exactly one sha afterwards
        cache.update_current_branch("main", sha('2'));
        assert!(!cache.has_references(&sha('3')));
        assert_eq!(cache.references(&sha('2'), RefKind::LocalBranch), vec!["main"]);

        let tags = cache.tags(RefKind::LocalTag);
        assert_eq!(tags["v1.0"], sha('2'));

        cache.clear_references();
        assert!(!cache.has_references(&sha('2')));
    }

    #[test]
    fn test_remote_tags_notify_subscribers() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let cache = linear_cache();
        let fired = Arc::new(AtomicUsize::new(0));
        let observed = fired.clone();
        cache.on_cache_update(move || {
            observed.fetch_add(1, Ordering::SeqCst);
        });

        let mut tags = BTreeMap::new();
        tags.insert("v2.0".to_string(), sha('3'));
        cache.update_remote_tags(tags);

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(cache.tags(RefKind::RemoteTag)["v2.0"], sha('3'));
    }

    #[test]
    fn test_callbacks_run_outside_the_observer_lock() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let cache = Arc::new(linear_cache());
        let fired = Arc::new(AtomicUsize::new(0));

        // a callback registering another observer must not deadlock
        let registrar = cache.clone();
        let observed = fired.clone();
        cache.on_cache_update(move || {
            let observed = observed.clone();
            registrar.on_cache_update(move || {
                observed.fetch_add(1, Ordering::SeqCst);
            });
        });

        cache.update_remote_tags(BTreeMap::new());
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        // the observer added by the first notification now runs too
        cache.update_remote_tags(BTreeMap::new());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cache_is_shareable_across_threads() {
        use std::sync::Arc;

        let cache = Arc::new(linear_cache());
        let reader = {
            let cache = cache.clone();
            std::thread::spawn(move || cache.commit_by_row(1).unwrap().sha().clone())
        };
        assert_eq!(reader.join().unwrap(), sha('3'));
    }
}
