//! The lane engine: assigns graph columns in one forward pass.
//!
//! Commits must be fed in reverse-topological order (children before
//! parents, newest first). The engine keeps one marker and one expected
//! next-parent sha per lane; each processed commit either continues the
//! lane that expected it, closes a fork of several lanes that all
//! expected it, or opens a fresh lane when nobody did. Work per commit
//! is linear in the number of live lanes, so no global graph analysis
//! is ever needed.

use tracing::trace;

use crate::cache::Sha;
use crate::graph::LaneType;

/// Lane assignment state carried across commits.
#[derive(Debug, Clone)]
pub struct Lanes {
    boundary: bool,
    // node markers swap to the boundary variants while boundary mode is on
    node: LaneType,
    node_r: LaneType,
    node_l: LaneType,
    active_lane: usize,
    types: Vec<LaneType>,
    next_sha: Vec<Sha>,
}

impl Default for Lanes {
    fn default() -> Self {
        Self {
            boundary: false,
            node: LaneType::MergeFork,
            node_r: LaneType::MergeForkR,
            node_l: LaneType::MergeForkL,
            active_lane: 0,
            types: Vec::new(),
            next_sha: Vec::new(),
        }
    }
}

impl Lanes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Start a fresh layout whose first expected commit is `sha`.
    pub fn init(&mut self, sha: &Sha) {
        trace!(sha = %sha.short(), "initializing lane state");
        self.clear();
        self.active_lane = 0;
        self.set_boundary(false);
        self.add(LaneType::Branch, sha.clone(), self.active_lane);
    }

    pub fn clear(&mut self) {
        self.types.clear();
        self.next_sha.clear();
    }

    /// Must be called before the per-commit steps: swaps the node marker
    /// set and greys out the active lane for boundary commits.
    pub fn set_boundary(&mut self, boundary: bool) {
        if boundary {
            self.node = LaneType::BoundaryC;
            self.node_r = LaneType::BoundaryR;
            self.node_l = LaneType::BoundaryL;
        } else {
            self.node = LaneType::MergeFork;
            self.node_r = LaneType::MergeForkR;
            self.node_l = LaneType::MergeForkL;
        }
        self.boundary = boundary;

        if boundary && !self.types.is_empty() {
            self.types[self.active_lane] = LaneType::Boundary;
        }
    }

    /// Returns `(is_fork, is_discontinuity)` for the commit about to be
    /// processed. A fork means more than one lane expected this sha; a
    /// discontinuity means the currently active lane did not.
    pub fn is_fork(&self, sha: &Sha) -> (bool, bool) {
        match self.find_next_sha(sha, 0) {
            None => (false, true),
            Some(pos) => (
                self.find_next_sha(sha, pos + 1).is_some(),
                pos != self.active_lane,
            ),
        }
    }

    /// Switch the active lane to the one expecting `sha`, opening a new
    /// branch lane when none does.
    pub fn change_active_lane(&mut self, sha: &Sha) {
        let current = self.types[self.active_lane];
        self.types[self.active_lane] =
            if current == LaneType::Initial || current.is_boundary() {
                LaneType::Empty
            } else {
                LaneType::NotActive
            };

        match self.find_next_sha(sha, 0) {
            Some(idx) => {
                self.types[idx] = LaneType::Active;
                self.active_lane = idx;
            }
            None => {
                self.active_lane = self.add(LaneType::Branch, sha.clone(), self.active_lane);
            }
        }
    }

    /// Mark every lane expecting `sha` as a closing tail and place the
    /// fork node on the active lane.
    pub fn set_fork(&mut self, sha: &Sha) {
        let mut idx = self.find_next_sha(sha, 0);
        let range_start = idx.unwrap_or(self.active_lane);
        let mut range_end = range_start;

        while let Some(i) = idx {
            range_end = i;
            self.types[i] = LaneType::Tail;
            idx = self.find_next_sha(sha, i + 1);
        }

        self.types[self.active_lane] = self.node;

        if self.types[range_start] == self.node {
            self.types[range_start] = self.node_l;
        }
        if self.types[range_end] == self.node {
            self.types[range_end] = self.node_r;
        }
        if self.types[range_start] == LaneType::Tail {
            self.types[range_start] = LaneType::TailL;
        }
        if self.types[range_end] == LaneType::Tail {
            self.types[range_end] = LaneType::TailR;
        }

        for i in range_start + 1..range_end {
            match self.types[i] {
                LaneType::NotActive => self.types[i] = LaneType::Cross,
                LaneType::Empty => self.types[i] = LaneType::CrossEmpty,
                _ => {}
            }
        }
    }

    /// Place the merge node and register every extra parent as either a
    /// join into an existing lane or a freshly opened head lane.
    pub fn set_merge(&mut self, parents: &[Sha]) {
        if self.boundary {
            // handled as a plain active line
            return;
        }

        let current = self.types[self.active_lane];
        let was_fork = current == self.node;
        let was_fork_l = current == self.node_l;
        let was_fork_r = current == self.node_r;
        let mut start_join_was_cross = false;
        let mut end_join_was_cross = false;

        self.types[self.active_lane] = self.node;

        let mut range_start = self.active_lane;
        let mut range_end = self.active_lane;

        for parent in parents.iter().skip(1) {
            match self.find_next_sha(parent, 0) {
                Some(idx) => {
                    if idx > range_end {
                        range_end = idx;
                        end_join_was_cross = self.types[idx] == LaneType::Cross;
                    }
                    if idx < range_start {
                        range_start = idx;
                        start_join_was_cross = self.types[idx] == LaneType::Cross;
                    }
                    self.types[idx] = LaneType::Join;
                }
                None => {
                    range_end = self.add(LaneType::Head, parent.clone(), range_end + 1);
                }
            }
        }

        if self.types[range_start] == self.node && !was_fork && !was_fork_r {
            self.types[range_start] = self.node_l;
        }
        if self.types[range_end] == self.node && !was_fork && !was_fork_l {
            self.types[range_end] = self.node_r;
        }
        if self.types[range_start] == LaneType::Join && !start_join_was_cross {
            self.types[range_start] = LaneType::JoinL;
        }
        if self.types[range_end] == LaneType::Join && !end_join_was_cross {
            self.types[range_end] = LaneType::JoinR;
        }
        if self.types[range_start] == LaneType::Head {
            self.types[range_start] = LaneType::HeadL;
        }
        if self.types[range_end] == LaneType::Head {
            self.types[range_end] = LaneType::HeadR;
        }

        for i in range_start + 1..range_end {
            match self.types[i] {
                LaneType::NotActive => self.types[i] = LaneType::Cross,
                LaneType::Empty => self.types[i] = LaneType::CrossEmpty,
                LaneType::TailL | LaneType::TailR => self.types[i] = LaneType::Tail,
                _ => {}
            }
        }
    }

    /// Mark the active lane as the root of its line of history.
    pub fn set_initial(&mut self) {
        let current = self.types[self.active_lane];
        if !self.is_node(current) && current != LaneType::Applied {
            self.types[self.active_lane] = if self.boundary {
                LaneType::Boundary
            } else {
                LaneType::Initial
            };
        }
    }

    /// Snapshot of the lane sequence for the row being processed.
    pub fn lanes(&self) -> Vec<LaneType> {
        self.types.clone()
    }

    /// Set what the active lane expects next; roots pass an empty sha.
    pub fn next_parent(&mut self, sha: &Sha) {
        self.next_sha[self.active_lane] = if self.boundary { Sha::default() } else { sha.clone() };
    }

    /// Settle transient merge markers back into plain lines.
    pub fn after_merge(&mut self) {
        if self.boundary {
            // will be reset by change_active_lane
            return;
        }

        for i in 0..self.types.len() {
            let t = self.types[i];
            if t.is_head() || t.is_join() || t == LaneType::Cross {
                self.types[i] = LaneType::NotActive;
            } else if t == LaneType::CrossEmpty {
                self.types[i] = LaneType::Empty;
            } else if self.is_node(t) {
                self.types[i] = LaneType::Active;
            }
        }
    }

    /// Settle fork markers and drop trailing empty lanes.
    pub fn after_fork(&mut self) {
        for i in 0..self.types.len() {
            let t = self.types[i];
            if t == LaneType::Cross {
                self.types[i] = LaneType::NotActive;
            } else if t.is_tail() || t == LaneType::CrossEmpty {
                self.types[i] = LaneType::Empty;
            }
            if !self.boundary && self.is_node(self.types[i]) {
                self.types[i] = LaneType::Active;
            }
        }

        while self.types.last() == Some(&LaneType::Empty) {
            self.types.pop();
            self.next_sha.pop();
        }
    }

    pub fn is_branch(&self) -> bool {
        self.types[self.active_lane] == LaneType::Branch
    }

    pub fn after_branch(&mut self) {
        self.types[self.active_lane] = LaneType::Active;
    }

    fn is_node(&self, t: LaneType) -> bool {
        t == self.node || t == self.node_l || t == self.node_r
    }

    fn find_next_sha(&self, sha: &Sha, from: usize) -> Option<usize> {
        if from >= self.next_sha.len() {
            return None;
        }
        self.next_sha[from..]
            .iter()
            .position(|s| s == sha)
            .map(|i| i + from)
    }

    fn find_type(&self, t: LaneType, from: usize) -> Option<usize> {
        if from >= self.types.len() {
            return None;
        }
        self.types[from..]
            .iter()
            .position(|candidate| *candidate == t)
            .map(|i| i + from)
    }

    /// Put `t` on the first free lane at or after `pos`, appending a new
    /// lane when none is free.
    fn add(&mut self, t: LaneType, sha: Sha, pos: usize) -> usize {
        if pos < self.types.len() {
            if let Some(idx) = self.find_type(LaneType::Empty, pos) {
                self.types[idx] = t;
                self.next_sha[idx] = sha;
                return idx;
            }
        }
        self.types.push(t);
        self.next_sha.push(sha);
        self.types.len() - 1
    }
}
