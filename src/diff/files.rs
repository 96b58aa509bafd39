//! Per-pair file change records.
//!
//! A [`RevisionFiles`] is the structured form of one name-status diff:
//! parallel vectors of interned path handles, resolved paths, status
//! flags and merge-parent indices, one slot per changed file. The three
//! data vectors always have equal length; duplicate paths within one
//! record are folded on insertion.

use bitflags::bitflags;

bitflags! {
    /// Change status of a single file between two revisions.
    ///
    /// Flags combine: a conflicted file is also modified, a staged
    /// modification carries `IN_INDEX`, and the WIP reconciliation can
    /// add `PARTIALLY_CACHED` on top of `MODIFIED`.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct FileStatus: u16 {
        const MODIFIED = 1;
        const DELETED = 1 << 1;
        const NEW = 1 << 2;
        const RENAMED = 1 << 3;
        const COPIED = 1 << 4;
        const UNKNOWN = 1 << 5;
        const IN_INDEX = 1 << 6;
        const CONFLICT = 1 << 7;
        const PARTIALLY_CACHED = 1 << 8;
    }
}

/// Interned location of a path: indices into the shared directory and
/// file name tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathHandle {
    pub dir: u32,
    pub name: u32,
}

/// The file changes between one pair of revisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionFiles {
    handles: Vec<PathHandle>,
    files: Vec<String>,
    statuses: Vec<FileStatus>,
    merge_parents: Vec<u32>,
    // aligned with the entries; empty string means no extended status
    ext_statuses: Vec<String>,
    only_modified: bool,
}

impl Default for RevisionFiles {
    fn default() -> Self {
        Self {
            handles: Vec::new(),
            files: Vec::new(),
            statuses: Vec::new(),
            merge_parents: Vec::new(),
            ext_statuses: Vec::new(),
            only_modified: true,
        }
    }
}

impl RevisionFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn file(&self, idx: usize) -> Option<&str> {
        self.files.get(idx).map(String::as_str)
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn handle(&self, idx: usize) -> Option<PathHandle> {
        self.handles.get(idx).copied()
    }

    pub fn status(&self, idx: usize) -> Option<FileStatus> {
        self.statuses.get(idx).copied()
    }

    /// True when the entry at `idx` carries every bit of `flag`.
    pub fn status_cmp(&self, idx: usize, flag: FileStatus) -> bool {
        self.statuses
            .get(idx)
            .is_some_and(|status| status.contains(flag))
    }

    pub fn append_status(&mut self, idx: usize, flag: FileStatus) {
        if let Some(status) = self.statuses.get_mut(idx) {
            status.insert(flag);
        }
    }

    /// Merge parent index the entry belongs to (relevant for combined
    /// merge diffs only; `1` otherwise).
    pub fn merge_parent(&self, idx: usize) -> Option<u32> {
        self.merge_parents.get(idx).copied()
    }

    /// Extended status text for renames and copies:
    /// `"<orig> --> <dest> (<N>%)"`.
    pub fn ext_status(&self, idx: usize) -> Option<&str> {
        self.ext_statuses
            .get(idx)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn index_of(&self, path: &str) -> Option<usize> {
        self.files.iter().position(|f| f == path)
    }

    pub fn only_modified(&self) -> bool {
        self.only_modified
    }

    pub fn set_only_modified(&mut self, only_modified: bool) {
        self.only_modified = only_modified;
    }

    /// Append one entry, folding duplicate paths within this record.
    pub(crate) fn push_entry(
        &mut self,
        handle: PathHandle,
        path: String,
        status: FileStatus,
        merge_parent: u32,
        ext_status: Option<String>,
    ) {
        if self.files.iter().any(|f| *f == path) {
            return;
        }

        if ext_status.is_some()
            || status.intersects(
                FileStatus::DELETED
                    | FileStatus::NEW
                    | FileStatus::UNKNOWN
                    | FileStatus::CONFLICT,
            )
        {
            self.only_modified = false;
        }

        self.handles.push(handle);
        self.files.push(path);
        self.statuses.push(status);
        self.merge_parents.push(merge_parent);
        self.ext_statuses.push(ext_status.unwrap_or_default());
    }
}
