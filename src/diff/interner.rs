//! Path name interning.
//!
//! Directory and file names repeat heavily across revisions, so they are
//! stored once in two append-only tables and referenced by small integer
//! handles. Lookup is linear; the tables are rebuilt on every cache
//! refresh and stay small in practice.

use crate::diff::PathHandle;

/// Shared directory and file name tables.
#[derive(Debug, Default)]
pub struct NameInterner {
    dirs: Vec<String>,
    names: Vec<String>,
}

impl NameInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.dirs.clear();
        self.names.clear();
    }

    /// Split `path` at the last slash and intern both halves. The
    /// directory half keeps its trailing slash so resolving is a plain
    /// concatenation.
    pub fn intern(&mut self, path: &str) -> PathHandle {
        let split = path.rfind('/').map(|i| i + 1).unwrap_or(0);
        PathHandle {
            dir: Self::intern_in(&mut self.dirs, &path[..split]),
            name: Self::intern_in(&mut self.names, &path[split..]),
        }
    }

    fn intern_in(table: &mut Vec<String>, value: &str) -> u32 {
        match table.iter().position(|entry| entry == value) {
            Some(idx) => idx as u32,
            None => {
                table.push(value.to_string());
                (table.len() - 1) as u32
            }
        }
    }

    pub fn dir(&self, idx: u32) -> Option<&str> {
        self.dirs.get(idx as usize).map(String::as_str)
    }

    pub fn name(&self, idx: u32) -> Option<&str> {
        self.names.get(idx as usize).map(String::as_str)
    }

    /// Rebuild the full path a handle points at.
    pub fn resolve(&self, handle: PathHandle) -> Option<String> {
        Some(format!("{}{}", self.dir(handle.dir)?, self.name(handle.name)?))
    }

    pub fn dir_count(&self) -> usize {
        self.dirs.len()
    }

    pub fn name_count(&self) -> usize {
        self.names.len()
    }
}
