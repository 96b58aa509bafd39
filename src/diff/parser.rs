//! Name-status diff parsing.
//!
//! Input is the line-oriented raw output of the diff tool: one status
//! line per changed path, prefixed with `:` (or `::` for combined merge
//! diffs). Decoding is two-tier: a fixed-width fast path slices the
//! common single-status shape directly, everything else falls back to a
//! tab tokenizer that understands rename/copy lines. Lines matching no
//! shape are skipped permissively and only advance the merge-parent
//! counter, since upstream tool output is trusted but varies across
//! versions.

use crate::diff::{FileStatus, NameInterner, RevisionFiles};

/// Whether a generic status line tracks a rename or a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameKind {
    Rename,
    Copy,
}

/// One decoded input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedLine<'a> {
    /// Fast-path single status line: `:mode mode sha sha S\tpath`.
    PathChange {
        status: char,
        in_index: bool,
        path: &'a str,
    },
    /// Combined merge line (`::` prefix). Rename information on these is
    /// ambiguous, so the file is always treated as modified.
    CombinedMerge { path: &'a str },
    /// Rename or copy with similarity: `R<N>\t<orig>\t<dest>`.
    RenameOrCopy {
        kind: RenameKind,
        similarity: u32,
        orig: &'a str,
        dest: &'a str,
    },
    /// Anything else; advances the merge-parent counter.
    Unrecognized,
}

// Fixed offsets of the fast-path shape:
// :100644 100644 <40-char sha> <40-char sha> S\tpath
//  ^0             ^15           ^56           ^97 ^98
const DST_SHA_RANGE: std::ops::Range<usize> = 56..96;
const STATUS_OFFSET: usize = 97;
const TAB_OFFSET: usize = 98;
const PATH_OFFSET: usize = 99;

/// Decode one raw diff line into its variant.
pub fn decode_line(line: &str) -> DecodedLine<'_> {
    let bytes = line.as_bytes();

    if bytes.first() != Some(&b':') {
        return DecodedLine::Unrecognized;
    }

    if bytes.get(1) == Some(&b':') {
        let path = line.rsplit('\t').next().unwrap_or("");
        return DecodedLine::CombinedMerge { path };
    }

    if bytes.get(TAB_OFFSET) == Some(&b'\t') {
        if let (Some(dst_sha), Some(path)) = (line.get(DST_SHA_RANGE), line.get(PATH_OFFSET..)) {
            let status = bytes[STATUS_OFFSET] as char;
            let mut in_index = !dst_sha.starts_with("000000");
            if status == 'D' {
                in_index = !in_index;
            }
            return DecodedLine::PathChange {
                status,
                in_index,
                path,
            };
        }
    }

    // rename or copy, not in the fast path anymore
    if let Some(rest) = line.get(STATUS_OFFSET..) {
        let fields: Vec<&str> = rest.split('\t').filter(|f| !f.is_empty()).collect();
        if let [status_field, orig, dest] = fields[..] {
            let kind = match status_field.chars().next() {
                Some('R') => RenameKind::Rename,
                Some('C') => RenameKind::Copy,
                _ => return DecodedLine::Unrecognized,
            };
            let similarity = status_field[1..].trim().parse().unwrap_or(0);
            return DecodedLine::RenameOrCopy {
                kind,
                similarity,
                orig,
                dest,
            };
        }
    }

    DecodedLine::Unrecognized
}

fn status_flags(status: char, in_index: bool) -> FileStatus {
    let mut flags = match status {
        'M' | 'T' => FileStatus::MODIFIED,
        'U' => FileStatus::MODIFIED | FileStatus::CONFLICT,
        'D' => FileStatus::DELETED,
        'A' => FileStatus::NEW,
        '?' => FileStatus::UNKNOWN,
        _ => FileStatus::MODIFIED,
    };
    if in_index && matches!(status, 'M' | 'T' | 'D' | 'A') {
        flags |= FileStatus::IN_INDEX;
    }
    flags
}

/// Parse one raw diff text into a revision-files record, interning every
/// distinct path through the shared tables.
pub fn parse_diff(text: &str, interner: &mut NameInterner) -> RevisionFiles {
    let mut rf = RevisionFiles::new();
    let mut merge_parent: u32 = 1;

    for line in text.lines().filter(|line| !line.is_empty()) {
        match decode_line(line) {
            DecodedLine::PathChange {
                status,
                in_index,
                path,
            } => {
                let handle = interner.intern(path);
                rf.push_entry(
                    handle,
                    path.to_string(),
                    status_flags(status, in_index),
                    merge_parent,
                    None,
                );
            }
            DecodedLine::CombinedMerge { path } => {
                let handle = interner.intern(path);
                rf.push_entry(
                    handle,
                    path.to_string(),
                    FileStatus::MODIFIED,
                    merge_parent,
                    None,
                );
            }
            DecodedLine::RenameOrCopy {
                kind,
                similarity,
                orig,
                dest,
            } => {
                let ext = format!("{orig} --> {dest} ({similarity}%)");

                let dest_status = FileStatus::NEW
                    | match kind {
                        RenameKind::Rename => FileStatus::RENAMED,
                        RenameKind::Copy => FileStatus::COPIED,
                    };
                let dest_handle = interner.intern(dest);
                rf.push_entry(
                    dest_handle,
                    dest.to_string(),
                    dest_status,
                    merge_parent,
                    Some(ext.clone()),
                );

                // a rename also implies the source is gone
                if kind == RenameKind::Rename {
                    let orig_handle = interner.intern(orig);
                    rf.push_entry(
                        orig_handle,
                        orig.to_string(),
                        FileStatus::DELETED | FileStatus::RENAMED,
                        merge_parent,
                        Some(ext),
                    );
                }
            }
            DecodedLine::Unrecognized => merge_parent += 1,
        }
    }

    rf
}

/// Build the revision-files record of the work-in-progress row.
///
/// Parses the unstaged diff, appends the untracked paths as unknown
/// entries, then reconciles against the staged diff: a path conflicted
/// in the staged pass is promoted to conflicted, and a modified but not
/// staged path present in the staged pass is flagged partially staged.
pub(crate) fn build_workdir_files(
    diff_index: &str,
    diff_index_cached: &str,
    untracked: &[String],
    interner: &mut NameInterner,
) -> RevisionFiles {
    let mut rf = parse_diff(diff_index, interner);
    rf.set_only_modified(false);

    for path in untracked {
        let handle = interner.intern(path);
        rf.push_entry(handle, path.clone(), FileStatus::UNKNOWN, 1, None);
    }

    let staged = parse_diff(diff_index_cached, interner);

    for idx in 0..rf.count() {
        let promotion = {
            let path = match rf.file(idx) {
                Some(path) => path,
                None => continue,
            };
            match staged.index_of(path) {
                None => continue,
                Some(staged_idx) if staged.status_cmp(staged_idx, FileStatus::CONFLICT) => {
                    FileStatus::CONFLICT
                }
                Some(_)
                    if rf.status_cmp(idx, FileStatus::MODIFIED)
                        && !rf.status_cmp(idx, FileStatus::IN_INDEX) =>
                {
                    FileStatus::PARTIALLY_CACHED
                }
                Some(_) => continue,
            }
        };
        rf.append_status(idx, promotion);
    }

    rf
}
