//! Diff parsing and per-pair file change records.
//!
//! Raw name-status diff text goes in, [`RevisionFiles`] records come
//! out, with all paths deduplicated through the [`NameInterner`].

mod files;
mod interner;
mod parser;

pub use files::{FileStatus, PathHandle, RevisionFiles};
pub use interner::NameInterner;
pub use parser::{decode_line, parse_diff, DecodedLine, RenameKind};

pub(crate) use parser::build_workdir_files;
