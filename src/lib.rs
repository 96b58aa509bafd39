//! gitgraph-cache - An in-memory commit history cache for graph views
//!
//! This crate keeps a repository's commit history in memory and keeps it
//! cheap to redraw: every commit gets a stable graph lane assignment, a
//! synthetic work-in-progress row tracks uncommitted changes, and per-pair
//! file-change records are parsed from raw `name-status` diff output with
//! interned path storage.
//!
//! The cache never talks to git itself. An external process-execution
//! collaborator feeds it already-tokenized text (commit listings newest
//! first, diff output, ref listings); a presentation collaborator reads
//! rows, lanes and references back out.
//!
//! # Example
//!
//! ```
//! use gitgraph_cache::cache::{CommitInfo, RepoCache, Sha, WipInfo};
//! use chrono::Utc;
//!
//! let head = Sha::new("1".repeat(40));
//! let commit = CommitInfo::new(head.clone(), vec![], "cmt", "auth", Utc::now(), "initial", "");
//!
//! let cache = RepoCache::new();
//! cache.configure(&WipInfo { parent_sha: head, ..Default::default() }, vec![commit]);
//!
//! // one real commit plus the WIP row
//! assert_eq!(cache.count(), 2);
//! ```

pub mod cache;
pub mod diff;
pub mod graph;
pub mod refs;
