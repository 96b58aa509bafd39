//! The commit cache: ordered rows, sha-keyed commit storage, the WIP
//! pseudo-commit and the lookup/search surface.
//!
//! ```text
//!                    ┌─────────────────────────────┐
//!                    │          RepoCache          │
//!                    │  (rows, commit map, lock)   │
//!                    └──────────────┬──────────────┘
//!              ┌────────────────────┼────────────────────┐
//!              ▼                    ▼                    ▼
//!       ┌────────────┐      ┌─────────────┐      ┌─────────────┐
//!       │   graph    │      │    diff     │      │    refs     │
//!       │  (lanes)   │      │ (rev files) │      │ (branches)  │
//!       └────────────┘      └─────────────┘      └─────────────┘
//! ```

mod commit;
mod error;
mod store;

pub use commit::{CommitInfo, Sha, WipInfo};
pub use error::{CacheError, CacheResult};
pub use store::{RepoCache, SearchDirection};
