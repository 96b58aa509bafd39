//! Cache error types.
//!
//! The cache degrades to empty results on missing keys, so lookups use
//! `Option` rather than errors. The error type covers the precondition
//! violations a caller can actually act on.

use thiserror::Error;

/// Errors reported by cache operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// A WIP update was requested before the first full refresh finished.
    /// The caller should retry on the next refresh cycle.
    #[error("cache not configured: a full refresh has not completed yet")]
    NotConfigured,
}

/// Result type alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
