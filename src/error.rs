//! Crate-wide error type. See SPEC_FULL.md §10.1 and spec.md §7.

use thiserror::Error;

/// Result alias used by every public operation in this crate.
pub type Result<T> = std::result::Result<T, WgError>;

/// Errors raised by the core. Never panics on recoverable conditions;
/// `Corrupt` signals an invariant breach and is logged before return.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum WgError {
    /// Column index out of range, duplicate columns, zero-length match
    /// record, unknown index/condition code.
    #[error("bad argument: {0}")]
    BadArgument(String),

    /// Allocator-shaped failure (arena exhausted).
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// Identical index already exists, missing bounding node on delete,
    /// bad field type for hashing, wrong argument count for hash search.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Unbalanced tree beyond repair, broken successor chain, unknown
    /// index type in dispatch. The database should be considered corrupt.
    #[error("corrupt index: {0}")]
    Corrupt(String),
}

impl WgError {
    pub fn bad_argument(msg: impl Into<String>) -> Self {
        let e = WgError::BadArgument(msg.into());
        log::debug!("{e}");
        e
    }

    pub fn out_of_memory(msg: impl Into<String>) -> Self {
        let e = WgError::OutOfMemory(msg.into());
        log::debug!("{e}");
        e
    }

    pub fn constraint(msg: impl Into<String>) -> Self {
        let e = WgError::ConstraintViolation(msg.into());
        log::debug!("{e}");
        e
    }

    /// Records an invariant breach. Per SPEC_FULL §10.1 / DESIGN.md open
    /// question (c), this replaces the original C `CHECK`-guarded panic.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        let e = WgError::Corrupt(msg.into());
        log::error!("{e}");
        e
    }
}
