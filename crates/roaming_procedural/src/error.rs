//! # World Error Types
//!
//! All errors the dungeon core can surface.
//!
//! None of these arise from valid configuration: construction is the
//! only place `InvalidConfig` can appear, and `ConsistencyViolation`
//! marks a generator bug rather than an input condition. Errors are
//! `Clone` because every waiter coalesced onto a failed build observes
//! the same value.

use thiserror::Error;

/// Errors that can occur in the dungeon core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// Configuration rejected at initialization.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Which constraint was violated.
        reason: String,
    },

    /// Post-generation self-check failed; the chunk was not cached.
    #[error("chunk ({cx}, {cy}) failed consistency check: {detail}")]
    ConsistencyViolation {
        /// Chunk X coordinate.
        cx: i32,
        /// Chunk Y coordinate.
        cy: i32,
        /// What the self-check found.
        detail: String,
    },

    /// Chunk coordinate outside the navigable range.
    #[error("chunk coordinate ({cx}, {cy}) outside the navigable range")]
    CoordinateOutOfRange {
        /// Requested X coordinate.
        cx: i32,
        /// Requested Y coordinate.
        cy: i32,
    },
}

/// Result type for dungeon core operations.
pub type WorldResult<T> = Result<T, WorldError>;
