//! GraphError: unified error type for mesh-rowgraph public APIs.
//!
//! Structural misuse (shape mismatches, violated preconditions, mapper
//! domain errors) is reported through `Result` rather than panics, so
//! callers can recover. Plain element accessors stay panic-on-misuse in
//! checked builds; their `try_*` twins return these errors instead.

use thiserror::Error;

/// Unified error type for mesh-rowgraph operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// An index was outside the addressable range of a list or row.
    #[error("{op}: index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// Operation that rejected the index.
        op: &'static str,
        /// The offending index.
        index: usize,
        /// Length of the collection or row at the time of the call.
        len: usize,
    },
    /// Two shapes that must agree (row counts, declared widths) did not.
    #[error("{op}: expected size {expected}, found {found}")]
    ShapeMismatch {
        /// Operation that detected the mismatch.
        op: &'static str,
        /// The size required by the call.
        expected: usize,
        /// The size actually supplied.
        found: usize,
    },
    /// A structural precondition of the operation did not hold.
    #[error("{op}: {reason}")]
    PreconditionViolated {
        /// Operation whose precondition failed.
        op: &'static str,
        /// What was violated.
        reason: &'static str,
    },
    /// Removal or inspection of an element from an empty collection.
    #[error("{op}: collection is empty")]
    EmptyCollection {
        /// Operation attempted on the empty collection.
        op: &'static str,
    },
    /// A row held no payload where payload was required.
    #[error("row {row} holds no data")]
    InvalidRow {
        /// The vacant row.
        row: usize,
    },
    /// A value fell outside the domain of a translation mapper.
    #[error("mapped value {value} outside mapper domain of length {mapper_len}")]
    MapperOutOfRange {
        /// The untranslatable value.
        value: u32,
        /// Length of the mapper that was supplied.
        mapper_len: usize,
    },
}

/// Errors produced while reading the text or binary wire format.
///
/// Kept separate from [`GraphError`] because it wraps `std::io::Error`,
/// which is neither `Clone` nor `Eq`.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The underlying reader failed.
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    /// The input did not match the expected grammar.
    #[error("parse error at byte {at}: expected {expected}, found `{found}`")]
    Parse {
        /// What the grammar required at this point.
        expected: &'static str,
        /// The token (or end-of-input marker) actually seen.
        found: String,
        /// Byte offset into the stream, counted from where reading began.
        at: usize,
    },
    /// The parsed shape could not be assembled into a container.
    #[error(transparent)]
    Graph(#[from] GraphError),
}
