//! # mesh-rowgraph
//!
//! mesh-rowgraph is a Rust library of row-oriented graph containers for mesh
//! generation and scientific computing. A graph here is a table of rows of
//! `u32` entity indices (the points of a cell, the faces at an edge); the
//! containers pack those rows into chunked storage that grows without
//! moving the elements already stored.
//!
//! ## Features
//! - [`ChunkedList`](storage::ChunkedList): a dynamic array over fixed-size
//!   chunks, address-stable under growth
//! - [`FixedWidthGraph`](graph::FixedWidthGraph): rows with one compile-time
//!   width and no per-row bookkeeping
//! - [`VarWidthGraph`](graph::VarWidthGraph): per-row widths with in-place
//!   growth, row reservations, and explicit compaction
//! - Row views and sub-graph windows that feed the same algorithms as whole
//!   graphs
//! - Sequential and lock-free parallel reverse addressing (graph transpose)
//!   over the rayon pool
//! - Plain text and raw binary wire forms, plus serde for generic interchange
//!
//! ## Determinism
//!
//! The parallel transpose partitions work by arithmetic on row and value
//! ranges, never by scheduling order, so its output is reproducible and
//! matches the sequential transpose entry for entry.
//!
//! ## Usage
//! Add `mesh-rowgraph` as a dependency in your `Cargo.toml` and enable
//! features as needed:
//!
//! ```toml
//! [dependencies]
//! mesh-rowgraph = "0.4"
//! # Optional features:
//! # features = ["check-invariants"]
//! ```
//!
//! ```
//! use mesh_rowgraph::prelude::*;
//!
//! let cell_points = VarWidthGraph::from_rows(vec![
//!     vec![0, 1, 2],
//!     vec![2, 1, 3],
//! ]);
//! let point_cells = reverse_addressing_par(&cell_points);
//! assert_eq!(point_cells.row(2).to_vec(), vec![0, 1]);
//! ```

// Re-export our major subsystems:
pub mod algs;
pub mod check;
pub mod error;
pub mod graph;
pub mod io;
pub mod storage;

pub use check::CheckInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::{reverse_addressing_par, reverse_addressing_par_mapped};
    pub use crate::check::CheckInvariants;
    pub use crate::error::{GraphError, ReadError};
    pub use crate::graph::{
        FixedWidthGraph, RowGraph, RowIter, RowView, RowViewMut, SubGraphView, VarWidthGraph,
    };
    pub use crate::io::IoFormat;
    pub use crate::storage::{BulkWriter, ChunkedList};
}
