//! Graph with one compile-time width for every row.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::check::CheckInvariants;
use crate::error::GraphError;
use crate::graph::traits::RowGraph;
use crate::storage::ChunkedList;

/// Rows of exactly `W` cells packed back to back in a chunked buffer.
///
/// Row `r` occupies cells `r * W .. (r + 1) * W`, so there is no row table
/// to maintain and no vacancy bookkeeping. Use this over
/// [`VarWidthGraph`](crate::graph::VarWidthGraph) whenever the width is a
/// structural constant, e.g. the two nodes of every edge.
///
/// ```
/// use mesh_rowgraph::graph::FixedWidthGraph;
///
/// let mut edges = FixedWidthGraph::<u32, 2>::new();
/// edges.push_row([4, 7]);
/// edges.push_row([7, 9]);
/// assert_eq!(edges.row_count(), 2);
/// assert_eq!(*edges.get(1, 0), 7);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct FixedWidthGraph<T, const W: usize> {
    data: ChunkedList<T>,
}

impl<T, const W: usize> FixedWidthGraph<T, W> {
    /// Row width, also available without an instance.
    pub const WIDTH: usize = W;

    /// Number of rows.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.data.len() / W
    }

    /// Row width.
    #[inline]
    pub fn width(&self) -> usize {
        W
    }

    /// Whether the graph has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Total number of cells.
    #[inline]
    pub fn element_count(&self) -> usize {
        self.data.len()
    }

    /// Cell at `(r, c)`.
    ///
    /// Range errors panic in debug/checked builds; release builds do not
    /// check beyond the backing buffer's own bounds.
    #[inline]
    pub fn get(&self, r: usize, c: usize) -> &T {
        self.check_entry("get", r, c);
        &self.data[r * W + c]
    }

    /// Mutable cell at `(r, c)`.
    #[inline]
    pub fn get_mut(&mut self, r: usize, c: usize) -> &mut T {
        self.check_entry("get_mut", r, c);
        &mut self.data[r * W + c]
    }

    /// Overwrites the cell at `(r, c)`.
    #[inline]
    pub fn set(&mut self, r: usize, c: usize, value: T) {
        self.check_entry("set", r, c);
        self.data[r * W + c] = value;
    }

    /// Fallible form of [`get`](Self::get).
    pub fn try_get(&self, r: usize, c: usize) -> Result<&T, GraphError> {
        if r >= self.row_count() {
            return Err(GraphError::IndexOutOfRange {
                op: "get",
                index: r,
                len: self.row_count(),
            });
        }
        if c >= W {
            return Err(GraphError::IndexOutOfRange {
                op: "get",
                index: c,
                len: W,
            });
        }
        Ok(&self.data[r * W + c])
    }

    /// Fallible form of [`set`](Self::set).
    pub fn try_set(&mut self, r: usize, c: usize, value: T) -> Result<(), GraphError> {
        if r >= self.row_count() {
            return Err(GraphError::IndexOutOfRange {
                op: "set",
                index: r,
                len: self.row_count(),
            });
        }
        if c >= W {
            return Err(GraphError::IndexOutOfRange {
                op: "set",
                index: c,
                len: W,
            });
        }
        self.data[r * W + c] = value;
        Ok(())
    }

    /// Iterator over the cells of row `r`.
    ///
    /// A row may straddle a chunk boundary, so there is no contiguous slice
    /// to hand out.
    pub fn row_iter(&self, r: usize) -> impl ExactSizeIterator<Item = &T> {
        self.check_row("row_iter", r);
        let base = r * W;
        (0..W).map(move |c| &self.data[base + c])
    }

    pub(crate) fn cells(&self) -> &ChunkedList<T> {
        &self.data
    }

    pub(crate) fn cells_mut(&mut self) -> &mut ChunkedList<T> {
        &mut self.data
    }

    #[inline]
    #[allow(unused_variables)]
    fn check_row(&self, op: &'static str, r: usize) {
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        if r >= self.row_count() {
            panic!(
                "FixedWidthGraph::{op}: row {r} out of range for {} rows",
                self.row_count()
            );
        }
    }

    #[inline]
    #[allow(unused_variables)]
    fn check_entry(&self, op: &'static str, r: usize, c: usize) {
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        {
            if r >= self.row_count() {
                panic!(
                    "FixedWidthGraph::{op}: row {r} out of range for {} rows",
                    self.row_count()
                );
            }
            if c >= W {
                panic!("FixedWidthGraph::{op}: position {c} out of range for width {W}");
            }
        }
    }
}

impl<T: Clone + Default, const W: usize> FixedWidthGraph<T, W> {
    /// Empty graph. The width is checked once, at compile time.
    pub fn new() -> Self {
        const { assert!(W > 0, "row width must be positive") };
        Self {
            data: ChunkedList::new(),
        }
    }

    /// Graph of `n` rows with every cell defaulted.
    pub fn with_rows(n: usize) -> Self {
        let mut graph = Self::new();
        graph.data.resize(n * W);
        graph
    }

    /// Builds a graph from materialized rows.
    pub fn from_rows(rows: &[[T; W]]) -> Self {
        let mut graph = Self::new();
        for row in rows {
            graph.push_row(row.clone());
        }
        graph
    }

    /// Resizes to `n` rows; new cells are defaulted.
    pub fn set_row_count(&mut self, n: usize) {
        self.data.resize(n * W);
    }

    /// Appends one row.
    pub fn push_row(&mut self, row: [T; W]) {
        for value in row {
            self.data.push(value);
        }
    }

    /// Replaces row `r`.
    pub fn set_row(&mut self, r: usize, row: [T; W]) {
        self.check_row("set_row", r);
        for (c, value) in row.into_iter().enumerate() {
            self.data[r * W + c] = value;
        }
    }

    /// Drops all rows.
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl<T: PartialEq, const W: usize> FixedWidthGraph<T, W> {
    /// Whether row `r` holds `value`.
    pub fn row_contains(&self, r: usize, value: &T) -> bool {
        self.row_iter(r).any(|v| v == value)
    }

    /// Position of `value` within row `r`.
    pub fn position_in_row(&self, r: usize, value: &T) -> Option<usize> {
        self.row_iter(r).position(|v| v == value)
    }
}

impl<T: Clone + Default, const W: usize> Default for FixedWidthGraph<T, W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const W: usize> RowGraph for FixedWidthGraph<u32, W> {
    fn row_count(&self) -> usize {
        self.data.len() / W
    }

    fn row_len(&self, _row: usize) -> usize {
        W
    }

    fn entry(&self, row: usize, col: usize) -> u32 {
        *self.get(row, col)
    }
}

impl<T: fmt::Debug, const W: usize> fmt::Debug for FixedWidthGraph<T, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries((0..self.row_count()).map(|r| self.row_iter(r).collect::<Vec<_>>()))
            .finish()
    }
}

impl<T: Serialize, const W: usize> Serialize for FixedWidthGraph<T, W> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq((0..self.row_count()).map(|r| self.row_iter(r).collect::<Vec<_>>()))
    }
}

impl<'de, T, const W: usize> Deserialize<'de> for FixedWidthGraph<T, W>
where
    T: Deserialize<'de> + Clone + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rows = Vec::<Vec<T>>::deserialize(deserializer)?;
        let mut graph = Self::new();
        graph.set_row_count(rows.len());
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != W {
                return Err(serde::de::Error::custom(format!(
                    "expected row of width {W}, found {}",
                    row.len()
                )));
            }
            for (c, value) in row.into_iter().enumerate() {
                graph.data[r * W + c] = value;
            }
        }
        Ok(graph)
    }
}

impl<T, const W: usize> CheckInvariants for FixedWidthGraph<T, W> {
    fn validate_invariants(&self) -> Result<(), GraphError> {
        if self.data.len() % W != 0 {
            return Err(GraphError::PreconditionViolated {
                op: "FixedWidthGraph::validate_invariants",
                reason: "cell count is not a multiple of the row width",
            });
        }
        Ok(())
    }
}
