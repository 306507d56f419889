//! Lightweight cursors over [`VarWidthGraph`] rows.

use core::fmt;

use crate::error::GraphError;
use crate::graph::slot::Slot;
use crate::graph::traits::RowGraph;
use crate::graph::var::VarWidthGraph;
use crate::storage::ChunkedList;

/// Read-only cursor over one row.
///
/// A cheap copyable handle; it resolves the row span on each access, so it
/// stays valid across operations that only touch other rows.
#[derive(Clone, Copy)]
pub struct RowView<'a> {
    graph: &'a VarWidthGraph,
    row: usize,
}

impl<'a> RowView<'a> {
    pub(crate) fn new(graph: &'a VarWidthGraph, row: usize) -> Self {
        Self { graph, row }
    }

    /// Index of the viewed row.
    #[inline]
    pub fn row_index(&self) -> usize {
        self.row
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.graph.row_len(self.row)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry at position `c`.
    #[inline]
    pub fn get(&self, c: usize) -> u32 {
        self.graph.get(self.row, c)
    }

    /// Fallible form of [`get`](Self::get).
    pub fn try_get(&self, c: usize) -> Result<u32, GraphError> {
        self.graph.try_get(self.row, c)
    }

    pub fn iter(&self) -> RowIter<'a> {
        let span = self.graph.span(self.row);
        RowIter {
            cells: self.graph.cells(),
            base: span.start.unwrap_or(0),
            col: 0,
            len: span.len,
        }
    }

    pub fn contains(&self, value: u32) -> bool {
        self.iter().any(|v| v == value)
    }

    pub fn position(&self, value: u32) -> Option<usize> {
        self.iter().position(|v| v == value)
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

impl fmt::Debug for RowView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for RowView<'a> {
    type Item = u32;
    type IntoIter = RowIter<'a>;

    fn into_iter(self) -> RowIter<'a> {
        self.iter()
    }
}

impl<'a> IntoIterator for &RowView<'a> {
    type Item = u32;
    type IntoIter = RowIter<'a>;

    fn into_iter(self) -> RowIter<'a> {
        self.iter()
    }
}

/// Iterator over the entries of one row.
pub struct RowIter<'a> {
    cells: &'a ChunkedList<Slot>,
    base: usize,
    col: usize,
    len: usize,
}

impl Iterator for RowIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.col == self.len {
            return None;
        }
        let v = self.cells[self.base + self.col].value().unwrap_or(0);
        self.col += 1;
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.col;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RowIter<'_> {}

impl DoubleEndedIterator for RowIter<'_> {
    fn next_back(&mut self) -> Option<u32> {
        if self.col == self.len {
            return None;
        }
        self.len -= 1;
        Some(self.cells[self.base + self.len].value().unwrap_or(0))
    }
}

/// Mutable cursor over one row.
pub struct RowViewMut<'a> {
    graph: &'a mut VarWidthGraph,
    row: usize,
}

impl<'a> RowViewMut<'a> {
    pub(crate) fn new(graph: &'a mut VarWidthGraph, row: usize) -> Self {
        Self { graph, row }
    }

    /// Index of the viewed row.
    #[inline]
    pub fn row_index(&self) -> usize {
        self.row
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.graph.row_len(self.row)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, c: usize) -> u32 {
        self.graph.get(self.row, c)
    }

    #[inline]
    pub fn set(&mut self, c: usize, value: u32) {
        self.graph.set(self.row, c, value);
    }

    /// Appends `value`, growing the row by one entry.
    pub fn append(&mut self, value: u32) {
        self.graph.append(self.row, value);
    }

    /// Appends `value` unless already present; returns whether it was added.
    pub fn append_if_absent(&mut self, value: u32) -> bool {
        self.graph.append_if_absent(self.row, value)
    }

    /// Replaces the row's contents.
    pub fn assign(&mut self, values: &[u32]) {
        self.graph.set_row(self.row, values);
    }

    /// Resizes the row; new entries hold zero.
    pub fn set_len(&mut self, n: usize) {
        self.graph.set_row_len(self.row, n);
    }

    /// Empties the row.
    pub fn clear(&mut self) {
        self.graph.set_row_len(self.row, 0);
    }

    /// Read-only view with the same scope.
    pub fn as_view(&self) -> RowView<'_> {
        RowView::new(self.graph, self.row)
    }

    pub fn iter(&self) -> RowIter<'_> {
        self.as_view().iter()
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

impl fmt::Debug for RowViewMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Read-only view over a contiguous range of rows.
///
/// Local row `i` maps to row `first + i` of the underlying graph. The view
/// implements [`RowGraph`], so any transpose can run on a window without
/// copying it out first.
#[derive(Clone, Copy)]
pub struct SubGraphView<'a> {
    graph: &'a VarWidthGraph,
    first: usize,
    count: usize,
}

impl<'a> SubGraphView<'a> {
    pub(crate) fn new(
        graph: &'a VarWidthGraph,
        first: usize,
        count: usize,
    ) -> Result<Self, GraphError> {
        let end = first
            .checked_add(count)
            .ok_or(GraphError::PreconditionViolated {
                op: "sub_graph",
                reason: "row range overflows",
            })?;
        if end > graph.row_count() {
            return Err(GraphError::IndexOutOfRange {
                op: "sub_graph",
                index: end,
                len: graph.row_count(),
            });
        }
        Ok(Self {
            graph,
            first,
            count,
        })
    }

    /// First underlying row covered by the view.
    #[inline]
    pub fn first_row(&self) -> usize {
        self.first
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Length of local row `local`.
    #[inline]
    pub fn row_len(&self, local: usize) -> usize {
        self.graph.row_len(self.global("row_len", local))
    }

    /// Entry at `(local, c)`.
    #[inline]
    pub fn get(&self, local: usize, c: usize) -> u32 {
        self.graph.get(self.global("get", local), c)
    }

    /// View of local row `local`.
    pub fn row(&self, local: usize) -> RowView<'a> {
        self.graph.row(self.global("row", local))
    }

    /// Iterator over the covered rows.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = RowView<'a>> + use<'a> {
        let graph = self.graph;
        (self.first..self.first + self.count).map(move |r| graph.row(r))
    }

    #[inline]
    #[allow(unused_variables)]
    fn global(&self, op: &'static str, local: usize) -> usize {
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        if local >= self.count {
            panic!(
                "SubGraphView::{op}: row {local} out of range for {} rows",
                self.count
            );
        }
        self.first + local
    }
}

impl RowGraph for SubGraphView<'_> {
    fn row_count(&self) -> usize {
        self.count
    }

    fn row_len(&self, row: usize) -> usize {
        self.graph.row_len(self.global("row_len", row))
    }

    fn entry(&self, row: usize, col: usize) -> u32 {
        self.graph.get(self.global("entry", row), col)
    }
}

impl fmt::Debug for SubGraphView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rows().map(|row| row.to_vec())).finish()
    }
}
