//! Variable-row-width graph.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::check::CheckInvariants;
use crate::error::GraphError;
use crate::graph::slot::{RowSpan, Slot};
use crate::graph::traits::RowGraph;
use crate::graph::view::{RowView, RowViewMut, SubGraphView};
use crate::storage::ChunkedList;

/// A table of rows with per-row widths, packed into one chunked buffer.
///
/// Each row is described by a span (start offset and length) into the shared
/// cell buffer. Rows grow in place when the cells past their end are
/// consumable, and relocate to the end of the buffer otherwise, leaving
/// vacant cells behind; [`compact`](Self::compact) reclaims those in one
/// pass. The preferred construction path is
/// [`set_row_count_and_widths`](Self::set_row_count_and_widths), which lays
/// every row out exactly once.
///
/// ```
/// use mesh_rowgraph::graph::VarWidthGraph;
///
/// let mut graph = VarWidthGraph::with_row_count(3);
/// graph.append(0, 4);
/// graph.append(0, 7);
/// graph.append(2, 1);
/// assert_eq!(graph.row_len(0), 2);
/// assert_eq!(graph.row(0).to_vec(), vec![4, 7]);
/// assert_eq!(graph.row_len(1), 0);
/// ```
#[derive(Clone, Default)]
pub struct VarWidthGraph {
    rows: Vec<RowSpan>,
    data: ChunkedList<Slot>,
    /// Number of vacant cells inside `data`; drives the compaction fast path.
    free_cells: usize,
}

impl VarWidthGraph {
    /// Empty graph with no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph of `n` vacant rows.
    pub fn with_row_count(n: usize) -> Self {
        Self {
            rows: vec![RowSpan::VACANT; n],
            data: ChunkedList::new(),
            free_cells: 0,
        }
    }

    /// Builds a graph from materialized rows.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<u32>>,
    {
        let rows: Vec<Vec<u32>> = rows.into_iter().collect();
        let widths: Vec<usize> = rows.iter().map(Vec::len).collect();
        let mut graph = Self::new();
        graph.set_row_count_and_widths(&widths);
        for (r, row) in rows.iter().enumerate() {
            if let Some(start) = graph.rows[r].start {
                for (c, &v) in row.iter().enumerate() {
                    graph.data[start + c] = Slot::Occupied(v);
                }
            }
        }
        graph
    }

    /// Number of rows.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the graph has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Length of row `r`.
    #[inline]
    pub fn row_len(&self, r: usize) -> usize {
        self.rows[r].len
    }

    /// Total number of live entries across all rows.
    pub fn element_count(&self) -> usize {
        self.rows.iter().map(|s| s.len).sum()
    }

    /// Number of cells in the backing buffer, vacant ones included.
    #[inline]
    pub fn storage_len(&self) -> usize {
        self.data.len()
    }

    /// Number of vacant cells awaiting [`compact`](Self::compact).
    #[inline]
    pub fn vacant_cells(&self) -> usize {
        self.free_cells
    }

    /// Resizes the row table.
    ///
    /// New rows are vacant. Removed rows leave their cells vacant in the
    /// buffer until the next [`compact`](Self::compact).
    pub fn set_row_count(&mut self, n: usize) {
        if n < self.rows.len() {
            for r in n..self.rows.len() {
                self.vacate_row_cells(r);
            }
            self.rows.truncate(n);
        } else {
            self.rows.resize(n, RowSpan::VACANT);
        }
    }

    /// Lays out the whole graph from per-row widths in one pass.
    ///
    /// Row starts are the running sum of the widths, zero-width rows are
    /// vacant, and the buffer is sized to the exact total with every cell
    /// reset to the zeroed placeholder. Any previous contents are discarded.
    pub fn set_row_count_and_widths(&mut self, widths: &[usize]) {
        let total: usize = widths.iter().sum();
        self.rows.clear();
        self.rows.reserve(widths.len());
        let mut start = 0usize;
        for &w in widths {
            if w == 0 {
                self.rows.push(RowSpan::VACANT);
            } else {
                self.rows.push(RowSpan {
                    start: Some(start),
                    len: w,
                });
                start += w;
            }
        }
        self.data.resize(total);
        self.data.fill(Slot::default());
        self.free_cells = 0;
        self.debug_assert_invariants();
    }

    /// Lays out `n_rows` empty rows, each with `row_capacity` reserved cells.
    ///
    /// Rows filled by [`append`](Self::append) afterwards grow inside their
    /// reservation without moving. Only valid on an empty graph.
    pub fn init_reserved(&mut self, n_rows: usize, row_capacity: usize) -> Result<(), GraphError> {
        if !self.rows.is_empty() || !self.data.is_empty() {
            return Err(GraphError::PreconditionViolated {
                op: "init_reserved",
                reason: "graph must be empty",
            });
        }
        if row_capacity == 0 {
            return Err(GraphError::PreconditionViolated {
                op: "init_reserved",
                reason: "row capacity must be positive",
            });
        }
        self.rows = (0..n_rows)
            .map(|i| RowSpan {
                start: Some(i * row_capacity),
                len: 0,
            })
            .collect();
        self.data.resize(n_rows * row_capacity);
        self.data.fill(Slot::Free);
        for i in 0..n_rows {
            self.data[i * row_capacity] = Slot::FreeStart;
        }
        self.free_cells = n_rows * row_capacity;
        self.debug_assert_invariants();
        Ok(())
    }

    /// Resizes row `r` to `new_len` entries.
    ///
    /// Growth extends in place when every cell between the current end and
    /// the new end is consumable, and relocates the row to the end of the
    /// buffer otherwise. New entries hold zero. Shrinking vacates the tail
    /// cells; shrinking to zero vacates the whole span.
    pub fn set_row_len(&mut self, r: usize, new_len: usize) {
        self.check_row("set_row_len", r);
        let old_len = self.rows[r].len;
        if new_len > old_len {
            self.grow_row(r, new_len);
        } else if new_len < old_len {
            self.shrink_row(r, new_len);
        }
    }

    /// Appends `value` to row `r`, growing the row by one entry.
    pub fn append(&mut self, r: usize, value: u32) {
        self.check_row("append", r);
        let len = self.rows[r].len;
        self.grow_row(r, len + 1);
        if let Some(start) = self.rows[r].start {
            self.data[start + len] = Slot::Occupied(value);
        }
    }

    /// Appends `value` to row `r` unless the row already holds it; returns
    /// whether it was added.
    pub fn append_if_absent(&mut self, r: usize, value: u32) -> bool {
        if self.contains(r, value) {
            false
        } else {
            self.append(r, value);
            true
        }
    }

    /// Replaces the contents of row `r`.
    pub fn set_row(&mut self, r: usize, values: &[u32]) {
        self.check_row("set_row", r);
        self.set_row_len(r, values.len());
        if let Some(start) = self.rows[r].start {
            for (c, &v) in values.iter().enumerate() {
                self.data[start + c] = Slot::Occupied(v);
            }
        }
    }

    /// Entry at `(r, c)`.
    ///
    /// Range errors panic in debug/checked builds; release builds do not
    /// check, mirroring the hot-path accessors elsewhere in the crate.
    #[inline]
    pub fn get(&self, r: usize, c: usize) -> u32 {
        self.check_entry("get", r, c);
        let span = self.rows[r];
        let i = span.start.unwrap_or(0) + c;
        self.data[i].value().unwrap_or(0)
    }

    /// Overwrites the entry at `(r, c)`.
    #[inline]
    pub fn set(&mut self, r: usize, c: usize, value: u32) {
        self.check_entry("set", r, c);
        let span = self.rows[r];
        let i = span.start.unwrap_or(0) + c;
        self.data[i] = Slot::Occupied(value);
    }

    /// Fallible form of [`get`](Self::get).
    pub fn try_get(&self, r: usize, c: usize) -> Result<u32, GraphError> {
        let span = *self
            .rows
            .get(r)
            .ok_or(GraphError::IndexOutOfRange {
                op: "get",
                index: r,
                len: self.rows.len(),
            })?;
        if c >= span.len {
            return Err(GraphError::IndexOutOfRange {
                op: "get",
                index: c,
                len: span.len,
            });
        }
        let Some(start) = span.start else {
            return Err(GraphError::InvalidRow { row: r });
        };
        match self.data[start + c].value() {
            Some(v) => Ok(v),
            None => Err(GraphError::InvalidRow { row: r }),
        }
    }

    /// Fallible form of [`set`](Self::set).
    pub fn try_set(&mut self, r: usize, c: usize, value: u32) -> Result<(), GraphError> {
        let span = *self
            .rows
            .get(r)
            .ok_or(GraphError::IndexOutOfRange {
                op: "set",
                index: r,
                len: self.rows.len(),
            })?;
        if c >= span.len {
            return Err(GraphError::IndexOutOfRange {
                op: "set",
                index: c,
                len: span.len,
            });
        }
        let Some(start) = span.start else {
            return Err(GraphError::InvalidRow { row: r });
        };
        self.data[start + c] = Slot::Occupied(value);
        Ok(())
    }

    /// Read-only view of row `r`.
    pub fn row(&self, r: usize) -> RowView<'_> {
        self.check_row("row", r);
        RowView::new(self, r)
    }

    /// Mutable view of row `r`.
    pub fn row_mut(&mut self, r: usize) -> RowViewMut<'_> {
        self.check_row("row_mut", r);
        RowViewMut::new(self, r)
    }

    /// Iterator over all rows as read-only views.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = RowView<'_>> {
        (0..self.rows.len()).map(move |r| RowView::new(self, r))
    }

    /// View over the contiguous row range `[first, first + count)`.
    pub fn sub_graph(&self, first: usize, count: usize) -> Result<SubGraphView<'_>, GraphError> {
        SubGraphView::new(self, first, count)
    }

    /// Whether row `r` holds `value`.
    pub fn contains(&self, r: usize, value: u32) -> bool {
        self.row(r).contains(value)
    }

    /// Position of `value` within row `r`.
    pub fn position_in_row(&self, r: usize, value: u32) -> Option<usize> {
        self.row(r).position(value)
    }

    /// Concatenates `parts` row by row.
    ///
    /// All parts must share one row count. Row `r` of the result is
    /// `parts[0]`'s row `r`, then `parts[1]`'s, and so on, in that order.
    pub fn merge_rowwise(parts: &[Self]) -> Result<Self, GraphError> {
        let Some(first) = parts.first() else {
            return Ok(Self::new());
        };
        let n = first.row_count();
        for part in parts {
            if part.row_count() != n {
                return Err(GraphError::ShapeMismatch {
                    op: "merge_rowwise",
                    expected: n,
                    found: part.row_count(),
                });
            }
        }
        let mut widths = vec![0usize; n];
        for part in parts {
            for r in 0..n {
                widths[r] += part.row_len(r);
            }
        }
        let mut merged = Self::new();
        merged.set_row_count_and_widths(&widths);
        // Fill back to front; walking parts and their elements in reverse
        // keeps concatenation order across parts.
        let mut cursors = widths;
        for part in parts.iter().rev() {
            for r in 0..n {
                for c in (0..part.row_len(r)).rev() {
                    cursors[r] -= 1;
                    merged.set(r, cursors[r], part.get(r, c));
                }
            }
        }
        debug_assert!(cursors.iter().all(|&c| c == 0));
        crate::debug_invariants!(merged.validate_invariants(), "VarWidthGraph::merge_rowwise");
        Ok(merged)
    }

    /// Rebuilds the buffer with the rows packed in order, dropping every
    /// vacant cell. A second call right after is a no-op.
    ///
    /// Reserved regions from [`init_reserved`](Self::init_reserved) do not
    /// survive: still-empty rows come out vacant.
    pub fn compact(&mut self) {
        if self.free_cells == 0 {
            return;
        }
        log::trace!("compact: reclaiming {} vacant cells", self.free_cells);
        let mut packed = ChunkedList::with_chunk_size(self.data.chunk_size());
        let mut pos = 0usize;
        for span in self.rows.iter_mut() {
            let Some(start) = span.start else { continue };
            if span.len == 0 {
                span.start = None;
                continue;
            }
            for c in 0..span.len {
                packed.push(self.data[start + c]);
            }
            span.start = Some(pos);
            pos += span.len;
        }
        self.data.transfer_from(&mut packed);
        self.free_cells = 0;
        crate::debug_invariants!(self.validate_invariants(), "VarWidthGraph::compact");
    }

    /// Drops all rows and the whole buffer.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.data.clear();
        self.free_cells = 0;
    }

    /// Transpose of `origin`: row `v` of the result lists every origin row
    /// in which the value `v` appears, once per appearance.
    ///
    /// The result has `max value + 1` rows (zero for an all-empty origin).
    /// Order within a result row is unspecified.
    pub fn reverse_addressing<G: RowGraph + ?Sized>(origin: &G) -> Self {
        let mut max: Option<u32> = None;
        for r in 0..origin.row_count() {
            for c in 0..origin.row_len(r) {
                let v = origin.entry(r, c);
                max = Some(max.map_or(v, |m| m.max(v)));
            }
        }
        let value_range = max.map_or(0, |m| m as usize + 1);
        Self::reverse_addressing_sized(value_range, origin)
    }

    /// Transpose with an explicit result row count.
    ///
    /// Every stored value must be below `value_range`.
    pub fn reverse_addressing_sized<G: RowGraph + ?Sized>(value_range: usize, origin: &G) -> Self {
        let mut widths = vec![0usize; value_range];
        for r in 0..origin.row_count() {
            for c in 0..origin.row_len(r) {
                widths[origin.entry(r, c) as usize] += 1;
            }
        }
        let mut reverse = Self::new();
        reverse.set_row_count_and_widths(&widths);
        let mut cursors = vec![0usize; value_range];
        for r in 0..origin.row_count() {
            for c in 0..origin.row_len(r) {
                let v = origin.entry(r, c) as usize;
                reverse.set(v, cursors[v], r as u32);
                cursors[v] += 1;
            }
        }
        reverse
    }

    pub(crate) fn span(&self, r: usize) -> RowSpan {
        self.rows[r]
    }

    pub(crate) fn cells(&self) -> &ChunkedList<Slot> {
        &self.data
    }

    /// Row table and buffer, split for the parallel fill phase.
    pub(crate) fn parts_mut(&mut self) -> (&[RowSpan], &mut ChunkedList<Slot>) {
        (&self.rows, &mut self.data)
    }

    fn vacate_row_cells(&mut self, r: usize) {
        let span = self.rows[r];
        let Some(start) = span.start else { return };
        for j in start..start + span.len {
            self.data[j] = Slot::Free;
            self.free_cells += 1;
        }
        self.rows[r] = RowSpan::VACANT;
    }

    /// Grows row `r` to `new_len`, preferring in-place extension.
    fn grow_row(&mut self, r: usize, new_len: usize) {
        let span = self.rows[r];
        let old_len = span.len;
        debug_assert!(new_len > old_len);
        let Some(start) = span.start else {
            // Vacant row: fresh span at the end of the buffer.
            let start = self.data.len();
            for _ in 0..new_len {
                self.data.push(Slot::default());
            }
            self.rows[r] = RowSpan {
                start: Some(start),
                len: new_len,
            };
            return;
        };
        let probe_from = start + old_len;
        let probe_to = (start + new_len).min(self.data.len());
        let mut in_place = true;
        for j in probe_from..probe_to {
            let consumable = match self.data[j] {
                Slot::Free => true,
                // A row may consume its own reservation marker, never a
                // neighbor's.
                Slot::FreeStart => j == start && old_len == 0,
                Slot::Occupied(_) => false,
            };
            if !consumable {
                in_place = false;
                break;
            }
        }
        if in_place {
            for j in probe_from..probe_to {
                self.data[j] = Slot::default();
                self.free_cells -= 1;
            }
            for _ in probe_to..start + new_len {
                self.data.push(Slot::default());
            }
            self.rows[r].len = new_len;
        } else {
            let new_start = self.data.len();
            for c in 0..old_len {
                let cell = self.data[start + c];
                self.data.push(cell);
            }
            for _ in old_len..new_len {
                self.data.push(Slot::default());
            }
            for j in start..start + old_len {
                self.data[j] = Slot::Free;
            }
            self.free_cells += old_len;
            self.rows[r] = RowSpan {
                start: Some(new_start),
                len: new_len,
            };
        }
    }

    fn shrink_row(&mut self, r: usize, new_len: usize) {
        let span = self.rows[r];
        let Some(start) = span.start else { return };
        for j in start + new_len..start + span.len {
            self.data[j] = Slot::Free;
            self.free_cells += 1;
        }
        if new_len == 0 {
            self.rows[r] = RowSpan::VACANT;
        } else {
            self.rows[r].len = new_len;
        }
    }

    #[inline]
    #[allow(unused_variables)]
    fn check_row(&self, op: &'static str, r: usize) {
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        if r >= self.rows.len() {
            panic!(
                "VarWidthGraph::{op}: row {r} out of range for {} rows",
                self.rows.len()
            );
        }
    }

    #[inline]
    #[allow(unused_variables)]
    fn check_entry(&self, op: &'static str, r: usize, c: usize) {
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        {
            if r >= self.rows.len() {
                panic!(
                    "VarWidthGraph::{op}: row {r} out of range for {} rows",
                    self.rows.len()
                );
            }
            let len = self.rows[r].len;
            if c >= len {
                panic!(
                    "VarWidthGraph::{op}: position {c} out of range for row {r} of length {len}"
                );
            }
        }
    }
}

impl RowGraph for VarWidthGraph {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn row_len(&self, row: usize) -> usize {
        self.rows[row].len
    }

    fn entry(&self, row: usize, col: usize) -> u32 {
        self.get(row, col)
    }
}

impl fmt::Debug for VarWidthGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rows().map(|row| row.to_vec()))
            .finish()
    }
}

impl PartialEq for VarWidthGraph {
    /// Rows compare by content; buffer layout and vacant cells are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.rows.len() == other.rows.len()
            && (0..self.rows.len()).all(|r| {
                self.rows[r].len == other.rows[r].len
                    && self.row(r).iter().eq(other.row(r).iter())
            })
    }
}

impl Eq for VarWidthGraph {}

impl From<Vec<Vec<u32>>> for VarWidthGraph {
    fn from(rows: Vec<Vec<u32>>) -> Self {
        Self::from_rows(rows)
    }
}

impl FromIterator<Vec<u32>> for VarWidthGraph {
    fn from_iter<I: IntoIterator<Item = Vec<u32>>>(iter: I) -> Self {
        Self::from_rows(iter)
    }
}

impl Serialize for VarWidthGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows().map(|row| row.to_vec()))
    }
}

impl<'de> Deserialize<'de> for VarWidthGraph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Vec<u32>>::deserialize(deserializer).map(Self::from_rows)
    }
}

impl CheckInvariants for VarWidthGraph {
    fn validate_invariants(&self) -> Result<(), GraphError> {
        const OP: &str = "VarWidthGraph::validate_invariants";
        let mut live: Vec<(usize, usize)> = Vec::new();
        for span in &self.rows {
            let Some(start) = span.start else {
                if span.len != 0 {
                    return Err(GraphError::PreconditionViolated {
                        op: OP,
                        reason: "vacant row with nonzero length",
                    });
                }
                continue;
            };
            let end = start
                .checked_add(span.len)
                .ok_or(GraphError::PreconditionViolated {
                    op: OP,
                    reason: "row span overflows",
                })?;
            if end > self.data.len() {
                return Err(GraphError::PreconditionViolated {
                    op: OP,
                    reason: "row span out of bounds",
                });
            }
            if span.len == 0 {
                if start >= self.data.len() || self.data[start] != Slot::FreeStart {
                    return Err(GraphError::PreconditionViolated {
                        op: OP,
                        reason: "reserved row without start marker",
                    });
                }
            } else {
                live.push((start, span.len));
            }
        }
        live.sort_unstable();
        for pair in live.windows(2) {
            if pair[0].0 + pair[0].1 > pair[1].0 {
                return Err(GraphError::PreconditionViolated {
                    op: OP,
                    reason: "row spans overlap",
                });
            }
        }
        for &(start, len) in &live {
            for j in start..start + len {
                if self.data[j].is_free() {
                    return Err(GraphError::PreconditionViolated {
                        op: OP,
                        reason: "vacant cell inside a live row",
                    });
                }
            }
        }
        let free = self.data.iter().filter(|s| s.is_free()).count();
        if free != self.free_cells {
            return Err(GraphError::PreconditionViolated {
                op: OP,
                reason: "vacant cell accounting is stale",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
impl VarWidthGraph {
    pub(crate) fn row_start(&self, r: usize) -> Option<usize> {
        self.rows[r].start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_layout_is_a_running_sum() {
        let mut g = VarWidthGraph::new();
        g.set_row_count_and_widths(&[2, 0, 3, 1]);
        assert_eq!(g.row_count(), 4);
        assert_eq!(g.storage_len(), 6);
        assert_eq!(g.row_start(0), Some(0));
        assert_eq!(g.row_start(1), None);
        assert_eq!(g.row_start(2), Some(2));
        assert_eq!(g.row_start(3), Some(5));
        assert_eq!(g.row(0).to_vec(), vec![0, 0]);
        g.validate_invariants().unwrap();
    }

    #[test]
    fn append_to_vacant_row_starts_fresh_span() {
        let mut g = VarWidthGraph::with_row_count(2);
        g.append(1, 9);
        assert_eq!(g.row_start(1), Some(0));
        assert_eq!(g.row(1).to_vec(), vec![9]);
        assert_eq!(g.row_len(0), 0);
        g.validate_invariants().unwrap();
    }

    #[test]
    fn append_at_buffer_end_extends_in_place() {
        let mut g = VarWidthGraph::with_row_count(1);
        g.append(0, 1);
        g.append(0, 2);
        g.append(0, 3);
        assert_eq!(g.row_start(0), Some(0));
        assert_eq!(g.storage_len(), 3);
        assert_eq!(g.vacant_cells(), 0);
    }

    #[test]
    fn blocked_append_relocates_row() {
        let mut g = VarWidthGraph::with_row_count(2);
        g.append(0, 1);
        g.append(1, 2);
        g.append(0, 3);
        assert_eq!(g.row_start(0), Some(2));
        assert_eq!(g.row(0).to_vec(), vec![1, 3]);
        assert_eq!(g.row(1).to_vec(), vec![2]);
        assert_eq!(g.vacant_cells(), 1);
        g.validate_invariants().unwrap();
    }

    #[test]
    fn set_row_len_grows_over_vacated_cells() {
        let mut g = VarWidthGraph::new();
        g.set_row_count_and_widths(&[2, 2]);
        g.set_row(0, &[1, 2]);
        g.set_row(1, &[3, 4]);
        g.set_row_len(1, 0);
        g.set_row_len(0, 4);
        // Row 1's vacated cells sit right after row 0, so row 0 stays put.
        assert_eq!(g.row_start(0), Some(0));
        assert_eq!(g.row(0).to_vec(), vec![1, 2, 0, 0]);
        assert_eq!(g.vacant_cells(), 0);
        g.validate_invariants().unwrap();
    }

    #[test]
    fn shrink_to_zero_vacates_span() {
        let mut g = VarWidthGraph::new();
        g.set_row_count_and_widths(&[3]);
        g.set_row_len(0, 0);
        assert_eq!(g.row_start(0), None);
        assert_eq!(g.row_len(0), 0);
        assert_eq!(g.vacant_cells(), 3);
        g.validate_invariants().unwrap();
    }

    #[test]
    fn reserved_rows_fill_without_moving() {
        let mut g = VarWidthGraph::new();
        g.init_reserved(3, 2).unwrap();
        assert_eq!(g.storage_len(), 6);
        for r in 0..3 {
            g.append(r, r as u32);
            g.append(r, 10 + r as u32);
        }
        assert_eq!(g.storage_len(), 6);
        assert_eq!(g.vacant_cells(), 0);
        for r in 0..3 {
            assert_eq!(g.row_start(r), Some(r * 2));
            assert_eq!(g.row(r).to_vec(), vec![r as u32, 10 + r as u32]);
        }
        g.validate_invariants().unwrap();
    }

    #[test]
    fn overflowing_a_reservation_never_steals_the_neighbor() {
        let mut g = VarWidthGraph::new();
        g.init_reserved(2, 2).unwrap();
        g.append(0, 1);
        g.append(0, 2);
        // Row 1's reservation starts at cell 2; this append must relocate
        // row 0 instead of consuming it.
        g.append(0, 3);
        assert_eq!(g.row_start(0), Some(4));
        assert_eq!(g.row(0).to_vec(), vec![1, 2, 3]);
        assert_eq!(g.row_start(1), Some(2));
        g.append(1, 7);
        assert_eq!(g.row_start(1), Some(2));
        assert_eq!(g.row(1).to_vec(), vec![7]);
        g.validate_invariants().unwrap();
    }

    #[test]
    fn init_reserved_requires_empty_graph() {
        let mut g = VarWidthGraph::with_row_count(1);
        assert_eq!(
            g.init_reserved(2, 2),
            Err(GraphError::PreconditionViolated {
                op: "init_reserved",
                reason: "graph must be empty",
            })
        );
    }

    #[test]
    fn merge_preserves_concatenation_order() {
        let a = VarWidthGraph::from_rows(vec![vec![1, 2], vec![], vec![5]]);
        let b = VarWidthGraph::from_rows(vec![vec![3], vec![4], vec![]]);
        let merged = VarWidthGraph::merge_rowwise(&[a, b]).unwrap();
        assert_eq!(merged.row(0).to_vec(), vec![1, 2, 3]);
        assert_eq!(merged.row(1).to_vec(), vec![4]);
        assert_eq!(merged.row(2).to_vec(), vec![5]);
    }

    #[test]
    fn merge_rejects_mismatched_row_counts() {
        let a = VarWidthGraph::with_row_count(2);
        let b = VarWidthGraph::with_row_count(3);
        assert_eq!(
            VarWidthGraph::merge_rowwise(&[a, b]),
            Err(GraphError::ShapeMismatch {
                op: "merge_rowwise",
                expected: 2,
                found: 3,
            })
        );
    }

    #[test]
    fn compact_packs_rows_in_order() {
        let mut g = VarWidthGraph::with_row_count(3);
        g.append(0, 1);
        g.append(1, 2);
        g.append(0, 3);
        g.append(2, 4);
        assert!(g.vacant_cells() > 0);
        let before = g.clone();
        g.compact();
        assert_eq!(g, before);
        assert_eq!(g.vacant_cells(), 0);
        assert_eq!(g.storage_len(), g.element_count());
        assert_eq!(g.row_start(0), Some(0));
        assert_eq!(g.row_start(1), Some(2));
        assert_eq!(g.row_start(2), Some(3));
        let len = g.storage_len();
        g.compact();
        assert_eq!(g.storage_len(), len);
        g.validate_invariants().unwrap();
    }

    #[test]
    fn removed_rows_leave_reclaimable_cells() {
        let mut g = VarWidthGraph::from_rows(vec![vec![1, 2], vec![3, 4, 5]]);
        g.set_row_count(1);
        assert_eq!(g.vacant_cells(), 3);
        g.compact();
        assert_eq!(g.storage_len(), 2);
        assert_eq!(g.row(0).to_vec(), vec![1, 2]);
    }

    #[test]
    fn reverse_addressing_counts_each_appearance() {
        let origin = vec![vec![0, 2], vec![1], vec![0, 0, 1]];
        let reverse = VarWidthGraph::reverse_addressing(&origin);
        assert_eq!(reverse.row_count(), 3);
        assert_eq!(reverse.row_len(0), 3);
        assert_eq!(reverse.row_len(1), 2);
        assert_eq!(reverse.row_len(2), 1);
        let mut row0 = reverse.row(0).to_vec();
        row0.sort_unstable();
        assert_eq!(row0, vec![0, 2, 2]);
        let mut row1 = reverse.row(1).to_vec();
        row1.sort_unstable();
        assert_eq!(row1, vec![1, 2]);
        assert_eq!(reverse.row(2).to_vec(), vec![0]);
    }

    #[test]
    fn reverse_addressing_of_empty_origin_is_empty() {
        let origin: Vec<Vec<u32>> = vec![vec![], vec![]];
        let reverse = VarWidthGraph::reverse_addressing(&origin);
        assert_eq!(reverse.row_count(), 0);
    }

    #[test]
    fn reverse_addressing_sized_keeps_trailing_rows() {
        let origin = vec![vec![1u32]];
        let reverse = VarWidthGraph::reverse_addressing_sized(4, &origin);
        assert_eq!(reverse.row_count(), 4);
        assert_eq!(reverse.row_len(1), 1);
        assert_eq!(reverse.row_len(3), 0);
    }

    #[test]
    fn equality_is_content_based() {
        let mut a = VarWidthGraph::with_row_count(2);
        a.append(0, 1);
        a.append(1, 2);
        a.append(0, 3);
        let b = VarWidthGraph::from_rows(vec![vec![1, 3], vec![2]]);
        assert_eq!(a, b);
        a.compact();
        assert_eq!(a, b);
    }

    #[test]
    fn try_get_reports_out_of_range() {
        let g = VarWidthGraph::with_row_count(1);
        assert_eq!(
            g.try_get(0, 0),
            Err(GraphError::IndexOutOfRange {
                op: "get",
                index: 0,
                len: 0,
            })
        );
        assert_eq!(
            g.try_get(3, 0),
            Err(GraphError::IndexOutOfRange {
                op: "get",
                index: 3,
                len: 1,
            })
        );
    }

    #[test]
    fn serde_round_trip_normalizes_holes() {
        let mut g = VarWidthGraph::with_row_count(2);
        g.append(0, 1);
        g.append(1, 2);
        g.append(0, 3);
        assert!(g.vacant_cells() > 0);
        let json = serde_json::to_string(&g).unwrap();
        let back: VarWidthGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, g);
        assert_eq!(back.vacant_cells(), 0);
    }
}
