//! Read-only abstraction over row tables.

/// Anything that can be read as rows of `u32` entity indices.
///
/// Both transpose algorithms and [`SubGraphView`](crate::graph::SubGraphView)
/// consume sources through this trait, so a `Vec<Vec<u32>>` staging structure
/// works interchangeably with the packed containers.
pub trait RowGraph {
    /// Number of rows.
    fn row_count(&self) -> usize;

    /// Number of entries in row `row`.
    fn row_len(&self, row: usize) -> usize;

    /// Entry at `(row, col)`.
    fn entry(&self, row: usize, col: usize) -> u32;

    /// Total number of entries across all rows.
    fn total_entries(&self) -> usize {
        (0..self.row_count()).map(|r| self.row_len(r)).sum()
    }
}

impl RowGraph for [Vec<u32>] {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn row_len(&self, row: usize) -> usize {
        self[row].len()
    }

    fn entry(&self, row: usize, col: usize) -> u32 {
        self[row][col]
    }
}

impl RowGraph for Vec<Vec<u32>> {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn row_len(&self, row: usize) -> usize {
        self[row].len()
    }

    fn entry(&self, row: usize, col: usize) -> u32 {
        self[row][col]
    }
}
