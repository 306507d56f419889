//! Cells and row descriptors for [`VarWidthGraph`](crate::graph::VarWidthGraph).

use static_assertions::{const_assert, const_assert_eq};

/// One cell of the packed row buffer.
///
/// A cell is either payload or one of two vacancy states: `Free` marks a
/// reclaimable cell, `FreeStart` marks the first cell of a reserved row
/// region. `FreeStart` also fences the preceding row: in-place growth never
/// consumes a `FreeStart` that belongs to another row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Reclaimable cell, owned by no row.
    Free,
    /// First cell of a reserved, still-unwritten row region.
    FreeStart,
    /// Payload cell.
    Occupied(u32),
}

impl Default for Slot {
    /// A zeroed payload cell; what freshly grown cells hold.
    fn default() -> Self {
        Slot::Occupied(0)
    }
}

impl Slot {
    #[inline]
    pub(crate) fn is_free(self) -> bool {
        matches!(self, Slot::Free | Slot::FreeStart)
    }

    #[inline]
    pub(crate) fn value(self) -> Option<u32> {
        match self {
            Slot::Occupied(v) => Some(v),
            _ => None,
        }
    }
}

// The cell type sits in every buffer position; keep it word-sized.
const_assert!(size_of::<Slot>() <= 8);
const_assert_eq!(align_of::<Slot>(), align_of::<u32>());

/// Placement of one row inside the packed buffer.
///
/// `start == None` is a vacant row; vacant rows always have `len == 0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct RowSpan {
    pub(crate) start: Option<usize>,
    pub(crate) len: usize,
}

impl RowSpan {
    pub(crate) const VACANT: RowSpan = RowSpan { start: None, len: 0 };
}
