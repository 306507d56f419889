//! Row-oriented graph containers.
//!
//! A "graph" here is a table of rows holding `u32` entity indices: row `r`
//! lists the indices connected to entity `r`. [`FixedWidthGraph`] fixes the
//! row width at compile time; [`VarWidthGraph`] lets every row have its own
//! width and packs the rows into one chunked buffer with best-effort in-place
//! growth.

pub mod fixed;
pub(crate) mod slot;
pub mod traits;
pub mod var;
pub mod view;

pub use fixed::FixedWidthGraph;
pub use traits::RowGraph;
pub use var::VarWidthGraph;
pub use view::{RowIter, RowView, RowViewMut, SubGraphView};
