//! Backing storage for the graph containers.

pub mod chunked_list;

pub use chunked_list::{BulkWriter, ChunkedList};
