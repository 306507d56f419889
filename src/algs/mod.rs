//! Re-export public algorithms.

pub mod reverse;

pub use reverse::{reverse_addressing_par, reverse_addressing_par_mapped};
