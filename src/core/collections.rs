//! High-performance collection types used by the history arena and its traversals.
//!
//! Hash-based collections use `rustc_hash`, small fixed-bound buffers use
//! `smallvec`, and the arena itself is a `slotmap` selected by the
//! `dense-slotmap` feature.

mod aliases;
mod buffers;
mod secondary_maps;

pub use aliases::*;
pub use buffers::*;
pub use secondary_maps::*;
