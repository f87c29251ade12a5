//! Container primitives backing track lists and the loader.

pub mod concurrent;
pub mod ordered_unique_map;

pub use concurrent::{AtomicCounter, ConcurrentMap};
pub use ordered_unique_map::{IndexMove, IndexSet, OrderedUniqueMap};
