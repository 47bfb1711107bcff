//! reyna-gc - the stop-the-world, precise mark-and-sweep collector
//! specified by §4.6: roots are marked, everything reachable from them is
//! marked recursively, and every unmarked object is reclaimed at sweep.
//!
//! Simplified down from a concurrent colored-pointer, NUMA-aware,
//! relocating collector to the single-threaded tracing collector the
//! language actually calls for - there is exactly one mutator, it never
//! runs concurrently with a collection, and nothing ever moves once
//! allocated, so none of that machinery earns its keep here.

mod config;
mod error;
mod heap;
mod stats;

pub use config::GcConfig;
pub use error::{GcError, Result};
pub use heap::{GcRef, Heap, Trace};
pub use stats::GcStats;
