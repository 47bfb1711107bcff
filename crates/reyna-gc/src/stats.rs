//! Bookkeeping surfaced for diagnostics (not consulted by the collector
//! itself, which only looks at `Heap::should_collect`).

#[derive(Debug, Clone, Default)]
pub struct GcStats {
    pub live_objects: usize,
    pub collections: u64,
    pub bytes_freed_total: usize,
}
