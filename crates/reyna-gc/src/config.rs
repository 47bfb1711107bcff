//! Tuning knobs for the stop-the-world collector.

/// Heap growth policy (§4.6): the initial watermark is 1MB; after each
/// collection that fails to reclaim at least 25% of the live set, the
/// watermark doubles rather than growing by a fixed increment.
#[derive(Debug, Clone)]
pub struct GcConfig {
    /// Initial `next_gc` byte watermark.
    pub initial_threshold: usize,
    /// Multiplier applied to the watermark when a collection frees less
    /// than `shrink_trigger` of the live set.
    pub growth_factor: f64,
    /// Fraction of the live set a collection must reclaim to avoid
    /// growing the watermark.
    pub shrink_trigger: f64,
    /// Hard cap on heap size. `None` means unbounded.
    pub max_heap_bytes: Option<usize>,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            initial_threshold: 1024 * 1024,
            growth_factor: 2.0,
            shrink_trigger: 0.25,
            max_heap_bytes: None,
        }
    }
}
