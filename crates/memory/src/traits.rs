//! Traits shared by the allocators

/// Byte-level usage report for an allocator
pub trait MemoryUsage {
    /// Bytes currently handed out, including padding and slack
    fn used_memory(&self) -> usize;

    /// Bytes that can still be handed out
    fn available_memory(&self) -> usize;

    /// Total bytes managed
    fn total_memory(&self) -> usize {
        self.used_memory() + self.available_memory()
    }

    /// Fraction of the managed bytes in use, in `0.0..=1.0`
    fn usage_ratio(&self) -> f64 {
        let total = self.total_memory();
        if total == 0 {
            0.0
        } else {
            self.used_memory() as f64 / total as f64
        }
    }
}
