//! Stack allocator statistics

/// Stack allocator statistics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackStats {
    /// Number of successful allocations
    pub total_allocations: u32,
    /// Number of rewinds, including clears
    pub total_rewinds: u32,
    /// Highest top reached, in bytes
    pub peak_bytes: usize,
    /// Current top, in bytes
    pub bytes_allocated: usize,
    /// Buffer capacity in bytes
    pub capacity: usize,
}
