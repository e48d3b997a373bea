//! Pool allocator statistics

/// Pool allocator statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of successful allocations
    pub total_allocations: u32,
    /// Number of frees
    pub total_frees: u32,
    /// Highest number of chunks allocated at once
    pub peak_allocated: usize,
    /// Chunks currently allocated
    pub allocated: usize,
    /// Size of each chunk in bytes
    pub chunk_size: usize,
    /// Total number of chunks
    pub chunk_count: usize,
}
