//! Common types and constants for memory management

/// Alignment used when a caller does not ask for one
///
/// Every owned allocator buffer starts on this boundary, and stack
/// allocations made without an explicit alignment use it.
pub const DEFAULT_ALIGNMENT: usize = 128;

/// Largest alignment the aligned allocator can record in its shift byte
pub const MAX_SHIFT_ALIGNMENT: usize = 256;

/// Size of the free-list link stored at the start of every free pool chunk
pub const LINK_SIZE: usize = core::mem::size_of::<*mut u8>();

/// Byte patterns painted over allocator memory when debugging
///
/// Each pattern marks a different state so that a stale read can be told
/// apart from a read of memory that was never handed out.
pub mod fill {
    /// Memory that has never been handed out
    pub const UNINITIALIZED: u8 = 0xDE;

    /// Alignment padding and reserved slack inside a live allocation
    pub const ALLOCATED: u8 = 0xFF;

    /// Memory that was handed out and then released
    pub const FREED: u8 = 0xCC;
}

/// Memory size constants
pub mod size {
    /// 1 Kilobyte
    pub const KB: usize = 1024;

    /// 1 Megabyte
    pub const MB: usize = 1024 * KB;

    /// 1 Gigabyte
    pub const GB: usize = 1024 * MB;
}
