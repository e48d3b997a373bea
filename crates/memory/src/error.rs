//! Error types for onyx-memory
//!
//! Uses thiserror for the error definitions. Every allocator operation that
//! can fail has a fallible `try_*` form returning [`MemoryResult`]; the plain
//! form treats the same error as fatal and goes through [`fatal`].

use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::{error, warn};

// ============================================================================
// Main Error Type
// ============================================================================

/// Memory management errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    // --- Allocation Errors ---
    #[error("Memory allocation failed: {size} bytes with {align} byte alignment")]
    AllocationFailed { size: usize, align: usize },

    #[error("Invalid alignment: {alignment} (must be a power of two)")]
    InvalidAlignment { alignment: usize },

    #[error("Size overflow during operation: {operation}")]
    SizeOverflow { operation: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Buffer too small: {required} bytes required, {provided} provided")]
    BufferTooSmall { required: usize, provided: usize },

    // --- Stack Errors ---
    #[error(
        "Stack allocator exhausted: requested {requested} bytes, {available} of {capacity} available"
    )]
    ArenaExhausted {
        requested: usize,
        available: usize,
        capacity: usize,
    },

    #[error("Invalid marker: {marker} is above the current top {top}")]
    InvalidMarker { marker: usize, top: usize },

    // --- Pool Errors ---
    #[error("Pool allocator exhausted (capacity: {capacity} chunks)")]
    PoolExhausted { capacity: usize },

    #[error("Pointer {address:#x} does not address a chunk of this pool")]
    ForeignPointer { address: usize },
}

impl MemoryError {
    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllocationFailed { .. } => "MEM:ALLOC:FAILED",
            Self::InvalidAlignment { .. } => "MEM:ALLOC:ALIGN",
            Self::SizeOverflow { .. } => "MEM:ALLOC:OVERFLOW",
            Self::InvalidConfig { .. } => "MEM:CONFIG:INVALID",
            Self::BufferTooSmall { .. } => "MEM:CONFIG:BUFFER",
            Self::ArenaExhausted { .. } => "MEM:ARENA:EXHAUSTED",
            Self::InvalidMarker { .. } => "MEM:ARENA:MARKER",
            Self::PoolExhausted { .. } => "MEM:POOL:EXHAUSTED",
            Self::ForeignPointer { .. } => "MEM:POOL:FOREIGN",
        }
    }

    /// Whether the error reports a full allocator rather than misuse
    #[must_use]
    pub fn is_exhaustion(&self) -> bool {
        matches!(
            self,
            Self::ArenaExhausted { .. } | Self::PoolExhausted { .. }
        )
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create allocation failed error
    pub fn allocation_failed(size: usize, align: usize) -> Self {
        #[cfg(feature = "logging")]
        error!(size, align, "memory allocation failed");

        Self::AllocationFailed { size, align }
    }

    /// Create invalid alignment error
    pub fn invalid_alignment(alignment: usize) -> Self {
        Self::InvalidAlignment { alignment }
    }

    /// Create size overflow error
    pub fn size_overflow(operation: &str) -> Self {
        Self::SizeOverflow {
            operation: operation.to_string(),
        }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: &str) -> Self {
        Self::InvalidConfig {
            reason: reason.to_string(),
        }
    }

    /// Create buffer too small error
    pub fn buffer_too_small(required: usize, provided: usize) -> Self {
        Self::BufferTooSmall { required, provided }
    }

    /// Create stack exhausted error
    pub fn arena_exhausted(requested: usize, available: usize, capacity: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(requested, available, capacity, "stack allocator exhausted");

        Self::ArenaExhausted {
            requested,
            available,
            capacity,
        }
    }

    /// Create invalid marker error
    pub fn invalid_marker(marker: usize, top: usize) -> Self {
        Self::InvalidMarker { marker, top }
    }

    /// Create pool exhausted error
    pub fn pool_exhausted(capacity: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(capacity, "pool allocator exhausted");

        Self::PoolExhausted { capacity }
    }

    /// Create foreign pointer error
    pub fn foreign_pointer(address: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(address, "free of a pointer outside the pool");

        Self::ForeignPointer { address }
    }
}

/// Reports a non-recoverable allocator error and panics with its message.
///
/// Exhaustion, rewinding forward and bad alignment are sizing or logic bugs
/// in the caller. The infallible allocator methods route their errors here.
#[cold]
#[inline(never)]
#[track_caller]
pub fn fatal(err: MemoryError) -> ! {
    #[cfg(feature = "logging")]
    error!(code = err.code(), "fatal allocator error: {err}");

    panic!("{err}")
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for memory operations
pub type MemoryResult<T> = core::result::Result<T, MemoryError>;

/// Generic result type alias
pub type Result<T> = MemoryResult<T>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_sizes() {
        let error = MemoryError::arena_exhausted(33, 32, 32);
        let message = error.to_string();
        assert!(message.contains("33"));
        assert!(message.contains("32"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(MemoryError::pool_exhausted(4).code(), "MEM:POOL:EXHAUSTED");
        assert_eq!(MemoryError::invalid_marker(10, 5).code(), "MEM:ARENA:MARKER");
        assert_eq!(MemoryError::invalid_alignment(3).code(), "MEM:ALLOC:ALIGN");
    }

    #[test]
    fn test_exhaustion_classification() {
        assert!(MemoryError::pool_exhausted(1).is_exhaustion());
        assert!(MemoryError::arena_exhausted(1, 0, 0).is_exhaustion());
        assert!(!MemoryError::foreign_pointer(0x10).is_exhaustion());
    }

    #[test]
    #[should_panic(expected = "Pool allocator exhausted")]
    fn test_fatal_panics_with_message() {
        fatal(MemoryError::pool_exhausted(4));
    }
}
