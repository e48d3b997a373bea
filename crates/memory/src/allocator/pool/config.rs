//! Pool allocator configuration

use crate::types::fill;

/// Configuration for pool allocator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Enable statistics tracking
    pub track_stats: bool,

    /// Fill pattern byte painted over the buffer at construction
    pub uninit_pattern: Option<u8>,
    /// Fill pattern byte painted over a chunk when it is freed
    pub freed_pattern: Option<u8>,

    /// Reject frees of pointers outside the buffer or off a chunk boundary
    pub validate_frees: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::debug()
        } else {
            Self::production()
        }
    }
}

impl PoolConfig {
    /// Production configuration - optimized for performance
    #[must_use]
    pub fn production() -> Self {
        Self {
            track_stats: false,
            uninit_pattern: None,
            freed_pattern: None,
            validate_frees: false,
        }
    }

    /// Debug configuration - optimized for debugging
    #[must_use]
    pub fn debug() -> Self {
        Self {
            track_stats: true,
            uninit_pattern: Some(fill::UNINITIALIZED),
            freed_pattern: Some(fill::FREED),
            validate_frees: true,
        }
    }
}
