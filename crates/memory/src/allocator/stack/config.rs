//! Stack allocator configuration

use crate::types::fill;

/// Configuration for stack allocator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    /// Enable statistics tracking
    pub track_stats: bool,

    /// Painted over the whole buffer at construction
    pub uninit_pattern: Option<u8>,
    /// Painted over alignment padding and unused reservation slack
    pub padding_pattern: Option<u8>,
    /// Painted over memory released by a rewind
    pub freed_pattern: Option<u8>,

    /// Zero the usable bytes of every allocation
    pub zero_on_alloc: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::debug()
        } else {
            Self::production()
        }
    }
}

impl StackConfig {
    /// Production configuration - no painting, no statistics
    #[must_use]
    pub fn production() -> Self {
        Self {
            track_stats: false,
            uninit_pattern: None,
            padding_pattern: None,
            freed_pattern: None,
            zero_on_alloc: false,
        }
    }

    /// Debug configuration - every state transition leaves a fill pattern
    #[must_use]
    pub fn debug() -> Self {
        Self {
            track_stats: true,
            uninit_pattern: Some(fill::UNINITIALIZED),
            padding_pattern: Some(fill::ALLOCATED),
            freed_pattern: Some(fill::FREED),
            zero_on_alloc: true,
        }
    }
}
