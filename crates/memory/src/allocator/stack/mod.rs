//! Stack (arena) allocator
//!
//! A linear allocator over a fixed buffer. Allocations only move the top
//! forward; memory is released in bulk by rewinding to a saved marker.
//!
//! ## Modules
//! - `allocator` - Main `StackAllocator` implementation
//! - `config` - Configuration presets (production, debug)
//! - `frame` - RAII helper for automatic stack restoration
//! - `marker` - Position markers for scoped deallocation
//! - `stats` - Statistics snapshot type
pub mod allocator;
pub mod config;
pub mod frame;
pub mod marker;
pub mod stats;

pub use allocator::StackAllocator;
pub use config::StackConfig;
pub use frame::StackFrame;
pub use marker::StackMarker;
pub use stats::StackStats;
