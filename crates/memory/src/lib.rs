//! # onyx-memory
//!
//! Memory core of the Onyx engine: the allocation primitives that engine
//! subsystems build on.
//!
//! - [`aligned`]: raw aligned allocation with a one-byte recovery header
//! - [`StackAllocator`]: stack (arena) allocator with rewind markers
//! - [`PoolAllocator`]: fixed-size chunk pool with an intrusive free list
//!
//! ## Quick Start
//!
//! ```rust
//! use onyx_memory::prelude::*;
//!
//! # fn main() -> MemoryResult<()> {
//! let stack = StackAllocator::new(4 * KB)?;
//! let marker = stack.top();
//! let scratch = stack.alloc(256, 16);
//! assert_eq!(scratch.as_ptr() as usize % 16, 0);
//! stack.free_to_marker(marker);
//!
//! let pool = PoolAllocator::new(64, 32)?;
//! let chunk = pool.alloc();
//! unsafe { pool.free(chunk) };
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Every fallible operation comes in two forms. `try_*` returns a
//! [`MemoryResult`]; the plain form treats the error as a programming bug,
//! logs it and panics. Out-of-memory from the system allocator aborts via
//! [`std::alloc::handle_alloc_error`].
//!
//! ## Features
//!
//! - `logging` (default): structured diagnostics through `tracing`
//!
//! ## Threading
//!
//! The allocators are `Send` but not `Sync`. Give each thread its own.

#![allow(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::redundant_closure)]

// Error types
pub mod error;

pub mod aligned;
pub mod allocator;
pub mod traits;
pub mod types;
pub mod utils;

pub use crate::aligned::{AlignedBlock, alloc_aligned, free_aligned};
pub use crate::allocator::{
    PoolAllocator, PoolBox, PoolConfig, PoolStats, StackAllocator, StackConfig, StackFrame,
    StackMarker, StackStats,
};
pub use crate::error::{MemoryError, MemoryResult, Result};
pub use crate::types::DEFAULT_ALIGNMENT;
pub use crate::utils::align_address;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Public API exports
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    // Error types
    pub use crate::error::{MemoryError, MemoryResult, Result};

    // Allocators
    pub use crate::aligned::{AlignedBlock, alloc_aligned, free_aligned};
    pub use crate::allocator::{
        PoolAllocator, PoolBox, PoolConfig, PoolStats, StackAllocator, StackConfig, StackFrame,
        StackMarker, StackStats,
    };

    // Traits and helpers
    pub use crate::traits::MemoryUsage;
    pub use crate::types::size::{GB, KB, MB};
    pub use crate::types::{DEFAULT_ALIGNMENT, fill};
    pub use crate::utils::align_address;
}
