//! Engine allocators
//!
//! Both allocators hand out raw memory from a single contiguous buffer that
//! is either owned (released through [`crate::aligned`] on drop) or
//! borrowed from the caller for `'buf`.
//!
//! - [`StackAllocator`] - linear allocation, released in bulk by rewinding
//!   to a [`StackMarker`]
//! - [`PoolAllocator`] - fixed-size chunks recycled through an intrusive
//!   free list

pub(crate) mod backing;
pub mod pool;
pub mod stack;

pub use pool::{PoolAllocator, PoolBox, PoolConfig, PoolStats};
pub use stack::{StackAllocator, StackConfig, StackFrame, StackMarker, StackStats};
