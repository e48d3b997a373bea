//! Utility functions and helpers for onyx-memory
//!
//! This module provides common utilities used throughout the crate:
//! - Memory alignment helpers
//! - Byte unit helpers
//! - Checked size arithmetic

use crate::error::{MemoryError, MemoryResult};
use crate::types::size::{GB, KB, MB};

/// Rounds an address up to the next multiple of `alignment`
///
/// This is the pure address computation shared by every allocator; it never
/// allocates. `alignment` must be a power of two, anything else is a
/// programmer error and panics.
///
/// # Examples
/// ```
/// use onyx_memory::utils::align_address;
///
/// assert_eq!(align_address(0x1001, 16), 0x1010);
/// assert_eq!(align_address(0x1010, 16), 0x1010);
/// ```
#[inline]
#[track_caller]
pub const fn align_address(address: usize, alignment: usize) -> usize {
    assert!(
        is_power_of_two(alignment),
        "alignment must be a power of two"
    );
    let mask = alignment - 1;
    (address + mask) & !mask
}

/// Aligns a value up to the nearest multiple of alignment
///
/// Unchecked counterpart of [`align_address`] for callers that have already
/// validated the alignment.
///
/// # Examples
/// ```
/// use onyx_memory::utils::align_up;
///
/// assert_eq!(align_up(7, 8), 8);
/// assert_eq!(align_up(8, 8), 8);
/// assert_eq!(align_up(9, 8), 16);
/// ```
#[inline(always)]
pub const fn align_up(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// Checks if a value is aligned to the given alignment
///
/// # Examples
/// ```
/// use onyx_memory::utils::is_aligned;
///
/// assert!(is_aligned(16, 8));
/// assert!(!is_aligned(17, 8));
/// ```
#[inline(always)]
pub const fn is_aligned(value: usize, alignment: usize) -> bool {
    debug_assert!(alignment.is_power_of_two());
    value & (alignment - 1) == 0
}

/// Calculates padding needed to align a value
#[inline(always)]
pub const fn padding_needed(value: usize, alignment: usize) -> usize {
    align_up(value, alignment) - value
}

/// Returns true for 1, 2, 4, 8, ...; zero is not a power of two
#[inline(always)]
pub const fn is_power_of_two(value: usize) -> bool {
    value != 0 && value & (value - 1) == 0
}

/// Check if a pointer is properly aligned
#[inline(always)]
pub fn is_aligned_ptr<T>(ptr: *const T, alignment: usize) -> bool {
    is_aligned(ptr as usize, alignment)
}

/// Validates an alignment argument for the fallible allocator paths
#[inline]
pub(crate) fn check_alignment(alignment: usize) -> MemoryResult<()> {
    if is_power_of_two(alignment) {
        Ok(())
    } else {
        Err(MemoryError::invalid_alignment(alignment))
    }
}

/// `a * b`, or a [`MemoryError::SizeOverflow`] naming `operation`
#[inline]
pub(crate) fn checked_mul(a: usize, b: usize, operation: &str) -> MemoryResult<usize> {
    a.checked_mul(b)
        .ok_or_else(|| MemoryError::size_overflow(operation))
}

// ============================================================================
// Byte units
// ============================================================================

/// `n` bytes
#[inline]
pub const fn bytes(n: usize) -> usize {
    n
}

/// `n` kilobytes (1024 bytes each)
#[inline]
pub const fn kilobytes(n: usize) -> usize {
    n * KB
}

/// `n` megabytes
#[inline]
pub const fn megabytes(n: usize) -> usize {
    n * MB
}

/// `n` gigabytes
#[inline]
pub const fn gigabytes(n: usize) -> usize {
    n * GB
}
