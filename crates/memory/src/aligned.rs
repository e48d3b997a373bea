//! Aligned raw allocation
//!
//! # Safety
//!
//! Blocks come from `libc::malloc` with `alignment` bytes of headroom. The
//! returned pointer is moved forward to the next multiple of `alignment`,
//! always by at least one byte, and the distance travelled (the *shift*) is
//! written to the byte just before it:
//!
//! ```text
//! base                      aligned
//!  |<-------- shift -------->|
//!  [ padding ........ |shift][ bytes ............ ]
//! ```
//!
//! `free_aligned` reads the shift back, steps to `base` and hands it to
//! `libc::free`. The shift is stored modulo 256, so a stored `0` means 256
//! and alignments above 256 are rejected.
//!
//! Out-of-memory is not recoverable here: it goes to
//! [`std::alloc::handle_alloc_error`], which aborts.

use core::alloc::Layout;
use core::ptr::{self, NonNull};

use crate::error::{MemoryError, MemoryResult, fatal};
use crate::types::{MAX_SHIFT_ALIGNMENT, fill};
use crate::utils::is_power_of_two;

#[cfg(feature = "logging")]
use tracing::trace;

/// Allocates `bytes` bytes aligned to `alignment`
///
/// Release the block with [`free_aligned`].
///
/// # Panics
///
/// Panics if `alignment` is not a power of two, is larger than 256, or if
/// `bytes + alignment` overflows. Aborts the process when the system is out
/// of memory.
#[track_caller]
pub fn alloc_aligned(bytes: usize, alignment: usize) -> NonNull<u8> {
    assert!(
        is_power_of_two(alignment),
        "alignment {alignment} is not a power of two"
    );
    assert!(
        alignment <= MAX_SHIFT_ALIGNMENT,
        "alignment {alignment} does not fit in a shift byte (max {MAX_SHIFT_ALIGNMENT})"
    );

    let total = bytes
        .checked_add(alignment)
        .unwrap_or_else(|| fatal(MemoryError::size_overflow("aligned allocation size")));

    // SAFETY: malloc has no preconditions; a null return is handled below.
    let raw = unsafe { libc::malloc(total) }.cast::<u8>();
    if raw.is_null() {
        match Layout::from_size_align(total, alignment) {
            Ok(layout) => std::alloc::handle_alloc_error(layout),
            Err(_) => fatal(MemoryError::allocation_failed(total, alignment)),
        }
    }

    // SAFETY: raw is non-null and holds `bytes + alignment` bytes.
    let aligned = unsafe { write_header(raw, alignment) };

    #[cfg(feature = "logging")]
    trace!(bytes, alignment, raw = ?raw, aligned = ?aligned, "aligned block allocated");

    aligned
}

/// Moves `raw` forward to the next `alignment` boundary and records the
/// shift in the byte before it
///
/// The shift is in `[1, alignment]`; a shift of 256 is stored as `0`.
///
/// # Safety
///
/// `raw` must be non-null and valid for writes of `alignment` bytes, and
/// `alignment` must be a power of two no larger than 256.
unsafe fn write_header(raw: *mut u8, alignment: usize) -> NonNull<u8> {
    // A zero misalignment still moves a full step so the shift byte has room.
    let misalignment = raw as usize & (alignment - 1);
    let shift = alignment - misalignment;
    debug_assert!((1..=MAX_SHIFT_ALIGNMENT).contains(&shift));

    // SAFETY: Writing the recovery metadata inside the caller's block.
    // - shift <= alignment, so every byte touched is inside the block
    // - shift >= 1, so aligned - 1 is still inside the block
    // - The padding [raw, aligned - 1) is unused
    unsafe {
        let aligned = raw.add(shift);
        if cfg!(debug_assertions) {
            ptr::write_bytes(raw, fill::ALLOCATED, shift - 1);
        }
        aligned.sub(1).write(shift as u8);
        NonNull::new_unchecked(aligned)
    }
}

/// Start of the block a header was written into
///
/// # Safety
///
/// `ptr` must have been returned by `write_header`, with its shift byte
/// intact.
unsafe fn header_base(ptr: NonNull<u8>) -> *mut u8 {
    // SAFETY: Caller contract; ptr - shift is the block start.
    unsafe { ptr.as_ptr().sub(stored_shift(ptr)) }
}

/// Releases a block returned by [`alloc_aligned`]
///
/// # Safety
///
/// `ptr` must have come from [`alloc_aligned`] and must not have been freed
/// already. The byte before `ptr` must be intact.
pub unsafe fn free_aligned(ptr: NonNull<u8>) {
    // SAFETY: Caller guarantees ptr came from alloc_aligned, so the shift
    // byte at ptr - 1 is valid and ptr - shift is the malloc'd base.
    unsafe {
        let base = header_base(ptr);

        #[cfg(feature = "logging")]
        trace!(base = ?base, "aligned block released");

        libc::free(base.cast());
    }
}

/// Reads the shift recorded in front of an aligned block
///
/// # Safety
///
/// `ptr` must be a live pointer returned by [`alloc_aligned`].
pub unsafe fn stored_shift(ptr: NonNull<u8>) -> usize {
    // SAFETY: alloc_aligned always leaves at least one byte before ptr.
    let stored = unsafe { ptr.as_ptr().sub(1).read() };
    if stored == 0 {
        MAX_SHIFT_ALIGNMENT
    } else {
        stored as usize
    }
}

/// An owned block from [`alloc_aligned`], released on drop
///
/// This is the storage behind allocators constructed without an external
/// buffer.
pub struct AlignedBlock {
    ptr: NonNull<u8>,
    len: usize,
    alignment: usize,
}

impl AlignedBlock {
    /// Allocates a block, validating the alignment first
    ///
    /// Unlike [`alloc_aligned`], a bad alignment is reported as an error.
    pub fn try_new(len: usize, alignment: usize) -> MemoryResult<Self> {
        if !is_power_of_two(alignment) || alignment > MAX_SHIFT_ALIGNMENT {
            return Err(MemoryError::invalid_alignment(alignment));
        }
        if len.checked_add(alignment).is_none() {
            return Err(MemoryError::size_overflow("aligned allocation size"));
        }

        Ok(Self {
            ptr: alloc_aligned(len, alignment),
            len,
            alignment,
        })
    }

    /// Start of the usable region
    #[inline]
    pub fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Usable length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the usable region is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Alignment of [`AlignedBlock::as_ptr`]
    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment
    }
}

impl Drop for AlignedBlock {
    fn drop(&mut self) {
        // SAFETY: self.ptr came from alloc_aligned in try_new and is only
        // released here, exactly once.
        unsafe { free_aligned(self.ptr) };
    }
}

impl core::fmt::Debug for AlignedBlock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AlignedBlock")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("alignment", &self.alignment)
            .finish()
    }
}

// SAFETY: AlignedBlock uniquely owns its malloc'd block, like Box<[u8]>.
unsafe impl Send for AlignedBlock {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_aligned_is_aligned() {
        for alignment in [1, 2, 8, 16, 64, 128, 256] {
            let ptr = alloc_aligned(100, alignment);
            assert_eq!(ptr.as_ptr() as usize % alignment, 0);
            unsafe { free_aligned(ptr) };
        }
    }

    #[test]
    fn test_shift_byte_range() {
        let ptr = alloc_aligned(100, 64);
        let shift = unsafe { stored_shift(ptr) };
        assert!((1..=64).contains(&shift));
        unsafe { free_aligned(ptr) };
    }

    #[test]
    fn test_alignment_one_shifts_by_one() {
        let ptr = alloc_aligned(10, 1);
        assert_eq!(unsafe { stored_shift(ptr) }, 1);
        unsafe { free_aligned(ptr) };
    }

    #[test]
    fn test_block_is_writable() {
        let ptr = alloc_aligned(256, 32);
        unsafe {
            ptr::write_bytes(ptr.as_ptr(), 0xAB, 256);
            assert_eq!(*ptr.as_ptr().add(255), 0xAB);
            assert!((1..=32).contains(&stored_shift(ptr)));
            free_aligned(ptr);
        }
    }

    #[test]
    #[should_panic(expected = "not a power of two")]
    fn test_rejects_non_power_of_two() {
        let _ = alloc_aligned(16, 48);
    }

    #[test]
    #[should_panic(expected = "shift byte")]
    fn test_rejects_alignment_above_256() {
        let _ = alloc_aligned(16, 512);
    }

    #[repr(C, align(256))]
    struct Page([u8; 512]);

    #[test]
    fn test_stored_zero_means_256() {
        let mut page = Page([0xAB; 512]);
        unsafe {
            let ptr = NonNull::new_unchecked(page.0.as_mut_ptr().add(256));
            ptr.as_ptr().sub(1).write(0);
            assert_eq!(stored_shift(ptr), 256);
        }
    }

    #[test]
    fn test_header_round_trip_with_full_shift() {
        let mut page = Page([0; 512]);
        let raw = page.0.as_mut_ptr();
        unsafe {
            let aligned = write_header(raw, 256);
            assert_eq!(aligned.as_ptr(), raw.add(256));
            assert_eq!(*aligned.as_ptr().sub(1), 0);
            assert_eq!(stored_shift(aligned), 256);
            assert_eq!(header_base(aligned), raw);
        }
    }

    #[test]
    fn test_header_round_trip_every_offset() {
        let mut page = Page([0; 512]);
        for offset in 0..64 {
            let raw = unsafe { page.0.as_mut_ptr().add(offset) };
            unsafe {
                let aligned = write_header(raw, 64);
                assert_eq!(aligned.as_ptr() as usize % 64, 0);
                assert_eq!(stored_shift(aligned), 64 - offset % 64);
                assert_eq!(header_base(aligned), raw);
            }
        }
    }

    #[test]
    fn test_aligned_block() {
        let block = AlignedBlock::try_new(1024, 128).unwrap();
        assert_eq!(block.len(), 1024);
        assert_eq!(block.alignment(), 128);
        assert_eq!(block.as_ptr().as_ptr() as usize % 128, 0);
    }

    #[test]
    fn test_aligned_block_validates() {
        assert!(matches!(
            AlignedBlock::try_new(64, 3),
            Err(MemoryError::InvalidAlignment { alignment: 3 })
        ));
        assert!(AlignedBlock::try_new(64, 1024).is_err());
        assert!(AlignedBlock::try_new(usize::MAX, 64).is_err());
    }
}
