//! Main stack allocator implementation
//!
//! # Safety
//!
//! This module implements a single-threaded linear allocator:
//! - The buffer is either owned (`AlignedBlock`) or borrowed for `'buf`
//! - `top` is a byte offset in `[0, capacity]`; `Cell` keeps the type `!Sync`
//! - Every allocation reserves `size + alignment - 1` bytes so the aligned
//!   start always fits, whatever `top` was
//! - Rewinding only moves `top` down; the reserved slack is never reclaimed
//!   until a rewind passes it
//!
//! ## Invariants
//!
//! - `0 <= top <= capacity`
//! - Every returned pointer lies in `[base + previous_top, base + top)`
//! - `free_to_marker` rejects markers above the current top

use core::cell::Cell;
use core::mem;
use core::ptr::{self, NonNull};

use super::{StackConfig, StackFrame, StackMarker, StackStats};
use crate::allocator::backing::Backing;
use crate::error::{MemoryError, MemoryResult, fatal};
use crate::traits::MemoryUsage;
use crate::types::DEFAULT_ALIGNMENT;
use crate::utils::{align_up, check_alignment, checked_mul};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Linear allocator with marker-based rewind
///
/// # Memory Layout
/// ```text
/// [base]--[pad|alloc1|slack]--[pad|alloc2|slack]--[top]----[free]----[end]
///          <---------------- allocated -------------->   <-- available -->
/// ```
///
/// Allocation bumps `top`; nothing is freed individually. Save a marker with
/// [`top`](Self::top) and call [`free_to_marker`](Self::free_to_marker) to
/// release everything allocated since, or [`clear`](Self::clear) to release
/// everything.
///
/// The infallible methods treat exhaustion and misuse as fatal and panic;
/// the `try_` methods report the same conditions as [`MemoryError`].
pub struct StackAllocator<'buf> {
    /// Owned or borrowed buffer
    buffer: Backing<'buf>,

    /// Capacity for convenience
    capacity: usize,

    /// Alignment used by `alloc_default`
    alignment: usize,

    /// Byte offset of the first free byte
    top: Cell<usize>,

    /// Configuration
    config: StackConfig,

    /// Statistics (only tracked if enabled)
    total_allocs: Cell<u32>,
    total_rewinds: Cell<u32>,
    peak_usage: Cell<usize>,
}

impl StackAllocator<'static> {
    /// Creates a stack allocator owning `capacity` bytes, aligned to
    /// [`DEFAULT_ALIGNMENT`]
    pub fn new(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, DEFAULT_ALIGNMENT, StackConfig::default())
    }

    /// Creates an owning stack allocator with a custom default alignment
    pub fn with_alignment(capacity: usize, alignment: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, alignment, StackConfig::default())
    }

    /// Creates an owning stack allocator with custom configuration
    ///
    /// The buffer comes from the aligned allocator and starts on an
    /// `alignment` boundary, so `alignment` must be a power of two no larger
    /// than 256.
    pub fn with_config(
        capacity: usize,
        alignment: usize,
        config: StackConfig,
    ) -> MemoryResult<Self> {
        validate(capacity, alignment)?;
        let buffer = Backing::owned(capacity, alignment)?;
        Ok(Self::from_backing(buffer, alignment, config))
    }

    /// Creates a production-optimized stack allocator
    pub fn production(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, DEFAULT_ALIGNMENT, StackConfig::production())
    }

    /// Creates a debug-optimized stack allocator
    pub fn debug(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, DEFAULT_ALIGNMENT, StackConfig::debug())
    }
}

impl<'buf> StackAllocator<'buf> {
    /// Creates a stack allocator over a caller-owned buffer
    ///
    /// The buffer is borrowed for the allocator's lifetime and is never
    /// released by it.
    pub fn from_slice(buffer: &'buf mut [u8], alignment: usize) -> MemoryResult<Self> {
        Self::from_slice_with_config(buffer, alignment, StackConfig::default())
    }

    /// Creates a stack allocator over a caller-owned buffer with custom
    /// configuration
    pub fn from_slice_with_config(
        buffer: &'buf mut [u8],
        alignment: usize,
        config: StackConfig,
    ) -> MemoryResult<Self> {
        validate(buffer.len(), alignment)?;
        Ok(Self::from_backing(
            Backing::from_slice(buffer),
            alignment,
            config,
        ))
    }

    /// Creates a stack allocator over raw caller memory
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `capacity` bytes for
    /// `'buf`, and nothing else may access that memory while the allocator
    /// lives. The allocator never frees it.
    pub unsafe fn from_raw_parts(
        ptr: NonNull<u8>,
        capacity: usize,
        alignment: usize,
        config: StackConfig,
    ) -> MemoryResult<Self> {
        validate(capacity, alignment)?;
        // SAFETY: Forwarded caller contract.
        let buffer = unsafe { Backing::from_raw_parts(ptr, capacity) };
        Ok(Self::from_backing(buffer, alignment, config))
    }

    fn from_backing(buffer: Backing<'buf>, alignment: usize, config: StackConfig) -> Self {
        let capacity = buffer.len();

        // Fill with uninit pattern if debugging
        if let Some(pattern) = config.uninit_pattern {
            // SAFETY: The whole buffer is ours (owned, or exclusively borrowed).
            unsafe { ptr::write_bytes(buffer.base().as_ptr(), pattern, capacity) };
        }

        #[cfg(feature = "logging")]
        debug!(
            capacity,
            alignment,
            owned = buffer.is_owned(),
            "stack allocator created"
        );

        Self {
            buffer,
            capacity,
            alignment,
            top: Cell::new(0),
            config,
            total_allocs: Cell::new(0),
            total_rewinds: Cell::new(0),
            peak_usage: Cell::new(0),
        }
    }

    /// Returns the total capacity of the allocator
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of bytes between the buffer start and the top
    ///
    /// This includes alignment padding and reservation slack.
    #[inline]
    pub fn bytes_allocated(&self) -> usize {
        self.top.get()
    }

    /// Returns the amount of memory available for allocation
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.top.get()
    }

    /// Checks if nothing is allocated
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.top.get() == 0
    }

    /// Default alignment used by [`alloc_default`](Self::alloc_default)
    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Whether the buffer is released when the allocator is dropped
    #[inline]
    pub fn is_owned(&self) -> bool {
        self.buffer.is_owned()
    }

    /// The active configuration
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Checks if a pointer lies in the currently allocated region
    pub fn contains(&self, ptr: *const u8) -> bool {
        let start = self.buffer.base().as_ptr() as usize;
        let addr = ptr as usize;
        addr >= start && addr < start + self.top.get()
    }

    /// Creates a marker at the current stack position
    #[inline]
    pub fn top(&self) -> StackMarker {
        StackMarker {
            offset: self.top.get(),
        }
    }

    /// Opens a [`StackFrame`] that rewinds to the current top when dropped
    pub fn frame(&self) -> StackFrame<'_, 'buf> {
        StackFrame::new(self)
    }

    /// Allocates `size` bytes aligned to `alignment`
    ///
    /// Reserves `size + alignment - 1` bytes whatever the actual padding
    /// turns out to be.
    ///
    /// # Panics
    ///
    /// Panics if `alignment` is not a power of two or if the reservation
    /// does not fit in the remaining capacity.
    #[track_caller]
    pub fn alloc(&self, size: usize, alignment: usize) -> NonNull<u8> {
        self.try_alloc(size, alignment)
            .unwrap_or_else(|err| fatal(err))
    }

    /// Allocates `size` bytes aligned to the allocator's default alignment
    #[track_caller]
    pub fn alloc_default(&self, size: usize) -> NonNull<u8> {
        self.alloc(size, self.alignment)
    }

    /// Fallible form of [`alloc`](Self::alloc)
    pub fn try_alloc(&self, size: usize, alignment: usize) -> MemoryResult<NonNull<u8>> {
        check_alignment(alignment)?;

        let top = self.top.get();
        let reserved = size
            .checked_add(alignment - 1)
            .ok_or_else(|| MemoryError::size_overflow("stack reservation"))?;
        let available = self.capacity - top;
        if reserved > available {
            return Err(MemoryError::arena_exhausted(
                reserved,
                available,
                self.capacity,
            ));
        }

        let base = self.buffer.base().as_ptr();
        let candidate = base as usize + top;
        let padding = align_up(candidate, alignment) - candidate;
        let new_top = top + reserved;

        // SAFETY: Carving [top, new_top) out of the buffer.
        // - new_top <= capacity (checked above), so every offset used here is
        //   inside the buffer
        // - padding <= alignment - 1, so aligned + size <= base + new_top
        // - The range was free, nothing else references it
        let aligned = unsafe {
            let start = base.add(top);
            let aligned = start.add(padding);

            if let Some(pattern) = self.config.padding_pattern {
                ptr::write_bytes(start, pattern, padding);
                let tail = aligned.add(size);
                ptr::write_bytes(tail, pattern, base.add(new_top).offset_from(tail) as usize);
            }
            if self.config.zero_on_alloc {
                ptr::write_bytes(aligned, 0, size);
            }

            aligned
        };

        self.top.set(new_top);

        if self.config.track_stats {
            self.total_allocs.set(self.total_allocs.get().saturating_add(1));
            self.peak_usage.set(self.peak_usage.get().max(new_top));
        }

        // SAFETY: aligned is derived from the non-null buffer base.
        Ok(unsafe { NonNull::new_unchecked(aligned) })
    }

    /// Reserves room for one `T` and moves `value` into it
    ///
    /// See [`alloc_slice`](Self::alloc_slice) for the lifetime contract.
    #[track_caller]
    pub fn alloc_value<T: Copy>(&self, value: T) -> NonNull<T> {
        self.alloc_slice(1, value).cast::<T>()
    }

    /// Reserves room for `count` values of `T`, each initialised to `value`
    ///
    /// The stack keeps no record of what was placed where, so a rewind never
    /// runs destructors. The `Copy` bound keeps types with destructors out.
    /// The returned pointer is valid until the stack is rewound below it or
    /// dropped; dereferencing it after that is undefined behavior.
    #[track_caller]
    pub fn alloc_slice<T: Copy>(&self, count: usize, value: T) -> NonNull<[T]> {
        self.try_alloc_slice(count, value)
            .unwrap_or_else(|err| fatal(err))
    }

    /// Fallible form of [`alloc_slice`](Self::alloc_slice)
    pub fn try_alloc_slice<T: Copy>(&self, count: usize, value: T) -> MemoryResult<NonNull<[T]>> {
        let size = checked_mul(mem::size_of::<T>(), count, "typed stack allocation")?;
        let ptr = self.try_alloc(size, mem::align_of::<T>())?.cast::<T>();

        for i in 0..count {
            // SAFETY: ptr is aligned for T and valid for count * size_of::<T>()
            // bytes, freshly reserved above.
            unsafe { ptr.as_ptr().add(i).write(value) };
        }

        Ok(NonNull::slice_from_raw_parts(ptr, count))
    }

    /// Releases everything allocated after `marker`
    ///
    /// # Panics
    ///
    /// Panics if `marker` is above the current top.
    #[track_caller]
    pub fn free_to_marker(&self, marker: StackMarker) {
        self.try_free_to_marker(marker)
            .unwrap_or_else(|err| fatal(err));
    }

    /// Fallible form of [`free_to_marker`](Self::free_to_marker)
    pub fn try_free_to_marker(&self, marker: StackMarker) -> MemoryResult<()> {
        let top = self.top.get();
        if marker.offset > top {
            return Err(MemoryError::invalid_marker(marker.offset, top));
        }

        // Fill with freed pattern if debugging
        if let Some(pattern) = self.config.freed_pattern {
            // SAFETY: [marker, top) is inside the buffer since top <= capacity.
            unsafe {
                ptr::write_bytes(
                    self.buffer.base().as_ptr().add(marker.offset),
                    pattern,
                    top - marker.offset,
                );
            }
        }

        self.top.set(marker.offset);

        if self.config.track_stats {
            self.total_rewinds.set(self.total_rewinds.get().saturating_add(1));
        }

        #[cfg(feature = "logging")]
        trace!(from = top, to = marker.offset, "stack rewound");

        Ok(())
    }

    /// Releases every allocation
    pub fn clear(&self) {
        self.free_to_marker(StackMarker::ORIGIN);
    }

    /// Get statistics (if tracking is enabled)
    pub fn stats(&self) -> Option<StackStats> {
        if !self.config.track_stats {
            return None;
        }

        Some(StackStats {
            total_allocations: self.total_allocs.get(),
            total_rewinds: self.total_rewinds.get(),
            peak_bytes: self.peak_usage.get(),
            bytes_allocated: self.top.get(),
            capacity: self.capacity,
        })
    }
}

fn validate(capacity: usize, alignment: usize) -> MemoryResult<()> {
    if capacity == 0 {
        return Err(MemoryError::invalid_config("capacity cannot be zero"));
    }
    check_alignment(alignment)
}

impl MemoryUsage for StackAllocator<'_> {
    fn used_memory(&self) -> usize {
        self.bytes_allocated()
    }

    fn available_memory(&self) -> usize {
        self.remaining()
    }

    fn total_memory(&self) -> usize {
        self.capacity()
    }
}

impl Drop for StackAllocator<'_> {
    fn drop(&mut self) {
        #[cfg(feature = "logging")]
        debug!(
            capacity = self.capacity,
            bytes_allocated = self.top.get(),
            owned = self.buffer.is_owned(),
            "stack allocator dropped"
        );
    }
}

impl core::fmt::Debug for StackAllocator<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StackAllocator")
            .field("capacity", &self.capacity)
            .field("top", &self.top.get())
            .field("alignment", &self.alignment)
            .field("owned", &self.buffer.is_owned())
            .finish()
    }
}

// SAFETY: StackAllocator can be sent between threads.
// - The buffer is owned or exclusively borrowed, never aliased
// - Cell fields move with the allocator; Cell keeps it !Sync, so it is never
//   used from two threads at once
unsafe impl Send for StackAllocator<'_> {}
