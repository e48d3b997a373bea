//! Main pool allocator implementation
//!
//! # Safety
//!
//! This module implements a single-threaded pool allocator using an
//! intrusive free list:
//! - Fixed-size chunks laid out back to back from the buffer start
//! - Free chunks store the address of the next free chunk in their first
//!   `LINK_SIZE` bytes; a null link terminates the list
//! - Links are read and written unaligned, since `chunk_size` need not be a
//!   multiple of the pointer alignment
//! - Allocated chunks belong to the caller; the pool never reads them
//!
//! ## Invariants
//!
//! - `allocated + free_list_len() == chunk_count`
//! - `chunk_size >= LINK_SIZE`
//! - Freeing a pointer twice, or one this pool did not hand out, corrupts
//!   the free list. `validate_frees` catches foreign and misaligned
//!   pointers but not double frees.

use core::cell::Cell;
use core::mem;
use core::ptr::{self, NonNull};

use super::{PoolConfig, PoolStats};
use crate::allocator::backing::Backing;
use crate::error::{MemoryError, MemoryResult, fatal};
use crate::traits::MemoryUsage;
use crate::types::{DEFAULT_ALIGNMENT, LINK_SIZE};
use crate::utils::{align_up, check_alignment, checked_mul};

#[cfg(feature = "logging")]
use tracing::debug;

/// Pool allocator for fixed-size chunks
///
/// # Memory Layout
/// ```text
/// [Chunk0][Chunk1][Chunk2][Chunk3]...[ChunkN]
///    ↓       ↓       ↓       ↓           ↓
/// [free] → [free] → [used] → [free] → [used] → null
/// ```
///
/// Free chunks are linked together in a singly-linked list whose head is the
/// next chunk handed out, so a freed chunk is the first to be reused.
pub struct PoolAllocator<'buf> {
    /// Owned or borrowed buffer containing all chunks
    buffer: Backing<'buf>,

    /// Size of each individual chunk
    chunk_size: usize,

    /// Total number of chunks in the pool
    chunk_count: usize,

    /// Alignment of the buffer start
    alignment: usize,

    /// Head of the free list
    free_head: Cell<Option<NonNull<u8>>>,

    /// Number of chunks handed out
    allocated: Cell<usize>,

    /// Configuration
    config: PoolConfig,

    /// Statistics (optional, only tracked if enabled)
    total_allocs: Cell<u32>,
    total_frees: Cell<u32>,
    peak_allocated: Cell<usize>,
}

impl PoolAllocator<'static> {
    /// Creates a pool owning `chunk_count` chunks of `chunk_size` bytes
    pub fn new(chunk_size: usize, chunk_count: usize) -> MemoryResult<Self> {
        Self::with_config(
            chunk_size,
            chunk_count,
            DEFAULT_ALIGNMENT,
            PoolConfig::default(),
        )
    }

    /// Creates an owning pool whose buffer starts on `alignment`
    pub fn with_alignment(
        chunk_size: usize,
        chunk_count: usize,
        alignment: usize,
    ) -> MemoryResult<Self> {
        Self::with_config(chunk_size, chunk_count, alignment, PoolConfig::default())
    }

    /// Creates a new pool allocator with custom configuration
    ///
    /// # Errors
    /// Returns an error if:
    /// - `chunk_size` is too small to hold a free-list link
    /// - `chunk_count` is zero
    /// - `alignment` is not a power of 2, or is above 256
    /// - `chunk_size * chunk_count` overflows
    pub fn with_config(
        chunk_size: usize,
        chunk_count: usize,
        alignment: usize,
        config: PoolConfig,
    ) -> MemoryResult<Self> {
        let total_size = validate(chunk_size, chunk_count, alignment)?;
        let buffer = Backing::owned(total_size, alignment)?;
        Ok(Self::from_backing(
            buffer,
            chunk_size,
            chunk_count,
            alignment,
            config,
        ))
    }

    /// Creates a pool sized and aligned for values of `T`
    ///
    /// Chunks are at least `LINK_SIZE` bytes and a multiple of `T`'s
    /// alignment, so every chunk can hold a `T`.
    pub fn for_type<T>(chunk_count: usize) -> MemoryResult<Self> {
        let align = mem::align_of::<T>().max(mem::align_of::<*mut u8>());
        let chunk_size = align_up(mem::size_of::<T>().max(LINK_SIZE), align);
        Self::with_config(chunk_size, chunk_count, align, PoolConfig::default())
    }

    /// Creates a pool allocator with production config
    pub fn production(chunk_size: usize, chunk_count: usize) -> MemoryResult<Self> {
        Self::with_config(
            chunk_size,
            chunk_count,
            DEFAULT_ALIGNMENT,
            PoolConfig::production(),
        )
    }

    /// Creates a pool allocator with debug config
    pub fn debug(chunk_size: usize, chunk_count: usize) -> MemoryResult<Self> {
        Self::with_config(
            chunk_size,
            chunk_count,
            DEFAULT_ALIGNMENT,
            PoolConfig::debug(),
        )
    }
}

impl<'buf> PoolAllocator<'buf> {
    /// Creates a pool over a caller-owned buffer
    ///
    /// The buffer must hold `chunk_size * chunk_count` bytes. It may start
    /// on any address; when it is less aligned than `alignment`, the pool
    /// records the alignment the buffer actually has. It is never released
    /// by the pool.
    pub fn from_slice(
        buffer: &'buf mut [u8],
        chunk_size: usize,
        chunk_count: usize,
        alignment: usize,
    ) -> MemoryResult<Self> {
        Self::from_slice_with_config(
            buffer,
            chunk_size,
            chunk_count,
            alignment,
            PoolConfig::default(),
        )
    }

    /// Creates a pool over a caller-owned buffer with custom configuration
    pub fn from_slice_with_config(
        buffer: &'buf mut [u8],
        chunk_size: usize,
        chunk_count: usize,
        alignment: usize,
        config: PoolConfig,
    ) -> MemoryResult<Self> {
        let total_size = validate(chunk_size, chunk_count, alignment)?;
        let alignment =
            borrowed_alignment(buffer.as_ptr(), buffer.len(), total_size, alignment)?;
        Ok(Self::from_backing(
            Backing::from_slice(buffer),
            chunk_size,
            chunk_count,
            alignment,
            config,
        ))
    }

    /// Creates a pool over raw caller memory
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `len` bytes for `'buf`,
    /// and nothing else may access that memory while the pool lives. The
    /// pool never frees it.
    pub unsafe fn from_raw_parts(
        ptr: NonNull<u8>,
        len: usize,
        chunk_size: usize,
        chunk_count: usize,
        alignment: usize,
        config: PoolConfig,
    ) -> MemoryResult<Self> {
        let total_size = validate(chunk_size, chunk_count, alignment)?;
        let alignment = borrowed_alignment(ptr.as_ptr(), len, total_size, alignment)?;
        // SAFETY: Forwarded caller contract.
        let buffer = unsafe { Backing::from_raw_parts(ptr, len) };
        Ok(Self::from_backing(
            buffer,
            chunk_size,
            chunk_count,
            alignment,
            config,
        ))
    }

    fn from_backing(
        buffer: Backing<'buf>,
        chunk_size: usize,
        chunk_count: usize,
        alignment: usize,
        config: PoolConfig,
    ) -> Self {
        // Fill with uninit pattern if debugging
        if let Some(pattern) = config.uninit_pattern {
            // SAFETY: The whole buffer is ours (owned, or exclusively borrowed).
            unsafe { ptr::write_bytes(buffer.base().as_ptr(), pattern, buffer.len()) };
        }

        #[cfg(feature = "logging")]
        debug!(
            chunk_size,
            chunk_count,
            alignment,
            owned = buffer.is_owned(),
            "pool allocator created"
        );

        let pool = Self {
            buffer,
            chunk_size,
            chunk_count,
            alignment,
            free_head: Cell::new(None),
            allocated: Cell::new(0),
            config,
            total_allocs: Cell::new(0),
            total_frees: Cell::new(0),
            peak_allocated: Cell::new(0),
        };

        // Initialize the free list
        pool.thread_free_list();
        pool
    }

    /// Links every chunk into the free list, chunk 0 first
    fn thread_free_list(&self) {
        let mut next: Option<NonNull<u8>> = None;

        for i in (0..self.chunk_count).rev() {
            let chunk = self.chunk(i);
            // SAFETY: chunk i is inside the buffer and at least LINK_SIZE
            // bytes (validated at construction).
            unsafe { write_link(chunk, next) };
            next = Some(chunk);
        }

        self.free_head.set(next);
        self.allocated.set(0);
    }

    /// Address of chunk `index`
    #[inline]
    fn chunk(&self, index: usize) -> NonNull<u8> {
        debug_assert!(index < self.chunk_count);
        // SAFETY: index < chunk_count, so the offset is inside the buffer.
        unsafe { self.buffer.base().add(index * self.chunk_size) }
    }

    /// Returns the size of each chunk
    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the total number of chunks in the pool
    #[inline]
    pub fn size(&self) -> usize {
        self.chunk_count
    }

    /// Returns the number of allocated chunks
    #[inline]
    pub fn num_allocated(&self) -> usize {
        self.allocated.get()
    }

    /// Returns the number of free chunks
    #[inline]
    pub fn free_count(&self) -> usize {
        self.chunk_count - self.allocated.get()
    }

    /// Alignment of the buffer start
    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Checks if the pool has no free chunks left
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.free_head.get().is_none()
    }

    /// Whether the buffer is released when the pool is dropped
    #[inline]
    pub fn is_owned(&self) -> bool {
        self.buffer.is_owned()
    }

    /// The active configuration
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Checks if a pointer lies inside the pool's buffer
    ///
    /// Any byte of any chunk counts; use a free with `validate_frees` set to
    /// also check the chunk boundary.
    pub fn contains(&self, ptr: *const u8) -> bool {
        let start = self.buffer.base().as_ptr() as usize;
        let addr = ptr as usize;
        addr >= start && addr < start + self.chunk_size * self.chunk_count
    }

    /// Counts the chunks on the free list by walking it
    ///
    /// O(n); meant for diagnostics and tests.
    pub fn free_list_len(&self) -> usize {
        let mut len = 0;
        let mut cursor = self.free_head.get();
        while let Some(chunk) = cursor {
            len += 1;
            // SAFETY: Every chunk on the free list holds a valid link.
            cursor = unsafe { read_link(chunk) };
        }
        len
    }

    /// Takes one chunk off the free list
    ///
    /// The chunk's bytes are not cleared; the old link is still in its first
    /// `LINK_SIZE` bytes.
    ///
    /// # Panics
    ///
    /// Panics if every chunk is allocated.
    #[track_caller]
    pub fn alloc(&self) -> NonNull<u8> {
        self.try_alloc().unwrap_or_else(|err| fatal(err))
    }

    /// Fallible form of [`alloc`](Self::alloc)
    pub fn try_alloc(&self) -> MemoryResult<NonNull<u8>> {
        let Some(chunk) = self.free_head.get() else {
            return Err(MemoryError::pool_exhausted(self.chunk_count));
        };

        // SAFETY: chunk is the free-list head, so it holds a valid link.
        let next = unsafe { read_link(chunk) };
        self.free_head.set(next);

        let allocated = self.allocated.get() + 1;
        self.allocated.set(allocated);

        if self.config.track_stats {
            self.total_allocs.set(self.total_allocs.get().saturating_add(1));
            self.peak_allocated.set(self.peak_allocated.get().max(allocated));
        }

        Ok(chunk)
    }

    /// Returns a chunk to the free list
    ///
    /// # Panics
    ///
    /// With `validate_frees` set, panics if `ptr` is outside the buffer or
    /// not on a chunk boundary.
    ///
    /// # Safety
    ///
    /// `ptr` must have come from [`alloc`](Self::alloc) on this pool and
    /// must not have been freed since. Violating this corrupts the free list.
    #[track_caller]
    pub unsafe fn free(&self, ptr: NonNull<u8>) {
        // SAFETY: Forwarded caller contract.
        unsafe { self.try_free(ptr) }.unwrap_or_else(|err| fatal(err));
    }

    /// Fallible form of [`free`](Self::free)
    ///
    /// Only fails when `validate_frees` is set and the pointer is rejected.
    ///
    /// # Safety
    ///
    /// Same as [`free`](Self::free).
    pub unsafe fn try_free(&self, ptr: NonNull<u8>) -> MemoryResult<()> {
        if self.config.validate_frees {
            self.validate_chunk(ptr)?;
        }

        let allocated = self.allocated.get();
        debug_assert!(allocated > 0, "pool free with no chunk allocated");

        // Fill with freed pattern if debugging
        if let Some(pattern) = self.config.freed_pattern {
            // SAFETY: ptr is a chunk of this pool (caller contract), so
            // chunk_size bytes from it are inside the buffer.
            unsafe { ptr::write_bytes(ptr.as_ptr(), pattern, self.chunk_size) };
        }

        // SAFETY: Same as above; chunk_size >= LINK_SIZE.
        unsafe { write_link(ptr, self.free_head.get()) };
        self.free_head.set(Some(ptr));
        self.allocated.set(allocated.wrapping_sub(1));

        if self.config.track_stats {
            self.total_frees.set(self.total_frees.get().saturating_add(1));
        }

        Ok(())
    }

    fn validate_chunk(&self, ptr: NonNull<u8>) -> MemoryResult<()> {
        let addr = ptr.as_ptr() as usize;
        if !self.contains(ptr.as_ptr()) {
            return Err(MemoryError::foreign_pointer(addr));
        }

        let start = self.buffer.base().as_ptr() as usize;
        if !(addr - start).is_multiple_of(self.chunk_size) {
            return Err(MemoryError::foreign_pointer(addr));
        }
        Ok(())
    }

    /// Returns every chunk to the free list
    ///
    /// # Safety
    ///
    /// No chunk handed out by this pool may be used after the reset.
    pub unsafe fn reset(&self) {
        self.thread_free_list();

        if self.config.track_stats {
            self.total_allocs.set(0);
            self.total_frees.set(0);
            self.peak_allocated.set(0);
        }
    }

    /// Get statistics (if tracking is enabled)
    pub fn stats(&self) -> Option<PoolStats> {
        if !self.config.track_stats {
            return None;
        }

        Some(PoolStats {
            total_allocations: self.total_allocs.get(),
            total_frees: self.total_frees.get(),
            peak_allocated: self.peak_allocated.get(),
            allocated: self.allocated.get(),
            chunk_size: self.chunk_size,
            chunk_count: self.chunk_count,
        })
    }
}

/// Reads the free-list link stored at the start of `chunk`
///
/// # Safety
///
/// `chunk` must be valid for reads of `LINK_SIZE` bytes.
#[inline]
unsafe fn read_link(chunk: NonNull<u8>) -> Option<NonNull<u8>> {
    // SAFETY: Caller contract; unaligned read because chunks need not be
    // pointer-aligned.
    NonNull::new(unsafe { chunk.as_ptr().cast::<*mut u8>().read_unaligned() })
}

/// Stores a free-list link at the start of `chunk`
///
/// # Safety
///
/// `chunk` must be valid for writes of `LINK_SIZE` bytes.
#[inline]
unsafe fn write_link(chunk: NonNull<u8>, next: Option<NonNull<u8>>) {
    let raw = next.map_or(ptr::null_mut(), NonNull::as_ptr);
    // SAFETY: Caller contract; see read_link.
    unsafe { chunk.as_ptr().cast::<*mut u8>().write_unaligned(raw) };
}

fn validate(chunk_size: usize, chunk_count: usize, alignment: usize) -> MemoryResult<usize> {
    if chunk_size < LINK_SIZE {
        return Err(MemoryError::invalid_config(&format!(
            "chunk size {chunk_size} cannot hold a {LINK_SIZE}-byte free-list link"
        )));
    }
    if chunk_count == 0 {
        return Err(MemoryError::invalid_config("chunk count cannot be zero"));
    }
    check_alignment(alignment)?;
    checked_mul(chunk_size, chunk_count, "pool buffer size")
}

/// Checks a borrowed buffer's size and returns the alignment its start
/// actually satisfies, capped at the requested one
fn borrowed_alignment(
    base: *const u8,
    len: usize,
    required: usize,
    alignment: usize,
) -> MemoryResult<usize> {
    if len < required {
        return Err(MemoryError::buffer_too_small(required, len));
    }

    let actual = address_alignment(base as usize);
    if actual < alignment {
        #[cfg(feature = "logging")]
        debug!(
            requested = alignment,
            actual, "borrowed pool buffer is less aligned than requested"
        );
        return Ok(actual);
    }
    Ok(alignment)
}

/// Largest power of two dividing `address`
#[inline]
fn address_alignment(address: usize) -> usize {
    1 << address.trailing_zeros().min(usize::BITS - 1)
}

impl MemoryUsage for PoolAllocator<'_> {
    fn used_memory(&self) -> usize {
        self.num_allocated() * self.chunk_size
    }

    fn available_memory(&self) -> usize {
        self.free_count() * self.chunk_size
    }

    fn total_memory(&self) -> usize {
        self.chunk_count * self.chunk_size
    }
}

impl Drop for PoolAllocator<'_> {
    fn drop(&mut self) {
        #[cfg(feature = "logging")]
        debug!(
            chunk_count = self.chunk_count,
            allocated = self.allocated.get(),
            owned = self.buffer.is_owned(),
            "pool allocator dropped"
        );
    }
}

impl core::fmt::Debug for PoolAllocator<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PoolAllocator")
            .field("chunk_size", &self.chunk_size)
            .field("chunk_count", &self.chunk_count)
            .field("allocated", &self.allocated.get())
            .field("owned", &self.buffer.is_owned())
            .finish()
    }
}

// SAFETY: PoolAllocator is Send because:
// - The buffer is owned or exclusively borrowed, never aliased
// - The free-list head only points into that buffer
// - Cell fields keep it !Sync, so no two threads touch it at once
unsafe impl Send for PoolAllocator<'_> {}
