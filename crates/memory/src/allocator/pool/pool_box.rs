//! RAII owner for a value living in a pool chunk
//!
//! # Safety
//!
//! - The value is written into a chunk taken from the pool in `new_in`
//! - `Drop` runs the value's destructor, then hands the chunk back
//! - `into_inner` moves the value out and skips `Drop` through `ManuallyDrop`
//! - The borrow of the pool keeps it alive for as long as the box

use core::fmt;
use core::mem::{self, ManuallyDrop};
use core::ops::{Deref, DerefMut};
use core::ptr::NonNull;

use super::PoolAllocator;
use crate::error::{MemoryError, MemoryResult};

/// Box-like owner of a `T` stored in a [`PoolAllocator`] chunk
pub struct PoolBox<'p, 'buf, T> {
    ptr: NonNull<T>,
    pool: &'p PoolAllocator<'buf>,
}

impl<'p, 'buf, T> PoolBox<'p, 'buf, T> {
    /// Moves `value` into a fresh chunk of `pool`
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if a `T` does not fit in one chunk
    /// - `InvalidAlignment` if chunks are not aligned for `T`
    /// - `PoolExhausted` if no chunk is free
    pub fn new_in(value: T, pool: &'p PoolAllocator<'buf>) -> MemoryResult<Self> {
        let align = mem::align_of::<T>();
        if mem::size_of::<T>() > pool.chunk_size() {
            return Err(MemoryError::invalid_config(&format!(
                "a {}-byte value does not fit in a {}-byte chunk",
                mem::size_of::<T>(),
                pool.chunk_size()
            )));
        }
        if align > pool.alignment() || !pool.chunk_size().is_multiple_of(align) {
            return Err(MemoryError::invalid_alignment(align));
        }

        let ptr = pool.try_alloc()?.cast::<T>();
        // SAFETY: The chunk is exclusively ours, large enough and aligned
        // for T (checked above).
        unsafe { ptr.as_ptr().write(value) };

        Ok(Self { ptr, pool })
    }

    /// The pool the value lives in
    pub fn pool(&self) -> &'p PoolAllocator<'buf> {
        self.pool
    }

    /// Moves the value out and returns its chunk to the pool
    pub fn into_inner(self) -> T {
        let this = ManuallyDrop::new(self);
        // SAFETY: Moving the value out and releasing its chunk.
        // - ptr holds an initialized T written in new_in, read once
        // - ManuallyDrop skips Drop, so the chunk is freed exactly once
        unsafe {
            let value = this.ptr.as_ptr().read();
            this.pool.free(this.ptr.cast());
            value
        }
    }
}

impl<T> Deref for PoolBox<'_, '_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: ptr holds an initialized T owned by this box.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> DerefMut for PoolBox<'_, '_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: As in deref; &mut self guarantees uniqueness.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T> Drop for PoolBox<'_, '_, T> {
    fn drop(&mut self) {
        // SAFETY: Releasing the value and its chunk.
        // - ptr holds an initialized T that nobody else can reach
        // - The chunk came from self.pool and has not been freed
        unsafe {
            self.ptr.as_ptr().drop_in_place();
            self.pool.free(self.ptr.cast());
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PoolBox<'_, '_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
