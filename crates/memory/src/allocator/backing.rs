//! Backing storage shared by the stack and pool allocators
//!
//! An allocator either owns its buffer (and releases it through the aligned
//! allocator when dropped) or borrows one from the caller. The variant is
//! fixed at construction; dropping a `Borrowed` backing never touches the
//! caller's memory.

use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::aligned::AlignedBlock;
use crate::error::MemoryResult;

/// Owned or borrowed allocator buffer
pub(crate) enum Backing<'buf> {
    /// Allocated by the allocator itself, released on drop
    Owned(AlignedBlock),

    /// Supplied by the caller, who keeps ownership
    Borrowed {
        base: NonNull<u8>,
        len: usize,
        _buffer: PhantomData<&'buf mut [u8]>,
    },
}

impl Backing<'static> {
    /// Allocates an owned buffer of `len` bytes on an `alignment` boundary
    pub(crate) fn owned(len: usize, alignment: usize) -> MemoryResult<Self> {
        AlignedBlock::try_new(len, alignment).map(Backing::Owned)
    }
}

impl<'buf> Backing<'buf> {
    /// Borrows a caller-provided slice for `'buf`
    pub(crate) fn from_slice(buffer: &'buf mut [u8]) -> Self {
        let len = buffer.len();
        Backing::Borrowed {
            base: NonNull::from(buffer).cast::<u8>(),
            len,
            _buffer: PhantomData,
        }
    }

    /// Borrows raw caller memory
    ///
    /// # Safety
    ///
    /// `base` must be valid for reads and writes of `len` bytes for `'buf`,
    /// and nothing else may access that memory while the backing lives.
    pub(crate) unsafe fn from_raw_parts(base: NonNull<u8>, len: usize) -> Self {
        Backing::Borrowed {
            base,
            len,
            _buffer: PhantomData,
        }
    }

    /// Start of the buffer
    #[inline]
    pub(crate) fn base(&self) -> NonNull<u8> {
        match self {
            Backing::Owned(block) => block.as_ptr(),
            Backing::Borrowed { base, .. } => *base,
        }
    }

    /// Length of the buffer in bytes
    #[inline]
    pub(crate) fn len(&self) -> usize {
        match self {
            Backing::Owned(block) => block.len(),
            Backing::Borrowed { len, .. } => *len,
        }
    }

    /// Whether the allocator releases this buffer when dropped
    #[inline]
    pub(crate) fn is_owned(&self) -> bool {
        matches!(self, Backing::Owned(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owned_backing() {
        let backing = Backing::owned(256, 64).unwrap();
        assert!(backing.is_owned());
        assert_eq!(backing.len(), 256);
        assert_eq!(backing.base().as_ptr() as usize % 64, 0);
    }

    #[test]
    fn test_borrowed_backing_leaves_buffer_alone() {
        let mut buffer = [7u8; 32];
        {
            let backing = Backing::from_slice(&mut buffer);
            assert!(!backing.is_owned());
            assert_eq!(backing.len(), 32);
        }
        assert!(buffer.iter().all(|&b| b == 7));
    }
}
