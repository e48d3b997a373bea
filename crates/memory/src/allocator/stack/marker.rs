//! Stack marker for position tracking

/// Marker representing a position in the stack allocator
///
/// Obtained from [`StackAllocator::top`](super::StackAllocator::top) and
/// handed back to
/// [`StackAllocator::free_to_marker`](super::StackAllocator::free_to_marker)
/// to release everything allocated after it. A marker is only meaningful to
/// the allocator that produced it, and only while it is not above that
/// allocator's current top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StackMarker {
    pub(super) offset: usize,
}

impl StackMarker {
    /// Marker for an empty stack
    pub(super) const ORIGIN: Self = Self { offset: 0 };

    /// Byte offset of this marker from the start of the buffer
    #[inline]
    pub fn offset(self) -> usize {
        self.offset
    }
}
