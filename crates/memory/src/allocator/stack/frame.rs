//! RAII-based stack frame for automatic restoration

use super::{StackAllocator, StackMarker};
use crate::error::{MemoryError, fatal};

/// RAII helper for stack-based scoped allocation
///
/// Records the allocator's top when created and rewinds to it when dropped,
/// so every allocation made inside the frame is released together.
///
/// Values placed in the frame are not dropped on rewind; see
/// [`StackAllocator::alloc_slice`].
pub struct StackFrame<'a, 'buf> {
    allocator: &'a StackAllocator<'buf>,
    marker: StackMarker,
}

impl<'a, 'buf> StackFrame<'a, 'buf> {
    /// Creates a new stack frame that will restore to the current position
    /// when dropped
    pub fn new(allocator: &'a StackAllocator<'buf>) -> Self {
        let marker = allocator.top();
        Self { allocator, marker }
    }

    /// Gets the underlying allocator
    pub fn allocator(&self) -> &'a StackAllocator<'buf> {
        self.allocator
    }

    /// The position this frame rewinds to
    pub fn marker(&self) -> StackMarker {
        self.marker
    }

    /// Manually restore and consume this frame
    pub fn release(self) {
        // Drop will handle the restoration
        drop(self);
    }
}

impl Drop for StackFrame<'_, '_> {
    fn drop(&mut self) {
        // The stack may already be below the marker if it was cleared inside
        // the frame; there is nothing left to release then.
        match self.allocator.try_free_to_marker(self.marker) {
            Ok(()) | Err(MemoryError::InvalidMarker { .. }) => {}
            Err(err) => fatal(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rewinds_on_drop() {
        let stack = StackAllocator::new(1024).unwrap();
        stack.alloc(16, 8);
        let before = stack.top();
        {
            let frame = StackFrame::new(&stack);
            frame.allocator().alloc(100, 8);
            assert!(stack.top() > before);
        }
        assert_eq!(stack.top(), before);
    }

    #[test]
    fn test_frame_survives_clear_inside() {
        let stack = StackAllocator::new(1024).unwrap();
        stack.alloc(64, 8);
        let frame = stack.frame();
        stack.clear();
        frame.release();
        assert_eq!(stack.bytes_allocated(), 0);
    }

    #[test]
    fn test_frame_opened_after_clear_rewinds_again() {
        let stack = StackAllocator::new(1024).unwrap();
        {
            let outer = stack.frame();
            outer.allocator().alloc(64, 8);
            stack.clear();
            {
                let _inner = stack.frame();
                stack.alloc(32, 8);
            }
            assert_eq!(stack.bytes_allocated(), 0);
        }
        assert_eq!(stack.bytes_allocated(), 0);
    }
}
