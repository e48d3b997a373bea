//! Integration tests for the pool allocator

use std::collections::HashSet;

use onyx_memory::prelude::*;

#[repr(C, align(128))]
struct AlignedBuffer([u8; 512]);

#[test]
fn test_four_chunks_spaced_by_chunk_size() {
    let pool = PoolAllocator::new(64, 4).unwrap();
    let chunks: Vec<usize> = (0..4).map(|_| pool.alloc().as_ptr() as usize).collect();

    let distinct: HashSet<_> = chunks.iter().collect();
    assert_eq!(distinct.len(), 4);

    let lowest = *chunks.iter().min().unwrap();
    let mut offsets: Vec<_> = chunks.iter().map(|c| c - lowest).collect();
    offsets.sort_unstable();
    assert_eq!(offsets, [0, 64, 128, 192]);

    assert_eq!(pool.num_allocated(), 4);
}

#[test]
#[should_panic(expected = "exhausted")]
fn test_fifth_alloc_is_fatal() {
    let pool = PoolAllocator::new(64, 4).unwrap();
    for _ in 0..5 {
        pool.alloc();
    }
}

#[test]
fn test_lifo_reuse() {
    let pool = PoolAllocator::new(64, 4).unwrap();
    let p = pool.alloc();
    unsafe { pool.free(p) };
    assert_eq!(pool.num_allocated(), 0);
    assert_eq!(pool.alloc(), p);
}

#[test]
fn test_free_order_is_reversed_on_reuse() {
    let pool = PoolAllocator::new(32, 3).unwrap();
    let a = pool.alloc();
    let b = pool.alloc();
    let c = pool.alloc();

    unsafe {
        pool.free(a);
        pool.free(c);
        pool.free(b);
    }

    assert_eq!(pool.alloc(), b);
    assert_eq!(pool.alloc(), c);
    assert_eq!(pool.alloc(), a);
}

#[test]
fn test_borrowed_buffer() {
    let mut storage = AlignedBuffer([0; 512]);
    {
        let pool = PoolAllocator::from_slice(&mut storage.0, 64, 8, 128).unwrap();
        assert!(!pool.is_owned());
        let chunk = pool.alloc();
        assert_eq!(chunk.as_ptr() as usize % 128, 0);
        assert!(pool.contains(chunk.as_ptr()));
    }
    // The pool is gone; the storage is still ours.
    storage.0[0] = 1;
    assert_eq!(storage.0[0], 1);
}

#[test]
fn test_borrowed_buffer_too_small() {
    let mut storage = AlignedBuffer([0; 512]);
    assert_eq!(
        PoolAllocator::from_slice(&mut storage.0, 64, 9, 128).unwrap_err(),
        MemoryError::BufferTooSmall {
            required: 576,
            provided: 512
        }
    );
}

#[test]
fn test_less_aligned_borrowed_buffer_with_default_alignment() {
    #[repr(align(16))]
    struct Wide(#[allow(dead_code)] u128);

    let mut storage = AlignedBuffer([0; 512]);
    let pool =
        PoolAllocator::from_slice(&mut storage.0[8..8 + 256], 64, 4, DEFAULT_ALIGNMENT).unwrap();
    assert_eq!(pool.alignment(), 8);
    assert_eq!(pool.size(), 4);

    let value = PoolBox::new_in(7u64, &pool).unwrap();
    assert_eq!(*value, 7);
    assert!(matches!(
        PoolBox::new_in(Wide(1), &pool),
        Err(MemoryError::InvalidAlignment { alignment: 16 })
    ));
}

#[test]
fn test_byte_aligned_borrowed_buffer() {
    let mut storage = AlignedBuffer([0; 512]);
    let pool = PoolAllocator::from_slice(&mut storage.0[1..], 64, 4, 128).unwrap();
    assert_eq!(pool.alignment(), 1);

    let chunks: Vec<_> = (0..4).map(|_| pool.alloc()).collect();
    unsafe {
        for chunk in chunks {
            pool.free(chunk);
        }
    }
    assert_eq!(pool.free_list_len(), 4);
    assert!(matches!(
        PoolBox::new_in(0u32, &pool),
        Err(MemoryError::InvalidAlignment { alignment: 4 })
    ));
}

#[test]
fn test_foreign_pointer_detected_in_debug_config() {
    let pool = PoolAllocator::debug(64, 4).unwrap();
    let other = PoolAllocator::debug(64, 4).unwrap();
    let stray = other.alloc();

    let err = unsafe { pool.try_free(stray) }.unwrap_err();
    assert_eq!(err.code(), "MEM:POOL:FOREIGN");
    assert_eq!(pool.free_list_len(), 4);
}

#[test]
fn test_pool_box_returns_chunk() {
    let pool = PoolAllocator::for_type::<String>(2).unwrap();
    {
        let mut name = PoolBox::new_in(String::from("onyx"), &pool).unwrap();
        name.push_str("-engine");
        assert_eq!(name.as_str(), "onyx-engine");
        assert_eq!(pool.num_allocated(), 1);
    }
    assert_eq!(pool.num_allocated(), 0);
    assert_eq!(pool.free_list_len(), 2);
}
