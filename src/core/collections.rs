//! Collection aliases shared across the triangulation data structure.
//!
//! The aliases centralize the storage decisions: slot-keyed pools for the
//! vertex and full-cell containers, stack-friendly buffers for per-cell slot
//! arrays, and fast non-cryptographic hashing for internal key sets.

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;
use smallvec::SmallVec;

/// Compact index type for slot positions within a full cell.
///
/// A d-dimensional full cell has d + 1 vertex slots and practical
/// triangulations stay far below 255 dimensions, so a `u8` suffices while
/// keeping [`Facet`](crate::core::face::Facet) and
/// [`Rotor`](crate::core::face::Rotor) values small.
pub type SlotIndex = u8;

/// Internal storage backend for the vertex and full-cell pools.
///
/// `SlotMap` provides O(1) insert/erase, stable keys with generation
/// counters, and iteration over live elements: exactly the handle-allocator
/// contract the triangulation relies on. Keys are never invalidated except
/// by erasing the element they name.
pub type StorageMap<K, V> = SlotMap<K, V>;

/// `HashMap` with a fast non-cryptographic hasher for internal mappings.
///
/// Not DoS-resistant; use only with trusted, internal keys.
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// `HashSet` with a fast non-cryptographic hasher for internal membership
/// tests (hole tagging, face deduplication).
pub type FastHashSet<T> = FxHashSet<T>;

/// Small-size-optimized vector: stack allocation up to `N` elements, heap
/// fallback beyond.
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Inline capacity used for per-cell slot arrays and gathered-vertex scratch.
///
/// Most applications work in 2 to 5 dimensions; 8 slots cover every cell of
/// a 7-dimensional triangulation without touching the heap.
pub const MAX_PRACTICAL_DIMENSION_SIZE: usize = 8;

/// Slot array of a full cell: one optional entry per slot, `None` marking a
/// slot that is unused at the current dimension or mid-mutation.
pub type SlotBuffer<T> = SmallBuffer<Option<T>, MAX_PRACTICAL_DIMENSION_SIZE>;

/// Scratch buffer of cell keys used by the gathering routines.
pub type CellBuffer<T> = SmallBuffer<T, MAX_PRACTICAL_DIMENSION_SIZE>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_buffer_stays_inline_within_capacity() {
        let mut buffer: SmallBuffer<u32, 4> = SmallBuffer::new();
        for i in 0..4 {
            buffer.push(i);
        }
        assert!(!buffer.spilled());
        buffer.push(4);
        assert!(buffer.spilled());
    }

    #[test]
    fn slot_buffer_defaults_to_unset_entries() {
        let buffer: SlotBuffer<u32> = SlotBuffer::from_elem(None, 4);
        assert_eq!(buffer.len(), 4);
        assert!(buffer.iter().all(Option::is_none));
    }
}
