//! Full-cell record of the triangulation data structure.
//!
//! A full cell is a maximal simplex: d + 1 vertex slots, d + 1 neighbor
//! slots (one per facet, indexed by the opposite vertex), and d + 1 mirror
//! indices pairing each facet with its encoding on the neighboring cell.
//! Slots beyond the current dimension of the triangulation stay unset.

use uuid::Uuid;

use crate::core::collections::{SlotBuffer, SlotIndex};
use crate::core::traits::payload::Payload;
use crate::core::triangulation_data_structure::{CellKey, VertexKey};
use crate::core::util::make_uuid;

/// Per-cell scratch byte.
///
/// Bit 0 is the traversal **visited** mark. Every public operation that sets
/// visited bits restores them before returning; the hole-insertion algorithm
/// instead consumes them by erasing the marked cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellScratch(u8);

impl CellScratch {
    const VISITED: u8 = 1;

    /// Returns `true` when no scratch bit is set.
    #[must_use]
    pub const fn is_clear(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` when the traversal visited mark is set.
    #[must_use]
    pub const fn is_visited(self) -> bool {
        self.0 & Self::VISITED != 0
    }

    pub(crate) fn mark_visited(&mut self) {
        self.0 |= Self::VISITED;
    }

    pub(crate) fn clear_visited(&mut self) {
        self.0 &= !Self::VISITED;
    }
}

/// A full cell: a simplex of the current dimension of the triangulation.
///
/// # Positional semantics
///
/// All three slot arrays are indexed together: `neighbors[i]` is the full
/// cell sharing the facet opposite `vertices[i]`, and `mirror_indices[i]` is
/// the slot `j` on that neighbor such that `neighbors[i].neighbors[j]` comes
/// back to this cell. The mirror relation is an involution.
///
/// Cells store keys, not records; resolving a slot to a vertex or neighbor
/// goes through the owning [`Tds`](crate::core::triangulation_data_structure::Tds).
#[derive(Clone, Debug)]
pub struct FullCell<V, const D: usize>
where
    V: Payload,
{
    /// Keys of the vertices spanning this cell, one per slot.
    vertices: SlotBuffer<VertexKey>,
    /// Keys of the neighboring cells, indexed by opposite vertex slot.
    neighbors: SlotBuffer<CellKey>,
    /// For each facet, the slot under which the neighbor records it.
    mirror_indices: SlotBuffer<SlotIndex>,
    /// Unique identifier of the cell.
    uuid: Uuid,
    /// Optional payload associated with the cell.
    pub data: Option<V>,
    /// Traversal scratch bits.
    scratch: CellScratch,
}

impl<V, const D: usize> FullCell<V, D>
where
    V: Payload,
{
    /// Allocates a cell with all D + 1 slots unset.
    #[must_use]
    pub(crate) fn unset() -> Self {
        Self {
            vertices: SlotBuffer::from_elem(None, D + 1),
            neighbors: SlotBuffer::from_elem(None, D + 1),
            mirror_indices: SlotBuffer::from_elem(None, D + 1),
            uuid: make_uuid(),
            data: None,
            scratch: CellScratch::default(),
        }
    }

    /// Clones `other`'s slots and payload into a fresh cell.
    ///
    /// The copy gets its own identity and clear scratch bits; vertex,
    /// neighbor and mirror slots are taken verbatim and are expected to be
    /// rewired by the caller.
    #[must_use]
    pub(crate) fn from_template(other: &Self) -> Self {
        Self {
            vertices: other.vertices.clone(),
            neighbors: other.neighbors.clone(),
            mirror_indices: other.mirror_indices.clone(),
            uuid: make_uuid(),
            data: other.data,
            scratch: CellScratch::default(),
        }
    }

    /// Returns the unique identifier of this cell.
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the vertex key at slot `i`, or `None` for an unset slot.
    ///
    /// # Panics
    ///
    /// Panics if `i > D`.
    #[must_use]
    pub fn vertex(&self, i: usize) -> Option<VertexKey> {
        self.vertices[i]
    }

    /// Returns the full slot array of vertex keys.
    #[must_use]
    pub fn vertices(&self) -> &[Option<VertexKey>] {
        &self.vertices
    }

    pub(crate) fn set_vertex(&mut self, i: usize, v: Option<VertexKey>) {
        self.vertices[i] = v;
    }

    /// Returns the neighbor key at slot `i`, or `None` for an unset slot.
    ///
    /// # Panics
    ///
    /// Panics if `i > D`.
    #[must_use]
    pub fn neighbor(&self, i: usize) -> Option<CellKey> {
        self.neighbors[i]
    }

    /// Returns the full slot array of neighbor keys.
    #[must_use]
    pub fn neighbors(&self) -> &[Option<CellKey>] {
        &self.neighbors
    }

    pub(crate) fn set_neighbor(&mut self, i: usize, n: Option<CellKey>) {
        self.neighbors[i] = n;
    }

    /// Returns the mirror index at slot `i`: the slot under which
    /// `self.neighbor(i)` records the shared facet.
    ///
    /// # Panics
    ///
    /// Panics if `i > D`.
    #[must_use]
    pub fn mirror_index(&self, i: usize) -> Option<usize> {
        self.mirror_indices[i].map(usize::from)
    }

    pub(crate) fn set_mirror_index(&mut self, i: usize, j: Option<usize>) {
        self.mirror_indices[i] = j.map(|j| {
            SlotIndex::try_from(j).expect("slot index exceeds the cell slot range")
        });
    }

    /// Returns the slot at which vertex `v` appears in this cell, if any.
    #[must_use]
    pub fn index_of(&self, v: VertexKey) -> Option<usize> {
        self.vertices.iter().position(|slot| *slot == Some(v))
    }

    /// Returns `true` when vertex `v` appears in one of this cell's slots.
    #[must_use]
    pub fn has_vertex(&self, v: VertexKey) -> bool {
        self.index_of(v).is_some()
    }

    /// Swaps slots `i` and `j` across all three slot arrays.
    ///
    /// The owning triangulation is responsible for re-aiming the two
    /// neighbors' mirror indices afterwards; see
    /// [`Tds::swap_vertex_slots`](crate::core::triangulation_data_structure::Tds::swap_vertex_slots).
    pub(crate) fn swap_slots(&mut self, i: usize, j: usize) {
        self.vertices.swap(i, j);
        self.neighbors.swap(i, j);
        self.mirror_indices.swap(i, j);
    }

    /// Returns the scratch byte of this cell.
    #[must_use]
    pub const fn scratch(&self) -> CellScratch {
        self.scratch
    }

    pub(crate) fn scratch_mut(&mut self) -> &mut CellScratch {
        &mut self.scratch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collections::StorageMap;

    #[test]
    fn unset_cell_has_empty_slots() {
        let cell: FullCell<(), 3> = FullCell::unset();
        assert_eq!(cell.vertices().len(), 4);
        assert!(cell.vertices().iter().all(Option::is_none));
        assert!(cell.neighbors().iter().all(Option::is_none));
        assert!(cell.scratch().is_clear());
    }

    #[test]
    fn template_copy_gets_fresh_identity() {
        let mut vertices: StorageMap<VertexKey, ()> = StorageMap::with_key();
        let v = vertices.insert(());

        let mut cell: FullCell<u8, 2> = FullCell::unset();
        cell.set_vertex(1, Some(v));
        cell.data = Some(9);
        cell.scratch_mut().mark_visited();

        let copy = FullCell::from_template(&cell);
        assert_eq!(copy.vertex(1), Some(v));
        assert_eq!(copy.data, Some(9));
        assert_ne!(copy.uuid(), cell.uuid());
        assert!(copy.scratch().is_clear());
    }

    #[test]
    fn index_of_finds_vertex_slot() {
        let mut vertices: StorageMap<VertexKey, ()> = StorageMap::with_key();
        let a = vertices.insert(());
        let b = vertices.insert(());

        let mut cell: FullCell<(), 2> = FullCell::unset();
        cell.set_vertex(0, Some(a));
        cell.set_vertex(2, Some(b));

        assert_eq!(cell.index_of(b), Some(2));
        assert!(cell.has_vertex(a));
        assert_eq!(cell.index_of(vertices.insert(())), None);
    }

    #[test]
    fn swap_slots_moves_all_three_arrays() {
        let mut vertices: StorageMap<VertexKey, ()> = StorageMap::with_key();
        let a = vertices.insert(());
        let b = vertices.insert(());

        let mut cell: FullCell<(), 2> = FullCell::unset();
        cell.set_vertex(0, Some(a));
        cell.set_vertex(2, Some(b));
        cell.set_mirror_index(0, Some(1));

        cell.swap_slots(0, 2);
        assert_eq!(cell.vertex(0), Some(b));
        assert_eq!(cell.vertex(2), Some(a));
        assert_eq!(cell.mirror_index(2), Some(1));
        assert_eq!(cell.mirror_index(0), None);
    }

    #[test]
    fn scratch_visited_roundtrip() {
        let mut scratch = CellScratch::default();
        assert!(!scratch.is_visited());
        scratch.mark_visited();
        assert!(scratch.is_visited());
        assert!(!scratch.is_clear());
        scratch.clear_visited();
        assert!(scratch.is_clear());
    }
}
