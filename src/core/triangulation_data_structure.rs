//! Data and operations on d-dimensional combinatorial triangulations.
//!
//! This module provides the [`Tds`] struct: a pure combinatorial
//! triangulation data structure for abstract simplicial complexes of
//! arbitrary dimension. The complex is a pure d-dimensional pseudo-manifold:
//! a connected collection of full cells (d-simplices) glued along their
//! (d-1)-faces so that every facet is shared by exactly two full cells.
//! Vertices, edges and lower-dimensional faces are implicit, derived on
//! demand from the full-cell/vertex incidence and the neighbor relation.
//!
//! There is no geometry here: no coordinates, no predicates. Vertex and
//! cell payloads are opaque. Geometric layers (Delaunay, regular, ...) are
//! expected to drive this structure from the outside.
//!
//! # Dimensions
//!
//! Two dimensions govern the structure. The **ambient dimension** `D` is
//! fixed at compile time and bounds the size of every cell's slot arrays.
//! The **current dimension** evolves at runtime:
//!
//! - `-2`: the empty triangulation;
//! - `-1`: a single vertex and a single degenerate full cell;
//! - `0`: a 0-sphere: two vertices, two mutually neighboring full cells;
//! - `d >= 1`: a pure d-dimensional pseudo-manifold.
//!
//! # Invariants at rest
//!
//! Between public operations the structure maintains, for every cell `s`
//! and slot `i` in `0..=d`:
//!
//! - **Neighbor symmetry**: `neighbor(neighbor(s, i), mirror_index(s, i))`
//!   is `s` again, and the mirror indices pair up as an involution.
//! - **Shared facet**: `s` and `neighbor(s, i)` share exactly the d vertices
//!   of the facet opposite slot `i`; no cell lists a vertex twice.
//! - **Back-references**: every vertex points at some full cell containing
//!   it.
//! - **Scratch hygiene**: all traversal visited bits are clear.
//!
//! # Examples
//!
//! Growing a triangulation from nothing by repeatedly increasing the
//! dimension (the first vertex plays the role of the point at infinity):
//!
//! ```rust
//! use simplicial_tds::core::triangulation_data_structure::Tds;
//!
//! let mut tds: Tds<(), (), 2> = Tds::new();
//! assert_eq!(tds.current_dimension(), -2);
//!
//! let inf = tds.insert_increase_dimension(None).unwrap();
//! let v1 = tds.insert_increase_dimension(Some(inf)).unwrap();
//! let _v2 = tds.insert_increase_dimension(Some(inf)).unwrap();
//! let _v3 = tds.insert_increase_dimension(Some(inf)).unwrap();
//!
//! assert_eq!(tds.current_dimension(), 2);
//! assert_eq!(tds.number_of_vertices(), 4);
//! assert_eq!(tds.number_of_full_cells(), 4);
//! assert!(tds.is_valid().is_ok());
//! # let _ = v1;
//! ```

use slotmap::{Key, new_key_type};
use thiserror::Error;

use crate::core::cell::FullCell;
use crate::core::collections::StorageMap;
use crate::core::face::{Face, Facet, Rotor};
use crate::core::traits::payload::Payload;
use crate::core::vertex::Vertex;

// =============================================================================
// KEY TYPES
// =============================================================================

new_key_type! {
    /// Stable handle to a vertex in the triangulation's vertex pool.
    ///
    /// Keys survive unrelated inserts and erases; only erasing the vertex
    /// itself invalidates its key. `VertexKey::default()` is the
    /// distinguished null handle.
    pub struct VertexKey;
}

new_key_type! {
    /// Stable handle to a full cell in the triangulation's cell pool.
    ///
    /// Keys survive unrelated inserts and erases; only erasing the cell
    /// itself invalidates its key. `CellKey::default()` is the
    /// distinguished null handle.
    pub struct CellKey;
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors reported by the editing operations of the triangulation.
///
/// These cover the checkable argument and state violations; contract
/// violations on the low-level primitive mutators are programming errors
/// and panic instead.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TdsError {
    /// A full-cell handle does not name a live cell.
    #[error("full cell {cell:?} is not in the triangulation")]
    FullCellNotFound {
        /// The offending cell handle.
        cell: CellKey,
    },
    /// A vertex handle does not name a live vertex.
    #[error("vertex {vertex:?} is not in the triangulation")]
    VertexNotFound {
        /// The offending vertex handle.
        vertex: VertexKey,
    },
    /// The operation is not defined at the triangulation's current
    /// dimension.
    #[error("operation requires current dimension in [{min}, {max}], but the triangulation is at {found}")]
    DimensionOutOfRange {
        /// The current dimension of the triangulation.
        found: i32,
        /// Smallest admissible current dimension.
        min: i32,
        /// Largest admissible current dimension.
        max: i32,
    },
    /// The current dimension already equals the ambient dimension.
    #[error("cannot increase the dimension beyond the ambient dimension {ambient}")]
    AmbientDimensionReached {
        /// The ambient dimension of the triangulation.
        ambient: i32,
    },
    /// A star vertex was supplied for an empty triangulation, or omitted
    /// for a non-empty one.
    #[error("a star vertex must be supplied exactly when the triangulation is non-empty (current dimension {current_dimension})")]
    StarArgumentMismatch {
        /// The current dimension of the triangulation.
        current_dimension: i32,
    },
    /// The starting facet handed to hole insertion is not on the boundary
    /// of the tagged hole.
    #[error("starting facet ({cell:?} opposite slot {index}) is not on the hole boundary")]
    FacetNotOnHoleBoundary {
        /// Cell of the offending facet encoding.
        cell: CellKey,
        /// Covertex slot of the offending facet encoding.
        index: usize,
    },
    /// Hole insertion was invoked with no cells to replace.
    #[error("hole insertion requires at least one full cell")]
    EmptyHole,
    /// The vertex is not the unique apex of the top dimension, so the
    /// triangulation cannot be collapsed onto the facets opposite it.
    #[error("vertex {vertex:?} is not the unique apex of the current dimension and cannot be removed by decreasing the dimension")]
    VertexNotRemovable {
        /// The vertex whose removal was requested.
        vertex: VertexKey,
    },
    /// The face's feature dimension does not admit a collapse.
    #[error("face of feature dimension {feature_dimension} is not collapsible at current dimension {current_dimension}")]
    FaceNotCollapsible {
        /// Feature dimension of the offending face.
        feature_dimension: i32,
        /// The current dimension of the triangulation.
        current_dimension: i32,
    },
}

// =============================================================================
// TDS STRUCT DEFINITION
// =============================================================================

/// A combinatorial triangulation data structure.
///
/// # Generic parameters
///
/// - `U`: opaque payload carried by each vertex.
/// - `V`: opaque payload carried by each full cell.
/// - `D`: ambient dimension, `D >= 1`. Cells carry `D + 1` slots; the
///   current dimension `d` uses the first `d + 1` of them.
///
/// # Handle stability
///
/// Both pools are slot maps: handles remain valid across unrelated inserts
/// and erases, and a stale handle can never alias a newer element.
///
/// # Concurrency
///
/// Single-threaded cooperative. No operation is reentrant or safe to call
/// concurrently with any other on the same value.
#[derive(Clone, Debug)]
pub struct Tds<U, V, const D: usize>
where
    U: Payload,
    V: Payload,
{
    /// Pool of vertices.
    vertices: StorageMap<VertexKey, Vertex<U>>,
    /// Pool of full cells.
    full_cells: StorageMap<CellKey, FullCell<V, D>>,
    /// Current dimension, in `-2..=D`.
    current_dimension: i32,
}

impl<U, V, const D: usize> Default for Tds<U, V, D>
where
    U: Payload,
    V: Payload,
{
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// QUERIES
// =============================================================================

impl<U, V, const D: usize> Tds<U, V, D>
where
    U: Payload,
    V: Payload,
{
    /// Creates an empty triangulation (current dimension -2).
    ///
    /// # Panics
    ///
    /// Panics if the ambient dimension `D` is zero.
    #[must_use]
    pub fn new() -> Self {
        assert!(D >= 1, "ambient dimension must be positive");
        Self {
            vertices: StorageMap::with_key(),
            full_cells: StorageMap::with_key(),
            current_dimension: -2,
        }
    }

    /// Returns the ambient dimension `D`.
    #[must_use]
    pub const fn ambient_dimension(&self) -> i32 {
        D as i32
    }

    /// Returns the current dimension, in `-2..=D`.
    #[must_use]
    pub const fn current_dimension(&self) -> i32 {
        self.current_dimension
    }

    /// Returns `true` when the triangulation is empty (current dimension
    /// -2).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.current_dimension == -2
    }

    /// Returns the number of live vertices.
    #[must_use]
    pub fn number_of_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of live full cells.
    #[must_use]
    pub fn number_of_full_cells(&self) -> usize {
        self.full_cells.len()
    }

    /// Returns the vertex pool for iteration and lookup.
    ///
    /// No ordering is guaranteed beyond being stable while the pool is not
    /// mutated.
    #[must_use]
    pub const fn vertices(&self) -> &StorageMap<VertexKey, Vertex<U>> {
        &self.vertices
    }

    /// Returns the full-cell pool for iteration and lookup.
    #[must_use]
    pub const fn full_cells(&self) -> &StorageMap<CellKey, FullCell<V, D>> {
        &self.full_cells
    }

    /// Returns the vertex record for `v`, or `None` for a dead handle.
    #[must_use]
    pub fn get_vertex(&self, v: VertexKey) -> Option<&Vertex<U>> {
        self.vertices.get(v)
    }

    /// Returns the full-cell record for `s`, or `None` for a dead handle.
    #[must_use]
    pub fn get_full_cell(&self, s: CellKey) -> Option<&FullCell<V, D>> {
        self.full_cells.get(s)
    }

    /// Returns a mutable vertex record for `v`, or `None` for a dead
    /// handle. Only the payload is writable through it.
    #[must_use]
    pub fn get_vertex_mut(&mut self, v: VertexKey) -> Option<&mut Vertex<U>> {
        self.vertices.get_mut(v)
    }

    /// Returns a mutable full-cell record for `s`, or `None` for a dead
    /// handle. Only the payload is writable through it.
    #[must_use]
    pub fn get_full_cell_mut(&mut self, s: CellKey) -> Option<&mut FullCell<V, D>> {
        self.full_cells.get_mut(s)
    }

    /// Returns `true` when `v` names a live vertex of this triangulation.
    #[must_use]
    pub fn contains_vertex(&self, v: VertexKey) -> bool {
        self.vertices.contains_key(v)
    }

    /// Returns `true` when `s` names a live full cell of this
    /// triangulation.
    #[must_use]
    pub fn contains_full_cell(&self, s: CellKey) -> bool {
        self.full_cells.contains_key(s)
    }

    /// Returns `true` when `i` is a valid slot index at the current
    /// dimension: `0..=d` for `d >= 0`, and only `0` below that.
    #[must_use]
    pub fn check_range(&self, i: usize) -> bool {
        if self.current_dimension < 0 {
            i == 0
        } else {
            i <= self.current_dimension.unsigned_abs() as usize
        }
    }

    /// Returns the vertex at slot `i` of full cell `s`.
    ///
    /// # Panics
    ///
    /// Panics if `s` is dead, `i` is out of range at the current dimension,
    /// or the slot is unset.
    #[must_use]
    pub fn vertex(&self, s: CellKey, i: usize) -> VertexKey {
        assert!(self.check_range(i), "slot {i} is out of range at the current dimension");
        match self.full_cells[s].vertex(i) {
            Some(v) => v,
            None => panic!("vertex slot {i} of full cell {s:?} is unset"),
        }
    }

    /// Returns the full cell sharing the facet of `s` opposite slot `i`.
    ///
    /// # Panics
    ///
    /// Panics if `s` is dead, `i` is out of range at the current dimension,
    /// or the slot is unset.
    #[must_use]
    pub fn neighbor(&self, s: CellKey, i: usize) -> CellKey {
        assert!(self.check_range(i), "slot {i} is out of range at the current dimension");
        match self.full_cells[s].neighbor(i) {
            Some(n) => n,
            None => panic!("neighbor slot {i} of full cell {s:?} is unset"),
        }
    }

    /// Returns the mirror index of facet `i` of `s`: the slot under which
    /// `neighbor(s, i)` records the shared facet.
    ///
    /// # Panics
    ///
    /// Panics if `s` is dead, `i` is out of range at the current dimension,
    /// or the slot is unset.
    #[must_use]
    pub fn mirror_index(&self, s: CellKey, i: usize) -> usize {
        assert!(self.check_range(i), "slot {i} is out of range at the current dimension");
        match self.full_cells[s].mirror_index(i) {
            Some(j) => j,
            None => panic!("mirror index slot {i} of full cell {s:?} is unset"),
        }
    }

    /// Returns the vertex of `neighbor(s, i)` opposite the facet shared
    /// with `s`.
    ///
    /// # Panics
    ///
    /// Panics under the conditions of [`neighbor`](Self::neighbor) and
    /// [`mirror_index`](Self::mirror_index).
    #[must_use]
    pub fn mirror_vertex(&self, s: CellKey, i: usize) -> VertexKey {
        self.vertex(self.neighbor(s, i), self.mirror_index(s, i))
    }

    /// Returns the full cell that vertex `v` points back to.
    ///
    /// # Panics
    ///
    /// Panics if `v` is dead or not anchored to any cell.
    #[must_use]
    pub fn full_cell_of(&self, v: VertexKey) -> CellKey {
        match self.vertices[v].incident_cell() {
            Some(s) => s,
            None => panic!("vertex {v:?} is not anchored to any full cell"),
        }
    }

    /// Resolves the `i`-th spanning vertex of a face.
    ///
    /// # Panics
    ///
    /// Panics if the face's cell is dead, `i` is out of range for the face,
    /// or the named slot is unset.
    #[must_use]
    pub fn face_vertex(&self, f: &Face, i: usize) -> VertexKey {
        self.vertex(f.full_cell(), f.index(i))
    }

    /// Builds the 0-face encoding of vertex `v` anchored at its
    /// back-reference cell.
    ///
    /// # Panics
    ///
    /// Panics if `v` is dead, unanchored, or its back-reference cell does
    /// not contain it.
    #[must_use]
    pub fn vertex_face(&self, v: VertexKey) -> Face {
        let s = self.full_cell_of(v);
        let Some(idx) = self.full_cells[s].index_of(v) else {
            panic!("the full cell incident to vertex {v:?} does not contain it")
        };
        Face::with_indices(s, &[idx])
    }
}

// =============================================================================
// FACET AND ROTOR ALGEBRA
// =============================================================================

impl<U, V, const D: usize> Tds<U, V, D>
where
    U: Payload,
    V: Payload,
{
    /// Rotates a rotor one step around its ridge.
    ///
    /// The rotation crosses the facet opposite the rotor's first covertex
    /// into the neighboring cell; there, the old second covertex becomes
    /// the new first covertex and the slot we arrived through becomes the
    /// new second covertex. Repeated rotation visits every full cell of the
    /// fan around the ridge.
    ///
    /// # Panics
    ///
    /// Panics if the rotor's slots are out of range, a crossed slot is
    /// unset, or the neighbor does not share the ridge (a broken shared-
    /// facet invariant).
    #[must_use]
    pub fn rotate_rotor(&self, r: Rotor) -> Rotor {
        let opposite = self.mirror_index(r.full_cell(), r.index_of_covertex());
        let s = self.neighbor(r.full_cell(), r.index_of_covertex());
        let second = self.vertex(r.full_cell(), r.index_of_second_covertex());
        let Some(new_second) = self.full_cells[s].index_of(second) else {
            panic!("rotor rotation crossed into a cell that does not share the ridge")
        };
        Rotor::new(s, new_second, opposite)
    }

    /// Returns `true` when `f` lies on the boundary of the currently tagged
    /// region: its cell is marked visited while the neighbor across it is
    /// not.
    ///
    /// # Panics
    ///
    /// Panics if the facet's cell is dead or the crossed slot is unset.
    #[must_use]
    pub fn is_boundary_facet(&self, f: Facet) -> bool {
        if self.get_visited(self.neighbor(f.full_cell(), f.index_of_covertex())) {
            return false;
        }
        self.get_visited(f.full_cell())
    }

    /// Re-aims the back-reference of `v` at `s` without touching any cell
    /// slot.
    pub(crate) fn anchor_vertex(&mut self, v: VertexKey, s: CellKey) {
        self.vertices[v].incident_cell = Some(s);
    }

    /// Direct mutable access to a cell record for the update algorithms.
    ///
    /// Panics on a dead handle.
    pub(crate) fn cell_mut(&mut self, s: CellKey) -> &mut FullCell<V, D> {
        &mut self.full_cells[s]
    }

    pub(crate) fn get_visited(&self, s: CellKey) -> bool {
        self.full_cells[s].scratch().is_visited()
    }

    pub(crate) fn set_visited(&mut self, s: CellKey, visited: bool) {
        let scratch = self.full_cells[s].scratch_mut();
        if visited {
            scratch.mark_visited();
        } else {
            scratch.clear_visited();
        }
    }
}

// =============================================================================
// PRIMITIVE MUTATORS
// =============================================================================

impl<U, V, const D: usize> Tds<U, V, D>
where
    U: Payload,
    V: Payload,
{
    /// Resets the triangulation to empty: both pools are cleared and the
    /// current dimension drops to -2.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.full_cells.clear();
        self.current_dimension = -2;
    }

    /// Sets the current dimension.
    ///
    /// Reserved for algorithms that atomically produce a consistent state
    /// at the new dimension; calling it in isolation leaves the structure
    /// invalid.
    ///
    /// # Panics
    ///
    /// Panics unless `-1 <= d <= D`.
    pub fn set_current_dimension(&mut self, d: i32) {
        assert!(
            (-1..=self.ambient_dimension()).contains(&d),
            "current dimension {d} outside [-1, {D}]"
        );
        self.current_dimension = d;
    }

    /// Allocates a full cell with all slots unset.
    pub fn new_full_cell(&mut self) -> CellKey {
        self.full_cells.insert(FullCell::unset())
    }

    /// Allocates a full cell whose slots and payload are copied from `s`.
    ///
    /// The copy gets a fresh identity and clear scratch bits; the caller is
    /// expected to rewire the copied slots.
    ///
    /// # Panics
    ///
    /// Panics if `s` is dead.
    pub fn new_full_cell_from(&mut self, s: CellKey) -> CellKey {
        let template = FullCell::from_template(&self.full_cells[s]);
        self.full_cells.insert(template)
    }

    /// Deallocates full cell `s`. The caller guarantees the cell is
    /// detached: nothing else refers to it.
    ///
    /// # Panics
    ///
    /// Panics if `s` is dead.
    pub fn delete_full_cell(&mut self, s: CellKey) {
        assert!(
            self.full_cells.remove(s).is_some(),
            "full cell {s:?} is not in the triangulation"
        );
    }

    /// Deallocates every full cell in `cells`.
    ///
    /// # Panics
    ///
    /// Panics if any handle is dead.
    pub fn delete_full_cells<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = CellKey>,
    {
        for s in cells {
            self.delete_full_cell(s);
        }
    }

    /// Allocates a vertex carrying `data`, not yet anchored to any cell.
    pub fn new_vertex(&mut self, data: Option<U>) -> VertexKey {
        self.vertices.insert(Vertex::new(data))
    }

    /// Deallocates vertex `v`, dropping its payload.
    ///
    /// # Panics
    ///
    /// Panics if `v` is dead.
    pub fn delete_vertex(&mut self, v: VertexKey) {
        assert!(
            self.vertices.remove(v).is_some(),
            "vertex {v:?} is not in the triangulation"
        );
    }

    /// Puts vertex `v` into slot `i` of full cell `s` and anchors `v`'s
    /// back-reference to `s`.
    ///
    /// Intentionally one-sided: neighbor and mirror slots are left alone.
    ///
    /// # Panics
    ///
    /// Panics if either handle is dead or null, or `i` is out of range at
    /// the current dimension.
    pub fn associate_vertex_with_full_cell(&mut self, s: CellKey, i: usize, v: VertexKey) {
        assert!(self.check_range(i), "slot {i} is out of range at the current dimension");
        assert!(!v.is_null(), "cannot associate the null vertex handle");
        assert!(self.contains_vertex(v), "vertex {v:?} is not in the triangulation");
        self.full_cells[s].set_vertex(i, Some(v));
        self.vertices[v].incident_cell = Some(s);
    }

    /// Establishes the symmetric neighbor link between facet `i` of `s` and
    /// facet `j` of `t`, setting both neighbor slots and both mirror
    /// indices.
    ///
    /// # Panics
    ///
    /// Panics if either handle is dead or null, or either index is out of
    /// range at the current dimension.
    pub fn set_neighbors(&mut self, s: CellKey, i: usize, t: CellKey, j: usize) {
        assert!(self.check_range(i), "slot {i} is out of range at the current dimension");
        assert!(self.check_range(j), "slot {j} is out of range at the current dimension");
        assert!(!s.is_null() && !t.is_null(), "cannot link through a null cell handle");
        if s == t {
            let cell = &mut self.full_cells[s];
            cell.set_neighbor(i, Some(t));
            cell.set_neighbor(j, Some(s));
            cell.set_mirror_index(i, Some(j));
            cell.set_mirror_index(j, Some(i));
        } else {
            let Some([cs, ct]) = self.full_cells.get_disjoint_mut([s, t]) else {
                panic!("cannot link dead full cells {s:?} and {t:?}")
            };
            cs.set_neighbor(i, Some(t));
            ct.set_neighbor(j, Some(s));
            cs.set_mirror_index(i, Some(j));
            ct.set_mirror_index(j, Some(i));
        }
    }

    /// Swaps slots `i` and `j` of full cell `s` across all three slot
    /// arrays, then re-aims the mirror indices of the two live neighbors so
    /// the involution keeps holding.
    ///
    /// A neighbor slot referring to an already-deleted cell is left alone;
    /// the dimension-decrease algorithm swaps slots while the far side of
    /// the collapse is being torn down.
    ///
    /// # Panics
    ///
    /// Panics if `s` is dead or an index exceeds the ambient slot range.
    pub fn swap_vertex_slots(&mut self, s: CellKey, i: usize, j: usize) {
        if i == j {
            return;
        }
        let cell = &mut self.full_cells[s];
        cell.swap_slots(i, j);
        let fixes = [
            (cell.neighbor(i), cell.mirror_index(i), i),
            (cell.neighbor(j), cell.mirror_index(j), j),
        ];
        for (neighbor, mirror, slot) in fixes {
            if let (Some(n), Some(m)) = (neighbor, mirror) {
                if let Some(ncell) = self.full_cells.get_mut(n) {
                    ncell.set_mirror_index(m, Some(slot));
                }
            }
        }
    }
}
