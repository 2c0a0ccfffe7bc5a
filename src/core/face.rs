//! Sub-simplex encodings: facets, rotors and faces.
//!
//! All three types name a sub-simplex of the complex through an enclosing
//! full cell and slot indices into that cell's vertex array, so they stay
//! valid exactly as long as the enclosing cell does.
//!
//! A [`Facet`] is a codimension-1 sub-simplex: the facet of a cell opposite
//! one of its vertices. A [`Rotor`] is a codimension-2 sub-simplex together
//! with a direction of rotation around it; it is the walker used to hop from
//! cell to cell inside the fan of cells incident to a ridge. A [`Face`] is a
//! sub-simplex of any feature dimension, named by an ordered list of slot
//! indices.

use crate::core::collections::{MAX_PRACTICAL_DIMENSION_SIZE, SlotIndex, SmallBuffer};
use crate::core::triangulation_data_structure::CellKey;

/// A facet: the codimension-1 face of `full_cell` opposite slot `covertex`.
///
/// Every interior facet has two encodings, one through each of the two cells
/// sharing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Facet {
    full_cell: CellKey,
    covertex: SlotIndex,
}

impl Facet {
    /// Encodes the facet of `full_cell` opposite vertex slot `covertex`.
    ///
    /// # Panics
    ///
    /// Panics if `covertex` exceeds the slot index range.
    #[must_use]
    pub fn new(full_cell: CellKey, covertex: usize) -> Self {
        Self {
            full_cell,
            covertex: SlotIndex::try_from(covertex)
                .expect("covertex index exceeds the cell slot range"),
        }
    }

    /// Returns the enclosing full cell.
    #[must_use]
    pub const fn full_cell(&self) -> CellKey {
        self.full_cell
    }

    /// Returns the slot of the vertex opposite this facet.
    #[must_use]
    pub const fn index_of_covertex(&self) -> usize {
        self.covertex as usize
    }
}

/// A rotor: a codimension-2 sub-simplex plus a direction of rotation.
///
/// The ridge is the face of `full_cell` opposite slots `covertex` and
/// `second_covertex`. Rotating crosses the facet opposite `covertex`; the
/// second covertex remembers where the previous rotation came from, which is
/// exactly the slot a newly built cell must be linked through during hole
/// insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rotor {
    full_cell: CellKey,
    covertex: SlotIndex,
    second_covertex: SlotIndex,
}

impl Rotor {
    /// Encodes the ridge of `full_cell` opposite slots `covertex` and
    /// `second_covertex`.
    ///
    /// # Panics
    ///
    /// Panics if the two slots coincide or exceed the slot index range.
    #[must_use]
    pub fn new(full_cell: CellKey, covertex: usize, second_covertex: usize) -> Self {
        assert_ne!(
            covertex, second_covertex,
            "a rotor needs two distinct covertex slots"
        );
        Self {
            full_cell,
            covertex: SlotIndex::try_from(covertex)
                .expect("covertex index exceeds the cell slot range"),
            second_covertex: SlotIndex::try_from(second_covertex)
                .expect("covertex index exceeds the cell slot range"),
        }
    }

    /// Returns the enclosing full cell.
    #[must_use]
    pub const fn full_cell(&self) -> CellKey {
        self.full_cell
    }

    /// Returns the slot of the first covertex, opposite the facet the next
    /// rotation crosses.
    #[must_use]
    pub const fn index_of_covertex(&self) -> usize {
        self.covertex as usize
    }

    /// Returns the slot of the second covertex.
    #[must_use]
    pub const fn index_of_second_covertex(&self) -> usize {
        self.second_covertex as usize
    }

    /// Returns the candidate boundary facet of this rotor: the facet of
    /// `full_cell` opposite the first covertex.
    #[must_use]
    pub const fn candidate_facet(&self) -> Facet {
        Facet {
            full_cell: self.full_cell,
            covertex: self.covertex,
        }
    }
}

/// A face of arbitrary feature dimension k: an enclosing full cell plus an
/// ordered list of k + 1 slot indices naming the spanning vertices.
///
/// Resolving slots to vertex keys goes through the owning
/// [`Tds`](crate::core::triangulation_data_structure::Tds), which also
/// builds faces for common queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Face {
    full_cell: CellKey,
    indices: SmallBuffer<SlotIndex, MAX_PRACTICAL_DIMENSION_SIZE>,
}

impl Face {
    /// Creates an empty face anchored at `full_cell`, to be filled with
    /// [`set_index`](Self::set_index).
    #[must_use]
    pub fn new(full_cell: CellKey) -> Self {
        Self {
            full_cell,
            indices: SmallBuffer::new(),
        }
    }

    /// Creates a face anchored at `full_cell` spanning the given slots.
    ///
    /// # Panics
    ///
    /// Panics if `indices` is empty or a slot exceeds the slot index range.
    #[must_use]
    pub fn with_indices(full_cell: CellKey, indices: &[usize]) -> Self {
        assert!(!indices.is_empty(), "a face needs at least one vertex slot");
        let mut face = Self::new(full_cell);
        for (i, &slot) in indices.iter().enumerate() {
            face.set_index(i, slot);
        }
        face
    }

    /// Returns the enclosing full cell.
    #[must_use]
    pub const fn full_cell(&self) -> CellKey {
        self.full_cell
    }

    /// Returns the feature dimension of this face: one less than the number
    /// of spanning vertices, or -1 for an empty face.
    #[must_use]
    pub fn feature_dimension(&self) -> i32 {
        i32::try_from(self.indices.len()).unwrap_or(i32::MAX) - 1
    }

    /// Returns the cell slot of the `i`-th spanning vertex.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    #[must_use]
    pub fn index(&self, i: usize) -> usize {
        usize::from(self.indices[i])
    }

    /// Sets the `i`-th spanning vertex to cell slot `slot`, growing the face
    /// by one when `i` is the current vertex count.
    ///
    /// # Panics
    ///
    /// Panics if `i` is past the end of the face or `slot` exceeds the slot
    /// index range.
    pub fn set_index(&mut self, i: usize, slot: usize) {
        let slot =
            SlotIndex::try_from(slot).expect("vertex slot exceeds the cell slot range");
        if i == self.indices.len() {
            self.indices.push(slot);
        } else {
            self.indices[i] = slot;
        }
    }
}
