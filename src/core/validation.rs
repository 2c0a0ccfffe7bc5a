//! Structural invariant checker.
//!
//! [`Tds::is_valid`] partially checks that the structure is an abstract
//! simplicial complex: pool sizes match the degenerate dimensions, every
//! vertex is a corner of the cell it points back to, no cell lists a vertex
//! twice, the neighbor relation is a mirror-indexed involution, and
//! neighboring cells share exactly the facet between them. Connectivity of
//! the adjacency graph is *not* checked; neither is it checked that cells
//! sharing d vertices are actually linked as neighbors.

use thiserror::Error;
use uuid::Uuid;

use crate::core::traits::payload::Payload;
use crate::core::triangulation_data_structure::Tds;

/// The first structural invariant [`Tds::is_valid`] found broken.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TdsValidationError {
    /// The triangulation claims to be empty but still owns elements.
    #[error("current dimension is -2 but the pools hold {vertices} vertices and {full_cells} full cells")]
    NonEmptyAtDimensionMinusTwo {
        /// Live vertex count.
        vertices: usize,
        /// Live full-cell count.
        full_cells: usize,
    },
    /// At dimension -1 the pools must hold exactly one vertex and one cell.
    #[error("current dimension is -1 but the pools hold {vertices} vertices and {full_cells} full cells instead of one of each")]
    WrongPoolsAtDimensionMinusOne {
        /// Live vertex count.
        vertices: usize,
        /// Live full-cell count.
        full_cells: usize,
    },
    /// A vertex has no back-reference to any full cell.
    #[error("vertex {vertex} is not anchored to any full cell")]
    UnanchoredVertex {
        /// Identifier of the offending vertex.
        vertex: Uuid,
    },
    /// A vertex's back-reference names an erased cell.
    #[error("vertex {vertex} points back to an erased full cell")]
    DeadBackReference {
        /// Identifier of the offending vertex.
        vertex: Uuid,
    },
    /// A vertex's back-reference cell does not list it.
    #[error("full cell {cell} does not contain vertex {vertex}, which points back to it")]
    BackReferenceMismatch {
        /// Identifier of the offending vertex.
        vertex: Uuid,
        /// Identifier of the cell it points back to.
        cell: Uuid,
    },
    /// A vertex slot within the current dimension is unset.
    #[error("full cell {cell} has an unset vertex slot {slot}")]
    EmptyVertexSlot {
        /// Identifier of the offending cell.
        cell: Uuid,
        /// The unset slot.
        slot: usize,
    },
    /// A vertex slot names an erased vertex.
    #[error("full cell {cell} lists an erased vertex at slot {slot}")]
    DeadVertexSlot {
        /// Identifier of the offending cell.
        cell: Uuid,
        /// The offending slot.
        slot: usize,
    },
    /// A cell lists the same vertex in two slots.
    #[error("full cell {cell} lists the same vertex twice")]
    DuplicateVertexInCell {
        /// Identifier of the offending cell.
        cell: Uuid,
    },
    /// A traversal scratch bit survived outside any traversal.
    #[error("full cell {cell} has a visited scratch bit set outside any traversal")]
    ScratchBitsSet {
        /// Identifier of the offending cell.
        cell: Uuid,
    },
    /// A neighbor slot within the current dimension is unset.
    #[error("full cell {cell} has no neighbor across facet {slot}")]
    MissingNeighbor {
        /// Identifier of the offending cell.
        cell: Uuid,
        /// The unset facet slot.
        slot: usize,
    },
    /// A neighbor slot names an erased cell.
    #[error("full cell {cell} has an erased neighbor across facet {slot}")]
    DeadNeighbor {
        /// Identifier of the offending cell.
        cell: Uuid,
        /// The offending facet slot.
        slot: usize,
    },
    /// A mirror index within the current dimension is unset.
    #[error("full cell {cell} has no mirror index for facet {slot}")]
    MissingMirrorIndex {
        /// Identifier of the offending cell.
        cell: Uuid,
        /// The offending facet slot.
        slot: usize,
    },
    /// Following a neighbor link and its mirror index does not lead back.
    #[error("the neighbor relation between full cells {cell} and {neighbor} across facet {slot} is not symmetric")]
    AsymmetricNeighbors {
        /// Identifier of the cell whose link was followed.
        cell: Uuid,
        /// Identifier of the neighbor it names.
        neighbor: Uuid,
        /// Facet slot of the followed link.
        slot: usize,
    },
    /// Neighboring cells do not share the d vertices of their common facet.
    #[error("full cells {cell} and {neighbor} do not share the facet across slot {slot}")]
    SharedFacetMismatch {
        /// Identifier of the cell whose facet was checked.
        cell: Uuid,
        /// Identifier of its neighbor across that facet.
        neighbor: Uuid,
        /// Facet slot that was checked.
        slot: usize,
    },
}

impl<U, V, const D: usize> Tds<U, V, D>
where
    U: Payload,
    V: Payload,
{
    /// Partially checks the structural invariants, reporting the first one
    /// found broken.
    ///
    /// Connectivity of the cell-adjacency graph is not verified.
    ///
    /// # Errors
    ///
    /// The returned [`TdsValidationError`] names the broken invariant and
    /// the elements involved.
    pub fn is_valid(&self) -> Result<(), TdsValidationError> {
        self.validate_pool_dimension_coherence()?;
        self.validate_back_references()?;
        if self.current_dimension() < 0 {
            return Ok(());
        }
        self.validate_cells()?;
        self.validate_adjacency()
    }

    fn validate_pool_dimension_coherence(&self) -> Result<(), TdsValidationError> {
        match self.current_dimension() {
            -2 if self.number_of_vertices() != 0 || self.number_of_full_cells() != 0 => {
                Err(TdsValidationError::NonEmptyAtDimensionMinusTwo {
                    vertices: self.number_of_vertices(),
                    full_cells: self.number_of_full_cells(),
                })
            }
            -1 if self.number_of_vertices() != 1 || self.number_of_full_cells() != 1 => {
                Err(TdsValidationError::WrongPoolsAtDimensionMinusOne {
                    vertices: self.number_of_vertices(),
                    full_cells: self.number_of_full_cells(),
                })
            }
            _ => Ok(()),
        }
    }

    fn validate_back_references(&self) -> Result<(), TdsValidationError> {
        let slots = usize::try_from(self.current_dimension().max(0)).unwrap_or(0) + 1;
        for (key, vertex) in self.vertices() {
            let Some(cell_key) = vertex.incident_cell() else {
                return Err(TdsValidationError::UnanchoredVertex {
                    vertex: vertex.uuid(),
                });
            };
            let Some(cell) = self.get_full_cell(cell_key) else {
                return Err(TdsValidationError::DeadBackReference {
                    vertex: vertex.uuid(),
                });
            };
            if !cell.vertices()[..slots].contains(&Some(key)) {
                return Err(TdsValidationError::BackReferenceMismatch {
                    vertex: vertex.uuid(),
                    cell: cell.uuid(),
                });
            }
        }
        Ok(())
    }

    fn validate_cells(&self) -> Result<(), TdsValidationError> {
        let slots = self.current_dimension().unsigned_abs() as usize + 1;
        for cell in self.full_cells().values() {
            if !cell.scratch().is_clear() {
                return Err(TdsValidationError::ScratchBitsSet { cell: cell.uuid() });
            }
            for (slot, entry) in cell.vertices()[..slots].iter().enumerate() {
                let Some(v) = entry else {
                    return Err(TdsValidationError::EmptyVertexSlot {
                        cell: cell.uuid(),
                        slot,
                    });
                };
                if !self.contains_vertex(*v) {
                    return Err(TdsValidationError::DeadVertexSlot {
                        cell: cell.uuid(),
                        slot,
                    });
                }
            }
            for i in 0..slots {
                for j in i + 1..slots {
                    if cell.vertices()[i] == cell.vertices()[j] {
                        return Err(TdsValidationError::DuplicateVertexInCell {
                            cell: cell.uuid(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_adjacency(&self) -> Result<(), TdsValidationError> {
        let dim = self.current_dimension().unsigned_abs() as usize;
        for (key, cell) in self.full_cells() {
            for i in 0..=dim {
                let Some(neighbor_key) = cell.neighbor(i) else {
                    return Err(TdsValidationError::MissingNeighbor {
                        cell: cell.uuid(),
                        slot: i,
                    });
                };
                let Some(neighbor) = self.get_full_cell(neighbor_key) else {
                    return Err(TdsValidationError::DeadNeighbor {
                        cell: cell.uuid(),
                        slot: i,
                    });
                };
                let Some(mirror) = cell.mirror_index(i) else {
                    return Err(TdsValidationError::MissingMirrorIndex {
                        cell: cell.uuid(),
                        slot: i,
                    });
                };
                if neighbor.neighbor(mirror) != Some(key) || neighbor.mirror_index(mirror) != Some(i)
                {
                    return Err(TdsValidationError::AsymmetricNeighbors {
                        cell: cell.uuid(),
                        neighbor: neighbor.uuid(),
                        slot: i,
                    });
                }
                // every corner of the shared facet must appear on the
                // neighbor, away from its covertex slot
                for j in (0..=dim).filter(|&j| j != i) {
                    let shared = (0..=dim)
                        .any(|k| k != mirror && neighbor.vertex(k) == cell.vertex(j));
                    if !shared {
                        return Err(TdsValidationError::SharedFacetMismatch {
                            cell: cell.uuid(),
                            neighbor: neighbor.uuid(),
                            slot: i,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type T3 = Tds<(), (), 3>;

    fn triangle_complex() -> Tds<(), (), 2> {
        let mut tds = Tds::new();
        let inf = tds.insert_increase_dimension(None).unwrap();
        for _ in 0..3 {
            tds.insert_increase_dimension(Some(inf)).unwrap();
        }
        tds
    }

    #[test]
    fn empty_triangulation_is_valid() {
        let tds = T3::new();
        assert!(tds.is_valid().is_ok());
    }

    #[test]
    fn dimension_ladder_states_are_valid() {
        let mut tds = T3::new();
        assert!(tds.is_valid().is_ok());
        let inf = tds.insert_increase_dimension(None).unwrap();
        assert!(tds.is_valid().is_ok());
        for _ in 0..3 {
            tds.insert_increase_dimension(Some(inf)).unwrap();
            assert!(tds.is_valid().is_ok());
        }
    }

    #[test]
    fn leftover_vertex_at_dimension_minus_two_is_reported() {
        let mut tds = T3::new();
        tds.new_vertex(None);
        assert!(matches!(
            tds.is_valid(),
            Err(TdsValidationError::NonEmptyAtDimensionMinusTwo { vertices: 1, .. })
        ));
    }

    #[test]
    fn unanchored_vertex_is_reported() {
        let mut tds = triangle_complex();
        tds.new_vertex(None);
        assert!(matches!(
            tds.is_valid(),
            Err(TdsValidationError::UnanchoredVertex { .. })
        ));
    }

    #[test]
    fn broken_symmetry_is_reported() {
        let mut tds = triangle_complex();
        let b = tds.full_cells().keys().nth(1).unwrap();
        // redirect one side of a symmetric link onto the cell itself
        tds.cell_mut(b).set_neighbor(1, Some(b));
        assert!(tds.is_valid().is_err());
    }
}
