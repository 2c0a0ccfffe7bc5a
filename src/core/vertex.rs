//! Vertex record of the triangulation data structure.
//!
//! A vertex owns an opaque payload and one back-reference to some full cell
//! that contains it. Everything else about a vertex (its star, its incident
//! faces) is derived on demand from the full-cell pool.

use uuid::Uuid;

use crate::core::traits::payload::Payload;
use crate::core::triangulation_data_structure::CellKey;
use crate::core::util::make_uuid;

/// A vertex of the simplicial complex.
///
/// # Properties
///
/// - **`uuid`**: unique identifier, assigned at allocation and never reused.
/// - **`incident_cell`**: key of one full cell whose vertex list contains
///   this vertex. Maintained by the triangulation; `None` only transiently
///   while an update algorithm is rewiring the complex.
/// - **`data`**: optional opaque payload. The triangulation moves it around
///   but never inspects it.
#[derive(Clone, Copy, Debug)]
pub struct Vertex<U>
where
    U: Payload,
{
    /// Unique identifier of the vertex.
    uuid: Uuid,
    /// One full cell containing this vertex; managed by the triangulation.
    pub(crate) incident_cell: Option<CellKey>,
    /// Optional payload associated with the vertex.
    pub data: Option<U>,
}

impl<U> Vertex<U>
where
    U: Payload,
{
    /// Creates a vertex carrying `data`, not yet anchored to any full cell.
    #[must_use]
    pub(crate) fn new(data: Option<U>) -> Self {
        Self {
            uuid: make_uuid(),
            incident_cell: None,
            data,
        }
    }

    /// Returns the unique identifier of this vertex.
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the key of one full cell containing this vertex, or `None`
    /// if the vertex has not been anchored yet.
    #[must_use]
    pub const fn incident_cell(&self) -> Option<CellKey> {
        self.incident_cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_vertex_is_unanchored() {
        let v: Vertex<u32> = Vertex::new(Some(7));
        assert!(v.incident_cell().is_none());
        assert_eq!(v.data, Some(7));
        assert!(!v.uuid().is_nil());
    }

    #[test]
    fn vertices_get_distinct_uuids() {
        let a: Vertex<()> = Vertex::new(None);
        let b: Vertex<()> = Vertex::new(None);
        assert_ne!(a.uuid(), b.uuid());
    }
}
