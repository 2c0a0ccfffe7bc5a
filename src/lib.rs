//! # simplicial-tds
//!
//! A **combinatorial triangulation data structure** for abstract simplicial
//! complexes of arbitrary dimension, inspired by
//! [CGAL](https://www.cgal.org)'s d-dimensional triangulation data
//! structure.
//!
//! The structure represents a pure d-dimensional pseudo-manifold: a
//! connected collection of *full cells* (d-simplices) glued along their
//! (d-1)-dimensional *facets* so that every facet is shared by exactly two
//! full cells. Only vertices and full cells are stored; edges, triangles
//! and every other lower-dimensional face are derived on demand from the
//! full-cell/vertex incidence and the neighbor relation.
//!
//! There is **no geometry** in this crate: no coordinates, no predicates,
//! no Delaunay property. Vertex and cell payloads are opaque `Copy` data
//! the structure moves around but never interprets. Geometric triangulation
//! layers are expected to drive this structure from the outside.
//!
//! # Features
//!
//! - Current dimension evolving at runtime from the empty triangulation
//!   (-2) up to the compile-time ambient dimension `D`
//! - Handle-stable vertex and full-cell pools (slot maps): handles survive
//!   unrelated inserts and erases
//! - Star replacement (hole insertion): replace any tagged topological ball
//!   of full cells with the star of a new vertex
//! - Point-in-cell, point-in-face and point-in-facet insertion drivers
//! - Dimension-increasing insertion (coning every cell to a new apex) and
//!   its inverse, with the "infinite vertex" convention for unbounded cells
//! - Face collapse, incidence and star gathering, k-face enumeration
//! - Structural validation and a bit-exact serialization bridge with
//!   pluggable payload codecs
//!
//! # Basic usage
//!
//! A triangulation is grown from nothing with
//! [`insert_increase_dimension`](core::triangulation_data_structure::Tds::insert_increase_dimension):
//! the first vertex conventionally models the point at infinity, and each
//! later call cones the whole triangulation over a new vertex. Once the
//! target dimension is reached, vertices are inserted by splitting cells,
//! facets or faces.
//!
//! ```rust
//! use simplicial_tds::prelude::*;
//!
//! // Build the boundary complex of a triangle: d = 2, one finite cell and
//! // three cells through the infinite vertex.
//! let mut tds: Tds<(), (), 2> = Tds::new();
//! let inf = tds.insert_increase_dimension(None).unwrap();
//! for _ in 0..3 {
//!     tds.insert_increase_dimension(Some(inf)).unwrap();
//! }
//! assert_eq!(tds.current_dimension(), 2);
//! assert_eq!(tds.number_of_full_cells(), 4);
//!
//! // Split the unique finite cell by a new vertex.
//! let finite = tds
//!     .full_cells()
//!     .iter()
//!     .find(|(_, cell)| !cell.has_vertex(inf))
//!     .map(|(key, _)| key)
//!     .unwrap();
//! let v = tds.insert_in_full_cell(finite).unwrap();
//!
//! assert_eq!(tds.number_of_vertices(), 5);
//! assert_eq!(tds.number_of_full_cells(), 6);
//! assert_eq!(tds.incident_full_cells_of_vertex(v).len(), 3);
//! assert!(tds.is_valid().is_ok());
//! ```
//!
//! # Contracts
//!
//! Editing operations return [`TdsError`](core::triangulation_data_structure::TdsError)
//! for the checkable argument and state violations. The low-level primitive
//! mutators and accessors treat violated preconditions, such as dead handles or
//! out-of-range slots, as programming errors and panic. Every public
//! operation either completes or leaves the structure untouched; the
//! serialization reader leaves it cleared on a malformed stream.

#![forbid(unsafe_code)]

/// Core data structures and the update algorithms.
pub mod core {
    /// The triangulation update algorithms.
    pub mod algorithms {
        /// Dimension-increasing insertion and its inverse.
        pub mod dimension;
        /// Star replacement: hole insertion and its thin drivers.
        pub mod hole;
    }
    pub mod cell;
    /// Collection aliases: pools, small buffers, fast hashing.
    pub mod collections;
    pub mod face;
    pub mod io;
    pub mod traversal;
    pub mod triangulation_data_structure;
    pub mod util;
    pub mod validation;
    pub mod vertex;
    /// Traits for payload data carried by vertices and full cells.
    pub mod traits {
        pub mod payload;
        pub use payload::*;
    }
    pub use cell::*;
    pub use face::*;
    pub use traits::*;
    pub use triangulation_data_structure::*;
    pub use validation::*;
    pub use vertex::*;
}

/// Re-exports of the commonly used types.
pub mod prelude {
    pub use crate::core::{
        cell::{CellScratch, FullCell},
        face::{Face, Facet, Rotor},
        io::{JsonPayloadCodec, PayloadCodec, TdsIoError, WireMode},
        traits::payload::Payload,
        traversal::{IncidentCellsPredicate, StarPredicate, TraversalPredicate},
        triangulation_data_structure::{CellKey, Tds, TdsError, VertexKey},
        validation::TdsValidationError,
        vertex::Vertex,
    };
    pub use crate::core::collections::{FastHashMap, FastHashSet, SmallBuffer};
}

#[cfg(test)]
mod tests {
    use crate::core::face::Facet;
    use crate::core::triangulation_data_structure::{CellKey, Tds, VertexKey};

    fn assert_auto_traits<T: Sized + Send + Sync + Unpin>() {}

    #[test]
    fn public_types_implement_auto_traits() {
        assert_auto_traits::<Tds<(), (), 3>>();
        assert_auto_traits::<VertexKey>();
        assert_auto_traits::<CellKey>();
        assert_auto_traits::<Facet>();
    }

    #[test]
    fn null_keys_are_distinguished() {
        let mut tds: Tds<(), (), 2> = Tds::new();
        let v = tds.new_vertex(None);
        assert_ne!(v, VertexKey::default());
        assert!(!tds.contains_vertex(VertexKey::default()));
        assert!(!tds.contains_full_cell(CellKey::default()));
    }
}
