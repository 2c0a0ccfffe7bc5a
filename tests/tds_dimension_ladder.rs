//! Dimension ladder tests: growing a triangulation from nothing with
//! `insert_increase_dimension` and shrinking it back with
//! `remove_decrease_dimension`.

use std::collections::HashMap;

use simplicial_tds::prelude::*;
use uuid::Uuid;

/// Asserts the universal invariants: structural validity plus the facet
/// counting identity (every facet shared by exactly two full cells).
fn assert_invariants<const D: usize>(tds: &Tds<(), (), D>) {
    tds.is_valid().unwrap();
    let d = tds.current_dimension();
    if d >= 1 {
        let dim = usize::try_from(d).unwrap();
        let mut facets: HashMap<Vec<VertexKey>, usize> = HashMap::new();
        for cell in tds.full_cells().values() {
            for i in 0..=dim {
                let mut facet: Vec<VertexKey> = (0..=dim)
                    .filter(|&j| j != i)
                    .map(|j| cell.vertex(j).unwrap())
                    .collect();
                facet.sort();
                *facets.entry(facet).or_insert(0) += 1;
            }
        }
        assert!(
            facets.values().all(|&count| count == 2),
            "every facet must be shared by exactly two full cells"
        );
        assert_eq!(tds.number_of_full_cells() * (dim + 1), 2 * facets.len());
    }
}

/// Canonical snapshot of the complex: the multiset of cells as sorted
/// vertex-uuid tuples, independent of pool slots and slot order.
fn canonical_cells<const D: usize>(tds: &Tds<(), (), D>) -> Vec<Vec<Uuid>> {
    let d = usize::try_from(tds.current_dimension().max(0)).unwrap();
    let mut cells: Vec<Vec<Uuid>> = tds
        .full_cells()
        .values()
        .map(|cell| {
            let mut corners: Vec<Uuid> = (0..=d)
                .map(|i| tds.get_vertex(cell.vertex(i).unwrap()).unwrap().uuid())
                .collect();
            corners.sort();
            corners
        })
        .collect();
    cells.sort();
    cells
}

#[test]
fn ladder_from_empty_to_triangle_boundary() {
    let mut tds: Tds<(), (), 2> = Tds::new();
    assert_eq!(tds.current_dimension(), -2);
    assert!(tds.is_empty());

    let inf = tds.insert_increase_dimension(None).unwrap();
    assert_eq!(tds.current_dimension(), -1);
    assert_eq!(tds.number_of_vertices(), 1);
    assert_eq!(tds.number_of_full_cells(), 1);
    tds.is_valid().unwrap();

    tds.insert_increase_dimension(Some(inf)).unwrap();
    assert_eq!(tds.current_dimension(), 0);
    assert_eq!(tds.number_of_vertices(), 2);
    assert_eq!(tds.number_of_full_cells(), 2);
    tds.is_valid().unwrap();

    tds.insert_increase_dimension(Some(inf)).unwrap();
    assert_eq!(tds.current_dimension(), 1);
    assert_eq!(tds.number_of_vertices(), 3);
    assert_eq!(tds.number_of_full_cells(), 3);
    assert_invariants(&tds);

    tds.insert_increase_dimension(Some(inf)).unwrap();
    assert_eq!(tds.current_dimension(), 2);
    assert_eq!(tds.number_of_vertices(), 4);
    assert_eq!(tds.number_of_full_cells(), 4);
    assert_invariants(&tds);

    // exactly one cell avoids the infinite vertex: the finite triangle
    let finite = tds
        .full_cells()
        .values()
        .filter(|cell| !cell.has_vertex(inf))
        .count();
    assert_eq!(finite, 1);
}

#[test]
fn ladder_reaches_the_ambient_dimension_and_stops() {
    let mut tds: Tds<(), (), 3> = Tds::new();
    let inf = tds.insert_increase_dimension(None).unwrap();
    for _ in 0..3 {
        tds.insert_increase_dimension(Some(inf)).unwrap();
    }
    assert_eq!(tds.current_dimension(), 3);
    assert_eq!(tds.number_of_vertices(), 5);
    assert_eq!(tds.number_of_full_cells(), 5);
    assert_invariants(&tds);

    assert!(matches!(
        tds.insert_increase_dimension(Some(inf)),
        Err(TdsError::AmbientDimensionReached { ambient: 3 })
    ));
}

#[test]
fn star_argument_must_match_the_state() {
    let mut tds: Tds<(), (), 2> = Tds::new();
    let bogus = tds.new_vertex(None);
    tds.delete_vertex(bogus);
    assert!(matches!(
        tds.insert_increase_dimension(Some(bogus)),
        Err(TdsError::StarArgumentMismatch { current_dimension: -2 })
    ));

    let inf = tds.insert_increase_dimension(None).unwrap();
    assert!(matches!(
        tds.insert_increase_dimension(None),
        Err(TdsError::StarArgumentMismatch { current_dimension: -1 })
    ));
    assert!(matches!(
        tds.insert_increase_dimension(Some(bogus)),
        Err(TdsError::VertexNotFound { .. })
    ));
    let _ = inf;
}

#[test]
fn increase_then_remove_restores_the_triangulation() {
    // R3 at every rung of a 4-dimensional ladder
    let mut tds: Tds<(), (), 4> = Tds::new();
    let inf = tds.insert_increase_dimension(None).unwrap();
    for _ in 0..3 {
        tds.insert_increase_dimension(Some(inf)).unwrap();
    }

    for _ in 0..2 {
        let before_dimension = tds.current_dimension();
        let before_vertices = tds.number_of_vertices();
        let before_cells = canonical_cells(&tds);

        let apex = tds.insert_increase_dimension(Some(inf)).unwrap();
        assert_invariants(&tds);
        tds.remove_decrease_dimension(apex, inf).unwrap();

        assert_eq!(tds.current_dimension(), before_dimension);
        assert_eq!(tds.number_of_vertices(), before_vertices);
        assert_eq!(canonical_cells(&tds), before_cells);
        assert_invariants(&tds);
    }
}

#[test]
fn remove_walks_the_ladder_all_the_way_down() {
    let mut tds: Tds<(), (), 3> = Tds::new();
    let inf = tds.insert_increase_dimension(None).unwrap();
    let mut apexes = Vec::new();
    for _ in 0..3 {
        apexes.push(tds.insert_increase_dimension(Some(inf)).unwrap());
    }

    while let Some(apex) = apexes.pop() {
        tds.remove_decrease_dimension(apex, inf).unwrap();
        tds.is_valid().unwrap();
    }
    assert_eq!(tds.current_dimension(), -1);
    assert_eq!(tds.number_of_vertices(), 1);

    tds.remove_decrease_dimension(inf, inf).unwrap();
    assert!(tds.is_empty());
    tds.is_valid().unwrap();
}

#[test]
fn vertex_inserted_in_a_cell_is_not_removable() {
    // scenario: in d = 3, a vertex split into a full cell is not the apex
    // of the dimension and must be rejected
    let mut tds: Tds<(), (), 3> = Tds::new();
    let inf = tds.insert_increase_dimension(None).unwrap();
    for _ in 0..3 {
        tds.insert_increase_dimension(Some(inf)).unwrap();
    }
    let finite = tds
        .full_cells()
        .iter()
        .find(|(_, cell)| !cell.has_vertex(inf))
        .map(|(key, _)| key)
        .unwrap();
    let v = tds.insert_in_full_cell(finite).unwrap();
    assert_invariants(&tds);

    assert!(matches!(
        tds.remove_decrease_dimension(v, inf),
        Err(TdsError::VertexNotRemovable { .. })
    ));
    // the rejected removal must leave the structure untouched
    assert_invariants(&tds);
    assert_eq!(tds.number_of_vertices(), 6);
    assert_eq!(tds.number_of_full_cells(), 8);
}

#[test]
fn removing_from_an_empty_triangulation_is_an_error() {
    let mut tds: Tds<(), (), 2> = Tds::new();
    let v = tds.new_vertex(None);
    assert!(matches!(
        tds.remove_decrease_dimension(v, v),
        Err(TdsError::DimensionOutOfRange { found: -2, .. })
    ));
    tds.delete_vertex(v);
}
