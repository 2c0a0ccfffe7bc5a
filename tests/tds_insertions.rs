//! Point insertion and face collapse: splitting cells, facets and faces,
//! and contracting faces back to a vertex.

use std::collections::HashMap;

use simplicial_tds::prelude::*;

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
        assert!(facets.values().all(|&count| count == 2));
        assert_eq!(tds.number_of_full_cells() * (dim + 1), 2 * facets.len());
    }
}

/// Boundary complex of a triangle at d = 2, returning the infinite vertex.
fn triangle_complex() -> (Tds<(), (), 2>, VertexKey) {
    let mut tds = Tds::new();
    let inf = tds.insert_increase_dimension(None).unwrap();
    for _ in 0..3 {
        tds.insert_increase_dimension(Some(inf)).unwrap();
    }
    (tds, inf)
}

/// Boundary complex of a tetrahedron at d = 3, returning the infinite
/// vertex.
fn tetrahedron_complex() -> (Tds<(), (), 3>, VertexKey) {
    let mut tds = Tds::new();
    let inf = tds.insert_increase_dimension(None).unwrap();
    for _ in 0..3 {
        tds.insert_increase_dimension(Some(inf)).unwrap();
    }
    (tds, inf)
}

fn finite_cell<const D: usize>(tds: &Tds<(), (), D>, inf: VertexKey) -> CellKey {
    tds.full_cells()
        .iter()
        .find(|(_, cell)| !cell.has_vertex(inf))
        .map(|(key, _)| key)
        .unwrap()
}

#[test]
fn insert_in_full_cell_splits_the_finite_triangle() {
    let (mut tds, inf) = triangle_complex();
    let s = finite_cell(&tds, inf);

    let v = tds.insert_in_full_cell(s).unwrap();

    assert_eq!(tds.number_of_vertices(), 5);
    assert_eq!(tds.number_of_full_cells(), 6);
    assert_invariants(&tds);

    // the new vertex sits in the three cells replacing s; the infinite
    // cells are untouched
    assert_eq!(tds.incident_full_cells_of_vertex(v).len(), 3);
    assert_eq!(tds.incident_full_cells_of_vertex(inf).len(), 3);
}

#[test]
fn insert_in_facet_between_two_finite_cells() {
    let (mut tds, inf) = triangle_complex();
    let s = finite_cell(&tds, inf);
    tds.insert_in_full_cell(s).unwrap();

    // pick a facet shared by two finite cells
    let (cell, slot) = tds
        .full_cells()
        .iter()
        .find_map(|(key, record)| {
            if record.has_vertex(inf) {
                return None;
            }
            (0..3).find_map(|i| {
                let n = record.neighbor(i).unwrap();
                (!tds.full_cells()[n].has_vertex(inf)).then_some((key, i))
            })
        })
        .unwrap();

    let before_cells = tds.number_of_full_cells();
    let v = tds.insert_in_facet(Facet::new(cell, slot)).unwrap();

    assert_eq!(tds.number_of_vertices(), 6);
    assert_eq!(tds.number_of_full_cells(), before_cells + 2);
    assert_invariants(&tds);
    assert_eq!(tds.incident_full_cells_of_vertex(v).len(), 4);
}

#[test]
fn insert_in_full_cell_splits_a_tetrahedron() {
    let (mut tds, inf) = tetrahedron_complex();
    let s = finite_cell(&tds, inf);

    let v = tds.insert_in_full_cell(s).unwrap();

    assert_eq!(tds.number_of_vertices(), 6);
    assert_eq!(tds.number_of_full_cells(), 8);
    assert_invariants(&tds);
    assert_eq!(tds.incident_full_cells_of_vertex(v).len(), 4);
}

#[test]
fn insert_in_face_replaces_the_incident_cells() {
    let (mut tds, inf) = tetrahedron_complex();
    let s = finite_cell(&tds, inf);
    let apex = tds.insert_in_full_cell(s).unwrap();

    // a 1-face (edge) from the apex into the surrounding complex
    let cell = tds.incident_full_cells_of_vertex(apex)[0];
    let apex_slot = tds.full_cells()[cell].index_of(apex).unwrap();
    let other_slot = usize::from(apex_slot == 0);
    let edge = Face::with_indices(cell, &[apex_slot, other_slot]);

    let hole = tds.incident_full_cells(&edge);
    let dim = 3;
    // count the hole's boundary facets: that is how many cells the cone
    // will rebuild
    let mut boundary_facets = 0;
    for &h in &hole {
        for i in 0..=dim {
            let n = tds.full_cells()[h].neighbor(i).unwrap();
            if !hole.contains(&n) {
                boundary_facets += 1;
            }
        }
    }

    let before_vertices = tds.number_of_vertices();
    let before_cells = tds.number_of_full_cells();
    let v = tds.insert_in_face(&edge).unwrap();

    assert_eq!(tds.number_of_vertices(), before_vertices + 1);
    assert_eq!(
        tds.number_of_full_cells(),
        before_cells - hole.len() + boundary_facets
    );
    assert_invariants(&tds);
    assert_eq!(tds.incident_full_cells_of_vertex(v).len(), boundary_facets);
}

#[test]
fn collapse_face_contracts_an_edge() {
    let (mut tds, inf) = triangle_complex();
    let s = finite_cell(&tds, inf);
    let apex = tds.insert_in_full_cell(s).unwrap();
    assert_invariants(&tds);

    // contract an edge from the apex to one of the triangle's corners
    let cell = tds.incident_full_cells_of_vertex(apex)[0];
    let apex_slot = tds.full_cells()[cell].index_of(apex).unwrap();
    let other_slot = usize::from(apex_slot == 0);
    let edge = Face::with_indices(cell, &[apex_slot, other_slot]);

    // the star of the edge covers every cell except the one opposite it
    assert_eq!(tds.star(&edge).len(), 5);
    let before_vertices = tds.number_of_vertices();

    let merged = tds.collapse_face(&edge).unwrap();

    // two endpoints went away, one merged vertex arrived, and the cone
    // over the three boundary facets replaced the five-cell star
    assert_eq!(tds.number_of_vertices(), before_vertices - 1);
    assert!(tds.contains_vertex(merged));
    assert_eq!(tds.number_of_full_cells(), 4);
    assert_eq!(tds.incident_full_cells_of_vertex(merged).len(), 3);
    assert_invariants(&tds);
}

#[test]
fn collapse_rejects_faces_outside_the_admissible_range() {
    let (mut tds, inf) = triangle_complex();
    let s = finite_cell(&tds, inf);

    // feature dimension 0 is just a vertex
    let vertex_face = Face::with_indices(s, &[0]);
    assert!(matches!(
        tds.collapse_face(&vertex_face),
        Err(TdsError::FaceNotCollapsible {
            feature_dimension: 0,
            ..
        })
    ));

    // feature dimension d is a whole cell
    let cell_face = Face::with_indices(s, &[0, 1, 2]);
    assert!(matches!(
        tds.collapse_face(&cell_face),
        Err(TdsError::FaceNotCollapsible {
            feature_dimension: 2,
            ..
        })
    ));
}

#[test]
fn insertion_requires_a_positive_dimension() {
    let mut tds: Tds<(), (), 2> = Tds::new();
    let inf = tds.insert_increase_dimension(None).unwrap();
    tds.insert_increase_dimension(Some(inf)).unwrap();
    let s = tds.full_cells().keys().next().unwrap();
    assert!(matches!(
        tds.insert_in_full_cell(s),
        Err(TdsError::DimensionOutOfRange { found: 0, .. })
    ));
}

#[test]
fn insert_in_hole_rejects_bad_arguments() {
    let (mut tds, inf) = triangle_complex();
    let s = finite_cell(&tds, inf);

    assert!(matches!(
        tds.insert_in_hole(&[], Facet::new(s, 0)),
        Err(TdsError::EmptyHole)
    ));

    // a facet of a cell outside the hole is not on its boundary
    let outside = tds.full_cells().keys().find(|&k| k != s).unwrap();
    assert!(matches!(
        tds.insert_in_hole(&[s], Facet::new(outside, 0)),
        Err(TdsError::FacetNotOnHoleBoundary { .. })
    ));
    // the rejected call untagged the hole again
    assert!(tds.full_cells().values().all(|c| c.scratch().is_clear()));
    assert_invariants(&tds);
}

#[test]
fn single_cell_hole_equals_insert_in_full_cell() {
    let (mut tds, inf) = triangle_complex();
    let s = finite_cell(&tds, inf);

    let mut new_cells = Vec::new();
    let v = tds
        .insert_in_hole_and_collect(&[s], Facet::new(s, 0), &mut new_cells)
        .unwrap();

    assert_eq!(new_cells.len(), 3);
    assert_eq!(tds.number_of_vertices(), 5);
    assert_eq!(tds.number_of_full_cells(), 6);
    assert!(new_cells.iter().all(|&c| tds.full_cells()[c].has_vertex(v)));
    assert_invariants(&tds);
}
