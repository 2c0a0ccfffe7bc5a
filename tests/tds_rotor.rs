//! Rotor rotation around a shared ridge in d = 3.

use simplicial_tds::prelude::*;

/// Builds a fan of six tetrahedra sharing the interior edge {a, b}:
/// cell i spans {a, b, w_i, w_{i+1}} and neighbors cell i+1 across the
/// facet {a, b, w_{i+1}}. Only the ring adjacency is wired; that is all a
/// rotor ever reads.
fn ring_of_six() -> (Tds<(), (), 3>, Vec<CellKey>) {
    let mut tds: Tds<(), (), 3> = Tds::new();
    tds.set_current_dimension(3);
    let a = tds.new_vertex(None);
    let b = tds.new_vertex(None);
    let rim: Vec<VertexKey> = (0..6).map(|_| tds.new_vertex(None)).collect();

    let cells: Vec<CellKey> = (0..6).map(|_| tds.new_full_cell()).collect();
    for i in 0..6 {
        tds.associate_vertex_with_full_cell(cells[i], 0, a);
        tds.associate_vertex_with_full_cell(cells[i], 1, b);
        tds.associate_vertex_with_full_cell(cells[i], 2, rim[i]);
        tds.associate_vertex_with_full_cell(cells[i], 3, rim[(i + 1) % 6]);
    }
    for i in 0..6 {
        // the facet {a, b, w_{i+1}} is opposite w_i (slot 2) in cell i and
        // opposite w_{i+2} (slot 3) in cell i+1
        tds.set_neighbors(cells[i], 2, cells[(i + 1) % 6], 3);
    }
    (tds, cells)
}

#[test]
fn six_rotations_return_the_rotor_to_its_start() {
    let (tds, cells) = ring_of_six();

    let start = Rotor::new(cells[0], 2, 3);
    let mut rotor = start;
    for step in 1..=6 {
        rotor = tds.rotate_rotor(rotor);
        if step < 6 {
            assert_ne!(rotor, start, "returned early after {step} rotations");
        }
    }
    assert_eq!(rotor, start);
}

#[test]
fn each_rotation_steps_one_cell_around_the_ring() {
    let (tds, cells) = ring_of_six();

    let mut rotor = Rotor::new(cells[0], 2, 3);
    for i in 1..6 {
        rotor = tds.rotate_rotor(rotor);
        assert_eq!(rotor.full_cell(), cells[i]);
        // the ridge {a, b} stays the one opposite the two covertices
        let covertices = [rotor.index_of_covertex(), rotor.index_of_second_covertex()];
        assert!(!covertices.contains(&0));
        assert!(!covertices.contains(&1));
    }
}
