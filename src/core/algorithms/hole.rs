//! Star replacement: inserting a vertex into a hole of full cells.
//!
//! A *hole* is a connected set of full cells marked for replacement. The
//! core algorithm removes the hole and fills it with the cone of a new
//! vertex over the hole boundary: one new cell per boundary facet, linked
//! outward to the untouched triangulation and inward to its siblings across
//! the ridges of the boundary. Point-in-cell, point-in-face and
//! point-in-facet insertion are thin drivers that compute the hole and
//! delegate.

use crate::core::collections::{CellBuffer, FastHashSet, SmallBuffer};
use crate::core::face::{Face, Facet, Rotor};
use crate::core::traits::payload::Payload;
use crate::core::triangulation_data_structure::{CellKey, Tds, TdsError, VertexKey};

impl<U, V, const D: usize> Tds<U, V, D>
where
    U: Payload,
    V: Payload,
{
    /// Replaces an already-tagged hole with the star of vertex `v`.
    ///
    /// The hole is the set of full cells whose visited bit is set; `f` must
    /// be one of its boundary facets. For every boundary facet, one new
    /// cell is built carrying `v` opposite the facet; it is linked outward
    /// across the hole boundary immediately, and inward to the sibling cell
    /// across each ridge of the boundary, found by rotating a rotor through
    /// the hole until it exits. A sibling that does not exist yet is built
    /// on the spot and queued for its own linking pass, so each boundary
    /// facet is processed exactly once and the work list replaces the
    /// unbounded recursion of the textbook formulation.
    ///
    /// Every new cell is appended to `new_cells`. The tagged cells are left
    /// in place, visited bits still set; callers erase them afterwards.
    ///
    /// Returns the new cell built over `f`.
    ///
    /// # Panics
    ///
    /// Panics if `f` is not a boundary facet of the tagged hole, or the
    /// tagged region violates the structure's invariants.
    pub fn insert_in_tagged_hole(
        &mut self,
        v: VertexKey,
        f: Facet,
        new_cells: &mut Vec<CellKey>,
    ) -> CellKey {
        assert!(
            self.is_boundary_facet(f),
            "starting facet must lie on the hole boundary"
        );
        let dim = self.current_dimension().unsigned_abs() as usize;

        let first = self.cone_over_boundary_facet(v, f, new_cells);
        let mut work: Vec<(CellKey, Facet)> = vec![(first, f)];

        while let Some((new_s, facet)) = work.pop() {
            let old_s = facet.full_cell();
            let m = facet.index_of_covertex();
            for i in (0..=dim).filter(|&i| i != m) {
                // walk around the ridge opposite {i, m} until it exits the
                // hole
                let mut rotor = Rotor::new(old_s, i, m);
                while !self.is_boundary_facet(rotor.candidate_facet()) {
                    rotor = self.rotate_rotor(rotor);
                }
                let inside = rotor.full_cell();
                let covertex = rotor.index_of_covertex();
                let outside = self.neighbor(inside, covertex);

                // has the cell over that boundary facet been built yet?
                let opposite = self.mirror_vertex(inside, covertex);
                let Some(idx) = self.full_cells()[outside].index_of(opposite) else {
                    panic!("cell outside the hole lost the vertex opposite its boundary facet")
                };
                let candidate = self.neighbor(outside, idx);
                let target = if candidate == inside {
                    let exit = Facet::new(inside, covertex);
                    let built = self.cone_over_boundary_facet(v, exit, new_cells);
                    work.push((built, exit));
                    built
                } else {
                    candidate
                };
                self.set_neighbors(new_s, i, target, rotor.index_of_second_covertex());
            }
        }
        first
    }

    /// Builds the one new cell of the cone over boundary facet `f`: the
    /// facet's vertices keep their slots, `v` takes the covertex slot, and
    /// the cell is linked outward across the hole boundary.
    fn cone_over_boundary_facet(
        &mut self,
        v: VertexKey,
        f: Facet,
        new_cells: &mut Vec<CellKey>,
    ) -> CellKey {
        let dim = self.current_dimension().unsigned_abs() as usize;
        let old_s = f.full_cell();
        let m = f.index_of_covertex();
        let new_s = self.new_full_cell();
        for i in (0..=dim).filter(|&i| i != m) {
            let w = self.vertex(old_s, i);
            self.associate_vertex_with_full_cell(new_s, i, w);
        }
        self.associate_vertex_with_full_cell(new_s, m, v);
        let outward = self.neighbor(old_s, m);
        let mirror = self.mirror_index(old_s, m);
        self.set_neighbors(new_s, m, outward, mirror);
        new_cells.push(new_s);
        new_s
    }

    /// Replaces the full cells of `hole` with the star of a fresh vertex
    /// and returns it.
    ///
    /// The cells of `hole` must form a connected set and `f` must be a
    /// facet on its boundary: a facet of a hole cell whose neighbor is
    /// outside the hole. The hole cells are erased; the triangulation
    /// outside the hole is untouched except for the neighbor links across
    /// the boundary.
    ///
    /// # Errors
    ///
    /// - [`TdsError::DimensionOutOfRange`] below dimension 1.
    /// - [`TdsError::EmptyHole`] when `hole` is empty.
    /// - [`TdsError::FullCellNotFound`] when a hole handle is dead.
    /// - [`TdsError::FacetNotOnHoleBoundary`] when `f` is interior to the
    ///   hole or outside it.
    pub fn insert_in_hole(&mut self, hole: &[CellKey], f: Facet) -> Result<VertexKey, TdsError> {
        let mut new_cells = Vec::new();
        self.insert_in_hole_and_collect(hole, f, &mut new_cells)
    }

    /// [`insert_in_hole`](Self::insert_in_hole), additionally appending
    /// every newly built cell to `new_cells`.
    ///
    /// # Errors
    ///
    /// See [`insert_in_hole`](Self::insert_in_hole).
    pub fn insert_in_hole_and_collect(
        &mut self,
        hole: &[CellKey],
        f: Facet,
        new_cells: &mut Vec<CellKey>,
    ) -> Result<VertexKey, TdsError> {
        if self.current_dimension() < 1 {
            return Err(TdsError::DimensionOutOfRange {
                found: self.current_dimension(),
                min: 1,
                max: self.ambient_dimension(),
            });
        }
        if hole.is_empty() {
            return Err(TdsError::EmptyHole);
        }
        for (tagged, &s) in hole.iter().enumerate() {
            if !self.contains_full_cell(s) {
                for &t in &hole[..tagged] {
                    self.set_visited(t, false);
                }
                return Err(TdsError::FullCellNotFound { cell: s });
            }
            self.set_visited(s, true);
        }
        if !self.is_boundary_facet(f) {
            for &s in hole {
                self.set_visited(s, false);
            }
            return Err(TdsError::FacetNotOnHoleBoundary {
                cell: f.full_cell(),
                index: f.index_of_covertex(),
            });
        }
        tracing::debug!(
            hole = hole.len(),
            dimension = self.current_dimension(),
            "replacing hole with the star of a new vertex"
        );
        let v = self.new_vertex(None);
        self.insert_in_tagged_hole(v, f, new_cells);
        // the visited bits of the hole are consumed by erasing the cells
        self.delete_full_cells(hole.iter().copied());
        Ok(v)
    }

    /// Inserts a vertex in the interior of full cell `s`, splitting it into
    /// d + 1 cells that share the new vertex.
    ///
    /// `s` itself is reused as the cell carrying the new vertex opposite
    /// its old 0-facet; d fresh copies carry it opposite the other facets.
    /// No hole machinery is involved.
    ///
    /// # Errors
    ///
    /// - [`TdsError::DimensionOutOfRange`] below dimension 1.
    /// - [`TdsError::FullCellNotFound`] when `s` is dead.
    pub fn insert_in_full_cell(&mut self, s: CellKey) -> Result<VertexKey, TdsError> {
        if self.current_dimension() < 1 {
            return Err(TdsError::DimensionOutOfRange {
                found: self.current_dimension(),
                min: 1,
                max: self.ambient_dimension(),
            });
        }
        if !self.contains_full_cell(s) {
            return Err(TdsError::FullCellNotFound { cell: s });
        }
        let dim = self.current_dimension().unsigned_abs() as usize;
        let v = self.new_vertex(None);

        // clones[i] will carry v at slot i; slot 0 reuses s itself
        let mut clones: SmallBuffer<CellKey, 8> = SmallBuffer::from_elem(s, dim + 1);
        for i in 1..=dim {
            let new_s = self.new_full_cell_from(s);
            clones[i] = new_s;
            self.associate_vertex_with_full_cell(new_s, i, v);
            let anchor = self.vertex(s, i - 1);
            self.anchor_vertex(anchor, new_s);
            let outward = self.neighbor(s, i);
            let mirror = self.mirror_index(s, i);
            self.set_neighbors(new_s, i, outward, mirror);
        }
        self.associate_vertex_with_full_cell(s, 0, v);
        for i in 0..=dim {
            for j in (0..=dim).filter(|&j| j != i) {
                self.set_neighbors(clones[i], j, clones[j], i);
            }
        }
        Ok(v)
    }

    /// Inserts a vertex in the interior of `face`: the hole is the set of
    /// full cells incident to the face.
    ///
    /// # Errors
    ///
    /// See [`insert_in_hole`](Self::insert_in_hole); additionally
    /// [`TdsError::FullCellNotFound`] when the face's cell is dead.
    pub fn insert_in_face(&mut self, face: &Face) -> Result<VertexKey, TdsError> {
        if !self.contains_full_cell(face.full_cell()) {
            return Err(TdsError::FullCellNotFound {
                cell: face.full_cell(),
            });
        }
        if self.current_dimension() < 1 {
            return Err(TdsError::DimensionOutOfRange {
                found: self.current_dimension(),
                min: 1,
                max: self.ambient_dimension(),
            });
        }
        let hole = self.incident_full_cells(face);
        self.insert_in_hole(&hole, Facet::new(face.full_cell(), face.index(0)))
    }

    /// Inserts a vertex in the interior of facet `f`: the hole is the pair
    /// of full cells sharing the facet.
    ///
    /// # Errors
    ///
    /// See [`insert_in_hole`](Self::insert_in_hole); additionally
    /// [`TdsError::FullCellNotFound`] when the facet's cell is dead.
    pub fn insert_in_facet(&mut self, f: Facet) -> Result<VertexKey, TdsError> {
        if !self.contains_full_cell(f.full_cell()) {
            return Err(TdsError::FullCellNotFound {
                cell: f.full_cell(),
            });
        }
        if self.current_dimension() < 1 {
            return Err(TdsError::DimensionOutOfRange {
                found: self.current_dimension(),
                min: 1,
                max: self.ambient_dimension(),
            });
        }
        let s0 = f.full_cell();
        let i = f.index_of_covertex();
        let s1 = self.neighbor(s0, i);
        // any covertex of s0 other than i starts on the hole boundary
        let start = Facet::new(s0, usize::from(i == 0));
        self.insert_in_hole(&[s0, s1], start)
    }

    /// Collapses `face` to a single fresh vertex: the star of the face is
    /// replaced by the star of the new vertex and the face's original
    /// vertices are erased.
    ///
    /// # Errors
    ///
    /// - [`TdsError::FaceNotCollapsible`] unless
    ///   `1 <= feature_dimension < current_dimension`.
    /// - [`TdsError::FullCellNotFound`] when the face's cell is dead.
    /// - The errors of [`insert_in_hole`](Self::insert_in_hole).
    pub fn collapse_face(&mut self, face: &Face) -> Result<VertexKey, TdsError> {
        let fd = face.feature_dimension();
        if fd < 1 || fd >= self.current_dimension() {
            return Err(TdsError::FaceNotCollapsible {
                feature_dimension: fd,
                current_dimension: self.current_dimension(),
            });
        }
        if !self.contains_full_cell(face.full_cell()) {
            return Err(TdsError::FullCellNotFound {
                cell: face.full_cell(),
            });
        }
        let mut face_vertices: CellBuffer<VertexKey> = CellBuffer::new();
        for i in 0..=fd.unsigned_abs() as usize {
            face_vertices.push(self.face_vertex(face, i));
        }
        let hole = self.star(face);
        // every facet of the face's own cell keeps some face vertex on its
        // far side, so the starting facet has to come from the fringe of
        // the star instead
        let Some(start) = self.boundary_facet_of(&hole) else {
            return Err(TdsError::FaceNotCollapsible {
                feature_dimension: fd,
                current_dimension: self.current_dimension(),
            });
        };
        let v = self.insert_in_hole(&hole, start)?;
        for w in face_vertices {
            self.delete_vertex(w);
        }
        Ok(v)
    }

    /// Finds some facet of `hole` whose far side lies outside it, or `None`
    /// when the hole covers the whole triangulation.
    fn boundary_facet_of(&self, hole: &[CellKey]) -> Option<Facet> {
        let dim = self.current_dimension().unsigned_abs() as usize;
        let hole_set: FastHashSet<CellKey> = hole.iter().copied().collect();
        hole.iter().find_map(|&s| {
            (0..=dim)
                .find(|&i| !hole_set.contains(&self.neighbor(s, i)))
                .map(|i| Facet::new(s, i))
        })
    }
}
