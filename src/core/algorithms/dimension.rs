//! Dimension-changing updates: coning the whole triangulation to a new
//! apex, and the inverse collapse.
//!
//! Increasing the dimension lifts a d-dimensional triangulation into
//! (d+1)-space by giving every existing full cell the new vertex as its
//! (d+1)-th corner and pairing every cell that misses the distinguished
//! *star* vertex with a fresh twin through `star`. The star vertex models
//! the point at infinity: cells through it represent the unbounded regions.
//! Decreasing the dimension removes the unique apex of the top dimension
//! and collapses every cell onto its facet opposite that apex.

use std::collections::VecDeque;

use crate::core::collections::FastHashSet;
use crate::core::traits::payload::Payload;
use crate::core::triangulation_data_structure::{CellKey, Tds, TdsError, VertexKey};

impl<U, V, const D: usize> Tds<U, V, D>
where
    U: Payload,
    V: Payload,
{
    /// Inserts a new vertex and raises the current dimension by one.
    ///
    /// `star` must be `None` exactly when the triangulation is empty. The
    /// first inserted vertex becomes the conventional "infinite" vertex;
    /// passing it as `star` on subsequent calls keeps the unbounded cells
    /// threaded through it.
    ///
    /// Returns the new vertex, which sits in every full cell that existed
    /// before the call.
    ///
    /// # Errors
    ///
    /// - [`TdsError::AmbientDimensionReached`] at current dimension `D`.
    /// - [`TdsError::StarArgumentMismatch`] when `star` is supplied for an
    ///   empty triangulation or omitted for a non-empty one.
    /// - [`TdsError::VertexNotFound`] when `star` is dead.
    pub fn insert_increase_dimension(
        &mut self,
        star: Option<VertexKey>,
    ) -> Result<VertexKey, TdsError> {
        let prev = self.current_dimension();
        if prev >= self.ambient_dimension() {
            return Err(TdsError::AmbientDimensionReached {
                ambient: self.ambient_dimension(),
            });
        }
        if (prev == -2) != star.is_none() {
            return Err(TdsError::StarArgumentMismatch {
                current_dimension: prev,
            });
        }
        if let Some(star) = star {
            if !self.contains_vertex(star) {
                return Err(TdsError::VertexNotFound { vertex: star });
            }
        }
        tracing::debug!(from = prev, "increasing the triangulation dimension");

        self.set_current_dimension(prev + 1);
        let v = self.new_vertex(None);
        match (prev, star) {
            (-2, None) => {
                // the first vertex, held by a single degenerate cell
                let s = self.new_full_cell();
                self.associate_vertex_with_full_cell(s, 0, v);
            }
            (-1, Some(star)) => {
                // a 0-sphere: the star's cell and a fresh finite cell,
                // mutual neighbors through their only facet
                let infinite = self.full_cell_of(star);
                let finite = self.new_full_cell();
                self.associate_vertex_with_full_cell(finite, 0, v);
                self.set_neighbors(infinite, 0, finite, 0);
            }
            (_, Some(star)) => self.do_insert_increase_dimension(v, star),
            _ => unreachable!("star argument validated against the current dimension"),
        }
        Ok(v)
    }

    /// The general d -> d+1 case, for d >= 0.
    ///
    /// Phase one extends every existing cell with `x` at the new top slot
    /// and builds a twin through `star` for every cell missing it, with the
    /// old vertices shifted one slot right. Phase two walks the old
    /// adjacency and wires the new top-slot neighbors; the `+ 1` mirror
    /// shifts account for the slot renumbering inside the twins. Phase
    /// three restores the orientation convention: a parity swap of the two
    /// top slots for even dimensions, and a single slot swap on the
    /// rightmost unbounded cell when the new dimension is 2.
    fn do_insert_increase_dimension(&mut self, x: VertexKey, star: VertexKey) {
        let dim = self.current_dimension().unsigned_abs() as usize;
        let old_cells: Vec<CellKey> = self.full_cells().keys().collect();
        let start = old_cells[0];
        let mut swap_me: Option<CellKey> = None;

        for &s in &old_cells {
            self.set_visited(s, true);
            self.associate_vertex_with_full_cell(s, dim, x);
            if let Some(star_index) = self.full_cells()[s].index_of(star) {
                if dim == 2 && self.mirror_index(s, star_index) == 0 {
                    // the rightmost unbounded cell needs its orientation
                    // fixed at the end
                    swap_me = Some(s);
                }
            } else {
                // s is bounded; build its unbounded twin through star
                let twin = self.new_full_cell();
                self.set_neighbors(s, dim, twin, 0);
                self.associate_vertex_with_full_cell(twin, 0, star);
                for k in 1..=dim {
                    let w = self.vertex(s, k - 1);
                    self.associate_vertex_with_full_cell(twin, k, w);
                }
            }
        }

        // wire the remaining top-slot neighbors by walking the old
        // adjacency; the loop doubles as the visited-bit clearing pass
        self.set_visited(start, false);
        let mut queue = VecDeque::new();
        queue.push_back(start);
        while let Some(s) = queue.pop_front() {
            if let Some(star_index) = self.full_cells()[s].index_of(star) {
                let across = self.neighbor(s, star_index);
                let target = self.neighbor(across, dim);
                let mirror = self.mirror_index(s, star_index);
                self.set_neighbors(s, dim, target, mirror + 1);
            } else {
                let twin = self.neighbor(s, dim);
                for k in 0..dim {
                    let opposite = self.neighbor(s, k);
                    if !self.full_cells()[opposite].has_vertex(star) {
                        let target = self.neighbor(opposite, dim);
                        let mirror = self.mirror_index(s, k);
                        self.set_neighbors(twin, k + 1, target, mirror + 1);
                    }
                }
            }
            for k in 0..dim {
                let n = self.neighbor(s, k);
                if self.get_visited(n) {
                    self.set_visited(n, false);
                    queue.push_back(n);
                }
            }
        }

        if dim % 2 == 0 && dim > 1 {
            let all_cells: Vec<CellKey> = self.full_cells().keys().collect();
            for s in all_cells {
                if self.full_cells()[s].vertex(dim) != Some(x) {
                    self.swap_vertex_slots(s, dim - 1, dim);
                }
            }
        }
        if let Some(s) = swap_me {
            self.swap_vertex_slots(s, 1, 2);
        }
    }

    /// Removes vertex `v` and lowers the current dimension by one.
    ///
    /// `v` must be the unique apex of the top dimension: every full cell
    /// either contains `v`, or is the twin through `star` of exactly one
    /// cell that does. Each cell incident to `v` is collapsed onto its
    /// facet opposite `v` and its twin is erased. This is the inverse of
    /// [`insert_increase_dimension`](Self::insert_increase_dimension).
    ///
    /// # Errors
    ///
    /// - [`TdsError::DimensionOutOfRange`] on an empty triangulation.
    /// - [`TdsError::VertexNotFound`] when `v` or `star` is dead.
    /// - [`TdsError::VertexNotRemovable`] when the triangulation is not the
    ///   cone of `v` over a lower-dimensional triangulation.
    pub fn remove_decrease_dimension(
        &mut self,
        v: VertexKey,
        star: VertexKey,
    ) -> Result<(), TdsError> {
        if self.current_dimension() < -1 {
            return Err(TdsError::DimensionOutOfRange {
                found: self.current_dimension(),
                min: -1,
                max: self.ambient_dimension(),
            });
        }
        if !self.contains_vertex(v) {
            return Err(TdsError::VertexNotFound { vertex: v });
        }
        if !self.contains_vertex(star) {
            return Err(TdsError::VertexNotFound { vertex: star });
        }
        tracing::debug!(
            from = self.current_dimension(),
            "decreasing the triangulation dimension"
        );
        match self.current_dimension() {
            -1 => {
                self.clear();
                Ok(())
            }
            0 => self.remove_decrease_dimension_0(v, star),
            1 => self.remove_decrease_dimension_1(v, star),
            _ => self.remove_decrease_dimension_general(v, star),
        }
    }

    /// d = 0: drop `v`'s cell, leaving the star vertex alone at d = -1.
    fn remove_decrease_dimension_0(&mut self, v: VertexKey, star: VertexKey) -> Result<(), TdsError> {
        if v == star || self.number_of_full_cells() != 2 {
            return Err(TdsError::VertexNotRemovable { vertex: v });
        }
        self.delete_full_cell(self.full_cell_of(v));
        self.delete_vertex(v);
        let star_cell = self.full_cell_of(star);
        let cell = self.cell_mut(star_cell);
        cell.set_neighbor(0, None);
        cell.set_mirror_index(0, None);
        self.set_current_dimension(-1);
        Ok(())
    }

    /// d = 1: the triangulation is a 3-cycle, one bounded cell and two
    /// cells through `star`. Remove the bounded cell and `v`, rewire the
    /// two survivors into a 0-sphere.
    fn remove_decrease_dimension_1(&mut self, v: VertexKey, star: VertexKey) -> Result<(), TdsError> {
        if v == star || self.number_of_full_cells() != 3 {
            return Err(TdsError::VertexNotRemovable { vertex: v });
        }
        let mut s = self.full_cell_of(v);
        if let Some(star_index) = self.full_cells()[s].index_of(star) {
            s = self.neighbor(s, star_index);
        }
        // s is now the bounded cell
        let Some(v_index) = self.full_cells()[s].index_of(v) else {
            return Err(TdsError::VertexNotRemovable { vertex: v });
        };
        let unbounded_0 = self.neighbor(s, 0);
        let unbounded_1 = self.neighbor(s, 1);
        let survivor = self.vertex(s, 1 - v_index);
        self.delete_vertex(v);
        self.delete_full_cell(s);
        for unbounded in [unbounded_0, unbounded_1] {
            let cell = self.cell_mut(unbounded);
            cell.set_vertex(1, None);
            cell.set_neighbor(1, None);
            cell.set_mirror_index(1, None);
        }
        self.associate_vertex_with_full_cell(unbounded_0, 0, star);
        self.associate_vertex_with_full_cell(unbounded_1, 0, survivor);
        self.set_neighbors(unbounded_0, 0, unbounded_1, 0);
        self.set_current_dimension(0);
        Ok(())
    }

    /// The general case, d >= 2.
    fn remove_decrease_dimension_general(
        &mut self,
        v: VertexKey,
        star: VertexKey,
    ) -> Result<(), TdsError> {
        let dim = self.current_dimension().unsigned_abs() as usize;
        let incident = self.incident_full_cells_of_vertex(v);
        self.check_removable(v, star, &incident)?;

        for &s in &incident {
            let Some(v_index) = self.full_cells()[s].index_of(v) else {
                unreachable!("incident cells contain the query vertex")
            };
            if self.full_cells()[s].has_vertex(star) {
                self.anchor_vertex(star, s);
            } else {
                // erase the unbounded twin on the far side of v and
                // re-anchor every corner onto the surviving cell
                let twin = self.neighbor(s, v_index);
                self.delete_full_cell(twin);
                for i in 0..=dim {
                    let w = self.vertex(s, i);
                    self.anchor_vertex(w, s);
                }
            }
            if v_index != dim {
                self.swap_vertex_slots(s, v_index, dim);
                if !self.full_cells()[s].has_vertex(star) || dim > 2 {
                    self.swap_vertex_slots(s, dim - 2, dim - 1);
                }
            }
            let cell = self.cell_mut(s);
            cell.set_vertex(dim, None);
            cell.set_neighbor(dim, None);
            cell.set_mirror_index(dim, None);
        }
        self.set_current_dimension(self.current_dimension() - 1);
        self.delete_vertex(v);
        Ok(())
    }

    /// Verifies that the triangulation is the cone of `v`: every full cell
    /// contains `v` or is the unique star-side twin of exactly one cell
    /// that does.
    fn check_removable(
        &self,
        v: VertexKey,
        star: VertexKey,
        incident: &[CellKey],
    ) -> Result<(), TdsError> {
        if v == star {
            return Err(TdsError::VertexNotRemovable { vertex: v });
        }
        let incident_set: FastHashSet<CellKey> = incident.iter().copied().collect();
        let mut twins: FastHashSet<CellKey> = FastHashSet::default();
        let mut star_beside_v = false;
        for &s in incident {
            let cell = &self.full_cells()[s];
            if cell.has_vertex(star) {
                star_beside_v = true;
                continue;
            }
            let Some(v_index) = cell.index_of(v) else {
                return Err(TdsError::VertexNotRemovable { vertex: v });
            };
            let twin = self.neighbor(s, v_index);
            let twin_cell = &self.full_cells()[twin];
            if twin_cell.has_vertex(v)
                || !twin_cell.has_vertex(star)
                || incident_set.contains(&twin)
                || !twins.insert(twin)
            {
                return Err(TdsError::VertexNotRemovable { vertex: v });
            }
        }
        // a genuine apex shares at least one cell with the star vertex:
        // the cone construction extends the unbounded cells too
        if !star_beside_v {
            return Err(TdsError::VertexNotRemovable { vertex: v });
        }
        if incident.len() + twins.len() != self.number_of_full_cells() {
            return Err(TdsError::VertexNotRemovable { vertex: v });
        }
        Ok(())
    }
}
