//! Breadth-first traversal over the full-cell adjacency graph, and the
//! gathering queries built on top of it.
//!
//! The engine walks outward from a start cell, marking visited bits as it
//! goes. A predicate decides per facet whether the walk crosses into the
//! neighbor; facets it refuses to cross bound the discovered region. After
//! the walk, a second pass re-walks exactly the marked cells and clears
//! every bit, so the scratch bytes are clean again when the query returns.
//! The two-phase pattern avoids keeping a container of marked cells and
//! tolerates any predicate that is a pure function of facet identity within
//! one traversal.

use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::core::collections::{CellBuffer, MAX_PRACTICAL_DIMENSION_SIZE, SmallBuffer};
use crate::core::face::{Face, Facet};
use crate::core::traits::payload::Payload;
use crate::core::triangulation_data_structure::{CellKey, Tds, VertexKey};

// =============================================================================
// TRAVERSAL PREDICATES
// =============================================================================

/// Per-facet gate of the breadth-first walk.
///
/// `crosses` must be a pure function of the facet identity for the duration
/// of one traversal; the engine consults it exactly once per region facet.
pub trait TraversalPredicate<U, V, const D: usize>
where
    U: Payload,
    V: Payload,
{
    /// Returns `true` when the walk should cross `facet` into the neighbor
    /// behind it.
    fn crosses(&self, tds: &Tds<U, V, D>, facet: Facet) -> bool;
}

/// Gathers the full cells *incident* to a face: those listing every vertex
/// of the face.
///
/// A facet is crossed iff its covertex is not a vertex of the query face;
/// crossing such a facet keeps all face vertices on board.
pub struct IncidentCellsPredicate {
    feature_vertices: CellBuffer<VertexKey>,
}

impl IncidentCellsPredicate {
    /// Resolves the query face's vertices once, up front.
    ///
    /// # Panics
    ///
    /// Panics if the face's cell is dead or names an unset slot.
    #[must_use]
    pub fn new<U, V, const D: usize>(tds: &Tds<U, V, D>, face: &Face) -> Self
    where
        U: Payload,
        V: Payload,
    {
        let dim = face.feature_dimension();
        assert!(dim >= 0, "cannot gather around an empty face");
        let mut feature_vertices = CellBuffer::new();
        for i in 0..=dim.unsigned_abs() as usize {
            feature_vertices.push(tds.face_vertex(face, i));
        }
        Self { feature_vertices }
    }
}

impl<U, V, const D: usize> TraversalPredicate<U, V, D> for IncidentCellsPredicate
where
    U: Payload,
    V: Payload,
{
    fn crosses(&self, tds: &Tds<U, V, D>, facet: Facet) -> bool {
        let covertex = tds.vertex(facet.full_cell(), facet.index_of_covertex());
        !self.feature_vertices.contains(&covertex)
    }
}

/// Gathers the *star* of a face: every full cell whose closure meets the
/// face.
///
/// A facet is crossed iff the neighbor behind it still lists at least one
/// vertex of the query face.
pub struct StarPredicate {
    feature_vertices: CellBuffer<VertexKey>,
}

impl StarPredicate {
    /// Resolves the query face's vertices once, up front.
    ///
    /// # Panics
    ///
    /// Panics if the face's cell is dead or names an unset slot.
    #[must_use]
    pub fn new<U, V, const D: usize>(tds: &Tds<U, V, D>, face: &Face) -> Self
    where
        U: Payload,
        V: Payload,
    {
        let inner = IncidentCellsPredicate::new(tds, face);
        Self {
            feature_vertices: inner.feature_vertices,
        }
    }
}

impl<U, V, const D: usize> TraversalPredicate<U, V, D> for StarPredicate
where
    U: Payload,
    V: Payload,
{
    fn crosses(&self, tds: &Tds<U, V, D>, facet: Facet) -> bool {
        let n = tds.neighbor(facet.full_cell(), facet.index_of_covertex());
        let dim = tds.current_dimension().unsigned_abs() as usize;
        (0..=dim).any(|j| self.feature_vertices.contains(&tds.vertex(n, j)))
    }
}

// =============================================================================
// THE TRAVERSAL ENGINE
// =============================================================================

impl<U, V, const D: usize> Tds<U, V, D>
where
    U: Payload,
    V: Payload,
{
    /// Breadth-first walk from `start`, gated by `predicate`.
    ///
    /// Every discovered cell is appended to `out`. Facets the predicate
    /// refuses to cross bound the discovered region; the last one seen is
    /// returned, which is only meaningful to callers that know there is at
    /// most one. Visited bits are set during the walk and cleared again
    /// before returning.
    ///
    /// # Panics
    ///
    /// Panics if the current dimension is negative, `start` is dead, or a
    /// neighbor slot inside the walked region is unset.
    pub fn gather_full_cells<P>(
        &mut self,
        start: CellKey,
        predicate: &P,
        out: &mut Vec<CellKey>,
    ) -> Option<Facet>
    where
        P: TraversalPredicate<U, V, D>,
    {
        assert!(
            self.current_dimension() >= 0,
            "cannot traverse a triangulation of dimension {}",
            self.current_dimension()
        );
        let dim = self.current_dimension().unsigned_abs() as usize;
        let mut boundary = None;
        let mut queue = VecDeque::new();
        self.set_visited(start, true);
        queue.push_back(start);
        while let Some(s) = queue.pop_front() {
            out.push(s);
            for i in 0..=dim {
                let n = self.neighbor(s, i);
                if !self.get_visited(n) {
                    self.set_visited(n, true);
                    let facet = Facet::new(s, i);
                    if predicate.crosses(self, facet) {
                        queue.push_back(n);
                    } else {
                        boundary = Some(facet);
                    }
                }
            }
        }
        self.clear_visited_marks(start);
        boundary
    }

    /// Re-walks the marked region from `start` and clears every visited
    /// bit, including the fringe of neighbors the gather marked but did not
    /// enter.
    fn clear_visited_marks(&mut self, start: CellKey) {
        let dim = self.current_dimension().unsigned_abs() as usize;
        let mut queue = VecDeque::new();
        self.set_visited(start, false);
        queue.push_back(start);
        while let Some(s) = queue.pop_front() {
            for i in 0..=dim {
                let n = self.neighbor(s, i);
                if self.get_visited(n) {
                    self.set_visited(n, false);
                    queue.push_back(n);
                }
            }
        }
    }
}

// =============================================================================
// GATHERING QUERIES
// =============================================================================

impl<U, V, const D: usize> Tds<U, V, D>
where
    U: Payload,
    V: Payload,
{
    /// Returns every full cell incident to `face` (listing all its
    /// vertices).
    ///
    /// # Panics
    ///
    /// Panics if the face's cell is dead, a named slot is unset, or the
    /// current dimension is negative.
    pub fn incident_full_cells(&mut self, face: &Face) -> Vec<CellKey> {
        let predicate = IncidentCellsPredicate::new(self, face);
        let mut out = Vec::new();
        self.gather_full_cells(face.full_cell(), &predicate, &mut out);
        out
    }

    /// Returns every full cell incident to vertex `v`.
    ///
    /// # Panics
    ///
    /// Panics if `v` is dead or unanchored, or the current dimension is
    /// negative.
    pub fn incident_full_cells_of_vertex(&mut self, v: VertexKey) -> Vec<CellKey> {
        let face = self.vertex_face(v);
        self.incident_full_cells(&face)
    }

    /// Returns the star of `face`: every full cell whose closure meets it.
    ///
    /// # Panics
    ///
    /// Panics if the face's cell is dead, a named slot is unset, or the
    /// current dimension is negative.
    pub fn star(&mut self, face: &Face) -> Vec<CellKey> {
        let predicate = StarPredicate::new(self, face);
        let mut out = Vec::new();
        self.gather_full_cells(face.full_cell(), &predicate, &mut out);
        out
    }

    /// Enumerates the k-dimensional faces incident to `v`, each exactly
    /// once, ordered by their vertex tuple under `cmp`.
    ///
    /// Every incident full cell proposes candidate faces: its vertices are
    /// sorted by `cmp` (with `v` pinned leftmost unless `upper` is set),
    /// and each combination of `k` sorted positions to the right of `v`
    /// names one face. The same face reached through different cells
    /// serializes to the same vertex tuple, which deduplicates it. With
    /// `upper` set, only faces whose `cmp`-minimum is `v` are produced.
    ///
    /// Returns nothing when `k >= current_dimension()`.
    ///
    /// # Panics
    ///
    /// Panics if `k` is zero, `v` is dead or unanchored, or the current
    /// dimension is negative.
    pub fn incident_faces<F>(&mut self, v: VertexKey, k: usize, mut cmp: F, upper: bool) -> Vec<Face>
    where
        F: FnMut(&VertexKey, &VertexKey) -> Ordering,
    {
        assert!(k > 0, "faces of feature dimension 0 are just vertices");
        let current = self.current_dimension();
        if k as i32 >= current {
            return Vec::new();
        }
        let dim = current.unsigned_abs() as usize;
        let cells = self.incident_full_cells_of_vertex(v);

        let mut vertices: CellBuffer<VertexKey> = CellBuffer::new();
        let mut sorted_idx: CellBuffer<usize> = CellBuffer::new();
        let mut keyed: Vec<(SmallBuffer<VertexKey, MAX_PRACTICAL_DIMENSION_SIZE>, Face)> =
            Vec::new();

        for s in cells {
            vertices.clear();
            for i in 0..=dim {
                vertices.push(self.vertex(s, i));
            }
            let v_idx = if upper {
                vertices.sort_by(|a, b| cmp(a, b));
                position_of(&vertices, v)
            } else {
                let pos = position_of(&vertices, v);
                vertices.swap(0, pos);
                vertices[1..].sort_by(|a, b| cmp(a, b));
                0
            };
            if v_idx + k > dim {
                // v sits too far right in this cell's order to be the
                // minimum of any k-face
                continue;
            }
            sorted_idx.clear();
            for &w in &vertices {
                let Some(slot) = self.full_cells()[s].index_of(w) else {
                    panic!("gathered cell {s:?} lost one of its own vertices")
                };
                sorted_idx.push(slot);
            }
            let mut combinations = CombinationEnumerator::new(k, v_idx + 1, dim);
            while let Some(combo) = combinations.next() {
                let mut face = Face::new(s);
                face.set_index(0, sorted_idx[v_idx]);
                let mut key = SmallBuffer::new();
                for (t, &ci) in combo.iter().enumerate() {
                    face.set_index(1 + t, sorted_idx[ci]);
                    key.push(vertices[ci]);
                }
                keyed.push((key, face));
            }
        }

        keyed.sort_by(|(a, _), (b, _)| lexicographic(a, b, &mut cmp));
        keyed.dedup_by(|(a, _), (b, _)| a == b);
        keyed.into_iter().map(|(_, face)| face).collect()
    }

    /// Enumerates the k-dimensional faces incident to `v` whose
    /// `cmp`-minimal vertex is `v`.
    ///
    /// Running this for every vertex enumerates each k-face of the complex
    /// exactly once.
    ///
    /// # Panics
    ///
    /// Panics under the conditions of [`incident_faces`](Self::incident_faces).
    pub fn incident_upper_faces<F>(&mut self, v: VertexKey, k: usize, cmp: F) -> Vec<Face>
    where
        F: FnMut(&VertexKey, &VertexKey) -> Ordering,
    {
        self.incident_faces(v, k, cmp, true)
    }
}

fn position_of(vertices: &[VertexKey], v: VertexKey) -> usize {
    let Some(pos) = vertices.iter().position(|&w| w == v) else {
        panic!("cell gathered as incident to a vertex does not contain it")
    };
    pos
}

fn lexicographic<F>(a: &[VertexKey], b: &[VertexKey], cmp: &mut F) -> Ordering
where
    F: FnMut(&VertexKey, &VertexKey) -> Ordering,
{
    for (x, y) in a.iter().zip(b) {
        match cmp(x, y) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Lexicographic enumerator of the k-element subsets of `min..=max`.
struct CombinationEnumerator {
    current: CellBuffer<usize>,
    max: usize,
    done: bool,
}

impl CombinationEnumerator {
    fn new(k: usize, min: usize, max: usize) -> Self {
        let done = min + k > max + 1;
        let current = (min..min + k).collect();
        Self { current, max, done }
    }

    fn next(&mut self) -> Option<CellBuffer<usize>> {
        if self.done {
            return None;
        }
        let result = self.current.clone();
        // advance to the next combination in lexicographic order
        let k = self.current.len();
        let mut p = k;
        loop {
            if p == 0 {
                self.done = true;
                break;
            }
            p -= 1;
            if self.current[p] < self.max - (k - 1 - p) {
                self.current[p] += 1;
                for q in p + 1..k {
                    self.current[q] = self.current[q - 1] + 1;
                }
                break;
            }
        }
        Some(result)
    }
}
