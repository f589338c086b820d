//! The brush: an ordered plane set and the B-Rep derived from it.
//!
//! All derived geometry (windings, vertex/edge lists, adjacency, AABB) is
//! a pure function of the current face planes. It is rebuilt lazily: plane
//! mutations set a dirty flag and the next geometry query runs the full
//! construction from scratch. There is no incremental update.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use qbrush_math::{Aabb, Mat4, Plane3, Vec3, MAX_BRUSH_FACES, MAX_WORLD_COORD, ON_EPSILON};
use qbrush_winding::{FixedWinding, PlaneCounts, Winding};

use crate::face::Face;
use crate::texture::{MaterialInfo, TextureProjection};

// =============================================================================
// Support types
// =============================================================================

/// Structural-vs-detail classification, carried through every operation but
/// never affecting topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DetailFlag {
    /// The brush participates in structural visibility computations.
    #[default]
    Structural,
    /// Detail geometry.
    Detail,
}

/// Undo hook: invoked before any mutating operation so the owning undo
/// system can snapshot the brush. Injected, never owned logic.
pub trait StateSaver {
    /// Called right before the brush mutates.
    fn save_state(&self);
}

/// The two faces meeting at one unique edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeFaces {
    /// Face owning the representative winding edge.
    pub first: usize,
    /// The face across the edge.
    pub second: usize,
}

/// Snapshot of one face for undo.
#[derive(Debug, Clone)]
pub struct FaceMemento {
    /// Committed plane.
    pub plane: Plane3,
    /// Texture projection.
    pub projection: TextureProjection,
    /// Material record.
    pub material: MaterialInfo,
}

/// Snapshot of a whole brush: the ordered face list plus the detail flag.
#[derive(Debug, Clone)]
pub struct BrushMemento {
    /// Face snapshots in insertion order.
    pub faces: Vec<FaceMemento>,
    /// Detail flag at snapshot time.
    pub detail: DetailFlag,
}

/// Lazily rebuilt derived geometry.
#[derive(Debug, Clone, Default)]
struct BrepCache {
    aabb: Aabb,
    degenerate: bool,
    unique_vertex_points: Vec<Vec3>,
    unique_edge_points: Vec<Vec3>,
    face_centroid_points: Vec<Vec3>,
    edge_faces: Vec<EdgeFaces>,
    edge_indices: Vec<(usize, usize)>,
}

// =============================================================================
// Brush
// =============================================================================

/// A convex solid as an ordered set of bounding planes.
///
/// Insertion order is significant: when two planes are near-parallel
/// duplicates the earlier, tighter one wins (see [`Plane3::inside`]). Faces
/// are appended, never reordered.
pub struct Brush {
    faces: Vec<Face>,
    detail: DetailFlag,
    version: u64,
    plane_changed: bool,
    cache: BrepCache,
    saver: Option<Rc<dyn StateSaver>>,
}

impl std::fmt::Debug for Brush {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Brush")
            .field("faces", &self.faces)
            .field("detail", &self.detail)
            .field("version", &self.version)
            .field("plane_changed", &self.plane_changed)
            .finish()
    }
}

impl Clone for Brush {
    /// Copies the face list and detail flag. The clone starts dirty and
    /// detached from any undo hook.
    fn clone(&self) -> Self {
        Self {
            faces: self.faces.clone(),
            detail: self.detail,
            version: 0,
            plane_changed: true,
            cache: BrepCache::default(),
            saver: None,
        }
    }
}

impl Default for Brush {
    fn default() -> Self {
        Self::new()
    }
}

impl Brush {
    /// An empty brush.
    pub fn new() -> Self {
        Self {
            faces: Vec::new(),
            detail: DetailFlag::Structural,
            version: 0,
            plane_changed: true,
            cache: BrepCache::default(),
            saver: None,
        }
    }

    // =========================================================================
    // Observation plumbing
    // =========================================================================

    /// Installs the undo hook.
    pub fn connect_state_saver(&mut self, saver: Rc<dyn StateSaver>) {
        self.saver = Some(saver);
    }

    /// Removes the undo hook.
    pub fn disconnect_state_saver(&mut self) {
        self.saver = None;
    }

    fn undo_save(&self) {
        if let Some(saver) = &self.saver {
            saver.save_state();
        }
    }

    /// Structural version, bumped by every face-list mutation. Dependents
    /// compare against a cached value instead of receiving callbacks.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn structural_change(&mut self) {
        self.version += 1;
        self.plane_changed = true;
    }

    // =========================================================================
    // Face list
    // =========================================================================

    /// Number of faces, contributing or not.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Whether the brush has no faces at all.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// A face by index.
    pub fn face(&self, index: usize) -> &Face {
        &self.faces[index]
    }

    /// Iterates over the faces in insertion order.
    pub fn faces(&self) -> std::slice::Iter<'_, Face> {
        self.faces.iter()
    }

    /// Appends a face; returns its index, or `None` at the face cap.
    pub fn add_face(&mut self, face: Face) -> Option<usize> {
        if self.faces.len() >= MAX_BRUSH_FACES {
            return None;
        }
        self.undo_save();
        self.faces.push(face);
        self.structural_change();
        Some(self.faces.len() - 1)
    }

    /// Appends a face through three points (clockwise seen from outside).
    pub fn add_plane(
        &mut self,
        p0: Vec3,
        p1: Vec3,
        p2: Vec3,
        projection: TextureProjection,
        material: MaterialInfo,
    ) -> Option<usize> {
        self.add_face(Face::from_points(p0, p1, p2, projection, material))
    }

    /// Removes a face by index.
    pub fn erase_face(&mut self, index: usize) {
        self.undo_save();
        self.faces.remove(index);
        self.structural_change();
    }

    /// Removes every face.
    pub fn clear(&mut self) {
        self.undo_save();
        self.faces.clear();
        self.structural_change();
    }

    /// Drops all non-contributing faces. Never called implicitly: removing
    /// faces mid-manipulation would make the edit irreversible.
    pub fn remove_empty_faces(&mut self) {
        self.evaluate_brep();
        self.undo_save();
        self.faces.retain(Face::contributes);
        self.structural_change();
    }

    /// The detail flag.
    pub fn detail_flag(&self) -> DetailFlag {
        self.detail
    }

    /// Sets the detail flag.
    pub fn set_detail_flag(&mut self, detail: DetailFlag) {
        self.undo_save();
        self.detail = detail;
    }

    // =========================================================================
    // Face mutation (all funnel the dirty flag)
    // =========================================================================

    /// Replaces a face's plane (a committed edit).
    pub fn set_face_plane(&mut self, index: usize, plane: Plane3) {
        self.undo_save();
        self.faces[index].set_plane(plane);
        self.plane_changed = true;
    }

    /// Flips a face so its front becomes its back.
    pub fn flip_face(&mut self, index: usize) {
        self.undo_save();
        self.faces[index].flip();
        self.plane_changed = true;
    }

    /// Moves a face's plane along its normal.
    pub fn offset_face_plane(&mut self, index: usize, amount: f64) {
        self.undo_save();
        self.faces[index].offset_plane(amount);
        self.plane_changed = true;
    }

    /// Replaces a face's material record.
    pub fn set_face_material(&mut self, index: usize, material: MaterialInfo) {
        self.undo_save();
        self.faces[index].set_material(material);
    }

    /// Replaces a face's texture projection.
    pub fn set_face_projection(&mut self, index: usize, projection: TextureProjection) {
        self.undo_save();
        self.faces[index].set_projection(projection);
    }

    /// Fits a face's texture to its winding.
    pub fn fit_face_texture(&mut self, index: usize, s_repeat: f64, t_repeat: f64) {
        self.evaluate_brep();
        self.undo_save();
        self.faces[index].fit_texture(s_repeat, t_repeat);
    }

    // =========================================================================
    // Transforms
    // =========================================================================

    /// Applies an affine transform to the pending planes of every face.
    pub fn transform(&mut self, transform: &Mat4) {
        self.undo_save();
        for face in &mut self.faces {
            face.transform(transform);
        }
        self.plane_changed = true;
    }

    /// Translates and commits in one step.
    pub fn translate(&mut self, translation: &Vec3) {
        self.undo_save();
        for face in &mut self.faces {
            face.translate(translation);
            face.freeze_transform();
        }
        self.plane_changed = true;
    }

    /// Commits all pending transforms into the identity planes.
    pub fn freeze_transform(&mut self) {
        for face in &mut self.faces {
            face.freeze_transform();
        }
    }

    /// Discards all pending transforms.
    pub fn revert_transform(&mut self) {
        for face in &mut self.faces {
            face.revert_transform();
        }
        self.plane_changed = true;
    }

    /// Snaps every face plane to a grid.
    pub fn snap_planes(&mut self, grid: f64) {
        self.undo_save();
        for face in &mut self.faces {
            face.snap_plane(grid);
        }
        self.plane_changed = true;
    }

    // =========================================================================
    // Mementos
    // =========================================================================

    /// Snapshots the ordered face list and detail flag.
    pub fn export_state(&self) -> BrushMemento {
        BrushMemento {
            faces: self
                .faces
                .iter()
                .map(|face| FaceMemento {
                    plane: *face.identity_plane(),
                    projection: *face.projection(),
                    material: face.material().clone(),
                })
                .collect(),
            detail: self.detail,
        }
    }

    /// Restores a snapshot, re-triggering full B-Rep invalidation.
    pub fn import_state(&mut self, memento: &BrushMemento) {
        self.faces = memento
            .faces
            .iter()
            .map(|m| Face::new(m.plane, m.projection, m.material.clone()))
            .collect();
        self.detail = memento.detail;
        self.structural_change();
    }

    // =========================================================================
    // Derived-geometry queries (lazy rebuild)
    // =========================================================================

    /// Rebuilds the B-Rep if any plane changed since the last build.
    pub fn evaluate_brep(&mut self) {
        if self.plane_changed {
            self.plane_changed = false;
            self.build_brep();
        }
    }

    /// Local-space bounding box.
    pub fn local_aabb(&mut self) -> Aabb {
        self.evaluate_brep();
        self.cache.aabb
    }

    /// Whether the last build classified the brush degenerate.
    pub fn is_degenerate(&mut self) -> bool {
        self.evaluate_brep();
        self.cache.degenerate
    }

    /// Unique vertex positions of the solid.
    pub fn unique_vertex_points(&mut self) -> &[Vec3] {
        self.evaluate_brep();
        &self.cache.unique_vertex_points
    }

    /// Midpoints of the unique edges.
    pub fn unique_edge_points(&mut self) -> &[Vec3] {
        self.evaluate_brep();
        &self.cache.unique_edge_points
    }

    /// Centroids of the contributing faces.
    pub fn face_centroid_points(&mut self) -> &[Vec3] {
        self.evaluate_brep();
        &self.cache.face_centroid_points
    }

    /// The two faces meeting at each unique edge.
    pub fn edge_faces(&mut self) -> &[EdgeFaces] {
        self.evaluate_brep();
        &self.cache.edge_faces
    }

    /// Wireframe indices: per unique edge, its two endpoints as indices
    /// into [`Brush::unique_vertex_points`].
    pub fn edge_indices(&mut self) -> &[(usize, usize)] {
        self.evaluate_brep();
        &self.cache.edge_indices
    }

    /// Number of faces whose windings actually bound the solid.
    pub fn contributing_face_count(&mut self) -> usize {
        self.evaluate_brep();
        self.faces.iter().filter(|f| f.contributes()).count()
    }

    /// Whether at least one face contributes.
    pub fn has_contributing_faces(&mut self) -> bool {
        self.contributing_face_count() > 0
    }

    /// Classifies the whole brush against an arbitrary plane by summing
    /// the vertex classifications of every contributing winding.
    pub fn classify_plane(&mut self, plane: &Plane3) -> PlaneCounts {
        self.evaluate_brep();
        let mut counts = PlaneCounts::default();
        for face in self.faces.iter().filter(|f| f.contributes()) {
            counts += face.winding().classify_plane(plane);
        }
        counts
    }

    /// Closest point where a ray enters the solid, if any: the nearest
    /// front-facing plane hit lying behind every other face plane.
    pub fn ray_intersection(&mut self, origin: &Vec3, direction: &Vec3) -> Option<Vec3> {
        self.evaluate_brep();
        let mut best: Option<f64> = None;
        for (i, face) in self.faces.iter().enumerate() {
            if !face.contributes() {
                continue;
            }
            let plane = face.plane();
            let denom = plane.normal().dot(direction);
            // Entering hits run against the outward normal.
            if denom >= 0.0 {
                continue;
            }
            let t = -plane.distance_to(origin) / denom;
            if t < 0.0 || best.is_some_and(|b| t >= b) {
                continue;
            }
            let point = origin + direction * t;
            let inside = self
                .faces
                .iter()
                .enumerate()
                .filter(|(j, f)| *j != i && f.contributes())
                .all(|(_, f)| f.plane().distance_to(&point) < ON_EPSILON);
            if inside {
                best = Some(t);
            }
        }
        best.map(|t| origin + direction * t)
    }

    // =========================================================================
    // Winding construction
    // =========================================================================

    /// Whether the plane of `index` is not dominated by a near-parallel
    /// duplicate elsewhere in the face list.
    pub fn plane_unique(&self, index: usize) -> bool {
        let planes: Vec<Plane3> = self.faces.iter().map(|f| *f.plane()).collect();
        plane_unique(&planes, index)
    }

    /// The polygon an arbitrary plane would have inside this brush, used
    /// for clip previews and tests. Pure function of the current planes.
    pub fn winding_for_clip_plane(&self, plane: &Plane3) -> Winding {
        let planes: Vec<Plane3> = self.faces.iter().map(|f| *f.plane()).collect();
        let unique: Vec<bool> = (0..planes.len())
            .map(|i| plane_unique(&planes, i))
            .collect();
        winding_for_clip_plane(&planes, &unique, plane)
    }

    /// Builds every face winding, grows the AABB, and runs the cleanup
    /// passes. Returns true when the brush is unbounded (degenerate).
    fn build_windings(&mut self) -> bool {
        let planes: Vec<Plane3> = self.faces.iter().map(|f| *f.plane()).collect();
        let unique: Vec<bool> = (0..planes.len())
            .map(|i| plane_unique(&planes, i))
            .collect();

        let mut aabb = Aabb::default();
        for i in 0..self.faces.len() {
            if !planes[i].is_valid() || !unique[i] {
                self.faces[i].set_winding(Winding::new());
                continue;
            }
            let winding = winding_for_clip_plane(&planes, &unique, &planes[i]);
            for vertex in winding.iter() {
                aabb.include_point(&vertex.vertex);
            }
            self.faces[i].set_winding(winding);
        }
        self.cache.aabb = aabb;

        let bounded = self.faces.iter().all(Face::is_bounded);
        if bounded {
            // Order matters: each pass relies on the previous one.
            self.remove_degenerate_edges();
            self.remove_degenerate_faces();
            self.remove_duplicate_edges();
            self.verify_connectivity_graph();
        }
        !bounded
    }

    /// Collapses edges shorter than `ON_EPSILON`, removing the matching
    /// edge from the adjacent face's winding as well.
    fn remove_degenerate_edges(&mut self) {
        for i in 0..self.faces.len() {
            let mut index = 0;
            while index < self.faces[i].winding().len() {
                let winding = self.faces[i].winding();
                let next = winding.next_index(index);
                let edge = winding[next].vertex - winding[index].vertex;
                if edge.norm_squared() >= ON_EPSILON * ON_EPSILON {
                    index += 1;
                    continue;
                }
                if let Some(adjacent) = winding[index].adjacent {
                    if adjacent != i {
                        if let Some(other) = self.faces[adjacent].winding().find_adjacent(i) {
                            self.faces[adjacent].winding_mut().remove(other);
                        }
                    }
                }
                self.faces[i].winding_mut().remove(index);
            }
        }
    }

    /// A 2-point winding is an "edge face": the plane only touches an edge
    /// of the solid. Splice its two neighbors together and zero it.
    fn remove_degenerate_faces(&mut self) {
        for i in 0..self.faces.len() {
            if self.faces[i].winding().len() != 2 {
                continue;
            }
            let first = self.faces[i].winding()[0].adjacent;
            let second = self.faces[i].winding()[1].adjacent;
            if let Some(first) = first {
                if let Some(index) = self.faces[first].winding().find_adjacent(i) {
                    self.faces[first].winding_mut()[index].adjacent = second;
                }
            }
            if let Some(second) = second {
                if let Some(index) = self.faces[second].winding().find_adjacent(i) {
                    self.faces[second].winding_mut()[index].adjacent = first;
                }
            }
            self.faces[i].winding_mut().clear();
        }
    }

    /// Collapses consecutive winding edges naming the same adjacent face.
    fn remove_duplicate_edges(&mut self) {
        for i in 0..self.faces.len() {
            let mut index = 0;
            while index < self.faces[i].winding().len() {
                let winding = self.faces[i].winding();
                let next = winding.next_index(index);
                if winding[index].adjacent == winding[next].adjacent {
                    self.faces[i].winding_mut().remove(next);
                } else {
                    index += 1;
                }
            }
        }
    }

    /// Drops edges whose adjacent face does not reciprocally list this one.
    fn verify_connectivity_graph(&mut self) {
        for i in 0..self.faces.len() {
            let mut index = 0;
            while index < self.faces[i].winding().len() {
                let reciprocal = self.faces[i].winding()[index]
                    .adjacent
                    .and_then(|adjacent| self.faces[adjacent].winding().find_adjacent(i));
                if reciprocal.is_none() {
                    debug!(face = i, edge = index, "dropping one-directional edge");
                    self.faces[i].winding_mut().remove(index);
                } else {
                    index += 1;
                }
            }
        }
    }

    // =========================================================================
    // Global topology
    // =========================================================================

    /// Full rebuild: windings, cleanup, then brush-wide unique vertex and
    /// edge lists stitched from the per-face adjacency rings.
    fn build_brep(&mut self) {
        let unbounded = self.build_windings();
        let contributing = self.faces.iter().filter(|f| f.contributes()).count();
        let vertex_total: usize = self.faces.iter().map(|f| f.winding().len()).sum();

        // Every closed polyhedron has an even occurrence count: each
        // physical edge appears in exactly two windings.
        if unbounded || contributing < 4 || vertex_total % 2 != 0 {
            debug!(
                unbounded,
                contributing, vertex_total, "degenerate brush, clearing derived geometry"
            );
            for face in &mut self.faces {
                face.winding_mut().clear();
            }
            self.cache = BrepCache::default();
            self.cache.degenerate = true;
            return;
        }

        let faces = &self.faces;
        let mut offsets = Vec::with_capacity(faces.len());
        let mut total = 0;
        for face in faces {
            offsets.push(total);
            total += face.winding().len();
        }
        let mut occurrences = Vec::with_capacity(total);
        for (f, face) in faces.iter().enumerate() {
            for v in 0..face.winding().len() {
                occurrences.push((f, v));
            }
        }
        let absolute = |f: usize, v: usize| offsets[f] + v;

        // One hop across an edge: the matching (face, vertex) occurrence on
        // the adjacent face.
        let next_edge = |f: usize, v: usize| -> Option<(usize, usize)> {
            let adjacent = faces[f].winding()[v].adjacent?;
            let other = faces[adjacent].winding().find_adjacent(f)?;
            Some((adjacent, other))
        };
        // One step around a physical vertex: cross the edge, then advance
        // one slot in the adjacent winding.
        let next_vertex = |f: usize, v: usize| -> Option<(usize, usize)> {
            let (af, av) = next_edge(f, v)?;
            Some((af, faces[af].winding().next_index(av)))
        };

        // Unique vertices: chase each ring once, tagging every occurrence
        // with the id of its first-encountered representative.
        let mut vertex_ids = vec![usize::MAX; total];
        let mut unique_vertex_points = Vec::new();
        for start in 0..total {
            if vertex_ids[start] != usize::MAX {
                continue;
            }
            let id = unique_vertex_points.len();
            let (f0, v0) = occurrences[start];
            unique_vertex_points.push(faces[f0].winding()[v0].vertex);
            let (mut f, mut v) = (f0, v0);
            let mut steps = 0;
            loop {
                vertex_ids[absolute(f, v)] = id;
                match next_vertex(f, v) {
                    Some(next) => (f, v) = next,
                    None => {
                        warn!(face = f, vertex = v, "dangling vertex ring");
                        break;
                    }
                }
                if (f, v) == (f0, v0) {
                    break;
                }
                steps += 1;
                if steps > total {
                    warn!(face = f0, vertex = v0, "vertex ring failed to close");
                    break;
                }
            }
        }

        // Unique edges: each physical edge is a two-occurrence ring.
        let mut edge_seen = vec![false; total];
        let mut unique_edge_points = Vec::new();
        let mut edge_faces = Vec::new();
        let mut edge_indices = Vec::new();
        for start in 0..total {
            if edge_seen[start] {
                continue;
            }
            edge_seen[start] = true;
            let (f, v) = occurrences[start];
            let Some((af, av)) = next_edge(f, v) else {
                warn!(face = f, vertex = v, "dangling edge occurrence");
                continue;
            };
            edge_seen[absolute(af, av)] = true;
            let winding = faces[f].winding();
            let next = winding.next_index(v);
            unique_edge_points.push((winding[v].vertex + winding[next].vertex) * 0.5);
            edge_faces.push(EdgeFaces { first: f, second: af });
            edge_indices.push((vertex_ids[absolute(f, v)], vertex_ids[absolute(f, next)]));
        }

        let face_centroid_points = faces
            .iter()
            .filter_map(Face::centroid)
            .collect::<Vec<_>>();

        // Advisory only: precision slop in hand-built maps can trip this
        // without the geometry being unusable.
        if unique_vertex_points.len() + contributing != unique_edge_points.len() + 2 {
            warn!(
                vertices = unique_vertex_points.len(),
                faces = contributing,
                edges = unique_edge_points.len(),
                "brush B-Rep violates the Euler invariant"
            );
        }

        self.cache.degenerate = false;
        self.cache.unique_vertex_points = unique_vertex_points;
        self.cache.unique_edge_points = unique_edge_points;
        self.cache.face_centroid_points = face_centroid_points;
        self.cache.edge_faces = edge_faces;
        self.cache.edge_indices = edge_indices;
    }
}

// =============================================================================
// Free helpers
// =============================================================================

/// Whether `planes[index]` is not dominated by a near-parallel duplicate.
fn plane_unique(planes: &[Plane3], index: usize) -> bool {
    planes
        .iter()
        .enumerate()
        .all(|(i, other)| i == index || planes[index].inside(other, index < i))
}

/// Intersection polygon of `plane` with the half-spaces of all `planes`:
/// the visible portion of that plane inside the solid.
fn winding_for_clip_plane(planes: &[Plane3], unique: &[bool], plane: &Plane3) -> Winding {
    let mut buffer = FixedWinding::create_infinite(plane, MAX_WORLD_COORD + 1.0);
    let mut scratch = FixedWinding::new();
    for (i, clip) in planes.iter().enumerate() {
        // Skip the plane itself, invalid planes, dominated duplicates and
        // exactly opposing planes (no interior between them to keep).
        if *clip == *plane || !clip.is_valid() || !unique[i] || *plane == clip.flipped() {
            continue;
        }
        scratch.clear();
        // Inverted: the surviving half is the side not cut away.
        buffer.clip_into(plane, &clip.flipped(), i, &mut scratch);
        std::mem::swap(&mut buffer, &mut scratch);
    }
    buffer.to_winding()
}

// =============================================================================
// Tests (cleanup passes on hand-built windings)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use qbrush_winding::WindingVertex;

    fn vertex(x: f64, y: f64, adjacent: usize) -> WindingVertex {
        let mut v = WindingVertex::at(Vec3::new(x, y, 0.0));
        v.adjacent = Some(adjacent);
        v
    }

    fn winding_of(vertices: Vec<WindingVertex>) -> Winding {
        let mut winding = Winding::new();
        for v in vertices {
            winding.push(v);
        }
        winding
    }

    fn brush_with_faces(count: usize) -> Brush {
        let mut brush = Brush::new();
        for i in 0..count {
            brush
                .add_face(Face::new(
                    Plane3::new(Vec3::z(), i as f64),
                    TextureProjection::default(),
                    MaterialInfo::default(),
                ))
                .expect("under the face cap");
        }
        brush
    }

    #[test]
    fn short_edges_collapse_on_both_sides() {
        let mut brush = brush_with_faces(4);
        // The edge from (1, 0) to (1.0001, 0) is far below the epsilon.
        brush.faces[0].set_winding(winding_of(vec![
            vertex(0.0, 0.0, 2),
            vertex(1.0, 0.0, 1),
            vertex(1.0001, 0.0, 3),
            vertex(0.5, 1.0, 2),
        ]));
        brush.faces[1].set_winding(winding_of(vec![
            vertex(5.0, 5.0, 0),
            vertex(6.0, 5.0, 3),
            vertex(6.0, 6.0, 2),
        ]));

        brush.remove_degenerate_edges();

        let winding = brush.faces[0].winding();
        assert_eq!(winding.len(), 3);
        assert!(!winding.iter().any(|v| v.vertex == Vec3::new(1.0, 0.0, 0.0)));
        // The matching edge disappears from the neighbor as well.
        assert_eq!(brush.faces[1].winding().len(), 2);
        assert!(brush.faces[1].winding().find_adjacent(0).is_none());
    }

    #[test]
    fn edge_faces_splice_their_neighbors() {
        let mut brush = brush_with_faces(3);
        // Face 0 kept only two points: its plane touches an edge shared by
        // faces 1 and 2.
        brush.faces[0].set_winding(winding_of(vec![
            vertex(0.0, 0.0, 1),
            vertex(1.0, 0.0, 2),
        ]));
        brush.faces[1].set_winding(winding_of(vec![
            vertex(0.0, 0.0, 0),
            vertex(1.0, 0.0, 2),
            vertex(0.0, 1.0, 2),
        ]));
        brush.faces[2].set_winding(winding_of(vec![
            vertex(0.0, 0.0, 0),
            vertex(1.0, 0.0, 1),
            vertex(0.0, 1.0, 1),
        ]));

        brush.remove_degenerate_faces();

        assert!(brush.faces[0].winding().is_empty());
        assert!(brush.faces[1].winding().find_adjacent(0).is_none());
        assert_eq!(brush.faces[1].winding()[0].adjacent, Some(2));
        assert_eq!(brush.faces[2].winding()[0].adjacent, Some(1));
    }

    #[test]
    fn repeated_neighbor_edges_merge() {
        let mut brush = brush_with_faces(1);
        brush.faces[0].set_winding(winding_of(vec![
            vertex(0.0, 0.0, 1),
            vertex(1.0, 0.0, 2),
            vertex(1.0, 1.0, 2),
            vertex(0.0, 1.0, 3),
        ]));

        brush.remove_duplicate_edges();

        let winding = brush.faces[0].winding();
        assert_eq!(winding.len(), 3);
        let tags: Vec<_> = winding.iter().map(|v| v.adjacent).collect();
        assert_eq!(tags, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn one_directional_edges_are_dropped() {
        let mut brush = brush_with_faces(3);
        brush.faces[0].set_winding(winding_of(vec![
            vertex(0.0, 0.0, 1),
            vertex(1.0, 0.0, 2),
            vertex(0.0, 1.0, 1),
        ]));
        brush.faces[1].set_winding(winding_of(vec![
            vertex(5.0, 0.0, 0),
            vertex(6.0, 0.0, 2),
            vertex(5.0, 1.0, 2),
        ]));
        // Face 2 never refers back to face 0.
        brush.faces[2].set_winding(winding_of(vec![
            vertex(9.0, 0.0, 1),
            vertex(10.0, 0.0, 1),
            vertex(9.0, 1.0, 1),
        ]));

        brush.verify_connectivity_graph();

        assert_eq!(brush.faces[0].winding().len(), 2);
        assert!(brush.faces[0].winding().find_adjacent(2).is_none());
        assert_eq!(brush.faces[1].winding().len(), 3);
        assert_eq!(brush.faces[2].winding().len(), 3);
    }
}
