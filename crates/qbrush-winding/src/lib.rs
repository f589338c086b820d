#![warn(missing_docs)]

//! Face polygons ("windings") and the half-space clipper that derives them.
//!
//! A [`Winding`] is the ordered, cyclic vertex loop bounding one face of a
//! convex solid. It is never authored directly: the [`FixedWinding`] clipper
//! seeds an "infinite" quadrilateral on the face plane and narrows it by one
//! half-space per sibling face, tagging every created edge with the index of
//! the face that produced it. That adjacency tag is what the B-Rep stage
//! later stitches into a full edge/vertex graph.

use qbrush_math::{
    classify_distance, Plane3, PlaneSide, Vec2, Vec3, ON_EPSILON,
};

// =============================================================================
// Winding
// =============================================================================

/// One vertex of a face polygon.
///
/// `tangent`, `bitangent` and `normal` exist for rendering only and carry no
/// topological meaning. `adjacent` names the other face sharing the edge
/// that starts at this vertex, or `None` while still unassigned.
#[derive(Debug, Clone, PartialEq)]
pub struct WindingVertex {
    /// Position in brush-local space.
    pub vertex: Vec3,
    /// Texture coordinate.
    pub texcoord: Vec2,
    /// Texture-space tangent.
    pub tangent: Vec3,
    /// Texture-space bitangent.
    pub bitangent: Vec3,
    /// Face normal copied onto the vertex.
    pub normal: Vec3,
    /// Index of the other face sharing the outgoing edge.
    pub adjacent: Option<usize>,
}

impl WindingVertex {
    /// A vertex at `position` with everything else zeroed / unassigned.
    pub fn at(position: Vec3) -> Self {
        Self {
            vertex: position,
            texcoord: Vec2::zeros(),
            tangent: Vec3::zeros(),
            bitangent: Vec3::zeros(),
            normal: Vec3::zeros(),
            adjacent: None,
        }
    }
}

/// Per-side vertex counts of a winding classified against a plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaneCounts {
    /// Vertices in front of the plane.
    pub front: usize,
    /// Vertices behind the plane.
    pub back: usize,
    /// Vertices within the epsilon band.
    pub on: usize,
}

impl PlaneCounts {
    /// Whether vertices fall on both sides.
    pub fn is_straddling(&self) -> bool {
        self.front != 0 && self.back != 0
    }
}

impl std::ops::AddAssign for PlaneCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.front += rhs.front;
        self.back += rhs.back;
        self.on += rhs.on;
    }
}

/// The ordered, cyclic polygon bounding one face.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Winding {
    points: Vec<WindingVertex>,
}

impl Winding {
    /// An empty winding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the winding has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Removes all vertices.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Appends a vertex.
    pub fn push(&mut self, vertex: WindingVertex) {
        self.points.push(vertex);
    }

    /// Removes the vertex at `index`, shifting the rest.
    pub fn remove(&mut self, index: usize) -> WindingVertex {
        self.points.remove(index)
    }

    /// Cyclic successor of an index.
    pub fn next_index(&self, index: usize) -> usize {
        if index + 1 == self.points.len() {
            0
        } else {
            index + 1
        }
    }

    /// Cyclic predecessor of an index.
    pub fn prev_index(&self, index: usize) -> usize {
        if index == 0 {
            self.points.len() - 1
        } else {
            index - 1
        }
    }

    /// Index of the vertex whose outgoing edge is shared with `face`.
    pub fn find_adjacent(&self, face: usize) -> Option<usize> {
        self.points.iter().position(|v| v.adjacent == Some(face))
    }

    /// Copies the face normal onto every vertex (rendering data only).
    pub fn update_normals(&mut self, normal: &Vec3) {
        for point in &mut self.points {
            point.normal = *normal;
        }
    }

    /// Counts the winding's vertices per side of a plane.
    pub fn classify_plane(&self, plane: &Plane3) -> PlaneCounts {
        let mut counts = PlaneCounts::default();
        for point in &self.points {
            match classify_distance(plane.distance_to(&point.vertex), ON_EPSILON) {
                PlaneSide::Front => counts.front += 1,
                PlaneSide::Back => counts.back += 1,
                PlaneSide::On => counts.on += 1,
            }
        }
        counts
    }

    /// True when no vertex lies strictly in front of the plane.
    pub fn all_behind(&self, plane: &Plane3) -> bool {
        self.classify_plane(plane).front == 0
    }

    /// Two faces are mutually concave when either winding pokes out in
    /// front of the other's plane; convex brushes never allow this.
    pub fn planes_concave(w1: &Winding, w2: &Winding, plane1: &Plane3, plane2: &Plane3) -> bool {
        !w1.all_behind(plane2) || !w2.all_behind(plane1)
    }

    /// Area centroid of the polygon, computed in the plane's dominant
    /// projection axis and lifted back onto the plane. `None` for windings
    /// with fewer than three points or zero projected area.
    pub fn centroid(&self, plane: &Plane3) -> Option<Vec3> {
        if self.points.len() < 3 {
            return None;
        }
        let (rx, ry, rz) = index_remap(projection_axis(&plane.normal()));
        let mut area2 = 0.0;
        let mut x_sum = 0.0;
        let mut y_sum = 0.0;
        let mut i = self.points.len() - 1;
        for j in 0..self.points.len() {
            let pi = &self.points[i].vertex;
            let pj = &self.points[j].vertex;
            let ai = pi[rx] * pj[ry] - pj[rx] * pi[ry];
            area2 += ai;
            x_sum += (pj[rx] + pi[rx]) * ai;
            y_sum += (pj[ry] + pi[ry]) * ai;
            i = j;
        }
        if area2 == 0.0 {
            return None;
        }
        let mut centroid = Vec3::zeros();
        centroid[rx] = x_sum / (3.0 * area2);
        centroid[ry] = y_sum / (3.0 * area2);
        let normal = plane.normal();
        centroid[rz] = (plane.dist() - normal[rx] * centroid[rx] - normal[ry] * centroid[ry])
            / normal[rz];
        Some(centroid)
    }

    /// Iterates over the vertices.
    pub fn iter(&self) -> std::slice::Iter<'_, WindingVertex> {
        self.points.iter()
    }

    /// Iterates mutably over the vertices.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, WindingVertex> {
        self.points.iter_mut()
    }
}

impl std::ops::Index<usize> for Winding {
    type Output = WindingVertex;

    fn index(&self, index: usize) -> &WindingVertex {
        &self.points[index]
    }
}

impl std::ops::IndexMut<usize> for Winding {
    fn index_mut(&mut self, index: usize) -> &mut WindingVertex {
        &mut self.points[index]
    }
}

impl<'a> IntoIterator for &'a Winding {
    type Item = &'a WindingVertex;
    type IntoIter = std::slice::Iter<'a, WindingVertex>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Index of the dominant component of a normal.
fn projection_axis(normal: &Vec3) -> usize {
    let ax = normal.x.abs();
    let ay = normal.y.abs();
    let az = normal.z.abs();
    if az >= ax && az >= ay {
        2
    } else if ax >= ay {
        0
    } else {
        1
    }
}

/// Component remap (x, y, z) for a projection axis.
fn index_remap(axis: usize) -> (usize, usize, usize) {
    match axis {
        0 => (1, 2, 0),
        1 => (2, 0, 1),
        _ => (0, 1, 2),
    }
}

// =============================================================================
// DoubleLine
// =============================================================================

/// An infinite line carried alongside each clipper vertex so intersection
/// points can be computed exactly on the original edge, not on a shortened
/// segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoubleLine {
    /// A point on the line.
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl DoubleLine {
    /// Line through `origin` along `direction` (normalised here).
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let norm = direction.norm();
        let direction = if norm > 0.0 { direction / norm } else { direction };
        Self { origin, direction }
    }

    /// The intersection line of two non-parallel planes.
    pub fn from_plane_intersection(p1: &Plane3, p2: &Plane3) -> Self {
        let n1 = p1.normal();
        let n2 = p2.normal();
        let direction = n1.cross(&n2);
        let denom = direction.norm_squared();
        if denom == 0.0 {
            // Parallel planes have no intersection line; callers filter
            // identical/opposing planes before clipping.
            return Self { origin: n1 * p1.dist(), direction: Vec3::zeros() };
        }
        let k = n1.dot(&n2);
        let origin =
            (n1 * (p1.dist() - p2.dist() * k) + n2 * (p2.dist() - p1.dist() * k)) / denom;
        Self { origin, direction: direction / denom.sqrt() }
    }

    /// The point where the line pierces a plane.
    pub fn intersect_plane(&self, plane: &Plane3) -> Vec3 {
        let denom = plane.normal().dot(&self.direction);
        if denom == 0.0 {
            return self.origin;
        }
        self.origin - self.direction * (plane.distance_to(&self.origin) / denom)
    }
}

// =============================================================================
// FixedWinding (half-space clipper)
// =============================================================================

/// A clipper vertex: position, the infinite line its outgoing edge lies on,
/// and the face that produced that edge.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedWindingVertex {
    /// Position.
    pub vertex: Vec3,
    /// Infinite line carrying the outgoing edge.
    pub edge: DoubleLine,
    /// Face that produced the outgoing edge, if any yet.
    pub adjacent: Option<usize>,
}

/// Working polygon for half-space clipping.
///
/// Two of these are ping-ponged per face: each clip pass reads one and
/// writes the other, then the owners are swapped with `mem::swap`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixedWinding {
    points: Vec<FixedWindingVertex>,
}

impl FixedWinding {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the quadrilateral that "tightly" bounds `plane` at `radius`,
    /// the starting polygon before any half-space is applied. Its edges
    /// carry no adjacency; any left unassigned after clipping means the
    /// solid reaches past the world bounds.
    pub fn create_infinite(plane: &Plane3, radius: f64) -> Self {
        let normal = plane.normal();
        let axis = projection_axis(&normal);
        let seed = if axis == 2 { Vec3::x() } else { Vec3::z() };
        let up = (seed - normal * seed.dot(&normal)).normalize();
        let right = up.cross(&normal);
        let org = normal * plane.dist();
        let up_r = up * radius;
        let right_r = right * radius;

        let mut winding = Self::new();
        winding.points.push(FixedWindingVertex {
            vertex: org - right_r + up_r,
            edge: DoubleLine::new(org + up_r, right),
            adjacent: None,
        });
        winding.points.push(FixedWindingVertex {
            vertex: org + right_r + up_r,
            edge: DoubleLine::new(org + right_r, -up),
            adjacent: None,
        });
        winding.points.push(FixedWindingVertex {
            vertex: org + right_r - up_r,
            edge: DoubleLine::new(org - up_r, -right),
            adjacent: None,
        });
        winding.points.push(FixedWindingVertex {
            vertex: org - right_r - up_r,
            edge: DoubleLine::new(org - right_r, up),
            adjacent: None,
        });
        winding
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Empties the buffer, keeping its allocation.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Clips this polygon (lying on `plane`) by `clip`, keeping the front
    /// side, and writes the result into `out`.
    ///
    /// Vertices created on the cut are tagged with `adjacent`, the index of
    /// the face whose (inverted) plane is doing the cutting. An edge lying
    /// exactly on the clip plane passes through with its existing tag.
    pub fn clip_into(&self, plane: &Plane3, clip: &Plane3, adjacent: usize, out: &mut FixedWinding) {
        let sides: Vec<PlaneSide> = self
            .points
            .iter()
            .map(|p| classify_distance(clip.distance_to(&p.vertex), ON_EPSILON))
            .collect();
        let front = sides.iter().filter(|s| **s == PlaneSide::Front).count();
        let back = sides.iter().filter(|s| **s == PlaneSide::Back).count();

        if back == 0 {
            // Entirely in front of (or on) the clip plane: survives whole.
            out.points.extend_from_slice(&self.points);
            return;
        }
        if front == 0 {
            // Entirely behind: clipped away.
            return;
        }

        let split_edge = DoubleLine::from_plane_intersection(plane, clip);
        for i in 0..self.points.len() {
            let next = if i + 1 == self.points.len() { 0 } else { i + 1 };
            let point = &self.points[i];
            match sides[i] {
                PlaneSide::Front => {
                    out.points.push(point.clone());
                    if sides[next] == PlaneSide::Back {
                        // Leaving the kept side: cut the outgoing edge and
                        // continue along the clip line.
                        out.points.push(FixedWindingVertex {
                            vertex: point.edge.intersect_plane(clip),
                            edge: split_edge,
                            adjacent: Some(adjacent),
                        });
                    }
                }
                PlaneSide::On => {
                    if sides[next] == PlaneSide::Back {
                        out.points.push(FixedWindingVertex {
                            vertex: point.vertex,
                            edge: split_edge,
                            adjacent: Some(adjacent),
                        });
                    } else {
                        out.points.push(point.clone());
                    }
                }
                PlaneSide::Back => {
                    if sides[next] == PlaneSide::Front {
                        // Re-entering: the surviving remainder of this edge
                        // keeps its original line and adjacency.
                        out.points.push(FixedWindingVertex {
                            vertex: point.edge.intersect_plane(clip),
                            edge: point.edge,
                            adjacent: point.adjacent,
                        });
                    }
                }
            }
        }
    }

    /// Copies positions and adjacency into a plain [`Winding`].
    pub fn to_winding(&self) -> Winding {
        let mut winding = Winding::new();
        for point in &self.points {
            let mut vertex = WindingVertex::at(point.vertex);
            vertex.adjacent = point.adjacent;
            winding.push(vertex);
        }
        winding
    }

    /// Iterates over the vertices.
    pub fn iter(&self) -> std::slice::Iter<'_, FixedWindingVertex> {
        self.points.iter()
    }
}

impl std::ops::Index<usize> for FixedWinding {
    type Output = FixedWindingVertex;

    fn index(&self, index: usize) -> &FixedWindingVertex {
        &self.points[index]
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_on_z0() -> FixedWinding {
        // Counter-clockwise seen from +z would be the back side; match the
        // clipper's clockwise-from-front convention instead.
        let corners = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
        ];
        let mut winding = FixedWinding::new();
        for i in 0..4 {
            let a = corners[i];
            let b = corners[(i + 1) % 4];
            winding.points.push(FixedWindingVertex {
                vertex: a,
                edge: DoubleLine::new(a, b - a),
                adjacent: Some(i),
            });
        }
        winding
    }

    #[test]
    fn infinite_winding_lies_on_its_plane() {
        let plane = Plane3::new(Vec3::new(0.6, 0.8, 0.0), 2.0);
        let winding = FixedWinding::create_infinite(&plane, 100.0);
        assert_eq!(winding.len(), 4);
        for point in winding.iter() {
            assert_relative_eq!(plane.distance_to(&point.vertex), 0.0, epsilon = 1e-9);
            assert_eq!(point.adjacent, None);
        }
    }

    #[test]
    fn clip_keeps_the_front_half_and_tags_the_cut() {
        let plane = Plane3::new(Vec3::z(), 0.0);
        // Keep x < 0.5: that region is in front of this clip plane.
        let clip = Plane3::new(-Vec3::x(), -0.5);
        let square = square_on_z0();
        let mut out = FixedWinding::new();
        square.clip_into(&plane, &clip, 9, &mut out);

        assert_eq!(out.len(), 4);
        let mut tagged = 0;
        for point in out.iter() {
            assert!(point.vertex.x <= 0.5 + ON_EPSILON);
            if point.adjacent == Some(9) {
                tagged += 1;
                assert_relative_eq!(point.vertex.x, 0.5, epsilon = 1e-9);
            }
        }
        assert_eq!(tagged, 1);
    }

    #[test]
    fn clip_passes_an_untouched_polygon_through() {
        let plane = Plane3::new(Vec3::z(), 0.0);
        let clip = Plane3::new(-Vec3::x(), -5.0);
        let square = square_on_z0();
        let mut out = FixedWinding::new();
        square.clip_into(&plane, &clip, 9, &mut out);
        assert_eq!(out, square);
    }

    #[test]
    fn clip_erases_a_polygon_fully_behind() {
        let plane = Plane3::new(Vec3::z(), 0.0);
        let clip = Plane3::new(Vec3::x(), 5.0);
        let square = square_on_z0();
        let mut out = FixedWinding::new();
        square.clip_into(&plane, &clip, 9, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn on_edge_keeps_its_existing_adjacency() {
        let plane = Plane3::new(Vec3::z(), 0.0);
        // The square's x = 0 edge lies exactly on this clip plane.
        let clip = Plane3::new(Vec3::x(), 0.0);
        let square = square_on_z0();
        let mut out = FixedWinding::new();
        square.clip_into(&plane, &clip, 9, &mut out);
        assert_eq!(out, square);
    }

    #[test]
    fn plane_intersection_line_lies_on_both_planes() {
        let p1 = Plane3::new(Vec3::z(), 1.0);
        let p2 = Plane3::new(Vec3::x(), 2.0);
        let line = DoubleLine::from_plane_intersection(&p1, &p2);
        for t in [-3.0, 0.0, 7.5] {
            let point = line.origin + line.direction * t;
            assert_relative_eq!(p1.distance_to(&point), 0.0, epsilon = 1e-9);
            assert_relative_eq!(p2.distance_to(&point), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn line_plane_intersection() {
        let line = DoubleLine::new(Vec3::new(0.0, 0.0, -2.0), Vec3::z());
        let plane = Plane3::new(Vec3::z(), 3.0);
        let hit = line.intersect_plane(&plane);
        assert_relative_eq!(hit.z, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn centroid_of_a_square() {
        let plane = Plane3::new(Vec3::z(), 0.0);
        let square = square_on_z0().to_winding();
        let centroid = square.centroid(&plane).expect("square has area");
        assert_relative_eq!(centroid.x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(centroid.y, 0.5, epsilon = 1e-12);
        assert_relative_eq!(centroid.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_windings_have_no_centroid() {
        let plane = Plane3::new(Vec3::z(), 0.0);
        assert!(Winding::new().centroid(&plane).is_none());

        // Three collinear points enclose no area.
        let mut sliver = Winding::new();
        for x in [0.0, 1.0, 2.0] {
            sliver.push(WindingVertex::at(Vec3::new(x, 0.0, 0.0)));
        }
        assert!(sliver.centroid(&plane).is_none());
    }

    #[test]
    fn concavity_test_spots_a_poked_out_winding() {
        let square = square_on_z0().to_winding();
        let mut lifted = square.clone();
        for v in lifted.iter_mut() {
            v.vertex.z += 1.0;
        }
        let below = Plane3::new(Vec3::z(), 0.0);
        let above = Plane3::new(Vec3::z(), 1.0);
        // Each winding sits exactly on the other's plane: convex.
        assert!(!Winding::planes_concave(&square, &square, &below, &below));
        // The lifted square is in front of the lower plane: concave.
        assert!(Winding::planes_concave(&square, &lifted, &below, &above));
    }
}
