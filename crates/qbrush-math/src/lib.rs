#![warn(missing_docs)]

//! Plane, bounds and classification primitives for the qbrush kernel.
//!
//! A brush is a convex solid described by an ordered set of [`Plane3`]s
//! whose normals point out of the solid; the interior is the back side
//! (`n · x < d`) of every plane. Everything downstream (windings, B-Rep,
//! CSG) is built on the epsilon classifications defined here.

use nalgebra::{Matrix4, Unit, Vector2, Vector3};

/// 2D vector of f64.
pub type Vec2 = Vector2<f64>;
/// 3D vector of f64.
pub type Vec3 = Vector3<f64>;
/// 3x3 matrix of f64.
pub type Mat3 = nalgebra::Matrix3<f64>;
/// 4x4 matrix of f64.
pub type Mat4 = Matrix4<f64>;

// =============================================================================
// Constants
// =============================================================================

/// Epsilon band for winding-clip classification of a point against a plane.
pub const ON_EPSILON: f64 = 1.0 / 256.0;

/// Tighter epsilon used to detect near-parallel duplicate planes.
pub const DUPLICATE_PLANE_EPSILON: f64 = 0.001;

/// Tolerance on `|n|² - 1` below which a plane normal counts as unit length.
pub const PLANE_VALID_EPSILON: f64 = 0.01;

/// Hard cap on the number of faces a single brush may carry.
pub const MAX_BRUSH_FACES: usize = 1024;

/// Largest world coordinate; windings reaching past this are unbounded.
pub const MAX_WORLD_COORD: f64 = 65536.0;

// =============================================================================
// Classification
// =============================================================================

/// Side of a plane a point (or a whole winding) lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// Within the epsilon band around the plane.
    On,
    /// On the side the normal points to (`n · x > d`).
    Front,
    /// On the opposite side (`n · x < d`); the interior side of a face plane.
    Back,
}

/// Classifies a signed distance against an epsilon band.
pub fn classify_distance(distance: f64, epsilon: f64) -> PlaneSide {
    if distance > epsilon {
        PlaneSide::Front
    } else if distance < -epsilon {
        PlaneSide::Back
    } else {
        PlaneSide::On
    }
}

/// Componentwise near-equality of two vectors.
pub fn vectors_near(a: &Vec3, b: &Vec3, epsilon: f64) -> bool {
    (a.x - b.x).abs() < epsilon && (a.y - b.y).abs() < epsilon && (a.z - b.z).abs() < epsilon
}

/// Snaps a scalar to the nearest multiple of `grid`.
pub fn snapped_to_grid(value: f64, grid: f64) -> f64 {
    (value / grid).round() * grid
}

// =============================================================================
// Plane3
// =============================================================================

/// An infinite oriented plane `n · x = d`.
///
/// The normal is unit length for a valid plane; `is_valid` is false for
/// degenerate (zero-normal) planes, which are excluded from clipping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane3 {
    normal: Vec3,
    dist: f64,
}

impl Plane3 {
    /// Creates a plane from a normal and signed distance from the origin.
    pub fn new(normal: Vec3, dist: f64) -> Self {
        Self { normal, dist }
    }

    /// Creates a plane through three points given in clockwise order when
    /// viewed from the front (map-format convention); the normal points
    /// toward the viewer, i.e. out of the solid the plane bounds.
    pub fn from_points(p0: Vec3, p1: Vec3, p2: Vec3) -> Self {
        let cross = (p2 - p0).cross(&(p1 - p0));
        let norm = cross.norm();
        if norm == 0.0 {
            return Self::new(Vec3::zeros(), 0.0);
        }
        let normal = cross / norm;
        Self::new(normal, normal.dot(&p0))
    }

    /// The plane normal.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Signed distance of the plane from the origin along its normal.
    pub fn dist(&self) -> f64 {
        self.dist
    }

    /// A plane is valid iff its normal is unit length within tolerance.
    pub fn is_valid(&self) -> bool {
        (self.normal.dot(&self.normal) - 1.0).abs() < PLANE_VALID_EPSILON
    }

    /// Signed distance from the plane to a point (positive in front).
    pub fn distance_to(&self, point: &Vec3) -> f64 {
        self.normal.dot(point) - self.dist
    }

    /// Classifies a point against the plane with the given epsilon band.
    pub fn side(&self, point: &Vec3, epsilon: f64) -> PlaneSide {
        classify_distance(self.distance_to(point), epsilon)
    }

    /// The same plane facing the opposite way.
    pub fn flipped(&self) -> Self {
        Self::new(-self.normal, -self.dist)
    }

    /// Moves the plane along its own normal.
    pub fn offset(&mut self, amount: f64) {
        self.dist += amount;
    }

    /// The plane translated by a vector.
    pub fn translated(&self, translation: &Vec3) -> Self {
        Self::new(self.normal, self.dist + self.normal.dot(translation))
    }

    /// The plane mapped through an affine transform.
    ///
    /// Rebuilt from three transformed points so non-uniform scale and shear
    /// are handled without an explicit inverse transpose.
    pub fn transformed(&self, transform: &Mat4) -> Self {
        let origin = self.normal * self.dist;
        let u = orthogonal_basis_vector(&self.normal);
        let v = self.normal.cross(&u);
        let map = |p: Vec3| transform.transform_point(&p.into()).coords;
        // u x v == normal, so (p0, p0 + v, p0 + u) keeps the orientation.
        Self::from_points(map(origin), map(origin + v), map(origin + u))
    }

    /// Snaps the plane to a grid by snapping three points on it and
    /// rebuilding; leaves the plane untouched if snapping degenerates it.
    pub fn snapped(&self, grid: f64) -> Self {
        let origin = self.normal * self.dist;
        let u = orthogonal_basis_vector(&self.normal) * grid.max(1.0) * 8.0;
        let v = self.normal.cross(&u);
        let snap = |p: Vec3| Vec3::new(
            snapped_to_grid(p.x, grid),
            snapped_to_grid(p.y, grid),
            snapped_to_grid(p.z, grid),
        );
        let candidate = Self::from_points(snap(origin), snap(origin + v), snap(origin + u));
        if candidate.is_valid() {
            candidate
        } else {
            *self
        }
    }

    /// Whether this plane bounds more tightly than a near-parallel `other`.
    ///
    /// When the normals agree within [`DUPLICATE_PLANE_EPSILON`] the plane
    /// with the smaller signed distance wins; an exact distance tie is
    /// broken in favor of the earlier-inserted plane (`self_is_earlier`).
    /// Non-parallel planes never dominate each other.
    pub fn inside(&self, other: &Plane3, self_is_earlier: bool) -> bool {
        if !vectors_near(&self.normal, &other.normal, DUPLICATE_PLANE_EPSILON) {
            return true;
        }
        if self.dist != other.dist {
            self.dist < other.dist
        } else {
            self_is_earlier
        }
    }
}

impl std::ops::Neg for Plane3 {
    type Output = Plane3;

    fn neg(self) -> Plane3 {
        self.flipped()
    }
}

/// Some unit vector orthogonal to `direction` (assumed non-zero).
pub fn orthogonal_basis_vector(direction: &Vec3) -> Vec3 {
    let axis = if direction.x.abs() <= direction.y.abs()
        && direction.x.abs() <= direction.z.abs()
    {
        Vec3::x()
    } else if direction.y.abs() <= direction.z.abs() {
        Vec3::y()
    } else {
        Vec3::z()
    };
    Unit::new_normalize(direction.cross(&axis)).into_inner()
}

// =============================================================================
// Aabb
// =============================================================================

/// Axis-aligned bounding box stored as origin + extents.
///
/// A default-constructed box has negative extents and is invalid until the
/// first point is included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Center of the box.
    pub origin: Vec3,
    /// Half-size along each axis; negative while the box is empty.
    pub extents: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            origin: Vec3::zeros(),
            extents: Vec3::new(-1.0, -1.0, -1.0),
        }
    }
}

impl Aabb {
    /// A box spanning `min..=max`.
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            origin: (min + max) * 0.5,
            extents: (max - min) * 0.5,
        }
    }

    /// Whether the box contains at least one point.
    pub fn is_valid(&self) -> bool {
        self.extents.x >= 0.0 && self.extents.y >= 0.0 && self.extents.z >= 0.0
    }

    /// Minimum corner.
    pub fn min(&self) -> Vec3 {
        self.origin - self.extents
    }

    /// Maximum corner.
    pub fn max(&self) -> Vec3 {
        self.origin + self.extents
    }

    /// Grows the box to contain a point.
    pub fn include_point(&mut self, point: &Vec3) {
        if !self.is_valid() {
            self.origin = *point;
            self.extents = Vec3::zeros();
            return;
        }
        let min = self.min().inf(point);
        let max = self.max().sup(point);
        *self = Self::from_min_max(min, max);
    }

    /// Whether two boxes overlap (touching counts).
    pub fn intersects(&self, other: &Aabb) -> bool {
        if !self.is_valid() || !other.is_valid() {
            return false;
        }
        (self.origin.x - other.origin.x).abs() <= self.extents.x + other.extents.x
            && (self.origin.y - other.origin.y).abs() <= self.extents.y + other.extents.y
            && (self.origin.z - other.origin.z).abs() <= self.extents.z + other.extents.z
    }
}

// =============================================================================
// Tests
// =============================================================================
