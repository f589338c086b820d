//! Brush primitives: plane sets for the standard editor shapes.
//!
//! Every constructor produces plane triples in clockwise-from-outside
//! order, so all normals point out of the solid.

use qbrush_math::{Aabb, Vec3};

use crate::brush::Brush;
use crate::texture::{MaterialInfo, TextureProjection};

/// Pairs of axis indices used to walk the three max-corner and three
/// min-corner planes of a cuboid.
const CUBOID_AXES: [[usize; 2]; 3] = [[0, 1], [2, 0], [1, 2]];

/// Axis-aligned cuboid filling `bounds`.
pub fn cuboid(bounds: &Aabb, material: &MaterialInfo) -> Brush {
    let min = bounds.min();
    let max = bounds.max();
    let mut brush = Brush::new();

    for axes in CUBOID_AXES {
        let mut p1 = max;
        p1[axes[1]] = min[axes[1]];
        let mut p2 = max;
        p2[axes[0]] = min[axes[0]];
        let _ = brush.add_plane(max, p1, p2, TextureProjection::default(), material.clone());
    }
    for axes in CUBOID_AXES {
        let mut p1 = min;
        p1[axes[1]] = max[axes[1]];
        let mut p2 = min;
        p2[axes[0]] = max[axes[0]];
        let _ = brush.add_plane(min, p2, p1, TextureProjection::default(), material.clone());
    }
    brush
}

/// Points on the ellipse inscribed in the box's XY cross-section.
fn rim_point(bounds: &Aabb, sides: usize, index: usize, z: f64) -> Vec3 {
    let angle = std::f64::consts::TAU * (index % sides) as f64 / sides as f64;
    Vec3::new(
        bounds.origin.x + bounds.extents.x * angle.cos(),
        bounds.origin.y + bounds.extents.y * angle.sin(),
        z,
    )
}

/// Regular prism along the Z axis with `sides` lateral faces, inscribed in
/// `bounds`. Needs at least three sides.
pub fn prism(bounds: &Aabb, sides: usize, material: &MaterialInfo) -> Brush {
    debug_assert!(sides >= 3);
    let min = bounds.min();
    let max = bounds.max();
    let mut brush = Brush::new();

    // Caps.
    let _ = brush.add_plane(
        Vec3::new(max.x, max.y, max.z),
        Vec3::new(max.x, min.y, max.z),
        Vec3::new(min.x, max.y, max.z),
        TextureProjection::default(),
        material.clone(),
    );
    let _ = brush.add_plane(
        Vec3::new(max.x, max.y, min.z),
        Vec3::new(min.x, max.y, min.z),
        Vec3::new(max.x, min.y, min.z),
        TextureProjection::default(),
        material.clone(),
    );

    for i in 0..sides {
        let bottom = rim_point(bounds, sides, i, min.z);
        let top = rim_point(bounds, sides, i, max.z);
        let bottom_next = rim_point(bounds, sides, i + 1, min.z);
        let _ = brush.add_plane(
            bottom,
            top,
            bottom_next,
            TextureProjection::default(),
            material.clone(),
        );
    }
    brush
}

/// Cone along the Z axis: a base plus `sides` slanted faces meeting at the
/// apex above the box center. Needs at least three sides.
pub fn cone(bounds: &Aabb, sides: usize, material: &MaterialInfo) -> Brush {
    debug_assert!(sides >= 3);
    let min = bounds.min();
    let max = bounds.max();
    let apex = Vec3::new(bounds.origin.x, bounds.origin.y, max.z);
    let mut brush = Brush::new();

    let _ = brush.add_plane(
        Vec3::new(max.x, max.y, min.z),
        Vec3::new(min.x, max.y, min.z),
        Vec3::new(max.x, min.y, min.z),
        TextureProjection::default(),
        material.clone(),
    );
    for i in 0..sides {
        let base = rim_point(bounds, sides, i, min.z);
        let base_next = rim_point(bounds, sides, i + 1, min.z);
        let _ = brush.add_plane(
            base,
            apex,
            base_next,
            TextureProjection::default(),
            material.clone(),
        );
    }
    brush
}
