#![warn(missing_docs)]

//! qbrush: convex brush geometry kernel.
//!
//! A brush is a convex solid described by an ordered set of planes. This
//! crate re-exports the whole kernel: plane math, the half-space clipper,
//! B-Rep construction and the CSG operators, plus serde records for
//! round-tripping brushes through map files.
//!
//! # Example
//!
//! ```rust
//! use qbrush::{primitives, Aabb, MaterialInfo, Plane3, Vec3};
//!
//! let bounds = Aabb::from_min_max(Vec3::zeros(), Vec3::new(64.0, 64.0, 64.0));
//! let mut brush = primitives::cuboid(&bounds, &MaterialInfo::default());
//! assert_eq!(brush.unique_vertex_points().len(), 8);
//!
//! let winding = brush.winding_for_clip_plane(&Plane3::new(Vec3::x(), 32.0));
//! assert_eq!(winding.len(), 4);
//! ```

pub use qbrush_brep::primitives;
pub use qbrush_brep::{
    texture_basis, Brush, BrushMemento, DetailFlag, EdgeFaces, Face, FaceMemento, MaterialInfo,
    MaterialProvider, NullMaterialProvider, StateSaver, TexDef, TextureProjection,
    DEFAULT_TEXTURE_SCALE,
};
pub use qbrush_csg::{hollow, merge, split_by_plane, subtract, MergeError, SplitOutcome};
pub use qbrush_math::{
    Aabb, Mat3, Mat4, Plane3, PlaneSide, Vec2, Vec3, MAX_BRUSH_FACES, MAX_WORLD_COORD, ON_EPSILON,
};
pub use qbrush_winding::{PlaneCounts, Winding, WindingVertex};

pub mod format;
