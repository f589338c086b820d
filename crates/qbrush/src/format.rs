//! Serde records for brush persistence.
//!
//! Faces are stored the way map files store them: three points on the
//! plane (clockwise seen from the front) plus the projection matrix and a
//! material name. Only the plane set survives a round trip; windings and
//! the rest of the B-Rep are rebuilt on load, so two brushes with the same
//! records always derive the same geometry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use qbrush_brep::{Brush, DetailFlag, Face, MaterialProvider, TextureProjection};
use qbrush_math::{orthogonal_basis_vector, Mat3, Plane3, Vec3};

/// Why a brush record could not be replayed.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The record carries more faces than a brush may hold.
    #[error("brush record exceeds the face cap")]
    TooManyFaces,
}

/// One stored face.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceRecord {
    /// Three points on the plane, clockwise seen from the front.
    pub points: [[f64; 3]; 3],
    /// Rows of the texture projection matrix.
    pub projection: [[f64; 3]; 3],
    /// Material name, resolved by a [`MaterialProvider`] on load.
    pub material: String,
}

/// One stored brush: its faces in insertion order plus the detail flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrushRecord {
    /// Face records in plane insertion order.
    pub faces: Vec<FaceRecord>,
    /// Structural-vs-detail classification.
    pub detail: DetailFlag,
}

/// Three well-spread points on a plane, ordered so
/// [`Plane3::from_points`] reconstructs the same orientation.
fn plane_points(plane: &Plane3) -> [[f64; 3]; 3] {
    let origin = plane.normal() * plane.dist();
    let u = orthogonal_basis_vector(&plane.normal()) * 64.0;
    let v = plane.normal().cross(&u);
    let row = |p: Vec3| [p.x, p.y, p.z];
    [row(origin), row(origin + v), row(origin + u)]
}

fn matrix_rows(matrix: &Mat3) -> [[f64; 3]; 3] {
    [
        [matrix[(0, 0)], matrix[(0, 1)], matrix[(0, 2)]],
        [matrix[(1, 0)], matrix[(1, 1)], matrix[(1, 2)]],
        [matrix[(2, 0)], matrix[(2, 1)], matrix[(2, 2)]],
    ]
}

/// Snapshots a brush's committed planes into a record.
pub fn export_brush(brush: &Brush) -> BrushRecord {
    BrushRecord {
        faces: brush
            .faces()
            .map(|face| FaceRecord {
                points: plane_points(face.identity_plane()),
                projection: matrix_rows(face.projection().matrix()),
                material: face.material().name.clone(),
            })
            .collect(),
        detail: brush.detail_flag(),
    }
}

/// Replays a record into a fresh brush, resolving material names through
/// `materials`.
pub fn import_brush(
    record: &BrushRecord,
    materials: &impl MaterialProvider,
) -> Result<Brush, FormatError> {
    let mut brush = Brush::new();
    brush.set_detail_flag(record.detail);
    for face in &record.faces {
        let point = |p: [f64; 3]| Vec3::new(p[0], p[1], p[2]);
        let plane = Plane3::from_points(
            point(face.points[0]),
            point(face.points[1]),
            point(face.points[2]),
        );
        let m = &face.projection;
        let matrix = Mat3::new(
            m[0][0], m[0][1], m[0][2],
            m[1][0], m[1][1], m[1][2],
            m[2][0], m[2][1], m[2][2],
        );
        let replayed = Face::new(
            plane,
            TextureProjection::from_matrix(matrix),
            materials.resolve(&face.material),
        );
        if brush.add_face(replayed).is_none() {
            return Err(FormatError::TooManyFaces);
        }
    }
    Ok(brush)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qbrush_brep::{primitives::cuboid, MaterialInfo, NullMaterialProvider};
    use qbrush_math::Aabb;

    #[test]
    fn json_roundtrip_rebuilds_the_same_brep() {
        let bounds = Aabb::from_min_max(Vec3::zeros(), Vec3::new(64.0, 32.0, 16.0));
        let mut brush = cuboid(&bounds, &MaterialInfo::unresolved("base/rock"));
        brush.set_detail_flag(DetailFlag::Detail);

        let json = serde_json::to_string(&export_brush(&brush)).expect("serializable record");
        let record: BrushRecord = serde_json::from_str(&json).expect("parseable record");
        let mut replayed = import_brush(&record, &NullMaterialProvider).expect("under the cap");

        assert_eq!(replayed.detail_flag(), DetailFlag::Detail);
        assert_eq!(replayed.face_count(), brush.face_count());
        for (a, b) in replayed.faces().zip(brush.faces()) {
            assert_relative_eq!(
                a.plane().normal().dot(&b.plane().normal()),
                1.0,
                epsilon = 1e-9
            );
            assert_relative_eq!(a.plane().dist(), b.plane().dist(), epsilon = 1e-9);
            assert_eq!(a.projection(), b.projection());
            assert_eq!(a.material().name, "base/rock");
        }

        assert!(!replayed.is_degenerate());
        assert_eq!(
            replayed.unique_vertex_points().len(),
            brush.unique_vertex_points().len()
        );
        let a = replayed.local_aabb();
        let b = brush.local_aabb();
        assert_relative_eq!(a.min().x, b.min().x, epsilon = 1e-9);
        assert_relative_eq!(a.max().z, b.max().z, epsilon = 1e-9);
    }

    #[test]
    fn oversized_record_is_rejected() {
        let face = FaceRecord {
            points: plane_points(&Plane3::new(Vec3::z(), 0.0)),
            projection: matrix_rows(TextureProjection::default().matrix()),
            material: String::new(),
        };
        let record = BrushRecord {
            faces: vec![face; qbrush_math::MAX_BRUSH_FACES + 1],
            detail: DetailFlag::Structural,
        };
        assert!(matches!(
            import_brush(&record, &NullMaterialProvider),
            Err(FormatError::TooManyFaces)
        ));
    }
}
