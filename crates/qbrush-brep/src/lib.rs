#![warn(missing_docs)]

//! Faces, brushes and boundary-representation construction.
//!
//! The pipeline:
//!
//! 1. Planes are added to a [`Brush`] in significant order.
//! 2. `build_windings` derives each face's polygon by half-space clipping
//!    and runs the degenerate-geometry cleanup passes.
//! 3. `build_brep` stitches the per-face adjacency tags into brush-wide
//!    unique vertex/edge lists and validates the Euler invariant.
//!
//! Everything is rebuilt lazily from scratch when a plane changes; brushes
//! that fail closure are classified degenerate and render as nothing.

mod brush;
mod face;
pub mod primitives;
mod texture;

pub use brush::{Brush, BrushMemento, DetailFlag, EdgeFaces, FaceMemento, StateSaver};
pub use face::Face;
pub use texture::{
    texture_basis, MaterialInfo, MaterialProvider, NullMaterialProvider, TexDef,
    TextureProjection, DEFAULT_TEXTURE_SCALE,
};

// =============================================================================
// Scenario tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qbrush_math::{Plane3, Vec3};
    use std::cell::Cell;
    use std::rc::Rc;

    /// The unit cube as six explicit outward planes in a fixed order.
    fn unit_cube_planes() -> Vec<Plane3> {
        vec![
            Plane3::new(-Vec3::x(), 0.0),
            Plane3::new(Vec3::x(), 1.0),
            Plane3::new(-Vec3::y(), 0.0),
            Plane3::new(Vec3::y(), 1.0),
            Plane3::new(-Vec3::z(), 0.0),
            Plane3::new(Vec3::z(), 1.0),
        ]
    }

    fn brush_from_planes(planes: &[Plane3]) -> Brush {
        let mut brush = Brush::new();
        for plane in planes {
            brush
                .add_face(Face::new(
                    *plane,
                    TextureProjection::default(),
                    MaterialInfo::default(),
                ))
                .expect("under the face cap");
        }
        brush
    }

    #[test]
    fn unit_cube_builds_the_expected_brep() {
        let mut brush = brush_from_planes(&unit_cube_planes());
        assert!(!brush.is_degenerate());
        assert_eq!(brush.unique_vertex_points().len(), 8);
        assert_eq!(brush.unique_edge_points().len(), 12);
        assert_eq!(brush.contributing_face_count(), 6);
        assert_eq!(brush.edge_faces().len(), 12);
        assert_eq!(brush.edge_indices().len(), 12);
        assert_eq!(brush.face_centroid_points().len(), 6);

        for face in brush.faces() {
            assert_eq!(face.winding().len(), 4);
        }
    }

    #[test]
    fn cube_windings_share_one_orientation() {
        let mut brush = brush_from_planes(&unit_cube_planes());
        brush.evaluate_brep();
        for face in brush.faces() {
            let w = face.winding();
            // Clipped polygons run clockwise seen from the front, so the
            // cross product of consecutive edges opposes the plane normal.
            for i in 0..w.len() {
                let a = w[w.next_index(i)].vertex - w[i].vertex;
                let b = w[w.next_index(w.next_index(i))].vertex - w[w.next_index(i)].vertex;
                assert!(a.cross(&b).dot(&face.plane().normal()) < 0.0);
            }
        }
    }

    #[test]
    fn brep_construction_is_idempotent() {
        let mut brush = brush_from_planes(&unit_cube_planes());
        brush.evaluate_brep();
        let vertices: Vec<_> = brush.unique_vertex_points().to_vec();
        let edges: Vec<_> = brush.unique_edge_points().to_vec();
        let windings: Vec<_> = brush.faces().map(|f| f.winding().clone()).collect();

        // Force a full rebuild on the unchanged plane set.
        brush.set_face_plane(5, Plane3::new(Vec3::z(), 1.0));
        brush.evaluate_brep();

        assert_eq!(brush.unique_vertex_points(), vertices.as_slice());
        assert_eq!(brush.unique_edge_points(), edges.as_slice());
        for (face, old) in brush.faces().zip(&windings) {
            assert_eq!(face.winding(), old);
        }
    }

    #[test]
    fn adjacency_graph_is_closed() {
        let mut brush = brush_from_planes(&unit_cube_planes());
        brush.evaluate_brep();
        for (i, face) in brush.faces().enumerate() {
            for vertex in face.winding().iter() {
                let adjacent = vertex.adjacent.expect("bounded brush");
                assert!(
                    brush.face(adjacent).winding().find_adjacent(i).is_some(),
                    "face {adjacent} must reciprocate face {i}"
                );
            }
        }
    }

    #[test]
    fn three_planes_are_degenerate() {
        let mut brush = brush_from_planes(&[
            Plane3::new(Vec3::x(), 1.0),
            Plane3::new(Vec3::y(), 1.0),
            Plane3::new(Vec3::z(), 1.0),
        ]);
        assert!(brush.is_degenerate());
        assert!(brush.unique_vertex_points().is_empty());
        assert!(brush.unique_edge_points().is_empty());
        assert!(brush.edge_indices().is_empty());
        assert_eq!(brush.contributing_face_count(), 0);
        assert!(!brush.local_aabb().is_valid());
    }

    #[test]
    fn duplicate_plane_tiebreak_prefers_the_dominating_distance() {
        let mut planes = unit_cube_planes();
        // A second x-max plane, tighter than the original at x=1.
        planes.push(Plane3::new(Vec3::x(), 0.5));
        let mut brush = brush_from_planes(&planes);
        brush.evaluate_brep();

        assert!(!brush.face(1).contributes(), "x=1 loses to x=0.5");
        assert!(brush.face(6).contributes());
        assert_eq!(brush.contributing_face_count(), 6);
        assert_relative_eq!(brush.local_aabb().max().x, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn exactly_duplicated_plane_defers_to_insertion_order() {
        let mut planes = unit_cube_planes();
        planes.push(planes[1]);
        let mut brush = brush_from_planes(&planes);
        brush.evaluate_brep();
        assert!(brush.face(1).contributes());
        assert!(!brush.face(6).contributes());
        assert_eq!(brush.contributing_face_count(), 6);
    }

    #[test]
    fn edge_tangent_plane_contributes_nothing() {
        let mut planes = unit_cube_planes();
        // A 45-degree plane through the x=1, z=1 edge: it touches the solid
        // along that edge without enclosing any area.
        planes.push(Plane3::new(
            Vec3::new(1.0, 0.0, 1.0) / 2.0_f64.sqrt(),
            2.0_f64.sqrt(),
        ));
        let mut brush = brush_from_planes(&planes);

        assert!(!brush.is_degenerate());
        assert!(!brush.face(6).contributes());
        assert!(brush.face(6).winding().is_empty());
        assert_eq!(brush.contributing_face_count(), 6);
        assert_eq!(brush.unique_vertex_points().len(), 8);
        assert_eq!(brush.unique_edge_points().len(), 12);
        // The cube faces around the touched edge stay mutually adjacent.
        for (i, face) in brush.faces().enumerate() {
            for vertex in face.winding().iter() {
                let adjacent = vertex.adjacent.expect("bounded brush");
                assert!(brush.face(adjacent).winding().find_adjacent(i).is_some());
            }
        }
    }

    #[test]
    fn invalid_plane_contributes_nothing() {
        let mut planes = unit_cube_planes();
        planes.push(Plane3::new(Vec3::zeros(), 3.0));
        let mut brush = brush_from_planes(&planes);
        assert!(!brush.is_degenerate());
        assert_eq!(brush.contributing_face_count(), 6);
        assert!(!brush.face(6).contributes());
    }

    #[test]
    fn face_cap_rejects_additions() {
        let mut brush = Brush::new();
        for i in 0..qbrush_math::MAX_BRUSH_FACES {
            let plane = Plane3::new(Vec3::z(), i as f64);
            assert!(brush
                .add_face(Face::new(
                    plane,
                    TextureProjection::default(),
                    MaterialInfo::default()
                ))
                .is_some());
        }
        let overflow = Face::new(
            Plane3::new(Vec3::z(), -1.0),
            TextureProjection::default(),
            MaterialInfo::default(),
        );
        assert!(brush.add_face(overflow).is_none());
    }

    #[test]
    fn classify_plane_counts_all_contributing_windings() {
        let mut brush = brush_from_planes(&unit_cube_planes());
        let counts = brush.classify_plane(&Plane3::new(Vec3::x(), 0.5));
        // 24 winding vertices total, half on each side of x=0.5.
        assert_eq!(counts.front, 12);
        assert_eq!(counts.back, 12);
        assert!(counts.is_straddling());

        let outside = brush.classify_plane(&Plane3::new(Vec3::x(), 5.0));
        assert_eq!(outside.front, 0);
        assert_eq!(outside.back, 24);
    }

    #[test]
    fn ray_hits_the_nearest_entering_face() {
        let mut brush = brush_from_planes(&unit_cube_planes());
        let hit = brush
            .ray_intersection(&Vec3::new(0.5, 0.5, 5.0), &Vec3::new(0.0, 0.0, -1.0))
            .expect("ray through the cube");
        assert_relative_eq!(hit.z, 1.0, epsilon = 1e-9);
        assert_relative_eq!(hit.x, 0.5, epsilon = 1e-9);

        let miss = brush.ray_intersection(&Vec3::new(5.0, 5.0, 5.0), &Vec3::new(0.0, 0.0, -1.0));
        assert!(miss.is_none());
    }

    #[test]
    fn memento_roundtrip_restores_the_face_list() {
        let mut brush = brush_from_planes(&unit_cube_planes());
        brush.set_detail_flag(DetailFlag::Detail);
        let snapshot = brush.export_state();
        let version = brush.version();

        brush.erase_face(5);
        brush.set_face_plane(0, Plane3::new(-Vec3::x(), -2.0));
        brush.set_detail_flag(DetailFlag::Structural);
        assert!(brush.version() > version);

        brush.import_state(&snapshot);
        assert_eq!(brush.face_count(), 6);
        assert_eq!(brush.detail_flag(), DetailFlag::Detail);
        assert_relative_eq!(brush.face(0).plane().dist(), 0.0);
        assert_eq!(brush.unique_vertex_points().len(), 8);
    }

    #[test]
    fn state_saver_runs_before_mutations() {
        struct Counter(Cell<usize>);
        impl StateSaver for Counter {
            fn save_state(&self) {
                self.0.set(self.0.get() + 1);
            }
        }
        let saver = Rc::new(Counter(Cell::new(0)));
        let mut brush = brush_from_planes(&unit_cube_planes());
        brush.connect_state_saver(saver.clone());

        brush.set_face_plane(0, Plane3::new(-Vec3::x(), -1.0));
        brush.flip_face(0);
        brush.erase_face(0);
        assert_eq!(saver.0.get(), 3);

        brush.disconnect_state_saver();
        brush.set_detail_flag(DetailFlag::Detail);
        assert_eq!(saver.0.get(), 3);
    }

    #[test]
    fn translation_moves_the_whole_brep() {
        let mut brush = brush_from_planes(&unit_cube_planes());
        brush.translate(&Vec3::new(16.0, 0.0, 0.0));
        let aabb = brush.local_aabb();
        assert_relative_eq!(aabb.min().x, 16.0, epsilon = 1e-9);
        assert_relative_eq!(aabb.max().x, 17.0, epsilon = 1e-9);
        assert_eq!(brush.unique_vertex_points().len(), 8);
    }

    #[test]
    fn pending_transform_reverts_cleanly() {
        let mut brush = brush_from_planes(&unit_cube_planes());
        brush.transform(&qbrush_math::Mat4::new_translation(&Vec3::new(0.0, 8.0, 0.0)));
        assert_relative_eq!(brush.local_aabb().min().y, 8.0, epsilon = 1e-9);
        brush.revert_transform();
        assert_relative_eq!(brush.local_aabb().min().y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn remove_empty_faces_drops_only_losers() {
        let mut planes = unit_cube_planes();
        planes.push(Plane3::new(Vec3::x(), 0.5));
        let mut brush = brush_from_planes(&planes);
        let version = brush.version();
        brush.remove_empty_faces();
        assert_eq!(brush.face_count(), 6);
        assert!(brush.version() > version);
        assert_eq!(brush.unique_vertex_points().len(), 8);
    }

    #[test]
    fn clip_preview_winding_matches_the_solid() {
        let brush = brush_from_planes(&unit_cube_planes());
        let winding = brush.winding_for_clip_plane(&Plane3::new(Vec3::x(), 0.5));
        assert_eq!(winding.len(), 4);
        for vertex in winding.iter() {
            assert_relative_eq!(vertex.vertex.x, 0.5, epsilon = 1e-9);
            assert!(vertex.vertex.y >= -1e-9 && vertex.vertex.y <= 1.0 + 1e-9);
            assert!(vertex.vertex.z >= -1e-9 && vertex.vertex.z <= 1.0 + 1e-9);
        }
    }
}
