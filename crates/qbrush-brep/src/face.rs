//! A single brush face: one supporting plane and the winding derived for it.

use qbrush_math::{Mat4, Plane3, Vec3};
use qbrush_winding::Winding;

use crate::texture::{MaterialInfo, TextureProjection};

/// One face of a brush.
///
/// The face owns two planes: the committed "identity" plane and a
/// "transformed" plane that tracks interactive manipulation until the
/// transform is frozen. All geometry derivation reads the transformed
/// plane; freezing copies it back into the identity plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    plane: Plane3,
    plane_transformed: Plane3,
    winding: Winding,
    projection: TextureProjection,
    material: MaterialInfo,
}

impl Face {
    /// Face on an explicit plane.
    pub fn new(plane: Plane3, projection: TextureProjection, material: MaterialInfo) -> Self {
        Self {
            plane,
            plane_transformed: plane,
            winding: Winding::new(),
            projection,
            material,
        }
    }

    /// Face through three points, clockwise when viewed from the front
    /// (normal out of the solid).
    pub fn from_points(
        p0: Vec3,
        p1: Vec3,
        p2: Vec3,
        projection: TextureProjection,
        material: MaterialInfo,
    ) -> Self {
        Self::new(Plane3::from_points(p0, p1, p2), projection, material)
    }

    /// The current (transformed) plane; what clipping sees.
    pub fn plane(&self) -> &Plane3 {
        &self.plane_transformed
    }

    /// The committed plane, untouched by a pending transform.
    pub fn identity_plane(&self) -> &Plane3 {
        &self.plane
    }

    /// Replaces both planes; a committed edit.
    pub fn set_plane(&mut self, plane: Plane3) {
        self.plane = plane;
        self.plane_transformed = plane;
    }

    /// Applies an affine transform to the pending plane only.
    pub fn transform(&mut self, transform: &Mat4) {
        self.plane_transformed = self.plane_transformed.transformed(transform);
    }

    /// Translates the pending plane only.
    pub fn translate(&mut self, translation: &Vec3) {
        self.plane_transformed = self.plane_transformed.translated(translation);
    }

    /// Commits the pending transform into the identity plane.
    pub fn freeze_transform(&mut self) {
        self.plane = self.plane_transformed;
    }

    /// Discards the pending transform.
    pub fn revert_transform(&mut self) {
        self.plane_transformed = self.plane;
    }

    /// Reverses the face so its front becomes its back.
    pub fn flip(&mut self) {
        self.plane = self.plane.flipped();
        self.plane_transformed = self.plane_transformed.flipped();
    }

    /// Moves both planes along the face normal.
    pub fn offset_plane(&mut self, amount: f64) {
        self.plane.offset(amount);
        self.plane_transformed.offset(amount);
    }

    /// Snaps both planes to a grid.
    pub fn snap_plane(&mut self, grid: f64) {
        self.plane = self.plane.snapped(grid);
        self.plane_transformed = self.plane;
    }

    /// The derived winding.
    pub fn winding(&self) -> &Winding {
        &self.winding
    }

    pub(crate) fn winding_mut(&mut self) -> &mut Winding {
        &mut self.winding
    }

    /// Installs a freshly clipped winding and refreshes its render data.
    pub(crate) fn set_winding(&mut self, winding: Winding) {
        self.winding = winding;
        self.update_winding();
    }

    pub(crate) fn update_winding(&mut self) {
        let normal = self.plane_transformed.normal();
        self.winding.update_normals(&normal);
        self.projection
            .emit_texture_coordinates(&mut self.winding, &normal);
    }

    /// A face contributes to the B-Rep iff its winding kept more than two
    /// points after clipping.
    pub fn contributes(&self) -> bool {
        self.winding.len() > 2
    }

    /// Whether every edge of the winding has its adjacent face assigned; an
    /// unassigned edge means the face escapes the world bounds.
    pub fn is_bounded(&self) -> bool {
        self.winding.iter().all(|v| v.adjacent.is_some())
    }

    /// Area centroid of the winding on the face plane, when it has one.
    pub fn centroid(&self) -> Option<Vec3> {
        self.winding.centroid(self.plane())
    }

    /// The face's texture projection.
    pub fn projection(&self) -> &TextureProjection {
        &self.projection
    }

    /// Replaces the texture projection and re-emits texture coordinates.
    pub fn set_projection(&mut self, projection: TextureProjection) {
        self.projection = projection;
        self.update_winding();
    }

    /// Rescales the projection so the texture fits the winding.
    pub fn fit_texture(&mut self, s_repeat: f64, t_repeat: f64) {
        let normal = self.plane_transformed.normal();
        self.projection
            .fit_texture(&self.winding, &normal, s_repeat, t_repeat);
        self.update_winding();
    }

    /// The resolved material record.
    pub fn material(&self) -> &MaterialInfo {
        &self.material
    }

    /// Replaces the material record.
    pub fn set_material(&mut self, material: MaterialInfo) {
        self.material = material;
    }

    /// Whether the face should render/select at all.
    pub fn is_visible(&self) -> bool {
        self.material.visible
    }
}
