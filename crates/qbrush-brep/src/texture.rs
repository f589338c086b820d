//! Per-face texture projection and the material-service boundary.
//!
//! The projection is a 3x3 affine transform from the face's axis-dominant
//! 2D basis to normalised texture space. It consumes finished windings and
//! never feeds back into topology.

use qbrush_math::{Mat3, Vec2, Vec3};
use qbrush_winding::Winding;

/// Default texture scale applied when no explicit projection is given.
pub const DEFAULT_TEXTURE_SCALE: f64 = 0.5;

// =============================================================================
// Material boundary
// =============================================================================

/// Resolved material data the kernel needs: texture dimensions for the
/// projection math and a visibility flag. Topology never reads this.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialInfo {
    /// Material name as it appears in map files.
    pub name: String,
    /// Texture width in pixels.
    pub width: f64,
    /// Texture height in pixels.
    pub height: f64,
    /// Whether faces carrying this material should render/select.
    pub visible: bool,
}

impl MaterialInfo {
    /// Fallback record for a name the material service cannot resolve.
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            width: 1.0,
            height: 1.0,
            visible: true,
        }
    }
}

impl Default for MaterialInfo {
    fn default() -> Self {
        Self::unresolved("")
    }
}

/// External material service. The default implementation resolves nothing,
/// so every name falls back to a 1x1 visible texture.
pub trait MaterialProvider {
    /// Resolves a material name to its record.
    fn resolve(&self, name: &str) -> MaterialInfo {
        MaterialInfo::unresolved(name)
    }
}

/// Provider with no backing material store.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMaterialProvider;

impl MaterialProvider for NullMaterialProvider {}

// =============================================================================
// Texture basis
// =============================================================================

/// The axis-dominant (s, t) basis for a face normal.
///
/// World space is rotated so the dominant axis of the normal becomes the
/// projection direction; the remaining two axes carry s and t.
pub fn texture_basis(normal: &Vec3) -> (Vec3, Vec3) {
    let ax = normal.x.abs();
    let ay = normal.y.abs();
    let az = normal.z.abs();
    if az >= ax && az >= ay {
        (Vec3::x(), Vec3::y())
    } else if ax >= ay {
        (Vec3::y(), Vec3::new(0.0, 0.0, -1.0))
    } else {
        (Vec3::x(), Vec3::new(0.0, 0.0, -1.0))
    }
}

// =============================================================================
// TexDef / TextureProjection
// =============================================================================

/// Shift/scale/rotation texture definition, the user-facing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexDef {
    /// Texture shift in pixels.
    pub shift: Vec2,
    /// Texture scale (world units per texel).
    pub scale: Vec2,
    /// Rotation in degrees.
    pub rotate: f64,
}

impl Default for TexDef {
    fn default() -> Self {
        Self {
            shift: Vec2::zeros(),
            scale: Vec2::new(DEFAULT_TEXTURE_SCALE, DEFAULT_TEXTURE_SCALE),
            rotate: 0.0,
        }
    }
}

/// The per-face 3x3 affine transform from the axis basis to UV space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureProjection {
    matrix: Mat3,
}

impl Default for TextureProjection {
    fn default() -> Self {
        Self::from_tex_def(&TexDef::default(), 1.0, 1.0)
    }
}

impl TextureProjection {
    /// Wraps an explicit matrix, falling back to the default projection if
    /// either basis column is zero (a singular transform).
    pub fn from_matrix(matrix: Mat3) -> Self {
        let s_ok = matrix[(0, 0)] != 0.0 || matrix[(1, 0)] != 0.0;
        let t_ok = matrix[(0, 1)] != 0.0 || matrix[(1, 1)] != 0.0;
        if s_ok && t_ok {
            Self { matrix }
        } else {
            Self::default()
        }
    }

    /// Builds the normalised matrix from shift/scale/rotation and the
    /// texture dimensions of the face's material.
    pub fn from_tex_def(def: &TexDef, width: f64, height: f64) -> Self {
        let inverse_s = 1.0 / (def.scale.x * width);
        let inverse_t = 1.0 / (def.scale.y * -height);
        let angle = (-def.rotate).to_radians();
        let (sin, cos) = angle.sin_cos();
        let matrix = Mat3::new(
            cos * inverse_s,
            -sin * inverse_s,
            def.shift.x / width,
            sin * inverse_t,
            cos * inverse_t,
            def.shift.y / height,
            0.0,
            0.0,
            1.0,
        );
        Self { matrix }
    }

    /// The underlying matrix.
    pub fn matrix(&self) -> &Mat3 {
        &self.matrix
    }

    /// Shifts the projection in normalised texture space.
    pub fn shift(&mut self, s: f64, t: f64) {
        self.matrix[(0, 2)] += s;
        self.matrix[(1, 2)] += t;
    }

    /// UV coordinate of one point given the face normal.
    pub fn texture_coords_for_vertex(&self, point: &Vec3, normal: &Vec3) -> Vec2 {
        let (s_axis, t_axis) = texture_basis(normal);
        let s = s_axis.dot(point);
        let t = t_axis.dot(point);
        self.apply(s, t)
    }

    fn apply(&self, s: f64, t: f64) -> Vec2 {
        let m = &self.matrix;
        Vec2::new(
            m[(0, 0)] * s + m[(0, 1)] * t + m[(0, 2)],
            m[(1, 0)] * s + m[(1, 1)] * t + m[(1, 2)],
        )
    }

    /// Fills per-vertex UV, tangent and bitangent of a finished winding.
    /// Quits on windings of fewer than three points.
    pub fn emit_texture_coordinates(&self, winding: &mut Winding, normal: &Vec3) {
        if winding.len() < 3 {
            return;
        }
        let (s_axis, t_axis) = texture_basis(normal);
        let m = &self.matrix;
        // Gradients of u and v in world space, the same for every vertex.
        let tangent = (s_axis * m[(0, 0)] + t_axis * m[(0, 1)]).normalize();
        let bitangent = (s_axis * m[(1, 0)] + t_axis * m[(1, 1)]).normalize();
        for vertex in winding.iter_mut() {
            let s = s_axis.dot(&vertex.vertex);
            let t = t_axis.dot(&vertex.vertex);
            vertex.texcoord = self.apply(s, t);
            vertex.tangent = tangent;
            vertex.bitangent = bitangent;
            vertex.normal = *normal;
        }
    }

    /// Rescales and shifts the projection so the winding covers the texture
    /// exactly `s_repeat` by `t_repeat` times.
    pub fn fit_texture(
        &mut self,
        winding: &Winding,
        normal: &Vec3,
        s_repeat: f64,
        t_repeat: f64,
    ) {
        if winding.len() < 3 {
            return;
        }
        let mut min = Vec2::new(f64::INFINITY, f64::INFINITY);
        let mut max = Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for vertex in winding.iter() {
            let uv = self.texture_coords_for_vertex(&vertex.vertex, normal);
            min = min.inf(&uv);
            max = max.sup(&uv);
        }
        let du = max.x - min.x;
        let dv = max.y - min.y;
        if du == 0.0 || dv == 0.0 {
            return;
        }
        let su = s_repeat / du;
        let sv = t_repeat / dv;
        for col in 0..3 {
            self.matrix[(0, col)] *= su;
            self.matrix[(1, col)] *= sv;
        }
        self.matrix[(0, 2)] -= min.x * su;
        self.matrix[(1, 2)] -= min.y * sv;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qbrush_winding::WindingVertex;

    fn square_winding(size: f64) -> Winding {
        let mut winding = Winding::new();
        for (x, y) in [(0.0, 0.0), (0.0, size), (size, size), (size, 0.0)] {
            winding.push(WindingVertex::at(Vec3::new(x, y, 4.0)));
        }
        winding
    }

    #[test]
    fn basis_is_orthogonal_to_the_dominant_axis() {
        for normal in [Vec3::z(), -Vec3::z(), Vec3::x(), Vec3::y(), Vec3::new(0.1, 0.2, 0.9)] {
            let (s, t) = texture_basis(&normal);
            let dominant = if normal.z.abs() >= normal.x.abs() && normal.z.abs() >= normal.y.abs()
            {
                Vec3::z()
            } else if normal.x.abs() >= normal.y.abs() {
                Vec3::x()
            } else {
                Vec3::y()
            };
            assert_relative_eq!(s.dot(&dominant), 0.0);
            assert_relative_eq!(t.dot(&dominant), 0.0);
            assert_relative_eq!(s.dot(&t), 0.0);
        }
    }

    #[test]
    fn emit_fills_uv_and_tangent_space() {
        let projection =
            TextureProjection::from_tex_def(&TexDef::default(), 64.0, 64.0);
        let mut winding = square_winding(32.0);
        projection.emit_texture_coordinates(&mut winding, &Vec3::z());
        // scale 0.5 over a 64px texture: 32 world units = 1 repeat.
        assert_relative_eq!(winding[0].texcoord.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(winding[2].texcoord.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(winding[2].texcoord.y, -1.0, epsilon = 1e-9);
        for v in winding.iter() {
            assert_relative_eq!(v.normal.z, 1.0);
            assert_relative_eq!(v.tangent.norm(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(v.bitangent.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn degenerate_windings_are_left_alone() {
        let projection = TextureProjection::default();
        let mut winding = Winding::new();
        winding.push(WindingVertex::at(Vec3::zeros()));
        winding.push(WindingVertex::at(Vec3::x()));
        projection.emit_texture_coordinates(&mut winding, &Vec3::z());
        assert_relative_eq!(winding[1].texcoord.x, 0.0);
    }

    #[test]
    fn fit_texture_covers_the_winding_once() {
        let mut projection =
            TextureProjection::from_tex_def(&TexDef::default(), 128.0, 128.0);
        let winding = square_winding(100.0);
        projection.fit_texture(&winding, &Vec3::z(), 1.0, 1.0);
        let mut min = Vec2::new(f64::INFINITY, f64::INFINITY);
        let mut max = Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for v in winding.iter() {
            let uv = projection.texture_coords_for_vertex(&v.vertex, &Vec3::z());
            min = min.inf(&uv);
            max = max.sup(&uv);
        }
        assert_relative_eq!(min.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(min.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(max.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(max.y, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn invalid_matrix_falls_back_to_default() {
        let singular = Mat3::new(0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        assert_eq!(
            TextureProjection::from_matrix(singular),
            TextureProjection::default()
        );
    }
}
