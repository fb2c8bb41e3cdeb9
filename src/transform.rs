//! Host-side object transform and culling bounds
//!
//! The host owns placement of the noise ball. Each frame it hands the
//! component a [`Transform`], from which the renderer derives the
//! `_LocalToWorld`/`_WorldToLocal` matrices and a conservative bounding box.

/// Bounding box multiplier applied to the object's world scale
pub const BOUNDS_SCALE_FACTOR: f32 = 5.0;

/// Translation, rotation and scale of the object in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// World position
    pub translation: [f32; 3],
    /// Unit quaternion `[x, y, z, w]`
    pub rotation: [f32; 4],
    /// Per-axis scale
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The identity transform
    pub const IDENTITY: Transform = Transform {
        translation: [0.0, 0.0, 0.0],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0, 1.0, 1.0],
    };

    /// Identity transform moved to `translation`
    pub fn from_translation(translation: [f32; 3]) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Set a uniform scale
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = [scale; 3];
        self
    }

    /// Set the rotation from an axis and an angle in radians
    pub fn with_axis_angle(mut self, axis: [f32; 3], angle: f32) -> Self {
        let len = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
        if len > 1e-10 {
            let s = (angle * 0.5).sin() / len;
            self.rotation = [axis[0] * s, axis[1] * s, axis[2] * s, (angle * 0.5).cos()];
        }
        self
    }

    /// World position of the object origin
    pub fn position(&self) -> [f32; 3] {
        self.translation
    }

    /// World scale. Without a parent hierarchy this is the local scale.
    pub fn lossy_scale(&self) -> [f32; 3] {
        self.scale
    }

    /// Object to world matrix, column-major
    pub fn local_to_world(&self) -> [[f32; 4]; 4] {
        let r = rotation_columns(self.rotation);
        let s = self.scale;
        let t = self.translation;
        [
            [r[0][0] * s[0], r[0][1] * s[0], r[0][2] * s[0], 0.0],
            [r[1][0] * s[1], r[1][1] * s[1], r[1][2] * s[1], 0.0],
            [r[2][0] * s[2], r[2][1] * s[2], r[2][2] * s[2], 0.0],
            [t[0], t[1], t[2], 1.0],
        ]
    }

    /// World to object matrix, column-major.
    ///
    /// Computed as `S^-1 * R^T * T^-1`. A zero scale axis maps to zero.
    pub fn world_to_local(&self) -> [[f32; 4]; 4] {
        let r = rotation_columns(self.rotation);
        let inv = self.scale.map(|s| if s.abs() > 1e-10 { 1.0 / s } else { 0.0 });

        // Row i of R^T scaled by 1/s_i is column i of R scaled by 1/s_i
        let mut m = [[0.0f32; 4]; 4];
        for col in 0..3 {
            for row in 0..3 {
                m[col][row] = r[row][col] * inv[row];
            }
        }
        let t = self.translation;
        for row in 0..3 {
            m[3][row] = -(m[0][row] * t[0] + m[1][row] * t[1] + m[2][row] * t[2]);
        }
        m[3][3] = 1.0;
        m
    }
}

/// Columns of the rotation matrix for a unit quaternion
fn rotation_columns(q: [f32; 4]) -> [[f32; 3]; 3] {
    let [x, y, z, w] = q;
    [
        [
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y + z * w),
            2.0 * (x * z - y * w),
        ],
        [
            2.0 * (x * y - z * w),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z + x * w),
        ],
        [
            2.0 * (x * z + y * w),
            2.0 * (y * z - x * w),
            1.0 - 2.0 * (x * x + y * y),
        ],
    ]
}

/// Axis-aligned box used for culling the draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Centre in world space
    pub center: [f32; 3],
    /// Half size on each axis
    pub extents: [f32; 3],
}

impl Bounds {
    /// Box with the given centre and full size
    pub fn from_center_size(center: [f32; 3], size: [f32; 3]) -> Self {
        Self {
            center,
            extents: size.map(|s| s.abs() * 0.5),
        }
    }

    /// Conservative bounds for a noise ball placed by `transform`.
    ///
    /// Node extents live on the GPU only, so the box is a fixed multiple of
    /// the object's scale rather than a fit.
    pub fn for_transform(transform: &Transform) -> Self {
        Self::from_center_size(
            transform.position(),
            transform.lossy_scale().map(|s| s * BOUNDS_SCALE_FACTOR),
        )
    }

    /// Full size on each axis
    pub fn size(&self) -> [f32; 3] {
        self.extents.map(|e| e * 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mul(a: &[[f32; 4]; 4], b: &[[f32; 4]; 4]) -> [[f32; 4]; 4] {
        let mut out = [[0.0; 4]; 4];
        for col in 0..4 {
            for row in 0..4 {
                out[col][row] = (0..4).map(|k| a[k][row] * b[col][k]).sum();
            }
        }
        out
    }

    fn assert_identity(m: &[[f32; 4]; 4]) {
        for col in 0..4 {
            for row in 0..4 {
                let expected = if col == row { 1.0 } else { 0.0 };
                assert!(
                    (m[col][row] - expected).abs() < 1e-4,
                    "m[{}][{}] = {}",
                    col,
                    row,
                    m[col][row]
                );
            }
        }
    }

    #[test]
    fn test_identity_matrices() {
        let t = Transform::default();
        assert_identity(&t.local_to_world());
        assert_identity(&t.world_to_local());
    }

    #[test]
    fn test_translation_in_last_column() {
        let t = Transform::from_translation([1.0, 2.0, 3.0]);
        assert_eq!(t.local_to_world()[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(t.world_to_local()[3], [-1.0, -2.0, -3.0, 1.0]);
    }

    #[test]
    fn test_world_to_local_inverts_local_to_world() {
        let t = Transform::from_translation([4.0, -1.5, 2.0])
            .with_axis_angle([0.3, 1.0, -0.2], 1.1)
            .with_uniform_scale(2.5);
        assert_identity(&mul(&t.world_to_local(), &t.local_to_world()));
        assert_identity(&mul(&t.local_to_world(), &t.world_to_local()));
    }

    #[test]
    fn test_non_uniform_scale_inverse() {
        let mut t =
            Transform::from_translation([0.5, 0.0, -3.0]).with_axis_angle([0.0, 0.0, 1.0], 0.7);
        t.scale = [1.0, 3.0, 0.5];
        assert_identity(&mul(&t.world_to_local(), &t.local_to_world()));
    }

    #[test]
    fn test_bounds_are_five_times_scale() {
        let t = Transform::from_translation([1.0, 2.0, 3.0]).with_uniform_scale(2.0);
        let bounds = Bounds::for_transform(&t);
        assert_eq!(bounds.center, [1.0, 2.0, 3.0]);
        assert_eq!(bounds.size(), [10.0, 10.0, 10.0]);
        assert_eq!(bounds.extents, [5.0, 5.0, 5.0]);
    }
}
