//! Orbit camera for viewing the noise ball
//!
//! Spherical coordinates around a target, producing the view/projection pair
//! the node material reads from `CameraUniforms`.

use std::f32::consts::{FRAC_PI_2, PI};

use crate::gpu::types::CameraUniforms;

/// Default field of view in radians (45 degrees)
pub const DEFAULT_FOV: f32 = PI / 4.0;

/// Default near clip plane
pub const DEFAULT_NEAR: f32 = 0.01;

/// Default far clip plane
pub const DEFAULT_FAR: f32 = 100.0;

/// Default camera distance from target. Frames a unit-scale ball.
pub const DEFAULT_DISTANCE: f32 = 4.0;

/// Elevation angle limit (prevent gimbal lock)
const ELEVATION_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Camera orbiting a target point.
///
/// # Example
///
/// ```
/// use noiseball::gpu::camera::OrbitCamera;
///
/// let mut camera = OrbitCamera::new(16.0 / 9.0);
/// camera.orbit(0.1, 0.0);
/// let uniforms = camera.uniforms();
/// assert_eq!(uniforms.camera_pos, camera.position());
/// ```
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Distance from target
    pub distance: f32,
    /// Horizontal angle in radians (0 = on +Z)
    pub azimuth: f32,
    /// Vertical angle in radians (0 = level)
    pub elevation: f32,
    /// Point looked at
    pub target: [f32; 3],
    /// Field of view in radians
    pub fov: f32,
    /// Width / height
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl OrbitCamera {
    /// Camera at the default distance, slightly above the target
    pub fn new(aspect: f32) -> Self {
        Self {
            distance: DEFAULT_DISTANCE,
            azimuth: 0.0,
            elevation: 0.3,
            target: [0.0, 0.0, 0.0],
            fov: DEFAULT_FOV,
            aspect,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }

    /// World-space eye position
    pub fn position(&self) -> [f32; 3] {
        let (sin_elev, cos_elev) = self.elevation.sin_cos();
        let (sin_azim, cos_azim) = self.azimuth.sin_cos();
        [
            self.distance * cos_elev * sin_azim + self.target[0],
            self.distance * sin_elev + self.target[1],
            self.distance * cos_elev * cos_azim + self.target[2],
        ]
    }

    /// World to camera space
    pub fn view_matrix(&self) -> [[f32; 4]; 4] {
        look_at(self.position(), self.target, [0.0, 1.0, 0.0])
    }

    /// Camera to clip space, depth mapped to [0, 1]
    pub fn projection_matrix(&self) -> [[f32; 4]; 4] {
        perspective(self.fov, self.aspect, self.near, self.far)
    }

    /// Uniform block for the node material
    pub fn uniforms(&self) -> CameraUniforms {
        CameraUniforms {
            view: self.view_matrix(),
            projection: self.projection_matrix(),
            camera_pos: self.position(),
            _padding: 0.0,
        }
    }

    /// Rotate around the target. Azimuth wraps, elevation clamps.
    pub fn orbit(&mut self, delta_azimuth: f32, delta_elevation: f32) {
        self.azimuth = (self.azimuth + delta_azimuth + PI).rem_euclid(2.0 * PI) - PI;
        self.elevation =
            (self.elevation + delta_elevation).clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(4.0 / 3.0)
    }
}

fn look_at(eye: [f32; 3], target: [f32; 3], up: [f32; 3]) -> [[f32; 4]; 4] {
    let f = normalize([target[0] - eye[0], target[1] - eye[1], target[2] - eye[2]]);
    let r = normalize(cross(f, up));
    let u = cross(r, f);

    [
        [r[0], u[0], -f[0], 0.0],
        [r[1], u[1], -f[1], 0.0],
        [r[2], u[2], -f[2], 0.0],
        [-dot(r, eye), -dot(u, eye), dot(f, eye), 1.0],
    ]
}

// Column-major, right-handed, WebGPU depth range.
fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> [[f32; 4]; 4] {
    let f = 1.0 / (fov / 2.0).tan();
    let nf = 1.0 / (near - far);

    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, far * nf, -1.0],
        [0.0, 0.0, near * far * nf, 0.0],
    ]
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = dot(v, v).sqrt();
    if len > 1e-10 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(m: &[[f32; 4]; 4], z: f32) -> f32 {
        // (0, 0, z, 1) through a column-major matrix
        let clip_z = m[2][2] * z + m[3][2];
        let clip_w = m[2][3] * z + m[3][3];
        clip_z / clip_w
    }

    #[test]
    fn test_position_on_z_axis() {
        let mut camera = OrbitCamera::new(1.0);
        camera.elevation = 0.0;
        let pos = camera.position();
        assert!(pos[0].abs() < 1e-5);
        assert!(pos[1].abs() < 1e-5);
        assert!((pos[2] - DEFAULT_DISTANCE).abs() < 1e-5);
    }

    #[test]
    fn test_orbit_wraps_and_clamps() {
        let mut camera = OrbitCamera::new(1.0);
        camera.orbit(7.0, 10.0);
        assert!((-PI..=PI).contains(&camera.azimuth));
        assert!(camera.elevation < FRAC_PI_2);

        camera.orbit(-14.0, -20.0);
        assert!((-PI..=PI).contains(&camera.azimuth));
        assert!(camera.elevation > -FRAC_PI_2);
    }

    #[test]
    fn test_projection_depth_range() {
        let camera = OrbitCamera::new(1.0);
        let proj = camera.projection_matrix();
        assert!(project(&proj, -camera.near).abs() < 1e-4);
        assert!((project(&proj, -camera.far) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_view_moves_target_onto_negative_z() {
        let camera = OrbitCamera::new(1.0);
        let view = camera.view_matrix();
        // Target is the origin, so its view-space position is the translation column
        let z = view[3][2];
        assert!((z + camera.distance).abs() < 1e-4);
    }

    #[test]
    fn test_cross_product() {
        let result = cross([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert_eq!(result, [0.0, 0.0, 1.0]);
    }
}
