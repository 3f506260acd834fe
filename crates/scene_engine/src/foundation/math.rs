//! Math utilities and types
//!
//! Provides the fundamental math types used by the scene graph. All matrices
//! follow nalgebra's column-vector convention: `parent * child` applies the
//! child transformation first.

pub use nalgebra::{Matrix3, Matrix4, Rotation3, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;

    /// Tolerance used for "exactly one" scale checks and float comparisons
    pub const ROUNDING_ERROR: f32 = 0.000_001;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Mat4, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Rotation matrix from Euler angles in degrees.
    ///
    /// The X rotation is applied first, then Y, then Z.
    pub fn rotation_from_degrees(rotation: &Vec3) -> Mat4 {
        Mat4::from_euler_angles(
            deg_to_rad(rotation.x),
            deg_to_rad(rotation.y),
            deg_to_rad(rotation.z),
        )
    }

    /// Translation part of an affine matrix
    pub fn translation_of(matrix: &Mat4) -> Vec3 {
        Vec3::new(matrix.m14, matrix.m24, matrix.m34)
    }

    /// Wrap an angle in degrees into `[0, 360)`
    pub fn wrap_degrees(angle: f32) -> f32 {
        let wrapped = angle % 360.0;
        if wrapped < 0.0 {
            wrapped + 360.0
        } else {
            wrapped
        }
    }
}

/// Extension trait for Mat4 with view/projection helpers
pub trait Mat4Ext {
    /// Right-handed perspective projection (OpenGL clip space, depth in `[-1, 1]`)
    fn perspective_rh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective_rh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        nalgebra::Perspective3::new(aspect, fov_y, near, far).to_homogeneous()
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation_order_x_then_z() {
        // 90 degrees about X maps +Y to +Z, then 90 about Z leaves +Z alone
        let m = utils::rotation_from_degrees(&Vec3::new(90.0, 0.0, 90.0));
        let v = m.transform_vector(&Vec3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(v, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-5);

        // +X goes through X untouched, then Z maps it to +Y
        let v = m.transform_vector(&Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(v, Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_wrap_degrees() {
        assert_relative_eq!(utils::wrap_degrees(370.0), 10.0, epsilon = 1e-4);
        assert_relative_eq!(utils::wrap_degrees(-30.0), 330.0, epsilon = 1e-4);
        assert_relative_eq!(utils::wrap_degrees(45.0), 45.0);
    }

    #[test]
    fn test_translation_of() {
        let m = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(utils::translation_of(&m), Vec3::new(1.0, 2.0, 3.0));
    }
}
