//! View frustum used for culling

use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::scene::AABB;

/// Plane defined by normal and distance from origin
///
/// Points with a non-negative signed distance are on the inner side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal: normal.normalize(), distance }
    }

    /// Plane from `ax + by + cz + d` coefficients, normalized
    fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = coefficients.xyz();
        let length = normal.norm();
        if length <= f32::EPSILON {
            return Self { normal: Vec3::zeros(), distance: 0.0 };
        }
        Self {
            normal: normal / length,
            distance: coefficients.w / length,
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// Index of each plane in [`ViewFrustum::planes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumPlane {
    /// Left clip plane
    Left = 0,
    /// Right clip plane
    Right = 1,
    /// Bottom clip plane
    Bottom = 2,
    /// Top clip plane
    Top = 3,
    /// Near clip plane
    Near = 4,
    /// Far clip plane
    Far = 5,
}

/// Frustum for visibility culling
#[derive(Debug, Clone, PartialEq)]
pub struct ViewFrustum {
    /// Six planes defining the frustum, indexed by [`FrustumPlane`]
    pub planes: [Plane; 6],
    bounding_box: AABB,
}

impl ViewFrustum {
    /// Extract the frustum from a view-projection matrix
    ///
    /// Planes use the Gribb-Hartmann extraction for OpenGL clip space
    /// (`-w <= x, y, z <= w`). The corners come from unprojecting the NDC
    /// cube; a singular matrix leaves an unbounded box.
    pub fn from_matrix(view_projection: &Mat4) -> Self {
        let row = |i: usize| view_projection.row(i).transpose();
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        let planes = [
            Plane::from_coefficients(r3 + r0),
            Plane::from_coefficients(r3 - r0),
            Plane::from_coefficients(r3 + r1),
            Plane::from_coefficients(r3 - r1),
            Plane::from_coefficients(r3 + r2),
            Plane::from_coefficients(r3 - r2),
        ];

        let bounding_box = view_projection
            .try_inverse()
            .and_then(|inverse| {
                let corners: Vec<Vec3> = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
                    .corners()
                    .iter()
                    .map(|ndc| {
                        let p = inverse * Vec4::new(ndc.x, ndc.y, ndc.z, 1.0);
                        p.xyz() / p.w
                    })
                    .collect();
                AABB::from_points(&corners)
            })
            .unwrap_or_else(|| {
                AABB::new(Vec3::repeat(f32::NEG_INFINITY), Vec3::repeat(f32::INFINITY))
            });

        Self { planes, bounding_box }
    }

    /// Access a single plane
    pub fn plane(&self, plane: FrustumPlane) -> &Plane {
        &self.planes[plane as usize]
    }

    /// World-space box around the frustum corners
    pub fn bounding_box(&self) -> &AABB {
        &self.bounding_box
    }

    /// Check if an AABB is inside or intersects the frustum
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        for plane in &self.planes {
            // Corner furthest along the plane normal
            let mut p = aabb.min;
            if plane.normal.x >= 0.0 { p.x = aabb.max.x; }
            if plane.normal.y >= 0.0 { p.y = aabb.max.y; }
            if plane.normal.z >= 0.0 { p.z = aabb.max.z; }

            if plane.distance_to_point(p) < 0.0 {
                return false;
            }
        }
        true
    }

    /// Conservative test of a point cloud (e.g. box corners) against the planes
    ///
    /// Rejects only when all points are outside the same plane.
    pub fn intersects_points(&self, points: &[Vec3]) -> bool {
        self.planes.iter().all(|plane| {
            points.iter().any(|p| plane.distance_to_point(*p) >= 0.0)
        })
    }

    /// Check a sphere against the planes
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(center) >= -radius)
    }
}
