//! Collision world boundary used by the collision response animator

use crate::foundation::math::Vec3;
use crate::scene::AABB;
use std::fmt;

/// Outcome of moving an ellipsoid through a collision world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    /// Ellipsoid center after sliding
    pub position: Vec3,
    /// Whether any geometry was hit
    pub collided: bool,
    /// Whether the ellipsoid is without ground contact
    pub falling: bool,
}

/// Static geometry an ellipsoid can collide with
pub trait CollisionWorld: fmt::Debug {
    /// Move an ellipsoid by `velocity`, sliding along whatever it hits
    fn collide_ellipsoid(&self, position: Vec3, radius: Vec3, velocity: Vec3) -> CollisionResult;
}

/// Collision world of static axis-aligned boxes
///
/// The ellipsoid is treated as its bounding box and moved one axis at a
/// time; a blocked axis keeps its old coordinate.
#[derive(Debug, Clone, Default)]
pub struct BoxCollisionWorld {
    boxes: Vec<AABB>,
}

impl BoxCollisionWorld {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a solid box
    pub fn add_box(&mut self, aabb: AABB) {
        self.boxes.push(aabb);
    }

    /// Solid boxes
    pub fn boxes(&self) -> &[AABB] {
        &self.boxes
    }

    fn blocked(&self, center: Vec3, radius: Vec3) -> bool {
        let volume = AABB::from_center_extents(center, radius);
        self.boxes.iter().any(|solid| solid.overlaps(&volume))
    }
}

impl CollisionWorld for BoxCollisionWorld {
    fn collide_ellipsoid(&self, position: Vec3, radius: Vec3, velocity: Vec3) -> CollisionResult {
        let mut current = position;
        let mut collided = false;
        let mut grounded = false;

        for axis in 0..3 {
            if velocity[axis] == 0.0 {
                continue;
            }
            let mut candidate = current;
            candidate[axis] += velocity[axis];
            if self.blocked(candidate, radius) {
                collided = true;
                if axis == 1 && velocity.y < 0.0 {
                    grounded = true;
                }
            } else {
                current = candidate;
            }
        }

        if !grounded {
            // Resting exactly on a surface still counts as ground contact
            let mut probe = current;
            probe.y -= radius.y * 0.01 + f32::EPSILON;
            grounded = self.blocked(probe, radius);
        }

        CollisionResult {
            position: current,
            collided,
            falling: !grounded,
        }
    }
}
