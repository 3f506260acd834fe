use super::{into_ref, AnimatorRef, AnimatorType, SceneNodeAnimator};
use crate::foundation::math::Vec3;
use crate::scene::{CollisionWorld, SceneManager, SceneNodeId};
use std::rc::Rc;

/// Keeps a node from moving through a collision world and applies gravity
///
/// Whatever moved the node since the last frame (user code or another
/// animator) is replayed through the world as an ellipsoid sweep, plus the
/// accumulated falling velocity. The ellipsoid is centered at the node
/// position minus `translation`.
#[derive(Debug, Clone)]
pub struct CollisionResponseAnimator {
    world: Rc<dyn CollisionWorld>,
    radius: Vec3,
    gravity: Vec3,
    translation: Vec3,
    falling_velocity: Vec3,
    last_position: Vec3,
    last_time: u32,
    falling: bool,
    collision_occurred: bool,
    target: Option<SceneNodeId>,
}

impl CollisionResponseAnimator {
    /// Create an animator for an ellipsoid of `radius`
    ///
    /// `gravity` is an acceleration in units per second squared.
    pub fn new(world: Rc<dyn CollisionWorld>, radius: Vec3, gravity: Vec3, translation: Vec3) -> Self {
        Self {
            world,
            radius,
            gravity,
            translation,
            falling_velocity: Vec3::zeros(),
            last_position: Vec3::zeros(),
            last_time: 0,
            falling: false,
            collision_occurred: false,
            target: None,
        }
    }

    /// Whether the node has no ground contact
    pub fn is_falling(&self) -> bool {
        self.falling
    }

    /// Whether the last step hit geometry
    pub fn collision_occurred(&self) -> bool {
        self.collision_occurred
    }

    /// Ellipsoid radii
    pub fn ellipsoid_radius(&self) -> Vec3 {
        self.radius
    }

    /// Gravity acceleration
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Set the gravity acceleration
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    /// Kick the node against gravity with `speed` units per second
    pub fn jump(&mut self, speed: f32) {
        if let Some(up) = (-self.gravity).try_normalize(f32::EPSILON) {
            self.falling_velocity += up * speed;
            self.falling = true;
        }
    }

    fn reset(&mut self, node: SceneNodeId, position: Vec3, time_ms: u32) {
        self.target = Some(node);
        self.last_position = position;
        self.last_time = time_ms;
        self.falling = false;
        self.falling_velocity = Vec3::zeros();
    }
}

impl SceneNodeAnimator for CollisionResponseAnimator {
    #[allow(clippy::cast_precision_loss)]
    fn animate_node(&mut self, scene: &mut SceneManager, node: SceneNodeId, time_ms: u32) {
        self.collision_occurred = false;
        let Some(scene_node) = scene.scene_node_mut(node) else {
            return;
        };
        let position = scene_node.position();
        if self.target != Some(node) {
            self.reset(node, position, time_ms);
            return;
        }

        let seconds = time_ms.wrapping_sub(self.last_time) as f32 * 0.001;
        self.last_time = time_ms;
        self.falling_velocity += self.gravity * seconds;

        let movement = position - self.last_position + self.falling_velocity * seconds;
        if movement != Vec3::zeros() {
            let result = self.world.collide_ellipsoid(
                self.last_position - self.translation,
                self.radius,
                movement,
            );
            self.collision_occurred = result.collided;
            self.falling = result.falling;
            if !self.falling {
                self.falling_velocity = Vec3::zeros();
            }
            scene_node.set_position(result.position + self.translation);
        }
        self.last_position = scene_node.position();
    }

    fn animator_type(&self) -> AnimatorType {
        AnimatorType::CollisionResponse
    }

    fn create_clone(&self) -> Option<AnimatorRef> {
        let mut copy = self.clone();
        copy.target = None;
        Some(into_ref(copy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::test_support::scene;
    use crate::scene::{BoxCollisionWorld, AABB};

    #[test]
    fn test_falls_onto_floor() {
        let mut world = BoxCollisionWorld::new();
        world.add_box(AABB::new(Vec3::new(-50.0, -1.0, -50.0), Vec3::new(50.0, 0.0, 50.0)));
        let mut scene = scene();
        let node = scene.add_empty_scene_node(None, -1);
        scene.scene_node_mut(node).unwrap().set_position(Vec3::new(0.0, 5.0, 0.0));

        let mut animator = CollisionResponseAnimator::new(
            Rc::new(world),
            Vec3::repeat(1.0),
            Vec3::new(0.0, -10.0, 0.0),
            Vec3::zeros(),
        );

        animator.animate_node(&mut scene, node, 0);
        let mut time = 0;
        for _ in 0..200 {
            time += 20;
            animator.animate_node(&mut scene, node, time);
        }

        let y = scene.scene_node(node).unwrap().position().y;
        assert!(y >= 1.0 - 1e-3, "sank into the floor: {y}");
        assert!(y < 1.5, "never landed: {y}");
        assert!(!animator.is_falling());
    }
}
