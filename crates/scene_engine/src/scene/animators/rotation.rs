use super::{elapsed_ms, into_ref, AnimatorRef, AnimatorType, SceneNodeAnimator};
use crate::foundation::math::{utils, Vec3};
use crate::scene::{SceneManager, SceneNodeId};

/// Spins a node at a constant angular speed
#[derive(Debug, Clone, PartialEq)]
pub struct RotationAnimator {
    /// Degrees per second about each axis
    speed: Vec3,
    start_time: u32,
}

impl RotationAnimator {
    /// Create an animator rotating `speed` degrees per second, starting at `time_ms`
    pub fn new(time_ms: u32, speed: Vec3) -> Self {
        Self { speed, start_time: time_ms }
    }

    /// Degrees per second about each axis
    pub fn speed(&self) -> Vec3 {
        self.speed
    }
}

impl SceneNodeAnimator for RotationAnimator {
    fn animate_node(&mut self, scene: &mut SceneManager, node: SceneNodeId, time_ms: u32) {
        let diff = elapsed_ms(self.start_time, time_ms);
        if diff <= 0 {
            return;
        }
        let Some(scene_node) = scene.scene_node_mut(node) else {
            return;
        };
        #[allow(clippy::cast_precision_loss)]
        let rotation = scene_node.rotation() + self.speed * (diff as f32 * 0.001);
        scene_node.set_rotation(rotation.map(utils::wrap_degrees));
        self.start_time = time_ms;
    }

    fn animator_type(&self) -> AnimatorType {
        AnimatorType::Rotation
    }

    fn create_clone(&self) -> Option<AnimatorRef> {
        Some(into_ref(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::test_support::scene;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotates_and_wraps() {
        let mut scene = scene();
        let node = scene.add_empty_scene_node(None, -1);
        let mut animator = RotationAnimator::new(0, Vec3::new(0.0, 90.0, 0.0));

        animator.animate_node(&mut scene, node, 1000);
        assert_relative_eq!(scene.scene_node(node).unwrap().rotation().y, 90.0, epsilon = 1e-4);

        animator.animate_node(&mut scene, node, 4500);
        // 90 + 315 = 405 wraps to 45
        assert_relative_eq!(scene.scene_node(node).unwrap().rotation().y, 45.0, epsilon = 1e-3);
        assert!(!animator.has_finished());
    }
}
