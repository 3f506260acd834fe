use super::{elapsed_ms, into_ref, AnimatorRef, AnimatorType, SceneNodeAnimator};
use crate::foundation::math::Vec3;
use crate::scene::{SceneManager, SceneNodeId};

/// Moves a node around a circle or ellipse
#[derive(Debug, Clone, PartialEq)]
pub struct FlyCircleAnimator {
    center: Vec3,
    radius: f32,
    radius_ellipsoid: f32,
    /// Radians per millisecond
    speed: f32,
    direction: Vec3,
    vec_u: Vec3,
    vec_v: Vec3,
    start_time: u32,
}

impl FlyCircleAnimator {
    /// Create a circle around `center` in the plane orthogonal to `direction`
    ///
    /// `start_position` is the phase in `[0, 1)` of one orbit the animation
    /// starts at. A non-zero `radius_ellipsoid` replaces the radius along the
    /// second in-plane axis.
    pub fn new(
        time_ms: u32,
        center: Vec3,
        radius: f32,
        speed: f32,
        direction: Vec3,
        start_position: f32,
        radius_ellipsoid: f32,
    ) -> Self {
        let direction = direction.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::y);
        let helper = if direction.y == 0.0 {
            Vec3::new(0.0, 50.0, 0.0)
        } else {
            Vec3::new(50.0, 0.0, 0.0)
        };
        let vec_v = helper.cross(&direction).normalize();
        let vec_u = vec_v.cross(&direction).normalize();

        // Phase offset moves the start time back by that share of one orbit
        let orbit_ms = if speed == 0.0 { 0.0 } else { std::f32::consts::TAU / speed.abs() };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let offset = (orbit_ms * start_position.clamp(0.0, 1.0)) as u32;

        Self {
            center,
            radius,
            radius_ellipsoid,
            speed,
            direction,
            vec_u,
            vec_v,
            start_time: time_ms.wrapping_sub(offset),
        }
    }

    /// Position on the orbit `elapsed` milliseconds after the start
    #[allow(clippy::cast_precision_loss)]
    pub fn position_at(&self, elapsed: i64) -> Vec3 {
        let angle = elapsed as f32 * self.speed;
        let r2 = if self.radius_ellipsoid == 0.0 { self.radius } else { self.radius_ellipsoid };
        self.center + self.vec_u * (self.radius * angle.cos()) + self.vec_v * (r2 * angle.sin())
    }

    /// Normalized axis of the orbit
    pub fn direction(&self) -> Vec3 {
        self.direction
    }
}

impl SceneNodeAnimator for FlyCircleAnimator {
    fn animate_node(&mut self, scene: &mut SceneManager, node: SceneNodeId, time_ms: u32) {
        let position = self.position_at(elapsed_ms(self.start_time, time_ms));
        if let Some(scene_node) = scene.scene_node_mut(node) {
            scene_node.set_position(position);
        }
    }

    fn animator_type(&self) -> AnimatorType {
        AnimatorType::FlyCircle
    }

    fn create_clone(&self) -> Option<AnimatorRef> {
        Some(into_ref(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_stays_on_circle() {
        let animator = FlyCircleAnimator::new(0, Vec3::new(1.0, 2.0, 3.0), 10.0, 0.001, Vec3::y(), 0.0, 0.0);
        for t in [0, 250, 1000, 5000] {
            let p = animator.position_at(t);
            assert_relative_eq!((p - Vec3::new(1.0, 2.0, 3.0)).norm(), 10.0, epsilon = 1e-3);
            assert_relative_eq!(p.y, 2.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_start_phase() {
        let speed = 0.001;
        let a = FlyCircleAnimator::new(10_000, Vec3::zeros(), 5.0, speed, Vec3::y(), 0.5, 0.0);
        let b = FlyCircleAnimator::new(10_000, Vec3::zeros(), 5.0, speed, Vec3::y(), 0.0, 0.0);
        // Half an orbit apart
        let pa = a.position_at(elapsed_ms(a.start_time, 10_000));
        let pb = b.position_at(elapsed_ms(b.start_time, 10_000));
        assert_relative_eq!(pa, -pb, epsilon = 1e-2);
    }

    #[test]
    fn test_ellipse() {
        let animator = FlyCircleAnimator::new(0, Vec3::zeros(), 10.0, 0.001, Vec3::y(), 0.0, 4.0);
        let quarter = animator.position_at((std::f32::consts::FRAC_PI_2 / 0.001) as i64);
        assert_relative_eq!(quarter.norm(), 4.0, epsilon = 1e-2);
    }
}
