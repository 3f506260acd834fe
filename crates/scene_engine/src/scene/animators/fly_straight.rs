use super::{elapsed_ms, into_ref, AnimatorRef, AnimatorType, SceneNodeAnimator};
use crate::foundation::math::Vec3;
use crate::scene::{SceneManager, SceneNodeId};

/// Moves a node along a line segment
#[derive(Debug, Clone, PartialEq)]
pub struct FlyStraightAnimator {
    start: Vec3,
    end: Vec3,
    time_for_way: u32,
    looping: bool,
    ping_pong: bool,
    start_time: u32,
    finished: bool,
}

impl FlyStraightAnimator {
    /// Fly from `start` to `end` in `time_for_way` milliseconds
    ///
    /// With `looping` the flight restarts at `start`; with `ping_pong` it
    /// alternates direction. A non-looping ping-pong flight finishes back at
    /// `start`.
    pub fn new(time_ms: u32, start: Vec3, end: Vec3, time_for_way: u32, looping: bool, ping_pong: bool) -> Self {
        Self {
            start,
            end,
            time_for_way: time_for_way.max(1),
            looping,
            ping_pong,
            start_time: time_ms,
            finished: false,
        }
    }

    /// Position `elapsed` milliseconds into the flight, and whether it is over
    #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
    pub fn position_at(&self, elapsed: i64) -> (Vec3, bool) {
        let t = elapsed.max(0) as u64;
        let way = u64::from(self.time_for_way);

        if !self.looping && !self.ping_pong && t >= way {
            return (self.end, true);
        }
        if !self.looping && self.ping_pong && t >= way * 2 {
            return (self.start, true);
        }

        let phase = (t % way) as f32 / way as f32;
        let travel = (self.end - self.start) * phase;
        let returning = self.ping_pong && (t / way) % 2 == 1;
        let position = if returning { self.end - travel } else { self.start + travel };
        (position, false)
    }
}

impl SceneNodeAnimator for FlyStraightAnimator {
    fn animate_node(&mut self, scene: &mut SceneManager, node: SceneNodeId, time_ms: u32) {
        let (position, finished) = self.position_at(elapsed_ms(self.start_time, time_ms));
        self.finished = finished;
        if let Some(scene_node) = scene.scene_node_mut(node) {
            scene_node.set_position(position);
        }
    }

    fn animator_type(&self) -> AnimatorType {
        AnimatorType::FlyStraight
    }

    fn has_finished(&self) -> bool {
        self.finished
    }

    fn create_clone(&self) -> Option<AnimatorRef> {
        Some(into_ref(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line(looping: bool, ping_pong: bool) -> FlyStraightAnimator {
        FlyStraightAnimator::new(0, Vec3::zeros(), Vec3::new(10.0, 0.0, 0.0), 1000, looping, ping_pong)
    }

    #[test]
    fn test_one_shot() {
        let animator = line(false, false);
        assert_relative_eq!(animator.position_at(500).0, Vec3::new(5.0, 0.0, 0.0));
        let (end, finished) = animator.position_at(1500);
        assert_relative_eq!(end, Vec3::new(10.0, 0.0, 0.0));
        assert!(finished);
    }

    #[test]
    fn test_loop_restarts() {
        let animator = line(true, false);
        let (p, finished) = animator.position_at(1250);
        assert_relative_eq!(p, Vec3::new(2.5, 0.0, 0.0));
        assert!(!finished);
    }

    #[test]
    fn test_ping_pong() {
        let animator = line(false, true);
        assert_relative_eq!(animator.position_at(1250).0, Vec3::new(7.5, 0.0, 0.0));
        let (p, finished) = animator.position_at(2500);
        assert_relative_eq!(p, Vec3::zeros());
        assert!(finished);
    }
}
