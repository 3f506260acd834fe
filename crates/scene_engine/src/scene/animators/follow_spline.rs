use super::{elapsed_ms, into_ref, AnimatorRef, AnimatorType, SceneNodeAnimator};
use crate::foundation::math::Vec3;
use crate::scene::{SceneManager, SceneNodeId};

/// Moves a node along a Hermite spline through a list of points
#[derive(Debug, Clone, PartialEq)]
pub struct FollowSplineAnimator {
    points: Vec<Vec3>,
    /// Points per second
    speed: f32,
    tightness: f32,
    looping: bool,
    ping_pong: bool,
    start_time: u32,
    finished: bool,
}

/// Wrap an index one step past either end of the point list
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn wrap_index(index: i64, size: usize) -> usize {
    let size = size as i64;
    let wrapped = if index < 0 {
        size + index
    } else if index >= size {
        index - size
    } else {
        index
    };
    wrapped.clamp(0, size - 1) as usize
}

impl FollowSplineAnimator {
    /// Follow `points` at `speed` points per second
    ///
    /// `tightness` scales the tangents; 0.5 gives a Catmull-Rom spline.
    pub fn new(
        time_ms: u32,
        points: Vec<Vec3>,
        speed: f32,
        tightness: f32,
        looping: bool,
        ping_pong: bool,
    ) -> Self {
        Self {
            points,
            speed,
            tightness,
            looping,
            ping_pong,
            start_time: time_ms,
            finished: false,
        }
    }

    /// Control points
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Position `elapsed` milliseconds after the start, and whether the path is done
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap
    )]
    pub fn position_at(&self, elapsed: i64) -> Option<(Vec3, bool)> {
        let size = self.points.len();
        match size {
            0 => return None,
            1 => return Some((self.points[0], !self.looping)),
            _ => {}
        }

        let dt = elapsed.max(0) as f32 * self.speed * 0.001;
        let unwrapped = dt.floor() as i64;
        let segments = size as i64 - 1;
        if !self.looping && !self.ping_pong && unwrapped >= segments {
            return Some((self.points[size - 1], true));
        }

        let pong = self.ping_pong && (unwrapped / segments) % 2 == 1;
        let fraction = dt - dt.floor();
        let u = if pong { 1.0 - fraction } else { fraction };
        let index = if pong {
            (segments - 1) - (unwrapped % segments)
        } else if self.ping_pong {
            unwrapped % segments
        } else {
            unwrapped % size as i64
        };

        let p0 = self.points[wrap_index(index - 1, size)];
        let p1 = self.points[wrap_index(index, size)];
        let p2 = self.points[wrap_index(index + 1, size)];
        let p3 = self.points[wrap_index(index + 2, size)];

        let (u2, u3) = (u * u, u * u * u);
        let h1 = 2.0 * u3 - 3.0 * u2 + 1.0;
        let h2 = -2.0 * u3 + 3.0 * u2;
        let h3 = u3 - 2.0 * u2 + u;
        let h4 = u3 - u2;

        let t1 = (p2 - p0) * self.tightness;
        let t2 = (p3 - p1) * self.tightness;
        Some((p1 * h1 + p2 * h2 + t1 * h3 + t2 * h4, false))
    }
}

impl SceneNodeAnimator for FollowSplineAnimator {
    fn animate_node(&mut self, scene: &mut SceneManager, node: SceneNodeId, time_ms: u32) {
        let elapsed = elapsed_ms(self.start_time, time_ms);
        if self.points.len() == 1 && elapsed <= 0 {
            return;
        }
        match self.position_at(elapsed) {
            Some((position, finished)) => {
                self.finished = finished;
                if let Some(scene_node) = scene.scene_node_mut(node) {
                    scene_node.set_position(position);
                }
            }
            None => self.finished = !self.looping,
        }
    }

    fn animator_type(&self) -> AnimatorType {
        AnimatorType::FollowSpline
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

    fn path(looping: bool) -> FollowSplineAnimator {
        let points = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 10.0),
            Vec3::new(0.0, 0.0, 10.0),
        ];
        FollowSplineAnimator::new(0, points, 1.0, 0.5, looping, false)
    }

    #[test]
    fn test_passes_through_points() {
        let spline = path(true);
        for (i, expected) in spline.points().to_vec().into_iter().enumerate() {
            let (p, _) = spline.position_at(i as i64 * 1000).unwrap();
            assert_relative_eq!(p, expected, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_stops_at_last_point() {
        let spline = path(false);
        let (p, finished) = spline.position_at(3500).unwrap();
        assert_relative_eq!(p, Vec3::new(0.0, 0.0, 10.0));
        assert!(finished);
        assert!(!spline.position_at(2500).unwrap().1);
    }

    #[test]
    fn test_degenerate_paths() {
        let empty = FollowSplineAnimator::new(0, Vec::new(), 1.0, 0.5, false, false);
        assert!(empty.position_at(100).is_none());

        let single = FollowSplineAnimator::new(0, vec![Vec3::new(1.0, 2.0, 3.0)], 1.0, 0.5, false, false);
        assert_eq!(single.position_at(100), Some((Vec3::new(1.0, 2.0, 3.0), true)));
    }

    #[test]
    fn test_wrap_index() {
        assert_eq!(wrap_index(-1, 4), 3);
        assert_eq!(wrap_index(4, 4), 0);
        assert_eq!(wrap_index(5, 4), 1);
        assert_eq!(wrap_index(2, 4), 2);
    }
}
