//! Scene node animators
//!
//! An animator is a per-frame mutation strategy attached to a node. The
//! manager runs every animator of a visible node during `on_animate`, before
//! the node's absolute transform is refreshed. Animators are shared
//! ([`AnimatorRef`]) so the same instance may drive several nodes.

mod collision_response;
mod delete;
mod fly_circle;
mod fly_straight;
mod follow_spline;
mod rotation;
mod texture;

pub use collision_response::CollisionResponseAnimator;
pub use delete::DeleteAnimator;
pub use fly_circle::FlyCircleAnimator;
pub use fly_straight::FlyStraightAnimator;
pub use follow_spline::FollowSplineAnimator;
pub use rotation::RotationAnimator;
pub use texture::TextureAnimator;

use crate::scene::{SceneManager, SceneNodeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared, mutable animator handle
pub type AnimatorRef = Rc<RefCell<dyn SceneNodeAnimator>>;

/// Built-in animator kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimatorType {
    /// [`RotationAnimator`]
    Rotation,
    /// [`FlyCircleAnimator`]
    FlyCircle,
    /// [`FlyStraightAnimator`]
    FlyStraight,
    /// [`TextureAnimator`]
    Texture,
    /// [`DeleteAnimator`]
    Delete,
    /// [`CollisionResponseAnimator`]
    CollisionResponse,
    /// [`FollowSplineAnimator`]
    FollowSpline,
    /// User-defined animator
    Unknown,
}

/// Per-frame mutation of a scene node
pub trait SceneNodeAnimator: fmt::Debug {
    /// Animate `node` for the frame at `time_ms`
    ///
    /// The animator may move, detach or queue the node for deletion; the
    /// traversal driving it tolerates all of these.
    fn animate_node(&mut self, scene: &mut SceneManager, node: SceneNodeId, time_ms: u32);

    /// Kind of animator
    fn animator_type(&self) -> AnimatorType {
        AnimatorType::Unknown
    }

    /// Whether the animation has run to its end
    fn has_finished(&self) -> bool {
        false
    }

    /// Independent copy used when the animated node is cloned
    fn create_clone(&self) -> Option<AnimatorRef> {
        None
    }
}

/// Wrap an animator into a shared handle
pub fn into_ref<A: SceneNodeAnimator + 'static>(animator: A) -> AnimatorRef {
    Rc::new(RefCell::new(animator))
}

/// Milliseconds from `start` to `now`, negative when `start` lies ahead
pub(crate) fn elapsed_ms(start: u32, now: u32) -> i64 {
    i64::from(now) - i64::from(start)
}
