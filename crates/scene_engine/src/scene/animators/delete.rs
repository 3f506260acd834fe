use super::{into_ref, AnimatorRef, AnimatorType, SceneNodeAnimator};
use crate::scene::{SceneManager, SceneNodeId};

/// Queues its node for deletion once a delay has passed
///
/// The node is removed at the end of the frame's `draw_all`, never in the
/// middle of a traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteAnimator {
    finish_time: u32,
    finished: bool,
}

impl DeleteAnimator {
    /// Delete the node `delay_ms` after `time_ms`
    pub fn new(time_ms: u32, delay_ms: u32) -> Self {
        Self {
            finish_time: time_ms.saturating_add(delay_ms),
            finished: false,
        }
    }

    /// Time after which the node is deleted
    pub fn finish_time(&self) -> u32 {
        self.finish_time
    }
}

impl SceneNodeAnimator for DeleteAnimator {
    fn animate_node(&mut self, scene: &mut SceneManager, node: SceneNodeId, time_ms: u32) {
        if time_ms > self.finish_time {
            self.finished = true;
            scene.add_to_deletion_queue(node);
        }
    }

    fn animator_type(&self) -> AnimatorType {
        AnimatorType::Delete
    }

    fn has_finished(&self) -> bool {
        self.finished
    }

    fn create_clone(&self) -> Option<AnimatorRef> {
        Some(into_ref(self.clone()))
    }
}
