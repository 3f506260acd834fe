use super::{elapsed_ms, into_ref, AnimatorRef, AnimatorType, SceneNodeAnimator};
use crate::scene::{SceneManager, SceneNodeId};
use crate::video::TextureId;

/// Cycles texture layer 0 of every material through a list of frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureAnimator {
    textures: Vec<TextureId>,
    time_per_frame: u32,
    looping: bool,
    start_time: u32,
    finished: bool,
}

impl TextureAnimator {
    /// Show each texture for `time_per_frame` milliseconds
    pub fn new(time_ms: u32, textures: Vec<TextureId>, time_per_frame: u32, looping: bool) -> Self {
        Self {
            textures,
            time_per_frame: time_per_frame.max(1),
            looping,
            start_time: time_ms,
            finished: false,
        }
    }

    /// Frame index shown `elapsed` milliseconds after the start
    ///
    /// A non-looping animation holds its last frame once all frames have
    /// been shown.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn frame_at(&self, elapsed: i64) -> Option<(usize, bool)> {
        if self.textures.is_empty() {
            return None;
        }
        let count = self.textures.len() as u64;
        let frame = elapsed.max(0) as u64 / u64::from(self.time_per_frame);
        if !self.looping && frame >= count {
            return Some((self.textures.len() - 1, true));
        }
        Some(((frame % count) as usize, false))
    }
}

impl SceneNodeAnimator for TextureAnimator {
    fn animate_node(&mut self, scene: &mut SceneManager, node: SceneNodeId, time_ms: u32) {
        let Some((index, finished)) = self.frame_at(elapsed_ms(self.start_time, time_ms)) else {
            return;
        };
        self.finished = finished;
        if let Some(scene_node) = scene.scene_node_mut(node) {
            scene_node.set_material_texture(0, self.textures.get(index).copied());
        }
    }

    fn animator_type(&self) -> AnimatorType {
        AnimatorType::Texture
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

    fn frames() -> Vec<TextureId> {
        vec![TextureId(10), TextureId(11), TextureId(12)]
    }

    #[test]
    fn test_frames_loop() {
        let animator = TextureAnimator::new(0, frames(), 100, true);
        assert_eq!(animator.frame_at(0), Some((0, false)));
        assert_eq!(animator.frame_at(150), Some((1, false)));
        assert_eq!(animator.frame_at(350), Some((0, false)));
    }

    #[test]
    fn test_holds_last_frame() {
        let animator = TextureAnimator::new(0, frames(), 100, false);
        assert_eq!(animator.frame_at(299), Some((2, false)));
        assert_eq!(animator.frame_at(1000), Some((2, true)));
    }

    #[test]
    fn test_no_frames() {
        let animator = TextureAnimator::new(0, Vec::new(), 100, true);
        assert_eq!(animator.frame_at(10), None);
    }
}
