//! Grouping node without geometry

use crate::foundation::math::Vec3;
use crate::scene::{RenderContext, SceneNodeKind, SceneNodeType, AABB};
use std::any::Any;

/// Node that only carries a transform and children
///
/// Also used for the scene root.
#[derive(Debug, Clone, PartialEq)]
pub struct EmptySceneNode {
    node_type: SceneNodeType,
}

impl EmptySceneNode {
    /// Create an empty node
    pub fn new() -> Self {
        Self { node_type: SceneNodeType::EMPTY }
    }

    pub(crate) fn root() -> Self {
        Self { node_type: SceneNodeType::ROOT }
    }
}

impl Default for EmptySceneNode {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneNodeKind for EmptySceneNode {
    fn node_type(&self) -> SceneNodeType {
        self.node_type
    }

    fn bounding_box(&self) -> AABB {
        AABB::from_point(Vec3::zeros())
    }

    fn render(&mut self, _ctx: &mut RenderContext<'_>) {}

    fn clone_kind(&self) -> Option<Box<dyn SceneNodeKind>> {
        Some(Box::new(self.clone()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
