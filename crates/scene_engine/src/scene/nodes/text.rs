//! Text label anchored at a world position

use crate::foundation::math::{utils, Vec3};
use crate::scene::{
    RenderContext, RenderPass, Registrar, SceneNode, SceneNodeId, SceneNodeKind, SceneNodeType, AABB,
};
use crate::video::Color;
use std::any::Any;

/// Label drawn in the GUI pass at the node's world position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSceneNode {
    text: String,
    color: Color,
}

impl TextSceneNode {
    /// Create a label
    pub fn new(text: impl Into<String>, color: Color) -> Self {
        Self { text: text.into(), color }
    }

    /// Label text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the label text
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Label color
    pub fn color(&self) -> Color {
        self.color
    }

    /// Set the label color
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

impl SceneNodeKind for TextSceneNode {
    fn node_type(&self) -> SceneNodeType {
        SceneNodeType::TEXT
    }

    fn bounding_box(&self) -> AABB {
        AABB::from_point(Vec3::zeros())
    }

    fn on_register(&self, id: SceneNodeId, node: &SceneNode, registrar: &mut Registrar<'_>) {
        registrar.register(id, node, RenderPass::Gui);
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let position = utils::translation_of(&ctx.absolute_transformation);
        ctx.driver.draw_text(&self.text, position, self.color);
    }

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
