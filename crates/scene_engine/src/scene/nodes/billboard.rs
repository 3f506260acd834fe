//! Camera-facing quad

use crate::foundation::math::{utils, Mat4, Vec2, Vec3};
use crate::scene::{
    DebugData, RenderContext, RenderPass, Registrar, SceneNode, SceneNodeId, SceneNodeKind,
    SceneNodeType, AABB,
};
use crate::video::{Color, Material, TransformState, Vertex};
use std::any::Any;

const QUAD_INDICES: [u16; 6] = [0, 2, 1, 0, 3, 2];

/// Quad rebuilt every frame to face the active camera
///
/// Registers through the automatic pass, so a transparent material puts it
/// into the back-to-front queue.
#[derive(Debug, Clone, PartialEq)]
pub struct BillboardSceneNode {
    size: Vec2,
    top_color: Color,
    bottom_color: Color,
    materials: [Material; 1],
}

impl BillboardSceneNode {
    /// Create a billboard of `size` (width, height) in world units
    pub fn new(size: Vec2, color: Color) -> Self {
        Self {
            size: Self::sanitize(size),
            top_color: color,
            bottom_color: color,
            materials: [Material::default()],
        }
    }

    /// Width and height
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Set width and height; zero components fall back to one
    pub fn set_size(&mut self, size: Vec2) {
        self.size = Self::sanitize(size);
    }

    /// Colors of the top and bottom vertices
    pub fn colors(&self) -> (Color, Color) {
        (self.top_color, self.bottom_color)
    }

    /// Set the colors of the top and bottom vertices
    pub fn set_colors(&mut self, top: Color, bottom: Color) {
        self.top_color = top;
        self.bottom_color = bottom;
    }

    fn sanitize(size: Vec2) -> Vec2 {
        Vec2::new(
            if size.x == 0.0 { 1.0 } else { size.x },
            if size.y == 0.0 { 1.0 } else { size.y },
        )
    }

    /// Quad corners facing a camera at `camera_position` looking at `camera_target`
    pub fn quad(&self, position: Vec3, camera_position: Vec3, camera_target: Vec3, up: Vec3) -> [Vertex; 4] {
        let view = (camera_target - camera_position).try_normalize(f32::EPSILON).unwrap_or_else(Vec3::z);
        let mut horizontal = up.cross(&view);
        if horizontal.norm_squared() <= f32::EPSILON {
            horizontal = Vec3::new(up.y, up.x, up.z);
        }
        let horizontal = horizontal.normalize() * (0.5 * self.size.x);
        // Points down
        let vertical = horizontal.cross(&view).normalize() * (0.5 * self.size.y);
        let normal = -view;

        [
            Vertex::new(position + horizontal + vertical, normal, self.bottom_color, Vec2::new(1.0, 1.0)),
            Vertex::new(position + horizontal - vertical, normal, self.top_color, Vec2::new(1.0, 0.0)),
            Vertex::new(position - horizontal - vertical, normal, self.top_color, Vec2::new(0.0, 0.0)),
            Vertex::new(position - horizontal + vertical, normal, self.bottom_color, Vec2::new(0.0, 1.0)),
        ]
    }
}

impl SceneNodeKind for BillboardSceneNode {
    fn node_type(&self) -> SceneNodeType {
        SceneNodeType::BILLBOARD
    }

    fn bounding_box(&self) -> AABB {
        let avg = (self.size.x + self.size.y) / 6.0;
        AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(avg))
    }

    fn on_register(&self, id: SceneNodeId, node: &SceneNode, registrar: &mut Registrar<'_>) {
        registrar.register(id, node, RenderPass::Automatic);
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let Some(camera) = ctx.camera else {
            return;
        };
        let position = utils::translation_of(&ctx.absolute_transformation);
        let vertices = self.quad(position, camera.position, camera.target, camera.up);

        ctx.driver.set_transform(TransformState::World, &Mat4::identity());
        ctx.driver.set_material(&self.materials[0]);
        ctx.driver.draw_indexed_triangle_list(&vertices, &QUAD_INDICES);

        if ctx.debug_data.contains(DebugData::BBOX) {
            ctx.driver.set_transform(TransformState::World, &ctx.absolute_transformation);
            ctx.driver.draw_3d_box(&self.bounding_box(), Color::WHITE);
        }
    }

    fn materials(&self) -> &[Material] {
        &self.materials
    }

    fn materials_mut(&mut self) -> &mut [Material] {
        &mut self.materials
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
