//! Sky box drawn around the camera

use crate::foundation::math::{Mat4, Vec2, Vec3};
use crate::scene::{
    RenderContext, RenderPass, Registrar, SceneNode, SceneNodeId, SceneNodeKind, SceneNodeType, AABB,
};
use crate::video::{Color, Material, TextureId, TransformState, Vertex};
use std::any::Any;

const FACE_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Textures of the six sky box faces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkyBoxTextures {
    /// +Y face
    pub top: Option<TextureId>,
    /// -Y face
    pub bottom: Option<TextureId>,
    /// -X face
    pub left: Option<TextureId>,
    /// +X face
    pub right: Option<TextureId>,
    /// -Z face
    pub front: Option<TextureId>,
    /// +Z face
    pub back: Option<TextureId>,
}

/// Unit cube of six inward-facing quads centered on the camera
///
/// The cube is scaled to half way between the camera's near and far planes
/// so it never clips. It has no extent of its own and is never culled.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyBoxSceneNode {
    faces: [[Vertex; 4]; 6],
    materials: [Material; 6],
}

impl SkyBoxSceneNode {
    /// Create a sky box from six face textures
    pub fn new(textures: SkyBoxTextures) -> Self {
        // Outward axis and two in-plane axes, ordered front, left, back, right, top, bottom
        let axes = [
            (-Vec3::z(), Vec3::x(), Vec3::y()),
            (-Vec3::x(), -Vec3::z(), Vec3::y()),
            (Vec3::z(), -Vec3::x(), Vec3::y()),
            (Vec3::x(), Vec3::z(), Vec3::y()),
            (Vec3::y(), Vec3::x(), -Vec3::z()),
            (-Vec3::y(), Vec3::x(), Vec3::z()),
        ];
        let layers = [
            textures.front,
            textures.left,
            textures.back,
            textures.right,
            textures.top,
            textures.bottom,
        ];

        let faces = axes.map(|(out, u, v)| {
            let corner = |su: f32, sv: f32, uv: Vec2| Vertex::new(out + u * su + v * sv, -out, Color::WHITE, uv);
            [
                corner(-1.0, -1.0, Vec2::new(0.0, 1.0)),
                corner(1.0, -1.0, Vec2::new(1.0, 1.0)),
                corner(1.0, 1.0, Vec2::new(1.0, 0.0)),
                corner(-1.0, 1.0, Vec2::new(0.0, 0.0)),
            ]
        });
        let materials = layers.map(|texture| {
            let mut material = Material {
                lighting: false,
                z_buffer: false,
                z_write: false,
                ..Material::default()
            };
            material.set_texture(0, texture);
            material
        });

        Self { faces, materials }
    }

    /// Quad vertices of each face
    pub fn faces(&self) -> &[[Vertex; 4]; 6] {
        &self.faces
    }
}

impl SceneNodeKind for SkyBoxSceneNode {
    fn node_type(&self) -> SceneNodeType {
        SceneNodeType::SKY_BOX
    }

    fn bounding_box(&self) -> AABB {
        AABB::from_point(Vec3::zeros())
    }

    fn on_register(&self, id: SceneNodeId, node: &SceneNode, registrar: &mut Registrar<'_>) {
        registrar.register(id, node, RenderPass::SkyBox);
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let Some(camera) = ctx.camera else {
            return;
        };
        let mut world = ctx.absolute_transformation;
        let position = camera.position;
        world.m14 = position.x;
        world.m24 = position.y;
        world.m34 = position.z;
        let view_distance = (camera.near + camera.far) * 0.5;
        world *= Mat4::new_scaling(view_distance);

        ctx.driver.set_transform(TransformState::World, &world);
        for (face, material) in self.faces.iter().zip(&self.materials) {
            ctx.driver.set_material(material);
            ctx.driver.draw_indexed_triangle_list(face, &FACE_INDICES);
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_faces_point_inward() {
        let sky = SkyBoxSceneNode::new(SkyBoxTextures::default());
        for face in sky.faces() {
            let center = face.iter().map(|v| v.position).sum::<Vec3>() / 4.0;
            assert_relative_eq!(center.norm(), 1.0, epsilon = 1e-6);
            assert_relative_eq!(face[0].normal, -center, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_materials_carry_textures() {
        let sky = SkyBoxSceneNode::new(SkyBoxTextures {
            top: Some(TextureId(1)),
            back: Some(TextureId(6)),
            ..SkyBoxTextures::default()
        });
        assert_eq!(sky.materials()[4].texture(0), Some(TextureId(1)));
        assert_eq!(sky.materials()[2].texture(0), Some(TextureId(6)));
        assert!(sky.materials().iter().all(|m| !m.lighting && !m.z_write));
    }
}
