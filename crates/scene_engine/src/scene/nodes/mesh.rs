//! Static mesh node

use crate::scene::{
    Mesh, RenderContext, RenderPass, Registrar, SceneNode, SceneNodeId, SceneNodeKind,
    SceneNodeType, DebugData, AABB,
};
use crate::video::{Color, Material, TransformState};
use std::any::Any;
use std::rc::Rc;

/// Node drawing every buffer of a shared mesh
///
/// The node keeps its own copy of the buffer materials so that two nodes
/// sharing one mesh can be textured differently. With read-only materials
/// the mesh buffer materials are used directly.
#[derive(Debug, Clone)]
pub struct MeshSceneNode {
    mesh: Rc<dyn Mesh>,
    materials: Vec<Material>,
    read_only_materials: bool,
}

impl MeshSceneNode {
    /// Create a node for `mesh`, copying its materials
    pub fn new(mesh: Rc<dyn Mesh>) -> Self {
        let materials = Self::copy_materials(mesh.as_ref());
        Self {
            mesh,
            materials,
            read_only_materials: false,
        }
    }

    /// The drawn mesh
    pub fn mesh(&self) -> &Rc<dyn Mesh> {
        &self.mesh
    }

    /// Replace the mesh and re-copy its materials
    pub fn set_mesh(&mut self, mesh: Rc<dyn Mesh>) {
        self.materials = Self::copy_materials(mesh.as_ref());
        self.mesh = mesh;
    }

    /// Draw with the mesh buffer materials instead of the node's copies
    pub fn set_read_only_materials(&mut self, read_only: bool) {
        self.read_only_materials = read_only;
    }

    /// Whether the mesh buffer materials are used directly
    pub fn is_read_only_materials(&self) -> bool {
        self.read_only_materials
    }

    fn copy_materials(mesh: &dyn Mesh) -> Vec<Material> {
        (0..mesh.mesh_buffer_count())
            .filter_map(|i| mesh.mesh_buffer(i))
            .map(|buffer| buffer.material.clone())
            .collect()
    }

    fn buffer_material(&self, index: usize) -> Option<&Material> {
        if self.read_only_materials {
            self.mesh.mesh_buffer(index).map(|buffer| &buffer.material)
        } else {
            self.materials.get(index)
        }
    }
}

impl SceneNodeKind for MeshSceneNode {
    fn node_type(&self) -> SceneNodeType {
        SceneNodeType::MESH
    }

    fn bounding_box(&self) -> AABB {
        self.mesh.bounding_box()
    }

    fn on_register(&self, id: SceneNodeId, node: &SceneNode, registrar: &mut Registrar<'_>) {
        let mut solid = false;
        let mut transparent = false;
        for i in 0..self.mesh.mesh_buffer_count() {
            match self.buffer_material(i) {
                Some(material) if material.is_transparent() => transparent = true,
                Some(_) => solid = true,
                None => {}
            }
            if solid && transparent {
                break;
            }
        }

        if solid {
            registrar.register(id, node, RenderPass::Solid);
        }
        if transparent {
            registrar.register(id, node, RenderPass::Transparent);
        }
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let transparent_pass = matches!(ctx.pass, RenderPass::Transparent | RenderPass::TransparentEffect);
        ctx.driver.set_transform(TransformState::World, &ctx.absolute_transformation);

        for i in 0..self.mesh.mesh_buffer_count() {
            let (Some(buffer), Some(material)) = (self.mesh.mesh_buffer(i), self.buffer_material(i)) else {
                continue;
            };
            if material.is_transparent() == transparent_pass {
                ctx.driver.set_material(material);
                ctx.driver.draw_mesh_buffer(buffer);
            }
        }

        if ctx.debug_data.is_empty() {
            return;
        }
        let debug_material = Material {
            lighting: false,
            ..Material::default()
        };
        ctx.driver.set_material(&debug_material);
        if ctx.debug_data.contains(DebugData::BBOX) {
            ctx.driver.draw_3d_box(&self.mesh.bounding_box(), Color::WHITE);
        }
        if ctx.debug_data.contains(DebugData::BBOX_BUFFERS) {
            for i in 0..self.mesh.mesh_buffer_count() {
                if let Some(buffer) = self.mesh.mesh_buffer(i) {
                    ctx.driver.draw_3d_box(&buffer.bounding_box(), Color::new(255, 190, 128, 128));
                }
            }
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
