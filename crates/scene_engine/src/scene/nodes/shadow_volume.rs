//! Stencil shadow volume of a mesh
//!
//! The volume is the set of light-facing triangles (front cap), the same
//! triangles pushed away from the light (back cap) and a quad for every
//! silhouette edge joining the two.

use crate::foundation::math::Vec3;
use crate::scene::{
    Mesh, RenderContext, RenderPass, Registrar, SceneNode, SceneNodeId, SceneNodeKind, SceneNodeType, AABB,
};
use crate::video::TransformState;
use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

type EdgeKey = ([u32; 3], [u32; 3]);

fn position_key(p: Vec3) -> [u32; 3] {
    [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
}

/// Shadow volume cast by a shared mesh away from a directional light
///
/// Usually attached as a child of the mesh node it shadows, with automatic
/// culling off. The light direction is given in world space.
#[derive(Debug, Clone)]
pub struct ShadowVolumeSceneNode {
    mesh: Rc<dyn Mesh>,
    light_direction: Vec3,
    extrusion: f32,
    use_zfail: bool,
    volume: Vec<Vec3>,
    volume_direction: Option<Vec3>,
}

impl ShadowVolumeSceneNode {
    /// Create a volume for `mesh` extruded `extrusion` units
    pub fn new(mesh: Rc<dyn Mesh>, light_direction: Vec3, extrusion: f32, use_zfail: bool) -> Self {
        Self {
            mesh,
            light_direction,
            extrusion,
            use_zfail,
            volume: Vec::new(),
            volume_direction: None,
        }
    }

    /// World-space light direction
    pub fn light_direction(&self) -> Vec3 {
        self.light_direction
    }

    /// Set the world-space light direction
    pub fn set_light_direction(&mut self, direction: Vec3) {
        self.light_direction = direction;
    }

    /// Whether the z-fail stencil method is used
    pub fn uses_zfail(&self) -> bool {
        self.use_zfail
    }

    /// Triangles of the last built volume, three positions per triangle
    pub fn volume(&self) -> &[Vec3] {
        &self.volume
    }

    /// Rebuild the volume for a light direction in mesh-local space
    pub fn build_volume(&mut self, local_direction: Vec3) {
        self.volume.clear();
        self.volume_direction = Some(local_direction);
        let Some(direction) = local_direction.try_normalize(f32::EPSILON) else {
            return;
        };
        let offset = direction * self.extrusion;

        let mut edges: HashMap<EdgeKey, (Vec3, Vec3, u32)> = HashMap::new();
        for index in 0..self.mesh.mesh_buffer_count() {
            let Some(buffer) = self.mesh.mesh_buffer(index) else {
                continue;
            };
            for [a, b, c] in buffer.triangle_positions() {
                let normal = (b - a).cross(&(c - a));
                if normal.dot(&direction) >= 0.0 {
                    continue;
                }
                self.volume.extend_from_slice(&[a, b, c]);
                self.volume.extend_from_slice(&[a + offset, c + offset, b + offset]);

                for (from, to) in [(a, b), (b, c), (c, a)] {
                    let (kf, kt) = (position_key(from), position_key(to));
                    let key = if kf <= kt { (kf, kt) } else { (kt, kf) };
                    edges.entry(key).or_insert((from, to, 0)).2 += 1;
                }
            }
        }

        for (from, to, count) in edges.into_values() {
            if count == 1 {
                let (from_far, to_far) = (from + offset, to + offset);
                self.volume.extend_from_slice(&[from, from_far, to]);
                self.volume.extend_from_slice(&[to, from_far, to_far]);
            }
        }
    }
}

impl SceneNodeKind for ShadowVolumeSceneNode {
    fn node_type(&self) -> SceneNodeType {
        SceneNodeType::SHADOW_VOLUME
    }

    fn bounding_box(&self) -> AABB {
        self.mesh.bounding_box()
    }

    fn on_register(&self, id: SceneNodeId, node: &SceneNode, registrar: &mut Registrar<'_>) {
        registrar.register(id, node, RenderPass::Shadow);
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let local_direction = ctx
            .absolute_transformation
            .try_inverse()
            .map_or(self.light_direction, |inverse| inverse.transform_vector(&self.light_direction));
        if self.volume_direction != Some(local_direction) {
            self.build_volume(local_direction);
        }
        if self.volume.is_empty() {
            return;
        }
        ctx.driver.set_transform(TransformState::World, &ctx.absolute_transformation);
        ctx.driver.draw_stencil_shadow_volume(&self.volume, self.use_zfail);
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
    use crate::scene::StaticMesh;
    use crate::video::Material;

    #[test]
    fn test_cube_volume_from_above() {
        let cube: Rc<dyn Mesh> = Rc::new(StaticMesh::cube(2.0, Material::default()));
        let mut shadow = ShadowVolumeSceneNode::new(cube, -Vec3::y(), 100.0, true);
        shadow.build_volume(-Vec3::y());

        // Top face: 2 front cap + 2 back cap triangles, 4 silhouette quads of 2 triangles
        assert_eq!(shadow.volume().len() / 3, 12);
        assert!(shadow.volume().iter().any(|p| p.y < -90.0));
    }

    #[test]
    fn test_zero_direction_builds_nothing() {
        let cube: Rc<dyn Mesh> = Rc::new(StaticMesh::cube(2.0, Material::default()));
        let mut shadow = ShadowVolumeSceneNode::new(cube, Vec3::zeros(), 100.0, false);
        shadow.build_volume(Vec3::zeros());
        assert!(shadow.volume().is_empty());
    }
}
