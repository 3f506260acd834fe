//! Dynamic light node

use crate::foundation::math::{utils, Vec3};
use crate::scene::{
    RenderContext, RenderPass, Registrar, SceneNode, SceneNodeId, SceneNodeKind, SceneNodeType, AABB,
};
use crate::video::{Colorf, LightData, LightType};
use std::any::Any;

/// Node that uploads a dynamic light during the light pass
///
/// Position and direction are taken from the node's absolute transform
/// each frame; the direction is the transformed +Z axis.
#[derive(Debug, Clone, PartialEq)]
pub struct LightSceneNode {
    light: LightData,
    driver_index: Option<usize>,
}

impl LightSceneNode {
    /// Point light with a color and radius
    pub fn new(color: Colorf, radius: f32) -> Self {
        Self {
            light: LightData {
                diffuse_color: color,
                radius,
                ..LightData::default()
            },
            driver_index: None,
        }
    }

    /// Light parameters
    pub fn light_data(&self) -> &LightData {
        &self.light
    }

    /// Mutable light parameters
    pub fn light_data_mut(&mut self) -> &mut LightData {
        &mut self.light
    }

    /// Change the light type
    pub fn set_light_type(&mut self, light_type: LightType) {
        self.light.light_type = light_type;
    }

    /// Falloff radius
    pub fn radius(&self) -> f32 {
        self.light.radius
    }

    /// Set the falloff radius
    pub fn set_radius(&mut self, radius: f32) {
        self.light.radius = radius;
    }

    /// Slot the driver assigned in the last light pass
    pub fn driver_light_index(&self) -> Option<usize> {
        self.driver_index
    }
}

impl SceneNodeKind for LightSceneNode {
    fn node_type(&self) -> SceneNodeType {
        SceneNodeType::LIGHT
    }

    fn bounding_box(&self) -> AABB {
        match self.light.light_type {
            LightType::Directional => AABB::from_point(Vec3::zeros()),
            LightType::Point | LightType::Spot => {
                AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(self.light.radius))
            }
        }
    }

    fn on_register(&self, id: SceneNodeId, node: &SceneNode, registrar: &mut Registrar<'_>) {
        registrar.register(id, node, RenderPass::Light);
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let absolute = &ctx.absolute_transformation;
        self.light.position = utils::translation_of(absolute);
        self.light.direction = absolute
            .transform_vector(&Vec3::z())
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vec3::z);
        self.driver_index = Some(ctx.driver.add_dynamic_light(&self.light));
    }

    fn clone_kind(&self) -> Option<Box<dyn SceneNodeKind>> {
        Some(Box::new(Self { driver_index: None, ..self.clone() }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
