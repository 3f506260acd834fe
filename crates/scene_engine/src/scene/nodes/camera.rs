//! Camera node
//!
//! The active camera registers into the camera pass; its `render` sets the
//! view and projection every later pass draws with. The manager derives a
//! [`CameraView`] from it once per frame for culling and distance sorting.

use crate::foundation::math::{constants, utils, Mat4, Mat4Ext, Vec3};
use crate::scene::{
    RenderContext, RenderPass, Registrar, SceneNode, SceneNodeId, SceneNodeKind, SceneNodeType,
    ViewFrustum, AABB,
};
use crate::video::TransformState;
use std::any::Any;

/// Camera state resolved against the camera node's absolute transform
#[derive(Debug, Clone, PartialEq)]
pub struct CameraView {
    /// World position
    pub position: Vec3,
    /// World look-at point
    pub target: Vec3,
    /// Up vector actually used for the view matrix
    pub up: Vec3,
    /// World to view
    pub view: Mat4,
    /// View to clip
    pub projection: Mat4,
    /// Frustum of `projection * view`
    pub frustum: ViewFrustum,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
}

/// Perspective camera looking at a world-space target
///
/// # Coordinate System
/// Right-handed, Y-up; the projection maps depth into OpenGL's `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSceneNode {
    target: Vec3,
    up: Vec3,
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl CameraSceneNode {
    /// Create a camera looking down +Z at `(0, 0, 100)`
    ///
    /// Field of view is `PI / 2.5` radians, aspect 4:3, near 1, far 3000.
    pub fn new() -> Self {
        Self {
            target: Vec3::new(0.0, 0.0, 100.0),
            up: Vec3::y(),
            fov_y: constants::PI / 2.5,
            aspect: 4.0 / 3.0,
            near: 1.0,
            far: 3000.0,
        }
    }

    /// World look-at point
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Set the world look-at point
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
        log::trace!("Camera target updated to: {:?}", target);
    }

    /// Up vector
    pub fn up_vector(&self) -> Vec3 {
        self.up
    }

    /// Set the up vector
    pub fn set_up_vector(&mut self, up: Vec3) {
        self.up = up;
    }

    /// Vertical field of view in radians
    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    /// Set the vertical field of view in radians
    pub fn set_fov_y(&mut self, fov_y: f32) {
        self.fov_y = fov_y;
    }

    /// Width over height
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect
    }

    /// Set width over height
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Near clip distance
    pub fn near_value(&self) -> f32 {
        self.near
    }

    /// Set the near clip distance
    pub fn set_near_value(&mut self, near: f32) {
        self.near = near;
    }

    /// Far clip distance
    pub fn far_value(&self) -> f32 {
        self.far
    }

    /// Set the far clip distance
    pub fn set_far_value(&mut self, far: f32) {
        self.far = far;
    }

    /// Projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Resolve view, projection and frustum for a camera at `absolute`
    ///
    /// An up vector parallel to the view direction is nudged along X so the
    /// view matrix stays defined. A target on top of the camera looks down +Z.
    pub fn view(&self, absolute: &Mat4) -> CameraView {
        let position = utils::translation_of(absolute);
        let mut target = self.target;
        if (target - position).norm_squared() <= constants::ROUNDING_ERROR {
            target = position + Vec3::z();
        }

        let direction = (target - position).normalize();
        let mut up = self.up.try_normalize(constants::ROUNDING_ERROR).unwrap_or_else(Vec3::y);
        if (direction.dot(&up).abs() - 1.0).abs() <= constants::ROUNDING_ERROR * 10.0 {
            up.x += 0.5;
        }

        let view = Mat4::look_at(position, target, up);
        let projection = self.projection_matrix();
        CameraView {
            position,
            target,
            up,
            view,
            projection,
            frustum: ViewFrustum::from_matrix(&(projection * view)),
            near: self.near,
            far: self.far,
        }
    }
}

impl Default for CameraSceneNode {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneNodeKind for CameraSceneNode {
    fn node_type(&self) -> SceneNodeType {
        SceneNodeType::CAMERA
    }

    fn bounding_box(&self) -> AABB {
        AABB::from_point(Vec3::zeros())
    }

    fn on_register(&self, id: SceneNodeId, node: &SceneNode, registrar: &mut Registrar<'_>) {
        if registrar.active_camera() == Some(id) {
            registrar.register(id, node, RenderPass::Camera);
        }
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let view = self.view(&ctx.absolute_transformation);
        ctx.driver.set_transform(TransformState::Projection, &view.projection);
        ctx.driver.set_transform(TransformState::View, &view.view);
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
