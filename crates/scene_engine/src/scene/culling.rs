//! Automatic culling tests
//!
//! Each enabled bit of a node's [`AutomaticCulling`] mask is tried in turn,
//! cheapest first; the first test that rejects the node wins.

use crate::scene::nodes::CameraView;
use crate::scene::{AutomaticCulling, SceneNode, SceneNodeId};
use crate::video::VideoDriver;

/// Whether the node is invisible from the camera
///
/// Without a camera nothing is culled.
pub fn is_culled(id: SceneNodeId, node: &SceneNode, camera: Option<&CameraView>, driver: &dyn VideoDriver) -> bool {
    let Some(camera) = camera else {
        return false;
    };
    let mask = node.automatic_culling();

    if mask.contains(AutomaticCulling::OCC_QUERY) && driver.occlusion_query_result(id) == Some(0) {
        return true;
    }

    if mask.contains(AutomaticCulling::BOX)
        && !node.transformed_bounding_box().intersects(camera.frustum.bounding_box())
    {
        return true;
    }

    if mask.contains(AutomaticCulling::FRUSTUM_SPHERE) {
        let world_box = node.transformed_bounding_box();
        let radius = world_box.extents().norm();
        if !camera.frustum.intersects_sphere(world_box.center(), radius) {
            return true;
        }
    }

    if mask.contains(AutomaticCulling::FRUSTUM_BOX) {
        let absolute = node.absolute_transformation();
        let corners = node
            .bounding_box()
            .corners()
            .map(|corner| absolute.transform_point(&corner.into()).coords);
        if !camera.frustum.intersects_points(&corners) {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::scene::nodes::{CameraSceneNode, EmptySceneNode};
    use crate::scene::{TransformNode, AABB};
    use crate::video::NullDriver;
    use slotmap::SlotMap;

    #[derive(Debug)]
    struct Boxed(AABB);

    impl crate::scene::SceneNodeKind for Boxed {
        fn node_type(&self) -> crate::scene::SceneNodeType {
            crate::scene::SceneNodeType::UNKNOWN
        }
        fn bounding_box(&self) -> AABB {
            self.0
        }
        fn render(&mut self, _ctx: &mut crate::scene::RenderContext<'_>) {}
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    fn camera() -> CameraView {
        // At the origin looking down -Z
        let transform = TransformNode::default();
        let mut camera = CameraSceneNode::new();
        camera.set_target(Vec3::new(0.0, 0.0, -1.0));
        camera.view(transform.absolute())
    }

    fn node_at(position: Vec3, culling: AutomaticCulling) -> SceneNode {
        let unit = AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(1.0));
        let mut transform = TransformNode::new(position, Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        transform.update_absolute(None);
        SceneNode::new(Box::new(Boxed(unit)), -1, transform, culling)
    }

    fn some_id() -> SceneNodeId {
        let mut map: SlotMap<SceneNodeId, ()> = SlotMap::with_key();
        map.insert(())
    }

    #[test]
    fn test_no_camera_never_culls() {
        let driver = NullDriver::new();
        let node = node_at(Vec3::new(0.0, 0.0, 500.0), AutomaticCulling::BOX);
        assert!(!is_culled(some_id(), &node, None, &driver));
    }

    #[test]
    fn test_off_never_culls() {
        let driver = NullDriver::new();
        let view = camera();
        let node = node_at(Vec3::new(0.0, 0.0, 500.0), AutomaticCulling::OFF);
        assert!(!is_culled(some_id(), &node, Some(&view), &driver));
    }

    #[test]
    fn test_box_mode() {
        let driver = NullDriver::new();
        let view = camera();
        let front = node_at(Vec3::new(0.0, 0.0, -20.0), AutomaticCulling::BOX);
        let behind = node_at(Vec3::new(0.0, 0.0, 20.0), AutomaticCulling::BOX);
        assert!(!is_culled(some_id(), &front, Some(&view), &driver));
        assert!(is_culled(some_id(), &behind, Some(&view), &driver));
    }

    #[test]
    fn test_frustum_modes_are_tighter_than_box() {
        let driver = NullDriver::new();
        let view = camera();
        // Inside the frustum's bounding box but outside the pyramid, near the camera
        let beside = Vec3::new(200.0, 0.0, -10.0);
        assert!(!is_culled(some_id(), &node_at(beside, AutomaticCulling::BOX), Some(&view), &driver));
        assert!(is_culled(some_id(), &node_at(beside, AutomaticCulling::FRUSTUM_BOX), Some(&view), &driver));
        assert!(is_culled(some_id(), &node_at(beside, AutomaticCulling::FRUSTUM_SPHERE), Some(&view), &driver));
    }

    #[test]
    fn test_occlusion_query() {
        let mut driver = NullDriver::new();
        let view = camera();
        let id = some_id();
        let node = node_at(Vec3::new(0.0, 0.0, -20.0), AutomaticCulling::OCC_QUERY);
        assert!(!is_culled(id, &node, Some(&view), &driver));
        driver.set_occlusion_query_result(id, 0);
        assert!(is_culled(id, &node, Some(&view), &driver));
        driver.set_occlusion_query_result(id, 12);
        assert!(!is_culled(id, &node, Some(&view), &driver));
    }

    #[test]
    fn test_empty_node_at_origin_visible() {
        let driver = NullDriver::new();
        let view = camera();
        let mut transform = TransformNode::new(Vec3::new(0.0, 0.0, -5.0), Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        transform.update_absolute(None);
        let node = SceneNode::new(Box::new(EmptySceneNode::new()), -1, transform, AutomaticCulling::BOX);
        assert!(!is_culled(some_id(), &node, Some(&view), &driver));
    }
}
