//! Scene Manager - owner of the node tree and the per-frame protocol
//!
//! Every frame runs three phases in order:
//!
//! ```text
//! on_animate(time)          animators, absolute transforms (top-down)
//!      ↓
//! on_register_scene_node()  visible nodes queue themselves per pass
//!      ↓
//! draw_all()                passes drawn in fixed order, queues cleared
//! ```
//!
//! [`SceneManager::render_frame`] runs all three. Tree editing lives in the
//! `hierarchy` module; this file holds configuration, factories and the
//! frame protocol.

use crate::config::{Config, Deserialize, Serialize};
use crate::foundation::math::{Mat4, Vec2, Vec3};
use crate::scene::animators::{
    AnimatorRef, CollisionResponseAnimator, DeleteAnimator, FlyCircleAnimator, FlyStraightAnimator,
    FollowSplineAnimator, RotationAnimator, TextureAnimator,
};
use crate::scene::nodes::{
    BillboardSceneNode, CameraSceneNode, CameraView, EmptySceneNode, LightSceneNode, MeshSceneNode,
    ShadowVolumeSceneNode, SkyBoxSceneNode, SkyBoxTextures, TextSceneNode,
};
use crate::scene::render_queue::{FrameStats, Registrar, RenderPass, RenderQueues};
use crate::scene::{
    AutomaticCulling, CollisionWorld, Mesh, MeshCache, RenderContext, SceneNode, SceneNodeId,
    SceneNodeKind, StaticMesh, TransformNode, UNSET_ID,
};
use crate::video::{Color, Colorf, Material, SharedDriver, TextureId, TransformState, VideoDriver};
use slotmap::SlotMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Scene Manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Keep animating nodes whose visibility flag is off
    pub animate_invisible_nodes: bool,

    /// Culling mask given to newly created nodes
    pub default_automatic_culling: AutomaticCulling,

    /// Sort lights nearest-first before the driver's light limit applies
    pub sort_lights_by_distance: bool,

    /// Color the stencil shadow is composited with
    pub shadow_color: Color,

    /// Global ambient light set before the light pass
    pub ambient_light: Colorf,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            animate_invisible_nodes: false,
            default_automatic_culling: AutomaticCulling::BOX,
            sort_lights_by_distance: true,
            shadow_color: Color::new(150, 0, 0, 0),
            ambient_light: Colorf::default(),
        }
    }
}

impl Config for SceneConfig {}

/// Owner of the node arena and the render queues
///
/// Nodes are addressed by [`SceneNodeId`]. The root node exists for the
/// whole lifetime of the manager; factory methods attach new nodes below it
/// unless a parent is given.
pub struct SceneManager {
    pub(crate) config: SceneConfig,
    pub(crate) nodes: SlotMap<SceneNodeId, SceneNode>,
    pub(crate) root: SceneNodeId,
    queues: RenderQueues,
    pub(crate) active_camera: Option<SceneNodeId>,
    camera_view: Option<CameraView>,
    pub(crate) deletion_queue: Vec<SceneNodeId>,
    driver: SharedDriver,
    mesh_cache: Rc<RefCell<MeshCache>>,
    time_ms: u32,
    current_pass: Option<RenderPass>,
    stats: FrameStats,
}

impl SceneManager {
    /// Create a scene manager with default configuration
    pub fn new(driver: SharedDriver) -> Self {
        Self::with_config(driver, SceneConfig::default())
    }

    /// Create a scene manager with custom configuration
    pub fn with_config(driver: SharedDriver, config: SceneConfig) -> Self {
        Self::with_shared(driver, Rc::new(RefCell::new(MeshCache::new())), config)
    }

    fn with_shared(driver: SharedDriver, mesh_cache: Rc<RefCell<MeshCache>>, config: SceneConfig) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(SceneNode::new(
            Box::new(EmptySceneNode::root()),
            UNSET_ID,
            TransformNode::default(),
            AutomaticCulling::OFF,
        ));
        if let Some(root_node) = nodes.get_mut(root) {
            root_node.set_name("root");
        }

        Self {
            config,
            nodes,
            root,
            queues: RenderQueues::new(),
            active_camera: None,
            camera_view: None,
            deletion_queue: Vec::new(),
            driver,
            mesh_cache,
            time_ms: 0,
            current_pass: None,
            stats: FrameStats::default(),
        }
    }

    /// New empty manager sharing this one's driver, mesh cache and configuration
    pub fn create_new_scene_manager(&self) -> Self {
        Self::with_shared(Rc::clone(&self.driver), Rc::clone(&self.mesh_cache), self.config.clone())
    }

    /// Configuration in effect
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Mutable configuration
    pub fn config_mut(&mut self) -> &mut SceneConfig {
        &mut self.config
    }

    /// Graphics device
    pub fn driver(&self) -> SharedDriver {
        Rc::clone(&self.driver)
    }

    /// Mesh cache shared with managers created from this one
    pub fn mesh_cache(&self) -> Rc<RefCell<MeshCache>> {
        Rc::clone(&self.mesh_cache)
    }

    /// Root of the node tree
    pub fn root_scene_node(&self) -> SceneNodeId {
        self.root
    }

    /// Node by handle, `None` once destroyed
    pub fn scene_node(&self, id: SceneNodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Mutable node by handle, `None` once destroyed
    pub fn scene_node_mut(&mut self, id: SceneNodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    /// Whether the handle refers to a live node
    pub fn contains(&self, id: SceneNodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Time passed to the last `on_animate`
    pub fn time_ms(&self) -> u32 {
        self.time_ms
    }

    /// Pass being drawn, `None` outside `draw_all`
    pub fn scene_node_render_pass(&self) -> Option<RenderPass> {
        self.current_pass
    }

    /// Counters of the last frame
    pub fn frame_stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Queues filled by the last registration phase
    pub fn render_queues(&self) -> &RenderQueues {
        &self.queues
    }

    /// Camera state prepared by the last registration phase
    pub fn camera_view(&self) -> Option<&CameraView> {
        self.camera_view.as_ref()
    }

    /// Color used to composite stencil shadows
    pub fn shadow_color(&self) -> Color {
        self.config.shadow_color
    }

    /// Set the shadow color
    pub fn set_shadow_color(&mut self, color: Color) {
        self.config.shadow_color = color;
    }

    /// Ambient light applied before the light pass
    pub fn ambient_light(&self) -> Colorf {
        self.config.ambient_light
    }

    /// Set the ambient light
    pub fn set_ambient_light(&mut self, color: Colorf) {
        self.config.ambient_light = color;
    }

    // ========================================================================
    // Cameras
    // ========================================================================

    /// The active camera
    pub fn active_camera(&self) -> Option<SceneNodeId> {
        self.active_camera
    }

    /// Make a camera active, or none
    ///
    /// The manager holds a reference on the active camera. Handles that are
    /// not live camera nodes are ignored.
    pub fn set_active_camera(&mut self, camera: Option<SceneNodeId>) {
        if let Some(id) = camera {
            let is_camera = self.nodes.get(id).is_some_and(|node| node.kind_as::<CameraSceneNode>().is_some());
            if !is_camera {
                log::warn!("Ignoring active camera {:?}: not a camera node", id);
                return;
            }
            self.grab(id);
        }
        if let Some(previous) = std::mem::replace(&mut self.active_camera, camera) {
            self.drop_node(previous);
        }
        log::debug!("Active camera set to {:?}", camera);
    }

    // ========================================================================
    // Node factories
    // ========================================================================

    /// Attach a node of any kind below `parent` (the root if `None`)
    ///
    /// The tree owns the returned node.
    pub fn add_scene_node(
        &mut self,
        kind: Box<dyn SceneNodeKind>,
        parent: Option<SceneNodeId>,
        id: i32,
        position: Vec3,
        rotation: Vec3,
        scale: Vec3,
    ) -> SceneNodeId {
        let node_type = kind.node_type();
        let handle = self.nodes.insert(SceneNode::new(
            kind,
            id,
            TransformNode::new(position, rotation, scale),
            self.config.default_automatic_culling,
        ));

        let parent = parent.filter(|p| self.nodes.contains_key(*p)).unwrap_or(self.root);
        self.add_child(parent, handle);
        self.drop_node(handle);
        self.update_absolute_position(handle);

        log::debug!("Created {} node {:?} under {:?}", node_type, handle, parent);
        handle
    }

    /// Create a detached node owned by the caller
    ///
    /// The caller holds the only reference; attaching it and then calling
    /// [`SceneManager::drop_node`] hands ownership to the tree.
    pub fn create_scene_node(&mut self, kind: Box<dyn SceneNodeKind>, id: i32) -> SceneNodeId {
        let node_type = kind.node_type();
        let handle = self.nodes.insert(SceneNode::new(
            kind,
            id,
            TransformNode::default(),
            self.config.default_automatic_culling,
        ));
        log::debug!("Created detached {} node {:?}", node_type, handle);
        handle
    }

    /// Grouping node
    pub fn add_empty_scene_node(&mut self, parent: Option<SceneNodeId>, id: i32) -> SceneNodeId {
        self.add_scene_node(
            Box::new(EmptySceneNode::new()),
            parent,
            id,
            Vec3::zeros(),
            Vec3::zeros(),
            Vec3::new(1.0, 1.0, 1.0),
        )
    }

    /// Camera at `position` looking at `look_at`
    pub fn add_camera_scene_node(
        &mut self,
        parent: Option<SceneNodeId>,
        position: Vec3,
        look_at: Vec3,
        id: i32,
        make_active: bool,
    ) -> SceneNodeId {
        let mut camera = CameraSceneNode::new();
        camera.set_target(look_at);
        let handle = self.add_scene_node(
            Box::new(camera),
            parent,
            id,
            position,
            Vec3::zeros(),
            Vec3::new(1.0, 1.0, 1.0),
        );
        if make_active {
            self.set_active_camera(Some(handle));
        }
        handle
    }

    /// Point light
    pub fn add_light_scene_node(
        &mut self,
        parent: Option<SceneNodeId>,
        position: Vec3,
        color: Colorf,
        radius: f32,
        id: i32,
    ) -> SceneNodeId {
        self.add_scene_node(
            Box::new(LightSceneNode::new(color, radius)),
            parent,
            id,
            position,
            Vec3::zeros(),
            Vec3::new(1.0, 1.0, 1.0),
        )
    }

    /// Node drawing a shared mesh
    pub fn add_mesh_scene_node(
        &mut self,
        mesh: Rc<dyn Mesh>,
        parent: Option<SceneNodeId>,
        id: i32,
        position: Vec3,
        rotation: Vec3,
        scale: Vec3,
    ) -> SceneNodeId {
        self.add_scene_node(Box::new(MeshSceneNode::new(mesh)), parent, id, position, rotation, scale)
    }

    /// Mesh node showing a cube of edge length `size`
    pub fn add_cube_scene_node(
        &mut self,
        size: f32,
        parent: Option<SceneNodeId>,
        id: i32,
        position: Vec3,
    ) -> SceneNodeId {
        let mesh: Rc<dyn Mesh> = Rc::new(StaticMesh::cube(size, Material::default()));
        self.add_mesh_scene_node(mesh, parent, id, position, Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0))
    }

    /// Camera-facing quad
    pub fn add_billboard_scene_node(
        &mut self,
        parent: Option<SceneNodeId>,
        size: Vec2,
        position: Vec3,
        id: i32,
        color: Color,
    ) -> SceneNodeId {
        self.add_scene_node(
            Box::new(BillboardSceneNode::new(size, color)),
            parent,
            id,
            position,
            Vec3::zeros(),
            Vec3::new(1.0, 1.0, 1.0),
        )
    }

    /// Sky box of six face textures
    pub fn add_sky_box_scene_node(
        &mut self,
        textures: SkyBoxTextures,
        parent: Option<SceneNodeId>,
        id: i32,
    ) -> SceneNodeId {
        let handle = self.add_scene_node(
            Box::new(SkyBoxSceneNode::new(textures)),
            parent,
            id,
            Vec3::zeros(),
            Vec3::zeros(),
            Vec3::new(1.0, 1.0, 1.0),
        );
        if let Some(node) = self.nodes.get_mut(handle) {
            node.set_automatic_culling(AutomaticCulling::OFF);
        }
        handle
    }

    /// Shadow volume child of a mesh node
    ///
    /// Returns `None` when `mesh_node` is not a live mesh node.
    pub fn add_shadow_volume_scene_node(
        &mut self,
        mesh_node: SceneNodeId,
        light_direction: Vec3,
        use_zfail: bool,
        extrusion: f32,
        id: i32,
    ) -> Option<SceneNodeId> {
        let mesh = self.nodes.get(mesh_node)?.kind_as::<MeshSceneNode>()?.mesh().clone();
        let handle = self.add_scene_node(
            Box::new(ShadowVolumeSceneNode::new(mesh, light_direction, extrusion, use_zfail)),
            Some(mesh_node),
            id,
            Vec3::zeros(),
            Vec3::zeros(),
            Vec3::new(1.0, 1.0, 1.0),
        );
        if let Some(node) = self.nodes.get_mut(handle) {
            node.set_automatic_culling(AutomaticCulling::OFF);
        }
        Some(handle)
    }

    /// Text label drawn in the GUI pass
    pub fn add_text_scene_node(
        &mut self,
        text: impl Into<String>,
        color: Color,
        parent: Option<SceneNodeId>,
        position: Vec3,
        id: i32,
    ) -> SceneNodeId {
        self.add_scene_node(
            Box::new(TextSceneNode::new(text, color)),
            parent,
            id,
            position,
            Vec3::zeros(),
            Vec3::new(1.0, 1.0, 1.0),
        )
    }

    // ========================================================================
    // Animator factories
    // ========================================================================
    //
    // Animators start at the time of the last `on_animate` and are detached;
    // attach them with `add_animator`.

    /// Rotation by `speed` degrees per second about each axis
    pub fn create_rotation_animator(&self, speed: Vec3) -> Rc<RefCell<RotationAnimator>> {
        Rc::new(RefCell::new(RotationAnimator::new(self.time_ms, speed)))
    }

    /// Circle of `radius` around `center`, `speed` in radians per millisecond
    pub fn create_fly_circle_animator(
        &self,
        center: Vec3,
        radius: f32,
        speed: f32,
        direction: Vec3,
        start_position: f32,
        radius_ellipsoid: f32,
    ) -> Rc<RefCell<FlyCircleAnimator>> {
        Rc::new(RefCell::new(FlyCircleAnimator::new(
            self.time_ms,
            center,
            radius,
            speed,
            direction,
            start_position,
            radius_ellipsoid,
        )))
    }

    /// Straight flight from `start` to `end`
    pub fn create_fly_straight_animator(
        &self,
        start: Vec3,
        end: Vec3,
        time_for_way: u32,
        looping: bool,
        ping_pong: bool,
    ) -> Rc<RefCell<FlyStraightAnimator>> {
        Rc::new(RefCell::new(FlyStraightAnimator::new(
            self.time_ms,
            start,
            end,
            time_for_way,
            looping,
            ping_pong,
        )))
    }

    /// Texture flip-book on layer 0
    pub fn create_texture_animator(
        &self,
        textures: Vec<TextureId>,
        time_per_frame: u32,
        looping: bool,
    ) -> Rc<RefCell<TextureAnimator>> {
        Rc::new(RefCell::new(TextureAnimator::new(self.time_ms, textures, time_per_frame, looping)))
    }

    /// Deletion after `delay_ms`
    pub fn create_delete_animator(&self, delay_ms: u32) -> Rc<RefCell<DeleteAnimator>> {
        Rc::new(RefCell::new(DeleteAnimator::new(self.time_ms, delay_ms)))
    }

    /// Ellipsoid collision response against `world`
    pub fn create_collision_response_animator(
        &self,
        world: Rc<dyn CollisionWorld>,
        radius: Vec3,
        gravity: Vec3,
        translation: Vec3,
    ) -> Rc<RefCell<CollisionResponseAnimator>> {
        Rc::new(RefCell::new(CollisionResponseAnimator::new(world, radius, gravity, translation)))
    }

    /// Hermite spline through `points`, `speed` in points per second
    pub fn create_follow_spline_animator(
        &self,
        start_time: u32,
        points: Vec<Vec3>,
        speed: f32,
        tightness: f32,
        looping: bool,
        ping_pong: bool,
    ) -> Rc<RefCell<FollowSplineAnimator>> {
        Rc::new(RefCell::new(FollowSplineAnimator::new(
            start_time, points, speed, tightness, looping, ping_pong,
        )))
    }

    // ========================================================================
    // Frame protocol
    // ========================================================================

    /// Run animators and refresh absolute transforms, top-down from the root
    pub fn on_animate(&mut self, time_ms: u32) {
        self.time_ms = time_ms;
        self.animate_subtree(self.root, time_ms);
    }

    fn animate_subtree(&mut self, id: SceneNodeId, time_ms: u32) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if !node.is_visible() && !self.config.animate_invisible_nodes {
            return;
        }

        // Animators may remove themselves, other animators or the node
        let animators: Vec<AnimatorRef> = node.animators.clone();
        for animator in animators {
            let Some(node) = self.nodes.get(id) else {
                return;
            };
            if !node.animators.iter().any(|a| Rc::ptr_eq(a, &animator)) {
                continue;
            }
            match animator.try_borrow_mut() {
                Ok(mut animator) => animator.animate_node(self, id, time_ms),
                Err(_) => log::warn!("Animator of {:?} is already running, skipped", id),
            }
        }

        if !self.nodes.contains_key(id) {
            return;
        }
        self.update_absolute_position(id);

        let children = self.nodes.get(id).map(|node| node.children.clone()).unwrap_or_default();
        for child in children {
            if self.nodes.get(child).is_some_and(|c| c.parent == Some(id)) {
                self.animate_subtree(child, time_ms);
            }
        }
    }

    /// Clear the queues and let every visible node register itself
    ///
    /// Invisible nodes are skipped together with their whole subtree.
    pub fn on_register_scene_node(&mut self) {
        self.queues.clear();
        self.stats = FrameStats::default();
        self.camera_view = self.active_camera.and_then(|id| {
            let node = self.nodes.get(id)?;
            Some(node.kind_as::<CameraSceneNode>()?.view(node.absolute_transformation()))
        });

        let driver = self.driver.borrow();
        let mut registrar = Registrar::new(
            &mut self.queues,
            &mut self.stats,
            self.camera_view.as_ref(),
            self.active_camera,
            &*driver,
        );
        Self::register_subtree(&self.nodes, self.root, &mut registrar);
    }

    fn register_subtree(nodes: &SlotMap<SceneNodeId, SceneNode>, id: SceneNodeId, registrar: &mut Registrar<'_>) {
        let Some(node) = nodes.get(id) else {
            return;
        };
        if !node.is_visible() {
            return;
        }
        node.kind().on_register(id, node, registrar);
        for &child in &node.children {
            Self::register_subtree(nodes, child, registrar);
        }
    }

    /// Queue a node into a pass outside of its own `on_register`
    ///
    /// Returns whether the node was taken; culled and unknown nodes are not.
    pub fn register_node_for_rendering(&mut self, id: SceneNodeId, pass: RenderPass) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        let driver = self.driver.borrow();
        let mut registrar = Registrar::new(
            &mut self.queues,
            &mut self.stats,
            self.camera_view.as_ref(),
            self.active_camera,
            &*driver,
        );
        registrar.register(id, node, pass)
    }

    /// Whether automatic culling rejects the node against the active camera
    pub fn is_culled(&self, id: SceneNodeId) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        let driver = self.driver.borrow();
        crate::scene::culling::is_culled(id, node, self.camera_view.as_ref(), &*driver)
    }

    /// Draw every queued node in pass order, then clear the queues
    ///
    /// Nodes queued for deletion are removed at the end.
    pub fn draw_all(&mut self) {
        let driver_handle = Rc::clone(&self.driver);
        {
            let mut driver = driver_handle.borrow_mut();
            driver.set_material(&Material::default());
            driver.set_transform(TransformState::Projection, &Mat4::identity());
            driver.set_transform(TransformState::View, &Mat4::identity());
            driver.set_transform(TransformState::World, &Mat4::identity());

            self.queues.sort_solids();
            self.queues.sort_transparents();
            if self.config.sort_lights_by_distance {
                self.queues.sort_lights();
            }

            let cameras = std::mem::take(&mut self.queues.cameras);
            self.draw_pass(&mut *driver, RenderPass::Camera, &cameras);

            driver.delete_all_dynamic_lights();
            driver.set_ambient_light(self.config.ambient_light);
            let max_lights = driver.max_dynamic_light_count();
            let lights: Vec<SceneNodeId> =
                self.queues.lights.iter().take(max_lights).map(|entry| entry.node).collect();
            self.draw_pass(&mut *driver, RenderPass::Light, &lights);

            let sky_boxes = std::mem::take(&mut self.queues.sky_boxes);
            self.draw_pass(&mut *driver, RenderPass::SkyBox, &sky_boxes);

            let solids: Vec<SceneNodeId> = self.queues.solids.iter().map(|entry| entry.node).collect();
            self.draw_pass(&mut *driver, RenderPass::Solid, &solids);

            let transparents: Vec<SceneNodeId> =
                self.queues.transparents.iter().map(|entry| entry.node).collect();
            self.draw_pass(&mut *driver, RenderPass::Transparent, &transparents);

            let effects: Vec<SceneNodeId> =
                self.queues.transparent_effects.iter().map(|entry| entry.node).collect();
            self.draw_pass(&mut *driver, RenderPass::TransparentEffect, &effects);

            let shadows = std::mem::take(&mut self.queues.shadows);
            if self.draw_pass(&mut *driver, RenderPass::Shadow, &shadows) > 0 {
                driver.draw_stencil_shadow(self.config.shadow_color);
            }

            let gui = std::mem::take(&mut self.queues.gui);
            self.draw_pass(&mut *driver, RenderPass::Gui, &gui);
        }

        self.current_pass = None;
        self.queues.clear();
        log::trace!(
            "Frame at {} ms: {} registrations, {} culled, {} nodes drawn",
            self.time_ms,
            self.stats.registration_calls,
            self.stats.culled,
            self.stats.total_drawn()
        );
        self.clear_deletion_queue();
    }

    fn draw_pass(&mut self, driver: &mut dyn VideoDriver, pass: RenderPass, ids: &[SceneNodeId]) -> usize {
        self.current_pass = Some(pass);
        let camera = self.camera_view.as_ref();
        let mut drawn = 0;
        for &id in ids {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            let mut ctx = RenderContext {
                driver: &mut *driver,
                pass,
                absolute_transformation: *node.absolute_transformation(),
                debug_data: node.debug_data_visible(),
                camera,
            };
            node.kind.render(&mut ctx);
            drawn += 1;
        }
        self.stats.record_drawn(pass, drawn);
        drawn
    }

    /// Animate, register and draw one frame
    pub fn render_frame(&mut self, time_ms: u32) {
        self.on_animate(time_ms);
        self.on_register_scene_node();
        self.draw_all();
    }

    // ========================================================================
    // Deletion queue
    // ========================================================================

    /// Remove the node at the end of the next `draw_all`
    ///
    /// Safe to call from animators and `render`.
    pub fn add_to_deletion_queue(&mut self, id: SceneNodeId) {
        if !self.nodes.contains_key(id) || self.deletion_queue.contains(&id) {
            return;
        }
        self.grab(id);
        self.deletion_queue.push(id);
    }

    /// Remove every queued node now
    pub fn clear_deletion_queue(&mut self) {
        for id in std::mem::take(&mut self.deletion_queue) {
            self.remove(id);
            self.drop_node(id);
        }
    }

    /// Remove every node below the root and reset the active camera
    pub fn clear(&mut self) {
        self.set_active_camera(None);
        self.clear_deletion_queue();
        self.remove_all(self.root);
        self.queues.clear();
        self.camera_view = None;
        log::debug!("Scene cleared, {} nodes left", self.nodes.len());
    }
}

impl std::fmt::Debug for SceneManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneManager")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .field("active_camera", &self.active_camera)
            .field("time_ms", &self.time_ms)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;
    use crate::scene::animators::SceneNodeAnimator;
    use crate::scene::test_support::{scene, scene_with_log};
    use crate::video::{DriverCall, MaterialType, NullDriver};
    use approx::assert_relative_eq;

    fn unit() -> Vec3 {
        Vec3::new(1.0, 1.0, 1.0)
    }

    fn transparent_cube() -> Rc<dyn Mesh> {
        let material = Material {
            material_type: MaterialType::TransparentAddColor,
            ..Material::default()
        };
        Rc::new(StaticMesh::cube(1.0, material))
    }

    /// Tree edit an animator performs on its own node
    #[derive(Debug)]
    enum Edit {
        Detach,
        RemoveAnimator(AnimatorRef),
        MoveBelow(SceneNodeId),
        Clone,
    }

    #[derive(Debug)]
    struct EditingAnimator {
        edit: Edit,
        runs: usize,
        clones: Vec<SceneNodeId>,
    }

    impl EditingAnimator {
        fn new(edit: Edit) -> Rc<RefCell<Self>> {
            Rc::new(RefCell::new(Self { edit, runs: 0, clones: Vec::new() }))
        }
    }

    impl SceneNodeAnimator for EditingAnimator {
        fn animate_node(&mut self, scene: &mut SceneManager, node: SceneNodeId, _time_ms: u32) {
            self.runs += 1;
            match &self.edit {
                Edit::Detach => scene.remove(node),
                Edit::RemoveAnimator(other) => {
                    scene.remove_animator(node, other);
                }
                Edit::MoveBelow(parent) => scene.set_parent(node, Some(*parent)),
                Edit::Clone => self.clones.extend(scene.clone_node(node, None)),
            }
        }
    }

    fn drawn_translations(log: &crate::video::DriverLog) -> Vec<Vec3> {
        // The first world transform is the identity reset of draw_all
        NullDriver::world_translations(log).into_iter().skip(1).collect()
    }

    #[test]
    fn test_absolute_transform_follows_parent() {
        let mut scene = scene();
        let parent = scene.add_empty_scene_node(None, -1);
        scene.scene_node_mut(parent).unwrap().set_position(Vec3::new(1.0, 0.0, 0.0));
        let child = scene.add_empty_scene_node(Some(parent), -1);
        scene.scene_node_mut(child).unwrap().set_position(Vec3::new(0.0, 2.0, 0.0));

        scene.on_animate(0);
        assert_relative_eq!(scene.scene_node(child).unwrap().absolute_position(), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_parent_child_links_are_symmetric() {
        let mut scene = scene();
        let root = scene.root_scene_node();
        let a = scene.add_empty_scene_node(None, 1);
        let b = scene.add_empty_scene_node(Some(a), 2);

        assert_eq!(scene.parent_of(a), Some(root));
        assert_eq!(scene.children_of(a), &[b]);
        assert_eq!(scene.parent_of(b), Some(a));
        assert_eq!(scene.node_count(), 3);
        assert_eq!(scene.reference_count(b), 1);
    }

    #[test]
    fn test_invisible_parent_hides_subtree() {
        let (mut scene, log) = scene_with_log();
        let parent = scene.add_empty_scene_node(None, -1);
        let child = scene.add_cube_scene_node(1.0, Some(parent), -1, Vec3::zeros());
        scene.scene_node_mut(parent).unwrap().set_visible(false);

        assert!(scene.scene_node(child).unwrap().is_visible());
        assert!(!scene.is_truly_visible(child));

        scene.render_frame(0);
        assert!(!log.borrow().iter().any(|call| matches!(call, DriverCall::DrawMeshBuffer { .. })));
        assert_eq!(scene.frame_stats().total_drawn(), 0);
    }

    #[test]
    fn test_solids_are_grouped_by_texture() {
        let (mut scene, log) = scene_with_log();
        for (x, texture) in [(1.0, 1), (2.0, 2), (3.0, 1)] {
            let cube = scene.add_cube_scene_node(1.0, None, -1, Vec3::new(x, 0.0, 0.0));
            scene.scene_node_mut(cube).unwrap().set_material_texture(0, Some(TextureId(texture)));
        }

        scene.render_frame(0);
        let xs: Vec<f32> = drawn_translations(&log).iter().map(|t| t.x).collect();
        assert_eq!(xs, vec![1.0, 3.0, 2.0]);
        assert_eq!(scene.frame_stats().drawn(RenderPass::Solid), 3);
    }

    #[test]
    fn test_transparents_draw_back_to_front() {
        let (mut scene, log) = scene_with_log();
        for z in [1.0, 5.0, 3.0] {
            scene.add_mesh_scene_node(transparent_cube(), None, -1, Vec3::new(0.0, 0.0, z), Vec3::zeros(), unit());
        }

        scene.render_frame(0);
        let zs: Vec<f32> = drawn_translations(&log).iter().map(|t| t.z).collect();
        assert_eq!(zs, vec![5.0, 3.0, 1.0]);
        assert_eq!(scene.frame_stats().drawn(RenderPass::Transparent), 3);
    }

    #[test]
    fn test_light_count_is_capped_by_driver() {
        let driver = NullDriver::with_max_lights(2);
        let log = driver.log();
        let mut scene = SceneManager::new(driver.into_shared());
        for x in [10.0, 1.0, 5.0] {
            scene.add_light_scene_node(None, Vec3::new(x, 0.0, 0.0), Colorf::new(1.0, 1.0, 1.0, 1.0), 10.0, -1);
        }

        scene.render_frame(0);
        let lights: Vec<f32> = log
            .borrow()
            .iter()
            .filter_map(|call| match call {
                DriverCall::AddDynamicLight(light) => Some(light.position.x),
                _ => None,
            })
            .collect();
        assert_eq!(lights, vec![1.0, 5.0]);

        let calls = log.borrow();
        let delete = calls.iter().position(|c| *c == DriverCall::DeleteAllDynamicLights).unwrap();
        let first_light = calls.iter().position(|c| matches!(c, DriverCall::AddDynamicLight(_))).unwrap();
        assert!(delete < first_light);
    }

    #[test]
    fn test_shadow_volumes_are_composited_once() {
        let (mut scene, log) = scene_with_log();
        let cube = scene.add_cube_scene_node(2.0, None, -1, Vec3::zeros());
        let shadow = scene.add_shadow_volume_scene_node(cube, Vec3::new(0.0, -1.0, 0.0), false, 100.0, -1);
        assert!(shadow.is_some());

        scene.render_frame(0);
        let calls = log.borrow();
        let volume = calls.iter().position(|c| matches!(c, DriverCall::DrawShadowVolume { .. })).unwrap();
        let composite: Vec<usize> = calls
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, DriverCall::DrawStencilShadow(_)))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(composite.len(), 1);
        assert!(composite[0] > volume);
        assert_eq!(calls[composite[0]], DriverCall::DrawStencilShadow(scene.shadow_color()));
    }

    #[test]
    fn test_no_shadow_composite_without_volumes() {
        let (mut scene, log) = scene_with_log();
        scene.add_cube_scene_node(1.0, None, -1, Vec3::zeros());
        scene.render_frame(0);
        assert!(!log.borrow().iter().any(|c| matches!(c, DriverCall::DrawStencilShadow(_))));
    }

    #[test]
    fn test_shadow_volume_requires_mesh_node() {
        let mut scene = scene();
        let empty = scene.add_empty_scene_node(None, -1);
        assert!(scene.add_shadow_volume_scene_node(empty, Vec3::new(0.0, -1.0, 0.0), false, 100.0, -1).is_none());
    }

    #[test]
    fn test_camera_registration_is_deduplicated() {
        let mut scene = scene();
        let camera = scene.add_camera_scene_node(None, Vec3::zeros(), Vec3::new(0.0, 0.0, 10.0), -1, true);
        let inactive = scene.add_camera_scene_node(None, Vec3::zeros(), Vec3::new(0.0, 0.0, 10.0), -1, false);

        scene.on_animate(0);
        scene.on_register_scene_node();
        assert!(scene.register_node_for_rendering(camera, RenderPass::Camera));
        assert_eq!(scene.render_queues().len(RenderPass::Camera), 1);
        assert_eq!(scene.active_camera(), Some(camera));
        assert_eq!(scene.reference_count(camera), 2);
        assert_eq!(scene.reference_count(inactive), 1);
        assert!(scene.camera_view().is_some());
    }

    #[test]
    fn test_active_camera_ignores_other_kinds() {
        let mut scene = scene();
        let camera = scene.add_camera_scene_node(None, Vec3::zeros(), Vec3::new(0.0, 0.0, 10.0), -1, true);
        let empty = scene.add_empty_scene_node(None, -1);
        scene.set_active_camera(Some(empty));
        assert_eq!(scene.active_camera(), Some(camera));

        scene.set_active_camera(None);
        assert_eq!(scene.reference_count(camera), 1);
    }

    #[test]
    fn test_camera_pass_sets_view_and_projection() {
        let (mut scene, log) = scene_with_log();
        scene.add_camera_scene_node(None, Vec3::new(0.0, 0.0, -5.0), Vec3::zeros(), -1, true);
        scene.render_frame(0);

        let calls = log.borrow();
        assert!(calls.iter().any(|c| matches!(c, DriverCall::SetTransform(TransformState::Projection, m) if *m != Mat4::identity())));
        assert!(calls.iter().any(|c| matches!(c, DriverCall::SetTransform(TransformState::View, m) if *m != Mat4::identity())));
    }

    #[test]
    fn test_nodes_behind_camera_are_culled() {
        let mut scene = scene();
        scene.add_camera_scene_node(None, Vec3::zeros(), Vec3::new(0.0, 0.0, 10.0), -1, true);
        let front = scene.add_cube_scene_node(1.0, None, -1, Vec3::new(0.0, 0.0, 20.0));
        let behind = scene.add_cube_scene_node(1.0, None, -1, Vec3::new(0.0, 0.0, -20.0));

        scene.on_animate(0);
        scene.on_register_scene_node();
        assert!(!scene.is_culled(front));
        assert!(scene.is_culled(behind));
        assert_eq!(scene.render_queues().len(RenderPass::Solid), 1);
        assert_eq!(scene.frame_stats().culled, 1);
    }

    #[test]
    fn test_mixed_mesh_is_culled_once() {
        let mut scene = scene();
        scene.add_camera_scene_node(None, Vec3::zeros(), Vec3::new(0.0, 0.0, 10.0), -1, true);
        let mut mesh = StaticMesh::cube(1.0, Material::default());
        if let Some(glass) = transparent_cube().mesh_buffer(0) {
            mesh.add_buffer(glass.clone());
        }
        let mesh: Rc<dyn Mesh> = Rc::new(mesh);
        let front = Vec3::new(0.0, 0.0, 20.0);
        let behind = Vec3::new(0.0, 0.0, -20.0);
        scene.add_mesh_scene_node(mesh.clone(), None, -1, front, Vec3::zeros(), unit());
        scene.add_mesh_scene_node(mesh, None, -1, behind, Vec3::zeros(), unit());

        scene.on_animate(0);
        scene.on_register_scene_node();
        assert_eq!(scene.render_queues().len(RenderPass::Solid), 1);
        assert_eq!(scene.render_queues().len(RenderPass::Transparent), 1);
        assert_eq!(scene.frame_stats().culled, 1);
    }

    #[test]
    fn test_delete_animator_removes_node_after_frame() {
        let mut scene = scene();
        let node = scene.add_cube_scene_node(1.0, None, -1, Vec3::zeros());
        let animator = scene.create_delete_animator(100);
        scene.add_animator(node, animator);

        scene.render_frame(50);
        assert!(scene.contains(node));
        scene.render_frame(200);
        assert!(!scene.contains(node));
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn test_deletion_queue_is_deduplicated() {
        let mut scene = scene();
        let node = scene.add_empty_scene_node(None, -1);
        scene.add_to_deletion_queue(node);
        scene.add_to_deletion_queue(node);
        assert_eq!(scene.reference_count(node), 2);

        scene.clear_deletion_queue();
        assert!(!scene.contains(node));
    }

    #[test]
    fn test_rotation_animator_through_frames() {
        let mut scene = scene();
        let node = scene.add_empty_scene_node(None, -1);
        let animator = scene.create_rotation_animator(Vec3::new(0.0, 90.0, 0.0));
        scene.add_animator(node, animator);

        scene.render_frame(1000);
        assert_relative_eq!(scene.scene_node(node).unwrap().rotation().y, 90.0, epsilon = 1e-3);
    }

    #[test]
    fn test_invisible_nodes_are_not_animated_by_default() {
        let mut scene = scene();
        let node = scene.add_empty_scene_node(None, -1);
        scene.scene_node_mut(node).unwrap().set_visible(false);
        let animator = scene.create_rotation_animator(Vec3::new(0.0, 90.0, 0.0));
        scene.add_animator(node, animator);

        scene.on_animate(1000);
        assert_relative_eq!(scene.scene_node(node).unwrap().rotation().y, 0.0);

        scene.config_mut().animate_invisible_nodes = true;
        scene.on_animate(2000);
        assert!(scene.scene_node(node).unwrap().rotation().y > 0.0);
    }

    #[test]
    fn test_animator_detaching_its_node_spares_siblings() {
        let mut scene = scene();
        let a = scene.add_empty_scene_node(None, -1);
        let b = scene.add_empty_scene_node(None, -1);
        let detach = EditingAnimator::new(Edit::Detach);
        scene.add_animator(a, detach.clone());
        let spin_a = scene.create_rotation_animator(Vec3::new(0.0, 90.0, 0.0));
        scene.add_animator(a, spin_a);
        let spin_b = scene.create_rotation_animator(Vec3::new(0.0, 90.0, 0.0));
        scene.add_animator(b, spin_b);

        scene.render_frame(1000);
        assert!(!scene.contains(a));
        assert_eq!(detach.borrow().runs, 1);
        assert_relative_eq!(scene.scene_node(b).unwrap().rotation().y, 90.0, epsilon = 1e-3);
        assert_eq!(scene.children_of(scene.root_scene_node()), &[b]);
    }

    #[test]
    fn test_animator_removing_a_later_animator() {
        let mut scene = scene();
        let node = scene.add_empty_scene_node(None, -1);
        let spin: AnimatorRef = scene.create_rotation_animator(Vec3::new(0.0, 90.0, 0.0));
        scene.add_animator(node, EditingAnimator::new(Edit::RemoveAnimator(spin.clone())));
        scene.add_animator(node, spin);

        scene.on_animate(1000);
        let node = scene.scene_node(node).unwrap();
        assert_eq!(node.animators().len(), 1);
        assert_relative_eq!(node.rotation().y, 0.0);
    }

    #[test]
    fn test_animator_moving_its_node_below_another() {
        let mut scene = scene();
        let target = scene.add_empty_scene_node(None, -1);
        scene.scene_node_mut(target).unwrap().set_position(Vec3::new(5.0, 0.0, 0.0));
        let mover = scene.add_empty_scene_node(None, -1);
        scene.scene_node_mut(mover).unwrap().set_position(Vec3::new(0.0, 1.0, 0.0));
        let move_below = EditingAnimator::new(Edit::MoveBelow(target));
        scene.add_animator(mover, move_below.clone());

        scene.on_animate(0);
        assert_eq!(move_below.borrow().runs, 1);
        assert_eq!(scene.parent_of(mover), Some(target));
        assert_eq!(scene.reference_count(mover), 1);
        assert_relative_eq!(scene.scene_node(mover).unwrap().absolute_position(), Vec3::new(5.0, 1.0, 0.0));
    }

    #[test]
    fn test_animator_cloning_its_own_node() {
        let mut scene = scene();
        let node = scene.add_empty_scene_node(None, 7);
        let cloner = EditingAnimator::new(Edit::Clone);
        scene.add_animator(node, cloner.clone());
        let spin = scene.create_rotation_animator(Vec3::new(0.0, 90.0, 0.0));
        scene.add_animator(node, spin);

        scene.on_animate(10);
        let clones = cloner.borrow().clones.clone();
        assert_eq!(clones.len(), 1);
        let copy = scene.scene_node(clones[0]).unwrap();
        assert_eq!(copy.id(), 7);
        // The running animator stays with the original only
        assert_eq!(copy.animators().len(), 1);
        assert_eq!(scene.scene_node(node).unwrap().animators().len(), 2);
        assert_eq!(scene.parent_of(clones[0]), Some(scene.root_scene_node()));
    }

    #[test]
    fn test_clear_keeps_only_root() {
        let mut scene = scene();
        let camera = scene.add_camera_scene_node(None, Vec3::zeros(), Vec3::new(0.0, 0.0, 10.0), -1, true);
        let parent = scene.add_empty_scene_node(None, -1);
        scene.add_cube_scene_node(1.0, Some(parent), -1, Vec3::zeros());

        scene.clear();
        assert_eq!(scene.node_count(), 1);
        assert!(!scene.contains(camera));
        assert!(scene.active_camera().is_none());
        assert!(scene.children_of(scene.root_scene_node()).is_empty());
    }

    #[test]
    fn test_new_manager_shares_driver_and_cache() {
        let mut scene = scene();
        scene.config_mut().animate_invisible_nodes = true;
        scene.add_empty_scene_node(None, -1);
        let other = scene.create_new_scene_manager();

        assert!(Rc::ptr_eq(&scene.driver(), &other.driver()));
        assert!(Rc::ptr_eq(&scene.mesh_cache(), &other.mesh_cache()));
        assert_eq!(other.config(), scene.config());
        assert_eq!(other.node_count(), 1);
    }

    #[test]
    fn test_config_round_trip() {
        let config = SceneConfig {
            animate_invisible_nodes: true,
            default_automatic_culling: AutomaticCulling::FRUSTUM_BOX | AutomaticCulling::OCC_QUERY,
            shadow_color: Color::new(100, 10, 20, 30),
            ..SceneConfig::default()
        };
        for format in [ConfigFormat::Toml, ConfigFormat::Ron] {
            let text = config.to_string_with(format).unwrap();
            assert_eq!(SceneConfig::from_str_with(&text, format).unwrap(), config);
        }
    }

    #[test]
    fn test_config_fills_missing_fields() {
        let config = SceneConfig::from_str_with("animate_invisible_nodes = true", ConfigFormat::Toml).unwrap();
        assert!(config.animate_invisible_nodes);
        assert_eq!(config.default_automatic_culling, AutomaticCulling::BOX);
        assert_eq!(config.shadow_color, Color::new(150, 0, 0, 0));
    }
}
