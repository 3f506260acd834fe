//! Per-frame render pass queues
//!
//! Queues hold node handles only. They are filled during registration,
//! sorted and drawn by `draw_all`, and cleared afterwards.

use crate::foundation::math::{utils, Vec3};
use crate::scene::culling;
use crate::scene::nodes::CameraView;
use crate::scene::{SceneNode, SceneNodeId};
use crate::video::{TextureId, VideoDriver};
use std::cmp::Ordering;

/// Draw-order buckets, listed in the order `draw_all` visits them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPass {
    /// Sets view and projection for the frame
    Camera,
    /// Uploads dynamic lights
    Light,
    /// Background geometry
    SkyBox,
    /// Opaque geometry, grouped by texture
    Solid,
    /// Blended geometry, back to front
    Transparent,
    /// Blended effects such as particles, back to front
    TransparentEffect,
    /// Stencil shadow volumes
    Shadow,
    /// Screen-space overlay
    Gui,
    /// Solid or transparent, picked from the node's materials
    Automatic,
}

impl RenderPass {
    /// Passes that actually own a queue, in draw order
    pub const DRAW_ORDER: [RenderPass; 8] = [
        RenderPass::Camera,
        RenderPass::Light,
        RenderPass::SkyBox,
        RenderPass::Solid,
        RenderPass::Transparent,
        RenderPass::TransparentEffect,
        RenderPass::Shadow,
        RenderPass::Gui,
    ];

    fn index(self) -> Option<usize> {
        Self::DRAW_ORDER.iter().position(|pass| *pass == self)
    }
}

/// Solid queue entry, keyed on the first texture of the first material
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidNodeEntry {
    /// Queued node
    pub node: SceneNodeId,
    /// Sort key
    pub texture: Option<TextureId>,
}

impl SolidNodeEntry {
    fn new(node: SceneNodeId, scene_node: &SceneNode) -> Self {
        Self {
            node,
            texture: scene_node.material(0).and_then(|material| material.texture(0)),
        }
    }
}

/// Transparent queue entry, keyed on squared distance to the camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransparentNodeEntry {
    /// Queued node
    pub node: SceneNodeId,
    /// Squared distance from the camera to the node's world translation
    pub distance_sq: f32,
}

impl TransparentNodeEntry {
    fn new(node: SceneNodeId, scene_node: &SceneNode, camera_position: Vec3) -> Self {
        let position = utils::translation_of(scene_node.absolute_transformation());
        Self {
            node,
            distance_sq: (position - camera_position).norm_squared(),
        }
    }
}

/// Light queue entry, keyed on distance corrected by the light's extent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceNodeEntry {
    /// Queued node
    pub node: SceneNodeId,
    /// Squared distance minus half the squared box extent
    pub distance: f64,
}

impl DistanceNodeEntry {
    fn new(node: SceneNodeId, scene_node: &SceneNode, camera_position: Vec3) -> Self {
        let position = utils::translation_of(scene_node.absolute_transformation());
        let distance_sq = f64::from((position - camera_position).norm_squared());
        let extent_sq = f64::from(scene_node.bounding_box().size().norm_squared());
        Self {
            node,
            distance: distance_sq - extent_sq * 0.5,
        }
    }
}

/// Registration counters of one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Calls to `register`
    pub registration_calls: usize,
    /// Nodes rejected by culling, each counted once per frame
    pub culled: usize,
    drawn: [usize; RenderPass::DRAW_ORDER.len()],
    last_culled: Option<SceneNodeId>,
}

impl FrameStats {
    /// Nodes drawn in a pass
    pub fn drawn(&self, pass: RenderPass) -> usize {
        pass.index().map_or(0, |i| self.drawn[i])
    }

    /// Nodes drawn over all passes
    pub fn total_drawn(&self) -> usize {
        self.drawn.iter().sum()
    }

    pub(crate) fn record_drawn(&mut self, pass: RenderPass, count: usize) {
        if let Some(i) = pass.index() {
            self.drawn[i] += count;
        }
    }
}

/// The queues of every render pass
#[derive(Debug, Default)]
pub struct RenderQueues {
    pub(crate) cameras: Vec<SceneNodeId>,
    pub(crate) lights: Vec<DistanceNodeEntry>,
    pub(crate) sky_boxes: Vec<SceneNodeId>,
    pub(crate) solids: Vec<SolidNodeEntry>,
    pub(crate) transparents: Vec<TransparentNodeEntry>,
    pub(crate) transparent_effects: Vec<TransparentNodeEntry>,
    pub(crate) shadows: Vec<SceneNodeId>,
    pub(crate) gui: Vec<SceneNodeId>,
}

impl RenderQueues {
    /// Create empty queues
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty every queue
    pub fn clear(&mut self) {
        self.cameras.clear();
        self.lights.clear();
        self.sky_boxes.clear();
        self.solids.clear();
        self.transparents.clear();
        self.transparent_effects.clear();
        self.shadows.clear();
        self.gui.clear();
    }

    /// Number of queued entries in a pass
    pub fn len(&self, pass: RenderPass) -> usize {
        match pass {
            RenderPass::Camera => self.cameras.len(),
            RenderPass::Light => self.lights.len(),
            RenderPass::SkyBox => self.sky_boxes.len(),
            RenderPass::Solid => self.solids.len(),
            RenderPass::Transparent => self.transparents.len(),
            RenderPass::TransparentEffect => self.transparent_effects.len(),
            RenderPass::Shadow => self.shadows.len(),
            RenderPass::Gui => self.gui.len(),
            RenderPass::Automatic => 0,
        }
    }

    /// Whether every queue is empty
    pub fn is_empty(&self) -> bool {
        RenderPass::DRAW_ORDER.iter().all(|pass| self.len(*pass) == 0)
    }

    /// Stable sort of the solid queue, ascending by texture
    pub fn sort_solids(&mut self) {
        self.solids.sort_by_key(|entry| entry.texture);
    }

    /// Stable sort of both transparent queues, farthest first
    pub fn sort_transparents(&mut self) {
        let farthest_first =
            |a: &TransparentNodeEntry, b: &TransparentNodeEntry| b.distance_sq.total_cmp(&a.distance_sq);
        self.transparents.sort_by(farthest_first);
        self.transparent_effects.sort_by(farthest_first);
    }

    /// Stable sort of the light queue, nearest first
    pub fn sort_lights(&mut self) {
        self.lights
            .sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
    }
}

/// Registration entry point handed to nodes during `on_register`
pub struct Registrar<'a> {
    queues: &'a mut RenderQueues,
    stats: &'a mut FrameStats,
    camera: Option<&'a CameraView>,
    active_camera: Option<SceneNodeId>,
    driver: &'a dyn VideoDriver,
}

impl<'a> Registrar<'a> {
    pub(crate) fn new(
        queues: &'a mut RenderQueues,
        stats: &'a mut FrameStats,
        camera: Option<&'a CameraView>,
        active_camera: Option<SceneNodeId>,
        driver: &'a dyn VideoDriver,
    ) -> Self {
        Self { queues, stats, camera, active_camera, driver }
    }

    /// The active camera's node, if any
    pub fn active_camera(&self) -> Option<SceneNodeId> {
        self.active_camera
    }

    /// View of the active camera prepared for this frame
    pub fn camera_view(&self) -> Option<&CameraView> {
        self.camera
    }

    /// Whether culling rejects the node against the active camera
    pub fn is_culled(&self, id: SceneNodeId, node: &SceneNode) -> bool {
        culling::is_culled(id, node, self.camera, self.driver)
    }

    /// Queue a node into a pass; returns whether it was taken
    ///
    /// Camera registrations are de-duplicated, lights and sky boxes are never
    /// culled, and `Automatic` picks the transparent pass if any material is
    /// transparent.
    pub fn register(&mut self, id: SceneNodeId, node: &SceneNode, pass: RenderPass) -> bool {
        self.stats.registration_calls += 1;
        let camera_position = self.camera.map_or_else(Vec3::zeros, |camera| camera.position);

        let taken = match pass {
            RenderPass::Camera => {
                if !self.queues.cameras.contains(&id) {
                    self.queues.cameras.push(id);
                }
                true
            }
            RenderPass::Light => {
                self.queues.lights.push(DistanceNodeEntry::new(id, node, camera_position));
                true
            }
            RenderPass::SkyBox => {
                self.queues.sky_boxes.push(id);
                true
            }
            _ if self.is_culled(id, node) => false,
            RenderPass::Solid => {
                self.queues.solids.push(SolidNodeEntry::new(id, node));
                true
            }
            RenderPass::Transparent => {
                self.queues.transparents.push(TransparentNodeEntry::new(id, node, camera_position));
                true
            }
            RenderPass::TransparentEffect => {
                self.queues
                    .transparent_effects
                    .push(TransparentNodeEntry::new(id, node, camera_position));
                true
            }
            RenderPass::Shadow => {
                self.queues.shadows.push(id);
                true
            }
            RenderPass::Gui => {
                self.queues.gui.push(id);
                true
            }
            RenderPass::Automatic => {
                let transparent = node.kind().materials().iter().any(|m| m.is_transparent());
                if transparent {
                    self.queues.transparents.push(TransparentNodeEntry::new(id, node, camera_position));
                } else {
                    self.queues.solids.push(SolidNodeEntry::new(id, node));
                }
                true
            }
        };

        // A node registering into several passes is culled for all of them
        if !taken && self.stats.last_culled != Some(id) {
            self.stats.culled += 1;
            self.stats.last_culled = Some(id);
        }
        taken
    }
}
