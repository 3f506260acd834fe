//! Scene node data and the node kind trait
//!
//! A [`SceneNode`] stores everything every node has in common: identity,
//! transform, flags and the links into the tree. What the node *is* (mesh,
//! camera, light, ...) lives behind the [`SceneNodeKind`] trait object it
//! owns. Nodes themselves live in the arena of a
//! [`SceneManager`](crate::scene::SceneManager) and are addressed by
//! [`SceneNodeId`].

use crate::foundation::math::{Mat4, Vec3};
use crate::scene::animators::AnimatorRef;
use crate::scene::nodes::CameraView;
use crate::scene::render_queue::{RenderPass, Registrar};
use crate::scene::{TransformNode, AABB};
use crate::video::{Material, MaterialFlag, MaterialType, TextureId, VideoDriver};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

slotmap::new_key_type! {
    /// Generational handle of a node inside a scene manager's arena
    pub struct SceneNodeId;
}

/// Id value meaning "no id assigned"
pub const UNSET_ID: i32 = -1;

/// Four-character node type tag
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneNodeType(u32);

impl SceneNodeType {
    /// Grouping node without geometry
    pub const EMPTY: Self = Self::from_tag(b"empt");
    /// Camera
    pub const CAMERA: Self = Self::from_tag(b"cam_");
    /// Dynamic light
    pub const LIGHT: Self = Self::from_tag(b"lgt_");
    /// Static mesh
    pub const MESH: Self = Self::from_tag(b"mesh");
    /// Camera-facing quad
    pub const BILLBOARD: Self = Self::from_tag(b"bill");
    /// Sky box
    pub const SKY_BOX: Self = Self::from_tag(b"sky_");
    /// Stencil shadow volume
    pub const SHADOW_VOLUME: Self = Self::from_tag(b"shdw");
    /// Text label
    pub const TEXT: Self = Self::from_tag(b"text");
    /// Scene root
    pub const ROOT: Self = Self::from_tag(b"root");
    /// Unknown node type
    pub const UNKNOWN: Self = Self::from_tag(b"unkn");
    /// Wildcard accepted by type lookups
    pub const ANY: Self = Self::from_tag(b"any_");

    /// Build a tag from four ASCII bytes
    pub const fn from_tag(tag: &[u8; 4]) -> Self {
        Self(u32::from_le_bytes(*tag))
    }

    /// The four tag bytes
    pub fn tag(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl fmt::Debug for SceneNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SceneNodeType({self})")
    }
}

impl fmt::Display for SceneNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.tag() {
            write!(f, "{}", char::from(byte))?;
        }
        Ok(())
    }
}

bitflags! {
    /// Automatic culling tests applied before a node is queued
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct AutomaticCulling: u32 {
        /// Never cull
        const OFF = 0;
        /// Transformed box against the box around the view frustum
        const BOX = 1;
        /// Box corners against the frustum planes
        const FRUSTUM_BOX = 2;
        /// Bounding sphere against the frustum planes
        const FRUSTUM_SPHERE = 4;
        /// Driver occlusion query result
        const OCC_QUERY = 8;
    }
}

bitflags! {
    /// Debug geometry a node draws in addition to itself
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DebugData: u32 {
        /// Nothing
        const OFF = 0;
        /// Node bounding box
        const BBOX = 1;
        /// Vertex normals
        const NORMALS = 2;
        /// Skeleton
        const SKELETON = 4;
        /// Wireframe overlay
        const MESH_WIRE_OVERLAY = 8;
        /// Half transparent materials
        const HALF_TRANSPARENCY = 16;
        /// Bounding box of each mesh buffer
        const BBOX_BUFFERS = 32;
        /// Everything
        const FULL = Self::BBOX.bits() | Self::NORMALS.bits() | Self::SKELETON.bits()
            | Self::MESH_WIRE_OVERLAY.bits() | Self::HALF_TRANSPARENCY.bits()
            | Self::BBOX_BUFFERS.bits();
    }
}

/// Everything a node needs while drawing itself
pub struct RenderContext<'a> {
    /// Graphics device
    pub driver: &'a mut dyn VideoDriver,
    /// Pass currently being drawn
    pub pass: RenderPass,
    /// The node's absolute transformation
    pub absolute_transformation: Mat4,
    /// The node's debug data flags
    pub debug_data: DebugData,
    /// Active camera of this frame, if any
    pub camera: Option<&'a CameraView>,
}

/// Behavior of a concrete node type
///
/// Implementors provide drawing, local bounds and a type tag. Nodes that want
/// to appear in a frame register themselves from [`SceneNodeKind::on_register`];
/// a node that never registers is animated but never drawn.
pub trait SceneNodeKind: fmt::Debug {
    /// Four-character type tag
    fn node_type(&self) -> SceneNodeType;

    /// Bounding box in node-local space
    fn bounding_box(&self) -> AABB;

    /// Draw the node for the pass in `ctx.pass`
    fn render(&mut self, ctx: &mut RenderContext<'_>);

    /// Queue the node into render passes; called only for visible nodes
    fn on_register(&self, _id: SceneNodeId, _node: &SceneNode, _registrar: &mut Registrar<'_>) {}

    /// Materials of the node
    fn materials(&self) -> &[Material] {
        &[]
    }

    /// Mutable materials of the node
    fn materials_mut(&mut self) -> &mut [Material] {
        &mut []
    }

    /// Copy of the kind for node cloning; `None` makes the node unclonable
    fn clone_kind(&self) -> Option<Box<dyn SceneNodeKind>> {
        None
    }

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// One node of the scene graph
#[derive(Debug)]
pub struct SceneNode {
    pub(crate) name: String,
    pub(crate) id: i32,
    pub(crate) transform: TransformNode,
    pub(crate) is_visible: bool,
    pub(crate) is_debug_object: bool,
    pub(crate) automatic_culling: AutomaticCulling,
    pub(crate) debug_data_visible: DebugData,
    pub(crate) parent: Option<SceneNodeId>,
    pub(crate) children: Vec<SceneNodeId>,
    pub(crate) animators: Vec<AnimatorRef>,
    pub(crate) reference_count: u32,
    pub(crate) kind: Box<dyn SceneNodeKind>,
}

impl SceneNode {
    pub(crate) fn new(kind: Box<dyn SceneNodeKind>, id: i32, transform: TransformNode, culling: AutomaticCulling) -> Self {
        Self {
            name: String::new(),
            id,
            transform,
            is_visible: true,
            is_debug_object: false,
            automatic_culling: culling,
            debug_data_visible: DebugData::OFF,
            parent: None,
            children: Vec::new(),
            animators: Vec::new(),
            reference_count: 1,
            kind,
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// User id, [`UNSET_ID`] by default
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Set the user id
    pub fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    /// Type tag of the node's kind
    pub fn node_type(&self) -> SceneNodeType {
        self.kind.node_type()
    }

    /// Position relative to the parent
    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }

    /// Set the position relative to the parent
    pub fn set_position(&mut self, position: Vec3) {
        self.transform.translation = position;
    }

    /// Rotation relative to the parent, in degrees
    pub fn rotation(&self) -> Vec3 {
        self.transform.rotation
    }

    /// Set the rotation relative to the parent, in degrees
    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.transform.rotation = rotation;
    }

    /// Scale relative to the parent
    pub fn scale(&self) -> Vec3 {
        self.transform.scale
    }

    /// Set the scale relative to the parent
    pub fn set_scale(&mut self, scale: Vec3) {
        self.transform.scale = scale;
    }

    /// Transform node of this scene node
    pub fn transform(&self) -> &TransformNode {
        &self.transform
    }

    /// Relative transformation matrix
    pub fn relative_transformation(&self) -> Mat4 {
        self.transform.relative_transformation()
    }

    /// Absolute transformation as of the last refresh
    pub fn absolute_transformation(&self) -> &Mat4 {
        self.transform.absolute()
    }

    /// World position as of the last refresh
    pub fn absolute_position(&self) -> Vec3 {
        self.transform.absolute_position()
    }

    /// The visibility flag set by the user
    ///
    /// The node is only drawn if every ancestor is visible too, see
    /// [`SceneManager::is_truly_visible`](crate::scene::SceneManager::is_truly_visible).
    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    /// Show or hide the node and its subtree
    pub fn set_visible(&mut self, visible: bool) {
        self.is_visible = visible;
    }

    /// Whether this node is a debug helper
    pub fn is_debug_object(&self) -> bool {
        self.is_debug_object
    }

    /// Mark the node as a debug helper
    pub fn set_is_debug_object(&mut self, debug_object: bool) {
        self.is_debug_object = debug_object;
    }

    /// Culling tests applied to this node
    pub fn automatic_culling(&self) -> AutomaticCulling {
        self.automatic_culling
    }

    /// Set the culling tests
    pub fn set_automatic_culling(&mut self, culling: AutomaticCulling) {
        self.automatic_culling = culling;
    }

    /// Debug geometry flags
    pub fn debug_data_visible(&self) -> DebugData {
        self.debug_data_visible
    }

    /// Set the debug geometry flags
    pub fn set_debug_data_visible(&mut self, debug_data: DebugData) {
        self.debug_data_visible = debug_data;
    }

    /// Parent handle, `None` for the root and detached nodes
    pub fn parent(&self) -> Option<SceneNodeId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[SceneNodeId] {
        &self.children
    }

    /// Animators in insertion order
    pub fn animators(&self) -> &[AnimatorRef] {
        &self.animators
    }

    /// Number of strong references held on this node
    pub fn reference_count(&self) -> u32 {
        self.reference_count
    }

    /// Bounding box in node-local space
    pub fn bounding_box(&self) -> AABB {
        self.kind.bounding_box()
    }

    /// Local bounding box transformed by the absolute transformation
    pub fn transformed_bounding_box(&self) -> AABB {
        self.kind.bounding_box().transformed(self.transform.absolute())
    }

    /// Material by index, `None` when out of range
    pub fn material(&self, index: usize) -> Option<&Material> {
        self.kind.materials().get(index)
    }

    /// Mutable material by index, `None` when out of range
    pub fn material_mut(&mut self, index: usize) -> Option<&mut Material> {
        self.kind.materials_mut().get_mut(index)
    }

    /// Number of materials
    pub fn material_count(&self) -> usize {
        self.kind.materials().len()
    }

    /// Set a flag on every material
    pub fn set_material_flag(&mut self, flag: MaterialFlag, value: bool) {
        for material in self.kind.materials_mut() {
            material.set_flag(flag, value);
        }
    }

    /// Set a texture layer on every material
    pub fn set_material_texture(&mut self, layer: usize, texture: Option<TextureId>) {
        for material in self.kind.materials_mut() {
            material.set_texture(layer, texture);
        }
    }

    /// Set the material type of every material
    pub fn set_material_type(&mut self, material_type: MaterialType) {
        for material in self.kind.materials_mut() {
            material.material_type = material_type;
        }
    }

    /// The node's kind
    pub fn kind(&self) -> &dyn SceneNodeKind {
        self.kind.as_ref()
    }

    /// The node's kind, mutably
    pub fn kind_mut(&mut self) -> &mut dyn SceneNodeKind {
        self.kind.as_mut()
    }

    /// Downcast the kind to a concrete node type
    pub fn kind_as<T: SceneNodeKind + 'static>(&self) -> Option<&T> {
        self.kind.as_any().downcast_ref::<T>()
    }

    /// Mutably downcast the kind to a concrete node type
    pub fn kind_as_mut<T: SceneNodeKind + 'static>(&mut self) -> Option<&mut T> {
        self.kind.as_any_mut().downcast_mut::<T>()
    }
}
