//! Graphics device interface
//!
//! The scene core never talks to a GPU directly. Every node `render` goes
//! through the [`VideoDriver`] trait, which a backend implements. The
//! [`NullDriver`] implementation records calls and is used headless and in
//! tests.

mod material;
mod null_driver;

pub use material::{Material, MaterialFlag, MaterialType, TextureId, MATERIAL_MAX_TEXTURES};
pub use null_driver::{DriverCall, DriverLog, NullDriver};

use crate::foundation::math::{Mat4, Vec2, Vec3};
use crate::scene::{AABB, MeshBuffer, SceneNodeId};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Driver handle shared between scene managers
pub type SharedDriver = Rc<RefCell<dyn VideoDriver>>;

/// 32-bit ARGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Alpha
    pub a: u8,
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl Color {
    /// Opaque white
    pub const WHITE: Color = Color::new(255, 255, 255, 255);

    /// Create a color from alpha, red, green and blue
    pub const fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Floating point RGBA color used for lighting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Colorf {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Colorf {
    /// Create a color from components
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Colorf {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

/// Vertex layout handed to the driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in object space
    pub position: Vec3,
    /// Normal in object space
    pub normal: Vec3,
    /// Vertex color
    pub color: Color,
    /// Texture coordinates
    pub tex_coords: Vec2,
}

impl Vertex {
    /// Create a vertex
    pub fn new(position: Vec3, normal: Vec3, color: Color, tex_coords: Vec2) -> Self {
        Self { position, normal, color, tex_coords }
    }
}

/// Matrix slots of the fixed transform state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformState {
    /// Object to world
    World,
    /// World to view
    View,
    /// View to clip
    Projection,
}

/// Dynamic light kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightType {
    /// Omnidirectional light with a falloff radius
    Point,
    /// Parallel light along a direction
    Directional,
    /// Cone light
    Spot,
}

/// Light state uploaded by light nodes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightData {
    /// Kind of light
    pub light_type: LightType,
    /// World position
    pub position: Vec3,
    /// World direction (directional and spot lights)
    pub direction: Vec3,
    /// Diffuse color
    pub diffuse_color: Colorf,
    /// Falloff radius
    pub radius: f32,
    /// Whether this light casts stencil shadows
    pub cast_shadows: bool,
}

impl Default for LightData {
    fn default() -> Self {
        Self {
            light_type: LightType::Point,
            position: Vec3::zeros(),
            direction: Vec3::new(0.0, 0.0, 1.0),
            diffuse_color: Colorf::new(1.0, 1.0, 1.0, 1.0),
            radius: 100.0,
            cast_shadows: true,
        }
    }
}

/// Interface to the graphics device consumed by scene node `render` methods
pub trait VideoDriver {
    /// Set one of the transform matrices
    fn set_transform(&mut self, state: TransformState, matrix: &Mat4);

    /// Current value of a transform matrix
    fn transform(&self, state: TransformState) -> Mat4;

    /// Activate a material for subsequent draws
    fn set_material(&mut self, material: &Material);

    /// Draw one mesh buffer with the active material and world transform
    fn draw_mesh_buffer(&mut self, buffer: &MeshBuffer);

    /// Draw an indexed triangle list
    fn draw_indexed_triangle_list(&mut self, vertices: &[Vertex], indices: &[u16]);

    /// Draw a wireframe box under the current world transform
    fn draw_3d_box(&mut self, bounds: &AABB, color: Color);

    /// Remove every dynamic light added this frame
    fn delete_all_dynamic_lights(&mut self);

    /// Add a dynamic light, returning its slot index
    fn add_dynamic_light(&mut self, light: &LightData) -> usize;

    /// How many dynamic lights the device supports at once
    fn max_dynamic_light_count(&self) -> usize;

    /// Set the global ambient light
    fn set_ambient_light(&mut self, color: Colorf);

    /// Render a shadow volume into the stencil buffer
    fn draw_stencil_shadow_volume(&mut self, triangles: &[Vec3], zfail: bool);

    /// Composite the stencil shadow onto the frame
    fn draw_stencil_shadow(&mut self, color: Color);

    /// Draw a text label anchored at a world position
    fn draw_text(&mut self, text: &str, position: Vec3, color: Color);

    /// Result of the last occlusion query for a node, if one was run
    ///
    /// `Some(0)` means no samples passed.
    fn occlusion_query_result(&self, _node: SceneNodeId) -> Option<u32> {
        None
    }
}
