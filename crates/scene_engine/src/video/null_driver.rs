//! Headless driver that records every call
//!
//! Keeps just enough device state (transforms, dynamic lights) for nodes to
//! read back what they set, and appends each call to a shared log.

use super::{Color, Colorf, LightData, Material, TransformState, Vertex, VideoDriver};
use crate::foundation::math::{utils, Mat4, Vec3};
use crate::scene::{AABB, MeshBuffer, SceneNodeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One recorded driver call
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    /// `set_transform`
    SetTransform(TransformState, Mat4),
    /// `set_material`
    SetMaterial(Material),
    /// `draw_mesh_buffer`
    DrawMeshBuffer {
        /// Vertices in the buffer
        vertex_count: usize,
        /// Indices in the buffer
        index_count: usize,
    },
    /// `draw_indexed_triangle_list`
    DrawTriangles {
        /// Vertices submitted
        vertex_count: usize,
        /// Indices submitted
        index_count: usize,
    },
    /// `draw_3d_box`
    Draw3DBox(AABB),
    /// `delete_all_dynamic_lights`
    DeleteAllDynamicLights,
    /// `add_dynamic_light`
    AddDynamicLight(LightData),
    /// `set_ambient_light`
    SetAmbientLight(Colorf),
    /// `draw_stencil_shadow_volume`
    DrawShadowVolume {
        /// Triangles in the volume
        triangle_count: usize,
    },
    /// `draw_stencil_shadow`
    DrawStencilShadow(Color),
    /// `draw_text`
    DrawText(String),
}

/// Shared call log of a [`NullDriver`]
pub type DriverLog = Rc<RefCell<Vec<DriverCall>>>;

/// Driver without a device
#[derive(Debug)]
pub struct NullDriver {
    log: DriverLog,
    world: Mat4,
    view: Mat4,
    projection: Mat4,
    dynamic_lights: Vec<LightData>,
    max_dynamic_lights: usize,
    occlusion_results: HashMap<SceneNodeId, u32>,
    primitives_drawn: usize,
}

impl NullDriver {
    /// Create a driver supporting eight dynamic lights
    pub fn new() -> Self {
        Self::with_max_lights(8)
    }

    /// Create a driver with a custom dynamic light limit
    pub fn with_max_lights(max_dynamic_lights: usize) -> Self {
        Self {
            log: Rc::new(RefCell::new(Vec::new())),
            world: Mat4::identity(),
            view: Mat4::identity(),
            projection: Mat4::identity(),
            dynamic_lights: Vec::new(),
            max_dynamic_lights,
            occlusion_results: HashMap::new(),
            primitives_drawn: 0,
        }
    }

    /// Wrap into a shared driver handle
    pub fn into_shared(self) -> Rc<RefCell<NullDriver>> {
        Rc::new(RefCell::new(self))
    }

    /// Handle to the call log; stays valid after the driver is shared
    pub fn log(&self) -> DriverLog {
        Rc::clone(&self.log)
    }

    /// Snapshot of every recorded call
    pub fn calls(&self) -> Vec<DriverCall> {
        self.log.borrow().clone()
    }

    /// Forget recorded calls
    pub fn clear_calls(&mut self) {
        self.log.borrow_mut().clear();
    }

    /// Dynamic lights currently set
    pub fn dynamic_lights(&self) -> &[LightData] {
        &self.dynamic_lights
    }

    /// Triangles submitted since creation
    pub fn primitives_drawn(&self) -> usize {
        self.primitives_drawn
    }

    /// Store the result an occlusion query would have produced for a node
    pub fn set_occlusion_query_result(&mut self, node: SceneNodeId, samples: u32) {
        self.occlusion_results.insert(node, samples);
    }

    /// World translations of every `set_transform(World, ..)` call, in order
    pub fn world_translations(log: &DriverLog) -> Vec<Vec3> {
        log.borrow()
            .iter()
            .filter_map(|call| match call {
                DriverCall::SetTransform(TransformState::World, m) => Some(utils::translation_of(m)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: DriverCall) {
        self.log.borrow_mut().push(call);
    }
}

impl Default for NullDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoDriver for NullDriver {
    fn set_transform(&mut self, state: TransformState, matrix: &Mat4) {
        match state {
            TransformState::World => self.world = *matrix,
            TransformState::View => self.view = *matrix,
            TransformState::Projection => self.projection = *matrix,
        }
        self.record(DriverCall::SetTransform(state, *matrix));
    }

    fn transform(&self, state: TransformState) -> Mat4 {
        match state {
            TransformState::World => self.world,
            TransformState::View => self.view,
            TransformState::Projection => self.projection,
        }
    }

    fn set_material(&mut self, material: &Material) {
        self.record(DriverCall::SetMaterial(material.clone()));
    }

    fn draw_mesh_buffer(&mut self, buffer: &MeshBuffer) {
        self.primitives_drawn += buffer.indices().len() / 3;
        self.record(DriverCall::DrawMeshBuffer {
            vertex_count: buffer.vertices().len(),
            index_count: buffer.indices().len(),
        });
    }

    fn draw_indexed_triangle_list(&mut self, vertices: &[Vertex], indices: &[u16]) {
        self.primitives_drawn += indices.len() / 3;
        self.record(DriverCall::DrawTriangles {
            vertex_count: vertices.len(),
            index_count: indices.len(),
        });
    }

    fn draw_3d_box(&mut self, bounds: &AABB, _color: Color) {
        self.record(DriverCall::Draw3DBox(*bounds));
    }

    fn delete_all_dynamic_lights(&mut self) {
        self.dynamic_lights.clear();
        self.record(DriverCall::DeleteAllDynamicLights);
    }

    fn add_dynamic_light(&mut self, light: &LightData) -> usize {
        self.dynamic_lights.push(*light);
        self.record(DriverCall::AddDynamicLight(*light));
        self.dynamic_lights.len() - 1
    }

    fn max_dynamic_light_count(&self) -> usize {
        self.max_dynamic_lights
    }

    fn set_ambient_light(&mut self, color: Colorf) {
        self.record(DriverCall::SetAmbientLight(color));
    }

    fn draw_stencil_shadow_volume(&mut self, triangles: &[Vec3], _zfail: bool) {
        self.record(DriverCall::DrawShadowVolume {
            triangle_count: triangles.len() / 3,
        });
    }

    fn draw_stencil_shadow(&mut self, color: Color) {
        self.record(DriverCall::DrawStencilShadow(color));
    }

    fn draw_text(&mut self, text: &str, _position: Vec3, _color: Color) {
        self.record(DriverCall::DrawText(text.to_owned()));
    }

    fn occlusion_query_result(&self, node: SceneNodeId) -> Option<u32> {
        self.occlusion_results.get(&node).copied()
    }
}
