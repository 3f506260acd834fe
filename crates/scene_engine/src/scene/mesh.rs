//! Mesh interface consumed by mesh-type scene nodes
//!
//! Mesh file parsers live outside this crate; anything that can hand out
//! [`MeshBuffer`]s and a bounding box can be drawn by a
//! [`MeshSceneNode`](crate::scene::nodes::MeshSceneNode).

use crate::foundation::math::{Vec2, Vec3};
use crate::scene::AABB;
use crate::video::{Color, Material, Vertex};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Vertices, 16-bit indices and the material they are drawn with
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBuffer {
    vertices: Vec<Vertex>,
    indices: Vec<u16>,
    /// Material the buffer is drawn with
    pub material: Material,
    bounding_box: AABB,
}

impl MeshBuffer {
    /// Create a buffer; the bounding box is computed from the vertices
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u16>, material: Material) -> Self {
        let positions: Vec<Vec3> = vertices.iter().map(|v| v.position).collect();
        let bounding_box = AABB::from_points(&positions).unwrap_or_else(|| AABB::from_point(Vec3::zeros()));
        Self { vertices, indices, material, bounding_box }
    }

    /// Vertex data
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Triangle list indices
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Box around every vertex
    pub fn bounding_box(&self) -> AABB {
        self.bounding_box
    }

    /// Vertex positions of every triangle, three per triangle
    pub fn triangle_positions(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            let p = |i: u16| self.vertices.get(usize::from(i)).map(|v| v.position);
            Some([p(tri[0])?, p(tri[1])?, p(tri[2])?])
        })
    }
}

/// Geometry provider
pub trait Mesh: fmt::Debug {
    /// Number of buffers
    fn mesh_buffer_count(&self) -> usize;

    /// Buffer by index, `None` when out of range
    fn mesh_buffer(&self, index: usize) -> Option<&MeshBuffer>;

    /// Box around every buffer
    fn bounding_box(&self) -> AABB;
}

/// Mesh made of fixed buffers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticMesh {
    buffers: Vec<MeshBuffer>,
    bounding_box: Option<AABB>,
}

impl StaticMesh {
    /// Create an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a buffer and grow the bounding box
    pub fn add_buffer(&mut self, buffer: MeshBuffer) {
        let buffer_box = buffer.bounding_box();
        match &mut self.bounding_box {
            Some(bounds) => bounds.add_box(&buffer_box),
            None => self.bounding_box = Some(buffer_box),
        }
        self.buffers.push(buffer);
    }

    /// Axis-aligned cube centered at the origin with edge length `size`
    pub fn cube(size: f32, material: Material) -> Self {
        let h = size * 0.5;
        // One face per axis direction: normal, then two in-plane axes
        let faces = [
            (Vec3::x(), Vec3::y(), Vec3::z()),
            (-Vec3::x(), Vec3::z(), Vec3::y()),
            (Vec3::y(), Vec3::z(), Vec3::x()),
            (-Vec3::y(), Vec3::x(), Vec3::z()),
            (Vec3::z(), Vec3::x(), Vec3::y()),
            (-Vec3::z(), Vec3::y(), Vec3::x()),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let base = u16::try_from(vertices.len()).unwrap_or(u16::MAX);
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let position = (normal + u * su + v * sv) * h;
                let uv = Vec2::new((su + 1.0) * 0.5, (sv + 1.0) * 0.5);
                vertices.push(Vertex::new(position, normal, Color::WHITE, uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        let mut mesh = Self::new();
        mesh.add_buffer(MeshBuffer::new(vertices, indices, material));
        mesh
    }
}

impl Mesh for StaticMesh {
    fn mesh_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    fn mesh_buffer(&self, index: usize) -> Option<&MeshBuffer> {
        self.buffers.get(index)
    }

    fn bounding_box(&self) -> AABB {
        self.bounding_box.unwrap_or_else(|| AABB::from_point(Vec3::zeros()))
    }
}

/// Named meshes shared between scene managers
#[derive(Debug, Default)]
pub struct MeshCache {
    meshes: HashMap<String, Rc<dyn Mesh>>,
}

impl MeshCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a mesh under a name, replacing any previous entry
    pub fn add_mesh(&mut self, name: impl Into<String>, mesh: Rc<dyn Mesh>) {
        self.meshes.insert(name.into(), mesh);
    }

    /// Look up a mesh by name
    pub fn mesh(&self, name: &str) -> Option<Rc<dyn Mesh>> {
        self.meshes.get(name).cloned()
    }

    /// Whether a name is cached
    pub fn contains(&self, name: &str) -> bool {
        self.meshes.contains_key(name)
    }

    /// Remove a mesh; returns whether it was cached
    pub fn remove_mesh(&mut self, name: &str) -> bool {
        self.meshes.remove(name).is_some()
    }

    /// Number of cached meshes
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Drop every mesh
    pub fn clear(&mut self) {
        self.meshes.clear();
    }
}
