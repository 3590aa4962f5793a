//! In-memory scene built up from decoded LEX/XTX files
//!
//! A run creates one [`Model`] (and optionally one [`Texture`]), feeds every
//! input file through the decoders in order, and hands the result to an
//! exporter.

mod types;

use indexmap::IndexSet;

pub use types::{
    JOINT_UNUSED, Material, MaterialColor, TexelRect, Texture, Triangle, UvRect, Vertex,
};

/// A named group of triangles from one LEX mesh.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    pub weight_format: u32,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    /// Whether the exporters should bind this mesh to the skin.
    #[must_use]
    pub fn is_skinned(&self) -> bool {
        self.weight_format & 0xFF != 0
    }
}

/// The scene aggregate.
///
/// Vertices and materials live in insertion-ordered sets, so inserting a
/// bit-identical record returns the index of the existing one.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
    materials: IndexSet<Material>,
    vertices: IndexSet<Vertex>,
    bones: IndexSet<u32>,
    /// Largest bone-set size observed after any LEX file.
    pub bone_count: usize,
}

impl Model {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vertex into the pool, returning its index.
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        self.vertices.insert_full(vertex).0
    }

    /// Insert a material, returning its index.
    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.insert_full(material).0
    }

    /// Insert a global bone id, returning its position in the bone set.
    pub fn add_bone(&mut self, bone: u32) -> usize {
        self.bones.insert_full(bone).0
    }

    #[must_use]
    pub fn vertices(&self) -> &IndexSet<Vertex> {
        &self.vertices
    }

    #[must_use]
    pub fn materials(&self) -> &IndexSet<Material> {
        &self.materials
    }

    #[must_use]
    pub fn material(&self, index: usize) -> Option<&Material> {
        self.materials.get_index(index)
    }

    #[must_use]
    pub fn bones(&self) -> &IndexSet<u32> {
        &self.bones
    }

    #[must_use]
    pub fn has_weights(&self) -> bool {
        self.meshes.iter().any(Mesh::is_skinned)
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.triangles.len()).sum()
    }

    pub(crate) fn refresh_bone_count(&mut self) {
        self.bone_count = self.bone_count.max(self.bones.len());
    }
}
