//! glTF document builder
//!
//! All vertex attributes live in one binary buffer shared by every
//! primitive, since meshes index into the model's common vertex pool.

mod export;
mod materials;
mod mesh;
mod skeleton;
mod vertex_attributes;

pub use mesh::PoolAccessors;

use super::materials::{GltfImage, GltfMaterial, GltfTexture};
use super::types::{GltfAccessor, GltfBufferView, GltfMesh, GltfNode, GltfSkin};

/// Accumulates buffer data and glTF objects before serialization.
pub struct GltfBuilder {
    pub(super) buffer: Vec<u8>,
    pub(super) buffer_views: Vec<GltfBufferView>,
    pub(super) accessors: Vec<GltfAccessor>,
    pub(super) meshes: Vec<GltfMesh>,
    pub(super) nodes: Vec<GltfNode>,
    pub(super) skins: Vec<GltfSkin>,
    pub(super) images: Vec<GltfImage>,
    pub(super) textures: Vec<GltfTexture>,
    pub(super) materials: Vec<GltfMaterial>,
    pub(super) scene_nodes: Vec<usize>,
}

impl GltfBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            buffer_views: Vec::new(),
            accessors: Vec::new(),
            meshes: Vec::new(),
            nodes: Vec::new(),
            skins: Vec::new(),
            images: Vec::new(),
            textures: Vec::new(),
            materials: Vec::new(),
            scene_nodes: Vec::new(),
        }
    }

    pub(super) fn align(&mut self, alignment: usize) {
        let padding = (alignment - (self.buffer.len() % alignment)) % alignment;
        self.buffer.extend(std::iter::repeat_n(0u8, padding));
    }

    /// Record a finished view over `buffer[byte_offset..]` and an accessor on it.
    pub(super) fn push_view(
        &mut self,
        byte_offset: usize,
        target: u32,
        accessor: impl FnOnce(usize) -> GltfAccessor,
    ) -> usize {
        let bv_idx = self.buffer_views.len();
        self.buffer_views.push(GltfBufferView {
            buffer: 0,
            byte_offset,
            byte_length: self.buffer.len() - byte_offset,
            target: Some(target),
        });

        let acc_idx = self.accessors.len();
        self.accessors.push(accessor(bv_idx));
        acc_idx
    }
}

impl Default for GltfBuilder {
    fn default() -> Self {
        Self::new()
    }
}
