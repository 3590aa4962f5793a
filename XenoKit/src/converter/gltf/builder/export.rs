//! Export methods for `GltfBuilder`

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;

use super::super::types::{GltfAsset, GltfBuffer, GltfDocument, GltfScene};
use super::GltfBuilder;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const CHUNK_JSON: u32 = 0x4E4F534A;
const CHUNK_BIN: u32 = 0x004E4942;

impl GltfBuilder {
    pub(super) fn build_document(self) -> (GltfDocument, Vec<u8>) {
        let doc = GltfDocument {
            asset: GltfAsset {
                version: "2.0".to_string(),
                generator: Some(format!("XenoKit {}", crate::VERSION)),
            },
            scene: 0,
            scenes: vec![GltfScene {
                name: Some("Scene".to_string()),
                nodes: self.scene_nodes,
            }],
            nodes: self.nodes,
            meshes: self.meshes,
            skins: self.skins,
            materials: self.materials,
            textures: self.textures,
            images: self.images,
            accessors: self.accessors,
            buffer_views: self.buffer_views,
            buffers: vec![GltfBuffer {
                byte_length: self.buffer.len(),
            }],
        };

        (doc, self.buffer)
    }

    /// Build GLB data and return as bytes.
    ///
    /// # Errors
    /// Returns an error if JSON serialization fails.
    pub fn build_glb(self) -> Result<Vec<u8>> {
        let (doc, buffer) = self.build_document();
        let json = serde_json::to_string(&doc)?;
        let json_bytes = json.as_bytes();

        let json_padding = (4 - (json_bytes.len() % 4)) % 4;
        let json_chunk_len = json_bytes.len() + json_padding;

        let bin_padding = (4 - (buffer.len() % 4)) % 4;
        let bin_chunk_len = buffer.len() + bin_padding;

        let total_len = 12 + 8 + json_chunk_len + 8 + bin_chunk_len;

        let mut output = Vec::with_capacity(total_len);

        // GLB header
        output.extend_from_slice(GLB_MAGIC);
        output.extend_from_slice(&2u32.to_le_bytes());
        output.extend_from_slice(&(total_len as u32).to_le_bytes());

        // JSON chunk
        output.extend_from_slice(&(json_chunk_len as u32).to_le_bytes());
        output.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        output.extend_from_slice(json_bytes);
        output.extend(std::iter::repeat_n(b' ', json_padding));

        // Binary chunk
        output.extend_from_slice(&(bin_chunk_len as u32).to_le_bytes());
        output.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        output.extend_from_slice(&buffer);
        output.extend(std::iter::repeat_n(0u8, bin_padding));

        Ok(output)
    }

    /// Export as a GLB file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn export_glb(self, path: &Path) -> Result<()> {
        let glb_data = self.build_glb()?;
        let mut file = File::create(path)?;
        file.write_all(&glb_data)?;
        Ok(())
    }
}
