//! glTF 2.0 material and texture types.

use serde::Serialize;

/// Image referenced by a URI relative to the GLB file
#[derive(Debug, Clone, Serialize)]
pub struct GltfImage {
    pub uri: String,
}

/// Texture referencing an image
#[derive(Debug, Clone, Serialize)]
pub struct GltfTexture {
    pub source: usize,
}

/// Texture info used in materials
#[derive(Debug, Clone, Serialize)]
pub struct GltfTextureInfo {
    pub index: usize,
}

/// PBR Metallic-Roughness material model
#[derive(Debug, Clone, Serialize)]
pub struct GltfPbrMetallicRoughness {
    #[serde(rename = "baseColorTexture")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_color_texture: Option<GltfTextureInfo>,
    #[serde(rename = "baseColorFactor")]
    pub base_color_factor: [f32; 4],
    #[serde(rename = "metallicFactor")]
    pub metallic_factor: f32,
    #[serde(rename = "roughnessFactor")]
    pub roughness_factor: f32,
}

impl Default for GltfPbrMetallicRoughness {
    fn default() -> Self {
        Self {
            base_color_texture: None,
            base_color_factor: [1.0, 1.0, 1.0, 1.0],
            metallic_factor: 0.0,
            roughness_factor: 0.5,
        }
    }
}

/// Material definition
#[derive(Debug, Clone, Serialize)]
pub struct GltfMaterial {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "pbrMetallicRoughness")]
    pub pbr_metallic_roughness: GltfPbrMetallicRoughness,
    #[serde(rename = "alphaMode")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha_mode: Option<String>,
    #[serde(rename = "doubleSided")]
    pub double_sided: bool,
}
