//! Material methods for `GltfBuilder`

use crate::model::Material;

use super::super::materials::{
    GltfImage, GltfMaterial, GltfPbrMetallicRoughness, GltfTexture, GltfTextureInfo,
};
use super::GltfBuilder;

/// Texture index of the direct RGBA page image.
const RGB_TEXTURE: usize = 0;
/// Texture index of the composited palette image.
const PALETTE_TEXTURE: usize = 1;

impl GltfBuilder {
    /// Register the two page images every textured material samples from.
    pub fn add_page_images(&mut self, rgb_uri: String, palette_uri: String) {
        for uri in [rgb_uri, palette_uri] {
            let source = self.images.len();
            self.images.push(GltfImage { uri });
            self.textures.push(GltfTexture { source });
        }
    }

    /// Add a double-sided material, returning its index.
    ///
    /// Textured materials only reference an image once the page images
    /// have been registered.
    pub fn add_material(&mut self, index: usize, material: &Material) -> usize {
        let textured = material.has_texture && !self.textures.is_empty();
        let texture = textured.then(|| GltfTextureInfo {
            index: if material.is_indexed() {
                PALETTE_TEXTURE
            } else {
                RGB_TEXTURE
            },
        });

        let mat_idx = self.materials.len();
        self.materials.push(GltfMaterial {
            name: Some(format!("Material_{index}")),
            pbr_metallic_roughness: GltfPbrMetallicRoughness {
                base_color_texture: texture,
                base_color_factor: material.color.diffuse().map(|c| c.clamp(0.0, 1.0)),
                ..GltfPbrMetallicRoughness::default()
            },
            alpha_mode: textured.then(|| "OPAQUE".to_string()),
            double_sided: true,
        });
        mat_idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn material(palette: u8) -> Material {
        let mut m = Material {
            has_texture: true,
            palette,
            ..Material::default()
        };
        m.color.colors[0] = [2.0, 0.5, -1.0, 1.0];
        m
    }

    #[test]
    fn test_material_texture_selection() {
        let mut builder = GltfBuilder::new();
        builder.add_page_images("a_RGB.png".into(), "a_palette.png".into());
        builder.add_material(0, &material(Material::DIRECT_RGBA));
        builder.add_material(1, &material(0x03));

        let pbr = |i: usize| &builder.materials[i].pbr_metallic_roughness;
        assert_eq!(pbr(0).base_color_texture.as_ref().map(|t| t.index), Some(0));
        assert_eq!(pbr(1).base_color_texture.as_ref().map(|t| t.index), Some(1));
        assert_eq!(pbr(0).base_color_factor, [1.0, 0.5, 0.0, 1.0]);
        assert_eq!(builder.materials[1].name.as_deref(), Some("Material_1"));
    }

    #[test]
    fn test_untextured_without_images() {
        let mut builder = GltfBuilder::new();
        builder.add_material(0, &material(0x03));
        let mat = &builder.materials[0];
        assert!(mat.pbr_metallic_roughness.base_color_texture.is_none());
        assert!(mat.alpha_mode.is_none());
        assert!(mat.double_sided);
    }
}
