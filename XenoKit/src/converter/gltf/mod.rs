//! Model to glTF binary conversion
//!
//! The whole model becomes one GLB: a shared vertex pool, one node per mesh
//! with a primitive per material run, and, when any mesh is weighted, a bone
//! chain bound through a single skin. Textures are referenced by URI so the
//! PNGs written next to the GLB are picked up by importers.

mod builder;
pub mod materials;
pub mod types;

use std::path::Path;

use super::page_image_names;
use crate::error::Result;
use crate::model::Model;

pub use builder::{GltfBuilder, PoolAccessors};

/// Convert a model to GLB bytes.
///
/// `xtx_path` names the texture page the PNG exporter wrote; textured
/// materials reference its `_RGB.png` and `_palette.png` images.
pub fn build_glb(model: &Model, xtx_path: Option<&str>) -> Result<Vec<u8>> {
    let mut builder = GltfBuilder::new();
    let skinned = model.has_weights();

    let skin = skinned.then(|| {
        let bones: Vec<u32> = model.bones().iter().copied().collect();
        let name = if model.name.is_empty() {
            "Armature"
        } else {
            &model.name
        };
        builder.add_skeleton(&bones, name)
    });

    if let Some(path) = xtx_path {
        let (rgb, palette) = page_image_names(path);
        builder.add_page_images(rgb, palette);
    }
    for (index, material) in model.materials().iter().enumerate() {
        builder.add_material(index, material);
    }

    let vertices: Vec<_> = model.vertices().iter().copied().collect();
    let pool = builder.add_vertex_pool(&vertices, skinned);
    for mesh in &model.meshes {
        builder.add_mesh(mesh, pool, skin);
    }

    tracing::debug!(
        "glTF: {} vertices, {} meshes, {} materials, skinned={}",
        vertices.len(),
        model.meshes.len(),
        model.materials().len(),
        skinned
    );
    builder.build_glb()
}

/// Write a model as a GLB file.
pub fn write_glb<P: AsRef<Path>>(path: P, model: &Model, xtx_path: Option<&str>) -> Result<()> {
    let path = path.as_ref();
    let data = build_glb(model, xtx_path)?;
    std::fs::write(path, data)?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}
