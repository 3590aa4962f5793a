//! Exporters for decoded scenes
//!
//! - [`gltf`] writes a binary glTF 2.0 file with optional skinning
//! - [`obj`] writes Wavefront OBJ geometry with an MTL material library
//! - [`png`] writes the texture page canvases as PNG images

pub mod gltf;
pub mod obj;
pub mod png;

use std::path::Path;

/// File names of the RGB and palette images written for `xtx_path`,
/// without the directory part.
pub(crate) fn page_image_names(xtx_path: &str) -> (String, String) {
    let name = Path::new(xtx_path)
        .file_name()
        .map_or_else(|| xtx_path.to_string(), |n| n.to_string_lossy().into_owned());
    (format!("{name}_RGB.png"), format!("{name}_palette.png"))
}
