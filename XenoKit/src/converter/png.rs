//! Texture page to PNG export
//!
//! Three images are produced for a page:
//!
//! - `<stem>_RGB.png`: the swizzled RGBA canvas as uploaded to the GS
//! - `<stem>_unswizzled.png`: the 8-bit index canvas as greyscale
//! - `<stem>_palette.png`: the palette composite, when one is given
//!
//! PS2 alpha runs from 0 to 0x80, so RGBA alpha is rescaled to 0..=255.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use image::{ImageBuffer, RgbaImage};

use crate::error::{Error, Result};
use crate::model::Texture;

/// Map a GS alpha value (0x80 = opaque) onto the full byte range.
#[must_use]
pub fn scale_alpha(alpha: u8) -> u8 {
    (255.0 * f32::from(alpha) / 128.0).clamp(0.0, 255.0) as u8
}

fn rgba_image(width: u32, height: u32, rgba: &[u8]) -> Result<RgbaImage> {
    let len = (width * height * 4) as usize;
    let mut pixels = rgba.get(..len).ok_or(Error::ImageBufferFailed)?.to_vec();
    for px in pixels.chunks_exact_mut(4) {
        px[3] = scale_alpha(px[3]);
    }
    ImageBuffer::from_raw(width, height, pixels).ok_or(Error::ImageBufferFailed)
}

/// The swizzled RGBA canvas.
pub fn rgb_canvas_image(texture: &Texture) -> Result<RgbaImage> {
    rgba_image(texture.width / 2, texture.height / 2, &texture.rgb)
}

/// The index canvas as opaque grey.
pub fn index_canvas_image(texture: &Texture) -> Result<RgbaImage> {
    let pixels = texture
        .unswizzled
        .iter()
        .flat_map(|&i| [i, i, i, 255])
        .collect();
    ImageBuffer::from_raw(texture.width, texture.height, pixels).ok_or(Error::ImageBufferFailed)
}

/// A composited palette canvas of the page's index dimensions.
pub fn palette_image(texture: &Texture, composite: &[u8]) -> Result<RgbaImage> {
    rgba_image(texture.width, texture.height, composite)
}

/// Encode an image as PNG bytes.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut png_data = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_data);
    img.write_with_encoder(encoder)
        .map_err(|e| Error::PngEncodeFailed {
            message: e.to_string(),
        })?;
    Ok(png_data)
}

fn suffixed(stem: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(stem.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Write the page images next to `stem`, returning the paths written.
pub fn write_texture_pngs<P: AsRef<Path>>(
    stem: P,
    texture: &Texture,
    palette: Option<&[u8]>,
) -> Result<Vec<PathBuf>> {
    let stem = stem.as_ref();
    let mut images = vec![
        (suffixed(stem, "_RGB.png"), rgb_canvas_image(texture)?),
        (suffixed(stem, "_unswizzled.png"), index_canvas_image(texture)?),
    ];
    if let Some(composite) = palette {
        images.push((suffixed(stem, "_palette.png"), palette_image(texture, composite)?));
    }

    let mut written = Vec::with_capacity(images.len());
    for (path, img) in images {
        std::fs::write(&path, encode_png(&img)?)?;
        tracing::info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texture() -> Texture {
        Texture {
            width: 4,
            height: 4,
            rgb: [10, 20, 30, 0x40].repeat(4),
            unswizzled: (0..16).collect(),
            max_x: 4,
            max_y: 4,
        }
    }

    #[test]
    fn test_scale_alpha() {
        assert_eq!(scale_alpha(0), 0);
        assert_eq!(scale_alpha(0x40), 127);
        assert_eq!(scale_alpha(0x80), 255);
        assert_eq!(scale_alpha(0xFF), 255);
    }

    #[test]
    fn test_canvas_images() {
        let tex = texture();
        let rgb = rgb_canvas_image(&tex).unwrap();
        assert_eq!(rgb.dimensions(), (2, 2));
        assert_eq!(rgb.get_pixel(1, 1).0, [10, 20, 30, 127]);

        let grey = index_canvas_image(&tex).unwrap();
        assert_eq!(grey.dimensions(), (4, 4));
        assert_eq!(grey.get_pixel(3, 1).0, [7, 7, 7, 255]);
    }

    #[test]
    fn test_short_composite_is_rejected() {
        let err = palette_image(&texture(), &[0u8; 8]).unwrap_err();
        assert!(matches!(err, Error::ImageBufferFailed));
    }

    #[test]
    fn test_write_texture_pngs() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("kosmos.xtx");
        let composite = vec![0u8; 4 * 4 * 4];

        let written = write_texture_pngs(&stem, &texture(), Some(composite.as_slice())).unwrap();
        let names: Vec<_> = written
            .iter()
            .filter_map(|p| p.file_name()?.to_str().map(String::from))
            .collect();
        assert_eq!(
            names,
            [
                "kosmos.xtx_RGB.png",
                "kosmos.xtx_unswizzled.png",
                "kosmos.xtx_palette.png"
            ]
        );
        let png = std::fs::read(&written[0]).unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let written = write_texture_pngs(&stem, &texture(), None).unwrap();
        assert_eq!(written.len(), 2);
    }
}
