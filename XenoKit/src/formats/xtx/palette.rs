//! Palette extraction and compositing.

use std::collections::HashSet;

use crate::diagnostics::{Anomaly, Diagnostics};
use crate::error::{Error, Result};
use crate::model::{Material, Model, Texture};

/// Entries in one palette block.
pub const PALETTE_LEN: usize = 256;

/// One RGBA palette entry.
pub type Rgba = [u8; 4];

/// Read the 16x16 palette block at `(palx, paly)` of the swizzled canvas.
///
/// The CSM1 storage order swaps entries 8..16 and 16..24 of every group of
/// 32. Pixels outside `rgb` read as transparent black.
#[must_use]
pub fn extract_palette(rgb: &[u8], palx: u32, paly: u32, stride: u32) -> [Rgba; PALETTE_LEN] {
    let mut palette = [[0u8; 4]; PALETTE_LEN];
    for (i, entry) in palette.iter_mut().enumerate() {
        let x = palx as usize + i % 16;
        let y = paly as usize + i / 16;
        let offset = (y * stride as usize + x) * 4;
        if let Some(px) = rgb.get(offset..offset + 4) {
            entry.copy_from_slice(px);
        }
    }
    for i in 0..8 {
        for j in 0..8 {
            palette.swap(i * 32 + 8 + j, i * 32 + 16 + j);
        }
    }
    palette
}

/// Composite every indexed material's rectangle into a `width` x `height`
/// RGBA canvas.
///
/// Texels claimed by two different materials are reported as
/// [`Anomaly::PaletteOverlap`] (once per material pair), even when both
/// share a palette, and the later material wins. In strict mode the first such texel fails with
/// [`Error::OverlapConflict`].
pub fn apply_palettes(texture: &Texture, model: &Model, diag: &mut Diagnostics) -> Result<Vec<u8>> {
    let width = texture.width as usize;
    let height = texture.height as usize;
    let mut out = vec![0u8; width * height * 4];
    let mut owner: Vec<Option<(usize, u8)>> = vec![None; width * height];
    let mut reported = HashSet::new();

    for (index, material) in model.materials().iter().enumerate() {
        if !material.is_indexed() {
            continue;
        }
        composite(
            texture,
            index,
            material,
            &mut out,
            &mut owner,
            &mut reported,
            diag,
        )?;
    }
    Ok(out)
}

fn composite(
    texture: &Texture,
    index: usize,
    material: &Material,
    out: &mut [u8],
    owner: &mut [Option<(usize, u8)>],
    reported: &mut HashSet<(usize, usize)>,
    diag: &mut Diagnostics,
) -> Result<()> {
    let palette = extract_palette(
        &texture.rgb,
        material.palx,
        material.paly,
        texture.rgba_stride(),
    );
    tracing::debug!(
        "material {index}: palette 0x{:02x} at ({}, {})",
        material.palette,
        material.palx,
        material.paly
    );

    let rect = material.rect;
    for v in rect.vmin..rect.vmax.min(texture.height) {
        for u in rect.umin..rect.umax.min(texture.width) {
            let offset = v as usize * texture.width as usize + u as usize;

            let claimed = owner[offset]
                .filter(|&(old, old_palette)| old != index || old_palette != material.palette);
            if let Some((old, _)) = claimed {
                if diag.is_strict() {
                    return Err(Error::OverlapConflict {
                        u,
                        v,
                        new: index,
                        old,
                    });
                }
                if reported.insert((index, old)) {
                    diag.report(Anomaly::PaletteOverlap {
                        u,
                        v,
                        new: index,
                        old,
                    });
                }
            }

            owner[offset] = Some((index, material.palette));
            let texel = texture.unswizzled.get(offset).copied().unwrap_or(0);
            out[offset * 4..offset * 4 + 4].copy_from_slice(&palette[usize::from(texel)]);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::lex::PaletteInfo;
    use crate::model::TexelRect;
    use crate::options::DecodeOptions;
    use pretty_assertions::assert_eq;

    /// 64x64 index canvas, 32x32 RGBA canvas whose pixel i holds (i, i>>8, 0, 0x80).
    fn texture() -> Texture {
        let rgb = (0..32 * 32u32)
            .flat_map(|i| [i as u8, (i >> 8) as u8, 0, 0x80])
            .collect();
        Texture {
            width: 64,
            height: 64,
            rgb,
            unswizzled: (0..64 * 64u32).map(|i| (i % 256) as u8).collect(),
            max_x: 64,
            max_y: 64,
        }
    }

    fn indexed(palette: u8, rect: TexelRect) -> Material {
        let (palx, paly) = PaletteInfo::from_slice(&[0, 0, 0, 0, 0, palette]).origin();
        Material {
            rect,
            palx,
            paly,
            palette,
            has_texture: true,
            ..Material::default()
        }
    }

    fn rect(umin: u32, umax: u32, vmin: u32, vmax: u32) -> TexelRect {
        TexelRect {
            umin,
            umax,
            vmin,
            vmax,
        }
    }

    #[test]
    fn test_extract_palette_swaps_columns() {
        let tex = texture();
        let palette = extract_palette(&tex.rgb, 0, 0, tex.rgba_stride());
        // entry 0 is pixel (0, 0)
        assert_eq!(palette[0], [0, 0, 0, 0x80]);
        // entry 8 is entry 16 of the raw block: pixel (0, 1)
        assert_eq!(palette[8], [32, 0, 0, 0x80]);
        assert_eq!(palette[16], [8, 0, 0, 0x80]);
        // entry 24 is not swapped: pixel (8, 1)
        assert_eq!(palette[24], [40, 0, 0, 0x80]);
    }

    #[test]
    fn test_composite_writes_palette_colors() {
        let tex = texture();
        let mut model = Model::new();
        model.add_material(indexed(0x00, rect(0, 4, 0, 2)));

        let out = apply_palettes(&tex, &model, &mut Diagnostics::default()).unwrap();
        assert_eq!(out.len(), 64 * 64 * 4);
        // texel (1, 0) has index 1 -> palette entry 1 -> pixel (1, 0)
        assert_eq!(&out[4..8], &[1, 0, 0, 0x80]);
        // outside the rectangle stays empty
        assert_eq!(&out[4 * 4..5 * 4], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_direct_materials_are_skipped() {
        let tex = texture();
        let mut model = Model::new();
        model.add_material(indexed(Material::DIRECT_RGBA, rect(0, 4, 0, 4)));

        let out = apply_palettes(&tex, &model, &mut Diagnostics::default()).unwrap();
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_overlap_tolerant_and_strict() {
        let tex = texture();
        let mut model = Model::new();
        model.add_material(indexed(0x00, rect(0, 8, 0, 8)));
        model.add_material(indexed(0x01, rect(4, 12, 4, 12)));

        let mut diag = Diagnostics::default();
        let out = apply_palettes(&tex, &model, &mut diag).unwrap();
        assert_eq!(
            diag.anomalies(),
            &[Anomaly::PaletteOverlap {
                u: 4,
                v: 4,
                new: 1,
                old: 0
            }]
        );
        // later writer wins: palette 0x01 starts at (0, 16)
        let offset = (4 * 64 + 4) * 4;
        let expected = extract_palette(&tex.rgb, 0, 16, 32)[usize::from(tex.unswizzled[4 * 64 + 4])];
        assert_eq!(&out[offset..offset + 4], &expected);

        let mut diag = Diagnostics::new(DecodeOptions::strict());
        let err = apply_palettes(&tex, &model, &mut diag).unwrap_err();
        assert!(matches!(err, Error::OverlapConflict { u: 4, v: 4, new: 1, old: 0 }));
    }

    #[test]
    fn test_overlap_with_shared_palette() {
        let tex = texture();
        let mut model = Model::new();
        model.add_material(indexed(0x00, rect(0, 8, 0, 8)));
        model.add_material(indexed(0x00, rect(4, 12, 0, 8)));
        assert_eq!(model.materials().len(), 2);

        let mut diag = Diagnostics::default();
        apply_palettes(&tex, &model, &mut diag).unwrap();
        assert_eq!(
            diag.anomalies(),
            &[Anomaly::PaletteOverlap {
                u: 4,
                v: 0,
                new: 1,
                old: 0
            }]
        );

        let mut diag = Diagnostics::new(DecodeOptions::strict());
        let err = apply_palettes(&tex, &model, &mut diag).unwrap_err();
        assert!(matches!(err, Error::OverlapConflict { u: 4, v: 0, new: 1, old: 0 }));
    }

    #[test]
    fn test_rectangle_clipped_to_canvas() {
        let tex = texture();
        let mut model = Model::new();
        model.add_material(indexed(0x00, rect(60, 80, 60, 80)));
        let out = apply_palettes(&tex, &model, &mut Diagnostics::default()).unwrap();
        assert_eq!(out.len(), 64 * 64 * 4);
    }
}
