//! Material records: bit-packed UV rectangles and palette selectors.
//!
//! The UV record is 16 bytes whose first byte selects the bit layout. Fields
//! are decoded by pure accessors over the raw bytes instead of overlaying
//! bitfield structs.

use super::header::read_material_color;
use crate::diagnostics::{Anomaly, Diagnostics};
use crate::model::{Material, MaterialColor, TexelRect, Texture, UvRect};

/// Normalization extent used when no texture is loaded.
const DEFAULT_EXTENT: (f32, f32) = (1024.0, 256.0);

/// Bit layout of a UV record, selected by its type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvLayout {
    Textureless,
    TypeFF,
    Type0A,
}

impl UvLayout {
    /// Map a type byte to its layout; `None` for unrecognized bytes.
    #[must_use]
    pub fn from_kind(kind: u8) -> Option<Self> {
        match kind {
            0x00 => Some(Self::Textureless),
            0xFF => Some(Self::TypeFF),
            0x0A => Some(Self::Type0A),
            _ => None,
        }
    }
}

/// Raw 16-byte UV record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UvInfo {
    raw: [u8; 16],
}

impl UvInfo {
    /// Build from a slice; short slices are zero padded.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 16];
        let n = bytes.len().min(16);
        raw[..n].copy_from_slice(&bytes[..n]);
        Self { raw }
    }

    #[must_use]
    pub fn kind(&self) -> u8 {
        self.raw[0]
    }

    #[must_use]
    pub fn layout(&self) -> Option<UvLayout> {
        UvLayout::from_kind(self.kind())
    }

    fn byte(&self, i: usize) -> u32 {
        u32::from(self.raw[i])
    }

    // 0xFF layout

    fn ff_w(&self) -> u32 {
        self.byte(1) & 0xF
    }

    fn ff_x1(&self) -> u32 {
        (self.byte(2) >> 3) & 1
    }

    fn ff_x(&self) -> u32 {
        self.byte(2) >> 4
    }

    fn ff_h(&self) -> u32 {
        self.byte(3) >> 4
    }

    fn ff_y1(&self) -> u32 {
        self.byte(4) >> 7
    }

    fn ff_y(&self) -> u32 {
        self.byte(5) & 0xF
    }

    // 0x0A layout

    fn a_x(&self) -> u32 {
        self.byte(1) & 0x3F
    }

    fn a_x2(&self) -> u32 {
        self.byte(1) >> 6
    }

    fn a_x1(&self) -> u32 {
        self.byte(2)
    }

    fn a_y(&self) -> u32 {
        self.byte(3)
    }

    fn a_y2(&self) -> u32 {
        self.byte(4) >> 2
    }

    fn a_y1(&self) -> u32 {
        self.byte(5)
    }

    /// Texel rectangle for the given layout.
    #[must_use]
    pub fn rect(&self, layout: UvLayout) -> TexelRect {
        match layout {
            UvLayout::Textureless => TexelRect::default(),
            UvLayout::TypeFF => {
                let umin = self.ff_x() * 64 + self.ff_x1() * 32;
                let vmin = self.ff_y() * 64 + self.ff_y1() * 32;
                TexelRect {
                    umin,
                    umax: umin + (self.ff_w() + 1) * 16,
                    vmin,
                    vmax: vmin + (self.ff_h() + 1) * 16,
                }
            }
            UvLayout::Type0A => TexelRect {
                umin: self.a_x() << 4,
                umax: ((self.a_x1() << 2) | self.a_x2()) + 1,
                vmin: self.a_y(),
                vmax: ((self.a_y1() << 6) | self.a_y2()) + 1,
            },
        }
    }
}

/// Raw 16-byte palette record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaletteInfo {
    raw: [u8; 16],
}

impl PaletteInfo {
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 16];
        let n = bytes.len().min(16);
        raw[..n].copy_from_slice(&bytes[..n]);
        Self { raw }
    }

    /// Secondary selector; bit 7 offsets the block by half a row.
    #[must_use]
    pub fn pal2(&self) -> u8 {
        self.raw[4]
    }

    /// Primary selector; 0xFF means direct RGBA.
    #[must_use]
    pub fn pal(&self) -> u8 {
        self.raw[5]
    }

    /// Palette block origin on the swizzled canvas.
    #[must_use]
    pub fn origin(&self) -> (u32, u32) {
        let pal = u32::from(self.pal());
        let hi = pal >> 4;
        let lo = pal & 0xF;
        let extra = u32::from(self.pal2() >> 7);
        let palx = (hi % 2) * 256 + (lo / 2) * 32 + extra * 16;
        let paly = (hi / 2) * 32 + (lo % 2) * 16;
        (palx, paly)
    }
}

/// Material descriptor carried inline in the VIF stream.
#[derive(Debug, Clone, Copy)]
pub enum MaterialBlock {
    Full {
        uv: UvInfo,
        palette: PaletteInfo,
        color: MaterialColor,
    },
    Small {
        uv: UvInfo,
        palette: PaletteInfo,
    },
}

impl MaterialBlock {
    pub const FULL_SIZE: usize = 128;
    pub const SMALL_SIZE: usize = 64;

    /// Dispatch on payload length. Returns `None` for unknown lengths.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let uv = UvInfo::from_slice(bytes.get(16..32)?);
        let palette = PaletteInfo::from_slice(bytes.get(32..48)?);
        match bytes.len() {
            Self::FULL_SIZE => {
                let color = read_material_color(&mut &bytes[64..112]).ok()?;
                Some(Self::Full { uv, palette, color })
            }
            Self::SMALL_SIZE => Some(Self::Small { uv, palette }),
            _ => None,
        }
    }

    #[must_use]
    pub fn uv(&self) -> &UvInfo {
        match self {
            Self::Full { uv, .. } | Self::Small { uv, .. } => uv,
        }
    }

    #[must_use]
    pub fn palette(&self) -> &PaletteInfo {
        match self {
            Self::Full { palette, .. } | Self::Small { palette, .. } => palette,
        }
    }

    /// Colors carried by the block, or `fallback` for small blocks.
    #[must_use]
    pub fn color_or(&self, fallback: MaterialColor) -> MaterialColor {
        match self {
            Self::Full { color, .. } => *color,
            Self::Small { .. } => fallback,
        }
    }
}

/// Decode a material from its UV and palette records.
///
/// Unrecognized UV type bytes fall back to the 0x0A layout and are reported;
/// in strict mode they yield a textureless material instead.
pub fn decode_material(
    uv: &UvInfo,
    palette: &PaletteInfo,
    color: MaterialColor,
    texture: Option<&Texture>,
    diag: &mut Diagnostics,
) -> Material {
    let layout = match uv.layout() {
        Some(layout) => layout,
        None => {
            diag.report(Anomaly::UnrecognizedUvType { kind: uv.kind() });
            if diag.is_strict() {
                UvLayout::Textureless
            } else {
                UvLayout::Type0A
            }
        }
    };

    let rect = uv.rect(layout);
    let has_texture = layout != UvLayout::Textureless;
    let pal = palette.pal();
    let (palx, paly) = palette.origin();

    let (mut width, mut height) = texture.map_or(DEFAULT_EXTENT, Texture::normalization_extent);
    if width <= 0.0 {
        width = DEFAULT_EXTENT.0;
    }
    if height <= 0.0 {
        height = DEFAULT_EXTENT.1;
    }
    let mul = if pal == Material::DIRECT_RGBA { 2.0 } else { 1.0 };

    let uv_rect = UvRect {
        umin: (rect.umin as f32 * mul / width).clamp(0.0, 1.0),
        umax: (rect.umax as f32 * mul / width).clamp(0.0, 1.0),
        vmin: (1.0 - rect.vmax as f32 * mul / height).clamp(0.0, 1.0),
        vmax: (1.0 - rect.vmin as f32 * mul / height).clamp(0.0, 1.0),
    };

    tracing::debug!(
        "material uv=0x{:02x} rect=({}, {}, {}, {}) pal=0x{pal:02x} palx={palx} paly={paly}",
        uv.kind(),
        rect.umin,
        rect.umax,
        rect.vmin,
        rect.vmax
    );

    Material {
        rect,
        uv: uv_rect,
        palx,
        paly,
        color,
        has_texture,
        palette: pal,
    }
}
