//! Public data structures shared by the decoders and exporters.

use std::hash::{Hash, Hasher};

/// Joint slot value meaning "no influence".
pub const JOINT_UNUSED: i16 = -1;

/// A decoded vertex.
///
/// Equality and hashing compare raw bit patterns, so two vertices are the
/// same pool entry only when every field is bit-identical.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
    pub weights: [f32; 4],
    pub joints: [i16; 4],
}

impl Vertex {
    fn float_bits(&self) -> [u32; 16] {
        let mut bits = [0u32; 16];
        let floats = self
            .position
            .iter()
            .chain(&self.normal)
            .chain(&self.uv)
            .chain(&self.color)
            .chain(&self.weights);
        for (slot, value) in bits.iter_mut().zip(floats) {
            *slot = value.to_bits();
        }
        bits
    }

    /// A vertex with every weight slot set to "no influence".
    #[must_use]
    pub fn unweighted() -> Self {
        Self {
            joints: [JOINT_UNUSED; 4],
            ..Self::default()
        }
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.float_bits() == other.float_bits() && self.joints == other.joints
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.float_bits().hash(state);
        self.joints.hash(state);
    }
}

/// A triangle referencing the model's vertex pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub indices: [usize; 3],
    pub material: usize,
}

/// Base colors carried by a mesh header or a full material block.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialColor {
    pub colors: [[f32; 4]; 3],
}

impl MaterialColor {
    /// The diffuse color used by the exporters.
    #[must_use]
    pub fn diffuse(&self) -> [f32; 4] {
        self.colors[0]
    }

    fn bits(&self) -> [[u32; 4]; 3] {
        self.colors.map(|c| c.map(f32::to_bits))
    }
}

/// Texture rectangle in texels of the index canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TexelRect {
    pub umin: u32,
    pub umax: u32,
    pub vmin: u32,
    pub vmax: u32,
}

impl TexelRect {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.umin >= self.umax || self.vmin >= self.vmax
    }
}

/// Texture rectangle normalized to `[0, 1]`, with V measured from the bottom.
#[derive(Debug, Clone, Copy, Default)]
pub struct UvRect {
    pub umin: f32,
    pub umax: f32,
    pub vmin: f32,
    pub vmax: f32,
}

impl UvRect {
    fn bits(&self) -> [u32; 4] {
        [self.umin, self.umax, self.vmin, self.vmax].map(f32::to_bits)
    }
}

/// A decoded material.
#[derive(Debug, Clone, Copy, Default)]
pub struct Material {
    pub rect: TexelRect,
    pub uv: UvRect,
    /// Palette block origin on the swizzled canvas.
    pub palx: u32,
    pub paly: u32,
    pub color: MaterialColor,
    pub has_texture: bool,
    /// Raw palette selector; 0xFF means direct RGBA.
    pub palette: u8,
}

impl Material {
    /// Selector value for materials that sample RGBA directly.
    pub const DIRECT_RGBA: u8 = 0xFF;

    #[must_use]
    pub fn is_indexed(&self) -> bool {
        self.palette != Self::DIRECT_RGBA
    }
}

impl PartialEq for Material {
    fn eq(&self, other: &Self) -> bool {
        self.rect == other.rect
            && self.uv.bits() == other.uv.bits()
            && self.palx == other.palx
            && self.paly == other.paly
            && self.color.bits() == other.color.bits()
            && self.has_texture == other.has_texture
            && self.palette == other.palette
    }
}

impl Eq for Material {}

impl Hash for Material {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rect.hash(state);
        self.uv.bits().hash(state);
        self.palx.hash(state);
        self.paly.hash(state);
        self.color.bits().hash(state);
        self.has_texture.hash(state);
        self.palette.hash(state);
    }
}

/// A decoded XTX texture page.
#[derive(Debug, Clone, Default)]
pub struct Texture {
    /// Index-canvas width (bytes per row of the unswizzled canvas).
    pub width: u32,
    /// Index-canvas height.
    pub height: u32,
    /// Swizzled RGBA canvas, `width / 2` by `height / 2` pixels.
    pub rgb: Vec<u8>,
    /// Unswizzled 8-bit index canvas, `width` by `height`.
    pub unswizzled: Vec<u8>,
    /// Furthest used column/row, in index-canvas units.
    pub max_x: u32,
    pub max_y: u32,
}

impl Texture {
    /// Row stride of the RGBA canvas in pixels.
    #[must_use]
    pub fn rgba_stride(&self) -> u32 {
        self.width / 2
    }

    /// Dimensions used to normalize material rectangles.
    #[must_use]
    pub fn normalization_extent(&self) -> (f32, f32) {
        (self.width as f32, self.max_y as f32)
    }
}
