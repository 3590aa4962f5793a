//! XTX texture page support
//!
//! An XTX file holds several RGBA sub-images that together form one GS
//! texture page. Sub-images are placed at their block origin on a shared
//! canvas which is then reinterpreted as swizzled 8-bit indices; the
//! palettes live on the same canvas.

mod palette;
mod swizzle;

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};
use crate::model::Texture;

pub use palette::{PALETTE_LEN, Rgba, apply_palettes, extract_palette};
pub use swizzle::{source_index, unswizzle8};

/// Magic at the start of every XTX file.
pub const XTX_MAGIC: [u8; 4] = *b"XTX\0";

/// Size of one image descriptor.
pub const DESCRIPTOR_SIZE: usize = 20;

/// Size of the opaque header preceding each sub-image's pixels.
pub const SUB_HEADER_SIZE: usize = 32;

/// Bytes per GS block; sub-image offsets are given in these units.
const BLOCK_BYTES: u32 = 4096;

#[derive(Debug, Clone)]
pub struct XtxHeader {
    pub magic: [u8; 4],
    pub size: u32,
    pub count: u32,
    pub img_header_addr: u32,
}

impl XtxHeader {
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        Ok(Self {
            magic,
            size: reader.read_u32::<LittleEndian>()?,
            count: reader.read_u32::<LittleEndian>()?,
            img_header_addr: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// Placement record for one sub-image.
#[derive(Debug, Clone, Copy)]
pub struct ImageDescriptor {
    pub width: u16,
    pub buffer_width: u16,
    pub height: u16,
    /// Destination offset in bytes; divided into 4 KiB blocks.
    pub offset: u32,
    pub size: u32,
    pub addr: u32,
}

impl ImageDescriptor {
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let width = reader.read_u16::<LittleEndian>()?;
        let buffer_width = reader.read_u16::<LittleEndian>()?;
        let height = reader.read_u16::<LittleEndian>()?;
        let _pad = reader.read_u16::<LittleEndian>()?;
        Ok(Self {
            width,
            buffer_width,
            height,
            offset: reader.read_u32::<LittleEndian>()?,
            size: reader.read_u32::<LittleEndian>()?,
            addr: reader.read_u32::<LittleEndian>()?,
        })
    }

    /// Top-left corner on the RGBA canvas, in pixels.
    #[must_use]
    pub fn origin(&self, buffer_width: u16) -> (u32, u32) {
        let block = self.offset / BLOCK_BYTES;
        let per_row = u32::from(buffer_width / 2);
        ((block % per_row) * 64, (block / per_row) * 32)
    }
}

/// Canvas geometry selected by the buffer width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageLayout {
    /// Index canvas edge.
    size: u32,
    /// RGBA row stride in pixels.
    stride: u32,
}

impl PageLayout {
    fn for_buffer_width(width: u16) -> Result<Self> {
        match width {
            0 | 8 => Ok(Self {
                size: 1024,
                stride: 512,
            }),
            4 => Ok(Self {
                size: 512,
                stride: 256,
            }),
            other => Err(Error::UnsupportedBufferWidth { width: other }),
        }
    }
}

/// Decode an XTX file into a texture page.
pub fn decode_xtx<R: Read + Seek>(reader: &mut R) -> Result<Texture> {
    reader.seek(SeekFrom::Start(0))?;
    let header = XtxHeader::read(reader)?;
    if header.magic != XTX_MAGIC {
        return Err(Error::malformed(format!("bad XTX magic {:02x?}", header.magic)));
    }
    tracing::debug!(
        "XTX: size={} count={} descriptors at 0x{:x}",
        header.size,
        header.count,
        header.img_header_addr
    );

    reader.seek(SeekFrom::Start(u64::from(header.img_header_addr)))?;
    let descriptors = (0..header.count)
        .map(|_| ImageDescriptor::read(reader))
        .collect::<Result<Vec<_>>>()?;

    let buffer_width = descriptors.first().map_or(0, |d| d.buffer_width);
    if let Some((index, d)) = descriptors
        .iter()
        .enumerate()
        .find(|(_, d)| d.buffer_width != buffer_width)
    {
        return Err(Error::BufferWidthMismatch {
            index,
            expected: buffer_width,
            found: d.buffer_width,
        });
    }
    let layout = PageLayout::for_buffer_width(buffer_width)?;
    let buffer_width = if buffer_width == 0 { 8 } else { buffer_width };

    let mut texture = Texture {
        width: layout.size,
        height: layout.size,
        rgb: vec![0u8; (layout.size * layout.size) as usize],
        ..Texture::default()
    };
    let rows = layout.size / 2;

    for (index, desc) in descriptors.iter().enumerate() {
        let (x0, y0) = desc.origin(buffer_width);
        let (w, h) = (u32::from(desc.width), u32::from(desc.height));
        tracing::debug!(
            "XTX image {index}: {w}x{h} offset=0x{:x} size=0x{:x} at ({x0}, {y0})",
            desc.offset,
            desc.size
        );
        if x0 + w > layout.stride || y0 + h > rows {
            return Err(Error::malformed(format!(
                "XTX image {index} ({w}x{h} at {x0},{y0}) exceeds the {}x{rows} canvas",
                layout.stride
            )));
        }

        reader.seek(SeekFrom::Start(
            u64::from(desc.addr) + SUB_HEADER_SIZE as u64,
        ))?;
        let mut pixels = vec![0u8; (w * h * 4) as usize];
        reader.read_exact(&mut pixels)?;

        if w > 0 {
            for (y, row) in pixels.chunks_exact((w * 4) as usize).enumerate() {
                let dst = (((y0 + y as u32) * layout.stride + x0) * 4) as usize;
                texture.rgb[dst..dst + row.len()].copy_from_slice(row);
            }
        }

        texture.max_x = texture.max_x.max((x0 + w) * 2);
        texture.max_y = texture.max_y.max((y0 + h) * 2);
    }

    texture.unswizzled = unswizzle8(
        &texture.rgb,
        texture.width as usize,
        texture.height as usize,
    );
    tracing::info!(
        "XTX: {} images, used area {}x{}",
        descriptors.len(),
        texture.max_x,
        texture.max_y
    );
    Ok(texture)
}

/// Open and decode an XTX file from disk.
pub fn read_xtx<P: AsRef<Path>>(path: P) -> Result<Texture> {
    let file = File::open(path.as_ref())?;
    tracing::info!("Reading XTX {}", path.as_ref().display());
    decode_xtx(&mut BufReader::new(file))
}
