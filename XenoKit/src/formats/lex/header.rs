//! LEX file and mesh header parsing.

use std::io::{Cursor, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use super::material::{PaletteInfo, UvInfo};
use crate::error::{Error, Result};
use crate::model::MaterialColor;

/// Size of the fixed file header.
pub const LEX_HEADER_SIZE: usize = 0xB0;

/// Size of a per-mesh header.
pub const MESH_HEADER_SIZE: usize = 0x190;

/// Entries in a mesh's local joint table.
pub const JOINT_TABLE_LEN: usize = 32;

/// Axis-aligned bounds as stored in LEX headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bounds {
    pub max: [f32; 3],
    pub min: [f32; 3],
    pub origin: [f32; 3],
}

impl Bounds {
    fn read(c: &mut Cursor<&[u8]>) -> Result<Self> {
        let mut read_vec = |c: &mut Cursor<&[u8]>| -> Result<[f32; 3]> {
            let mut v = [0f32; 4];
            c.read_f32_into::<LittleEndian>(&mut v)?;
            Ok([v[0], v[1], v[2]])
        };
        Ok(Self {
            max: read_vec(c)?,
            min: read_vec(c)?,
            origin: read_vec(c)?,
        })
    }
}

/// The fixed header at the start of every LEX file.
#[derive(Debug, Clone)]
pub struct LexHeader {
    pub magic: [u8; 4],
    name: [u8; 32],
    artist: [u8; 15],
    pub nmatrix: u32,
    pub nmesh: u32,
    /// Absolute section addresses; `addr[0]` holds the matrix table.
    pub addr: [u32; 5],
    pub bounds: Bounds,
}

impl LexHeader {
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let mut buf = [0u8; LEX_HEADER_SIZE];
        reader.read_exact(&mut buf)?;
        let mut c = Cursor::new(&buf[..]);

        let mut magic = [0u8; 4];
        c.read_exact(&mut magic)?;

        let mut name = [0u8; 32];
        c.set_position(0x10);
        c.read_exact(&mut name)?;
        let mut artist = [0u8; 15];
        c.read_exact(&mut artist)?;

        c.set_position(0x40);
        let nmatrix = c.read_u32::<LittleEndian>()?;
        let nmesh = c.read_u32::<LittleEndian>()?;

        c.set_position(0x50);
        let mut addr = [0u32; 5];
        c.read_u32_into::<LittleEndian>(&mut addr)?;

        c.set_position(0x70);
        let bounds = Bounds::read(&mut c)?;

        Ok(Self {
            magic,
            name,
            artist,
            nmatrix,
            nmesh,
            addr,
            bounds,
        })
    }

    /// The model name: the stored name without its leading marker byte.
    #[must_use]
    pub fn model_name(&self) -> String {
        let mut raw = [0u8; 32];
        raw[..31].copy_from_slice(&self.name[1..]);
        raw[31] = self.artist[0];
        fixed_string(&raw)
    }

    #[must_use]
    pub fn artist(&self) -> String {
        fixed_string(&self.artist)
    }
}

/// A per-mesh header located through the mesh address table.
#[derive(Debug, Clone)]
pub struct MeshHeader {
    pub bone_name: String,
    pub weight_format: u32,
    pub data_offset: u32,
    pub data_len: u32,
    pub bone_idx: u32,
    /// Local joint table; weight indices resolve through `joint_table[local + 1]`.
    pub joint_table: [u16; JOINT_TABLE_LEN],
    pub bounds: Bounds,
    pub vertex_format: u8,
    pub color: MaterialColor,
    pub palette: PaletteInfo,
    pub uv: UvInfo,
    pub group_name: String,
    pub material_name: String,
}

impl MeshHeader {
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; MESH_HEADER_SIZE];
        reader.read_exact(&mut buf)?;
        let mut c = Cursor::new(&buf[..]);

        let bone_name = fixed_string(&buf[0x00..0x20]);

        c.set_position(0x20);
        let weight_format = c.read_u32::<LittleEndian>()?;
        let data_offset = c.read_u32::<LittleEndian>()?;
        let data_len = c.read_u32::<LittleEndian>()?;
        let bone_idx = c.read_u32::<LittleEndian>()?;

        let mut joint_table = [0u16; JOINT_TABLE_LEN];
        c.read_u16_into::<LittleEndian>(&mut joint_table)?;

        c.set_position(0x70);
        let bounds = Bounds::read(&mut c)?;

        let vertex_format = buf[0xC0];

        c.set_position(0xD0);
        let color = read_material_color(&mut c)?;

        let palette = PaletteInfo::from_slice(&buf[0x120..0x130]);
        let uv = UvInfo::from_slice(&buf[0x130..0x140]);

        Ok(Self {
            bone_name,
            weight_format,
            data_offset,
            data_len,
            bone_idx,
            joint_table,
            bounds,
            vertex_format,
            color,
            palette,
            uv,
            group_name: fixed_string(&buf[0x150..0x170]),
            material_name: fixed_string(&buf[0x170..0x190]),
        })
    }

    /// Absolute offset one past the mesh's VIF data.
    pub fn data_end(&self, mesh_addr: u32) -> Result<u64> {
        u64::from(mesh_addr)
            .checked_add(u64::from(self.data_offset))
            .and_then(|v| v.checked_add(u64::from(self.data_len)))
            .ok_or_else(|| Error::malformed("mesh data range overflows"))
    }
}

/// Read three RGBA float vectors.
pub(crate) fn read_material_color<R: Read>(reader: &mut R) -> Result<MaterialColor> {
    let mut color = MaterialColor::default();
    for c in &mut color.colors {
        reader.read_f32_into::<LittleEndian>(c)?;
    }
    Ok(color)
}

/// Decode a NUL-terminated fixed-width string.
pub(crate) fn fixed_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_string() {
        assert_eq!(fixed_string(b"body\0junk"), "body");
        assert_eq!(fixed_string(b"full"), "full");
    }

    #[test]
    fn test_model_name_skips_marker() {
        let mut buf = vec![0u8; LEX_HEADER_SIZE];
        buf[..4].copy_from_slice(b"lex\0");
        buf[0x10..0x16].copy_from_slice(b"_kosmo");
        buf[0x44..0x48].copy_from_slice(&2u32.to_le_bytes());

        let header = LexHeader::read(&mut Cursor::new(buf)).unwrap();
        assert_eq!(header.model_name(), "kosmo");
        assert_eq!(header.nmesh, 2);
    }

    #[test]
    fn test_mesh_header_fields() {
        let mut buf = vec![0u8; MESH_HEADER_SIZE];
        buf[..4].copy_from_slice(b"hips");
        buf[0x20..0x24].copy_from_slice(&1u32.to_le_bytes());
        buf[0x24..0x28].copy_from_slice(&0x190u32.to_le_bytes());
        buf[0x28..0x2C].copy_from_slice(&0x40u32.to_le_bytes());
        buf[0x32..0x34].copy_from_slice(&0x0102u16.to_le_bytes());
        buf[0xC0] = 0x12;
        buf[0xD0..0xD4].copy_from_slice(&0.5f32.to_le_bytes());
        buf[0x130] = 0xFF;
        buf[0x150..0x155].copy_from_slice(b"torso");

        let header = MeshHeader::read(&mut buf.as_slice()).unwrap();
        assert_eq!(header.bone_name, "hips");
        assert_eq!(header.weight_format, 1);
        assert_eq!(header.joint_table[1], 0x0102);
        assert_eq!(header.vertex_format, 0x12);
        assert_eq!(header.color.colors[0][0], 0.5);
        assert_eq!(header.uv.kind(), 0xFF);
        assert_eq!(header.group_name, "torso");
        assert_eq!(header.data_end(0x1000).unwrap(), 0x1000 + 0x190 + 0x40);
    }
}
