//! JNT joint table support
//!
//! A JNT file is a 0x20-byte header, a run of extra `u16` data and a flat
//! array of 0x40-byte joint blocks. Each block names its parent by index;
//! translation blocks (types 3 and 4) carry an offset in their first three
//! floats.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use glam::Vec3;

use crate::error::{Error, Result};
use crate::formats::lex::header::fixed_string;

/// Magic at the start of every JNT file.
pub const JNT_MAGIC: [u8; 4] = *b"JNT\0";

/// Size of the fixed header.
pub const JNT_HEADER_SIZE: usize = 0x20;

/// Size of one joint block.
pub const JNT_BLOCK_SIZE: usize = 0x40;

/// `offset` is measured from this position.
const OFFSET_BASE: u32 = 0x10;

#[derive(Debug, Clone)]
pub struct JntHeader {
    pub magic: [u8; 4],
    pub unk0: u16,
    pub block_count: u16,
    pub pre_blocks: u16,
    pub unk3: u16,
    pub name_blocks: u16,
    pub post_blocks: u16,
    pub offset: u32,
    pub unk6: u16,
    pub unk7: u16,
    pub name: String,
}

impl JntHeader {
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        let unk0 = reader.read_u16::<LittleEndian>()?;
        let block_count = reader.read_u16::<LittleEndian>()?;
        let pre_blocks = reader.read_u16::<LittleEndian>()?;
        let unk3 = reader.read_u16::<LittleEndian>()?;
        let name_blocks = reader.read_u16::<LittleEndian>()?;
        let post_blocks = reader.read_u16::<LittleEndian>()?;
        let offset = reader.read_u32::<LittleEndian>()?;
        let unk6 = reader.read_u16::<LittleEndian>()?;
        let unk7 = reader.read_u16::<LittleEndian>()?;
        let mut name = [0u8; 8];
        reader.read_exact(&mut name)?;

        Ok(Self {
            magic,
            unk0,
            block_count,
            pre_blocks,
            unk3,
            name_blocks,
            post_blocks,
            offset,
            unk6,
            unk7,
            name: fixed_string(&name),
        })
    }
}

/// One joint record.
#[derive(Debug, Clone, Copy, Default)]
pub struct JntBlock {
    pub kind: u16,
    pub unk1: u16,
    pub unk: [u16; 5],
    /// Index of the parent block.
    pub parent: u16,
    pub values: [f32; 12],
}

impl JntBlock {
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let kind = reader.read_u16::<LittleEndian>()?;
        let unk1 = reader.read_u16::<LittleEndian>()?;
        let mut unk = [0u16; 5];
        reader.read_u16_into::<LittleEndian>(&mut unk)?;
        let parent = reader.read_u16::<LittleEndian>()?;
        let mut values = [0f32; 12];
        reader.read_f32_into::<LittleEndian>(&mut values)?;
        Ok(Self {
            kind,
            unk1,
            unk,
            parent,
            values,
        })
    }

    /// Offset applied to the parent's position, if this is a translation.
    #[must_use]
    pub fn translation(&self) -> Option<Vec3> {
        matches!(self.kind, 3 | 4)
            .then(|| Vec3::new(self.values[0], self.values[1], self.values[2]))
    }
}

/// A parsed joint table.
#[derive(Debug, Clone)]
pub struct JntFile {
    pub header: JntHeader,
    pub extra: Vec<u16>,
    pub blocks: Vec<JntBlock>,
}

/// Rendered hierarchy below block 0.
#[derive(Debug, Clone, Default)]
pub struct JointTree {
    pub text: String,
    pub leaves: usize,
    /// Accumulated position of every block reached from the root.
    pub positions: Vec<Vec3>,
}

impl JntFile {
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let header = JntHeader::read(reader)?;
        if header.magic != JNT_MAGIC {
            return Err(Error::malformed(format!(
                "bad JNT magic {:02x?}",
                header.magic
            )));
        }
        let extra_len = header.offset.checked_sub(OFFSET_BASE).ok_or_else(|| {
            Error::malformed(format!("JNT data offset 0x{:x} inside header", header.offset))
        })? as usize;

        let mut extra_bytes = vec![0u8; extra_len];
        reader.read_exact(&mut extra_bytes)?;
        let extra = extra_bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();

        let blocks = (0..header.block_count)
            .map(|_| JntBlock::read(reader))
            .collect::<Result<Vec<_>>>()?;

        let mut trailing = [0u8; 1];
        match reader.read_exact(&mut trailing) {
            Ok(()) if trailing[0] != 0 => {
                return Err(Error::malformed(format!(
                    "JNT: unexpected byte 0x{:02x} after the last block",
                    trailing[0]
                )));
            }
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {}
            Err(e) => return Err(e.into()),
        }

        tracing::debug!(
            "JNT '{}': {} blocks ({} pre, {} name, {} post), {} extra words",
            header.name,
            header.block_count,
            header.pre_blocks,
            header.name_blocks,
            header.post_blocks,
            extra_bytes.len() / 2
        );

        Ok(Self {
            header,
            extra,
            blocks,
        })
    }

    /// Sum of every translation block's offset.
    #[must_use]
    pub fn total_translation(&self) -> Vec3 {
        self.blocks.iter().filter_map(JntBlock::translation).sum()
    }

    /// Render the hierarchy rooted at block 0 as indented text.
    #[must_use]
    pub fn render_tree(&self) -> JointTree {
        let mut tree = JointTree {
            positions: vec![Vec3::ZERO; self.blocks.len()],
            ..JointTree::default()
        };
        if self.blocks.is_empty() {
            return tree;
        }
        let mut visited = vec![false; self.blocks.len()];
        let mut lines = Vec::new();
        self.render_node(0, &mut lines, &mut visited, &mut tree);
        tree
    }

    fn children(&self, root: usize) -> impl Iterator<Item = usize> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .filter(move |&(i, b)| i != root && usize::from(b.parent) == root)
            .map(|(i, _)| i)
    }

    fn render_node(
        &self,
        root: usize,
        lines: &mut Vec<bool>,
        visited: &mut [bool],
        tree: &mut JointTree,
    ) {
        visited[root] = true;
        let children: Vec<usize> = self.children(root).collect();
        if children.is_empty() {
            tree.leaves += 1;
        }

        let depth = lines.len();
        for (n, &i) in children.iter().enumerate() {
            if visited[i] {
                continue;
            }
            let block = &self.blocks[i];
            lines.push(n + 1 < children.len());

            for &open in &lines[..depth] {
                tree.text.push_str(if open { "|  " } else { "   " });
            }
            let _ = write!(tree.text, "L_{i:2x}: {} {}", block.kind, block.unk1);

            let base = tree.positions[root];
            tree.positions[i] = match block.translation() {
                Some(offset) => {
                    let pos = base + offset;
                    let arrow = if block.kind == 3 { " => " } else { "   => " };
                    let _ = write!(tree.text, "{arrow}{:.6} {:.6} {:.6}", pos.x, pos.y, pos.z);
                    pos
                }
                None => base,
            };
            tree.text.push('\n');

            self.render_node(i, lines, visited, tree);
            lines.pop();
        }
    }
}

/// Open and parse a JNT file from disk.
pub fn read_jnt<P: AsRef<Path>>(path: P) -> Result<JntFile> {
    let file = File::open(path.as_ref())?;
    tracing::info!("Reading JNT {}", path.as_ref().display());
    JntFile::read(&mut BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn header(block_count: u16, offset: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"JNT\0");
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&block_count.to_le_bytes());
        data.extend_from_slice(&[0u8; 8]);
        data.extend_from_slice(&offset.to_le_bytes());
        data.extend_from_slice(&[0u8; 4]);
        data.extend_from_slice(b"skel\0\0\0\0");
        data
    }

    fn block(kind: u16, parent: u16, offset: [f32; 3]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&kind.to_le_bytes());
        data.extend_from_slice(&[0u8; 12]);
        data.extend_from_slice(&parent.to_le_bytes());
        for f in offset.into_iter().chain(std::iter::repeat_n(0.0, 9)) {
            data.extend_from_slice(&f.to_le_bytes());
        }
        data
    }

    fn sample() -> Vec<u8> {
        let mut data = header(4, 0x14);
        data.extend_from_slice(&[1, 0, 2, 0]);
        data.extend(block(1, 0, [0.0; 3]));
        data.extend(block(3, 0, [1.0, 0.0, 0.0]));
        data.extend(block(4, 1, [0.0, 2.0, 0.0]));
        data.extend(block(2, 0, [0.0; 3]));
        data
    }

    #[test]
    fn test_parse_blocks() {
        let jnt = JntFile::read(&mut sample().as_slice()).unwrap();
        assert_eq!(jnt.header.name, "skel");
        assert_eq!(jnt.extra, vec![1, 2]);
        assert_eq!(jnt.blocks.len(), 4);
        assert_eq!(jnt.blocks[2].parent, 1);
        assert_eq!(jnt.total_translation(), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_render_tree() {
        let jnt = JntFile::read(&mut sample().as_slice()).unwrap();
        let tree = jnt.render_tree();

        let expected = "\
L_ 1: 3 0 => 1.000000 0.000000 0.000000
|  L_ 2: 4 0   => 1.000000 2.000000 0.000000
L_ 3: 2 0
";
        assert_eq!(tree.text, expected);
        assert_eq!(tree.leaves, 2);
        assert_eq!(tree.positions[2], Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(tree.positions[3], Vec3::ZERO);
    }

    #[test]
    fn test_offset_inside_header() {
        let data = header(0, 0x08);
        let err = JntFile::read(&mut data.as_slice()).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { .. }));
    }

    #[test]
    fn test_trailing_byte() {
        let mut data = sample();
        data.push(0);
        assert!(JntFile::read(&mut data.as_slice()).is_ok());

        let mut data = sample();
        data.push(7);
        let err = JntFile::read(&mut data.as_slice()).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { .. }));
    }

    #[test]
    fn test_parent_cycle_terminates() {
        let mut data = header(2, 0x10);
        data.extend(block(1, 1, [0.0; 3]));
        data.extend(block(1, 0, [0.0; 3]));
        let tree = JntFile::read(&mut data.as_slice()).unwrap().render_tree();
        assert_eq!(tree.text, "L_ 1: 1 0\n");
    }
}
