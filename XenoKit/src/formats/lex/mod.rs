//! LEX mesh container support
//!
//! A LEX file holds a header, a table of mesh addresses and, per mesh, a
//! header followed by a VIF command stream. The stream carries vertex data
//! in UNPACK blocks and inline material descriptors.
//!
//! # Example
//!
//! ```no_run
//! use xenokit::formats::lex::read_lex;
//! use xenokit::{Diagnostics, Model};
//!
//! let mut model = Model::new();
//! let mut diag = Diagnostics::default();
//! let summary = read_lex("kosmos.lex", &mut model, None, &mut diag)?;
//! println!("{} triangles", summary.triangles);
//! # Ok::<(), xenokit::Error>(())
//! ```

pub mod header;
pub mod material;
pub mod mesh;
pub mod reader;
pub mod vif;

pub use header::{LexHeader, MeshHeader};
pub use material::{MaterialBlock, PaletteInfo, UvInfo, UvLayout, decode_material};
pub use reader::{LEX_MAGIC, LexSummary, decode_lex, read_lex};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::error::Error;
    use crate::model::Model;
    use std::io::Cursor;

    const MESH_ADDR: usize = 0x100;
    const DATA_OFFSET: usize = 0x190;

    fn command(imm: u16, num: u8, cmd: u8) -> [u8; 4] {
        let imm = imm.to_le_bytes();
        [imm[0], imm[1], num, cmd]
    }

    /// One mesh, format 0x10, three vertices, unweighted, textureless.
    fn build_lex(stream: &[u8], name: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; MESH_ADDR + DATA_OFFSET];
        data[..4].copy_from_slice(b"lex\0");
        data[0x10..0x10 + name.len()].copy_from_slice(name);
        data[0x44..0x48].copy_from_slice(&1u32.to_le_bytes());
        data[0xB0..0xB4].copy_from_slice(&(MESH_ADDR as u32).to_le_bytes());

        let mesh = &mut data[MESH_ADDR..];
        mesh[..4].copy_from_slice(b"root");
        mesh[0x24..0x28].copy_from_slice(&(DATA_OFFSET as u32).to_le_bytes());
        mesh[0x28..0x2C].copy_from_slice(&(stream.len() as u32).to_le_bytes());
        mesh[0xC0] = 0x10;
        mesh[0x150..0x154].copy_from_slice(b"body");

        data.extend_from_slice(stream);
        data
    }

    fn triangle_stream() -> Vec<u8> {
        let mut s = Vec::new();
        s.extend(command(0x8000, 4, 0x6C));
        let mut block = [0u8; 16];
        block[0] = 3;
        block[4] = 0x10;
        s.extend(block);
        for (x, y) in [(0.0f32, 0.0f32), (1.0, 0.0), (0.0, 1.0)] {
            for f in [x, y, 0.0, x] {
                s.extend(f.to_le_bytes());
            }
        }
        s.extend(command(0x8000 | 4, 3, 0x60));
        for f in [0.0f32, 0.0, 1.0] {
            s.extend(f.to_le_bytes());
        }
        s.extend(command(0x8000 | 5, 3, 0x6E));
        s.extend([128u8; 12]);
        s.extend(command(0, 0, 0x17));
        s
    }

    #[test]
    fn test_decode_single_triangle() {
        let data = build_lex(&triangle_stream(), b"_kosmos");
        let mut model = Model::new();
        let mut diag = Diagnostics::default();

        let summary = decode_lex(&mut Cursor::new(data), &mut model, None, &mut diag).unwrap();
        assert_eq!(summary.meshes, 1);
        assert_eq!(summary.triangles, 1);
        assert_eq!(model.name, "kosmos");
        assert_eq!(model.materials().len(), 1);
        assert_eq!(model.vertices().len(), 3);
        assert_eq!(model.meshes[0].name, "00/body/root");
        assert_eq!(model.meshes[0].triangles[0].indices, [0, 1, 2]);
        assert!(!model.has_weights());
        assert!(diag.anomalies().is_empty());
    }

    #[test]
    fn test_second_file_merges() {
        let data = build_lex(&triangle_stream(), b"_kosmos");
        let mut model = Model::new();
        let mut diag = Diagnostics::default();
        decode_lex(&mut Cursor::new(data.clone()), &mut model, None, &mut diag).unwrap();

        let other = build_lex(&triangle_stream(), b"_other");
        decode_lex(&mut Cursor::new(other), &mut model, None, &mut diag).unwrap();

        assert_eq!(model.name, "kosmos");
        assert_eq!(model.meshes.len(), 2);
        assert_eq!(model.vertices().len(), 3);
        assert_eq!(model.meshes[1].triangles[0].indices, [0, 1, 2]);
    }

    #[test]
    fn test_unflushed_slots_are_reported() {
        let mut stream = triangle_stream();
        stream.truncate(stream.len() - 4);
        let data = build_lex(&stream, b"_kosmos");
        let mut model = Model::new();
        let mut diag = Diagnostics::default();

        let summary = decode_lex(&mut Cursor::new(data), &mut model, None, &mut diag).unwrap();
        assert_eq!(summary.triangles, 0);
        assert_eq!(diag.anomalies().len(), 1);
    }

    #[test]
    fn test_failed_file_leaves_model_untouched() {
        let mut stream = triangle_stream();
        stream.extend(command(0, 0, 0x41));
        let data = build_lex(&stream, b"_kosmos");
        let mut model = Model::new();
        let mut diag = Diagnostics::default();

        let err = decode_lex(&mut Cursor::new(data), &mut model, None, &mut diag).unwrap_err();
        assert!(matches!(err, Error::UnknownOpcode { opcode: 0x41, .. }));
        assert!(model.meshes.is_empty());
        assert!(model.vertices().is_empty());
        assert!(model.name.is_empty());
    }

    #[test]
    fn test_oversized_counts_are_rejected() {
        let mut data = build_lex(&triangle_stream(), b"_kosmos");
        data[0x44..0x48].copy_from_slice(&(1u32 << 30).to_le_bytes());
        let mut model = Model::new();
        let err = decode_lex(
            &mut Cursor::new(data.clone()),
            &mut model,
            None,
            &mut Diagnostics::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { .. }));

        data[0x44..0x48].copy_from_slice(&1u32.to_le_bytes());
        data[0x40..0x44].copy_from_slice(&u32::MAX.to_le_bytes());
        let err = decode_lex(
            &mut Cursor::new(data),
            &mut model,
            None,
            &mut Diagnostics::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { .. }));
        assert!(model.meshes.is_empty());
    }

    #[test]
    fn test_bad_magic() {
        let mut data = build_lex(&triangle_stream(), b"_kosmos");
        data[0] = b'L';
        let err = decode_lex(
            &mut Cursor::new(data),
            &mut Model::new(),
            None,
            &mut Diagnostics::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { .. }));
    }
}
