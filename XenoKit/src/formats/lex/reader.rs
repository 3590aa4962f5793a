//! LEX file reader
//!
//! Walks the mesh address table, runs the VIF interpreter over each mesh's
//! command range and feeds flushed batches to the vertex decoder.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use super::header::{LexHeader, MeshHeader};
use super::material::decode_material;
use super::mesh::{MeshLayout, decode_vertices, emit_strip};
use super::vif::{VifEvent, VifInterpreter};
use crate::diagnostics::{Anomaly, Diagnostics};
use crate::error::{Error, Result};
use crate::model::{Mesh, Model, Texture};

/// Magic at the start of every LEX file.
pub const LEX_MAGIC: [u8; 4] = *b"lex\0";

/// Full texture height the V scale is relative to.
const TEXTURE_PAGE_HEIGHT: u32 = 1024;

/// Bytes per stored 4x4 float matrix.
const MATRIX_SIZE: u64 = 64;

/// Counts reported after decoding one LEX file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexSummary {
    pub meshes: usize,
    pub triangles: usize,
    pub weighted_meshes: usize,
}

/// Decode a LEX file into `model`.
///
/// The model is only updated when the whole file decodes; on error it is
/// left as it was.
pub fn decode_lex<R: Read + Seek>(
    reader: &mut R,
    model: &mut Model,
    texture: Option<&Texture>,
    diag: &mut Diagnostics,
) -> Result<LexSummary> {
    let header = LexHeader::read(reader)?;
    if header.magic != LEX_MAGIC {
        return Err(Error::malformed(format!(
            "bad LEX magic {:02x?}",
            header.magic
        )));
    }
    tracing::debug!(
        "LEX '{}' by '{}': {} meshes, {} matrices, addr={:x?}",
        header.model_name(),
        header.artist(),
        header.nmesh,
        header.nmatrix,
        header.addr
    );

    check_table_sizes(reader, &header)?;

    let mut mesh_addrs = vec![0u32; header.nmesh as usize];
    reader.read_u32_into::<LittleEndian>(&mut mesh_addrs)?;

    if header.nmatrix > 0 {
        reader.seek(SeekFrom::Start(u64::from(header.addr[0])))?;
        let mut matrices = vec![[0f32; 16]; header.nmatrix as usize * 2];
        for matrix in &mut matrices {
            reader.read_f32_into::<LittleEndian>(matrix)?;
        }
        tracing::trace!("LEX matrices: {matrices:?}");
    }

    let mut staged = model.clone();
    if staged.name.is_empty() {
        staged.name = header.model_name();
    }

    let v_divisor = texture
        .filter(|t| diag.options().apply_texture_scale && t.max_y > 0)
        .map(|t| (TEXTURE_PAGE_HEIGHT / t.max_y).max(1) as f32);

    let mut summary = LexSummary::default();
    for (index, &addr) in mesh_addrs.iter().enumerate() {
        let mesh = decode_mesh(reader, index, addr, &mut staged, texture, v_divisor, diag)?;
        summary.meshes += 1;
        summary.triangles += mesh.triangles.len();
        if mesh.is_skinned() {
            summary.weighted_meshes += 1;
        }
        staged.meshes.push(mesh);
    }

    staged.refresh_bone_count();
    *model = staged;

    tracing::info!(
        "LEX: {} meshes, {} triangles, {} weighted, {} bones",
        summary.meshes,
        summary.triangles,
        summary.weighted_meshes,
        model.bones().len()
    );
    Ok(summary)
}

/// Reject mesh and matrix counts whose tables cannot fit in the stream.
fn check_table_sizes<R: Read + Seek>(reader: &mut R, header: &LexHeader) -> Result<()> {
    let table_start = reader.stream_position()?;
    let stream_len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(table_start))?;

    let table_end = table_start + u64::from(header.nmesh) * 4;
    if table_end > stream_len {
        return Err(Error::malformed(format!(
            "{} mesh addresses do not fit in {stream_len} bytes",
            header.nmesh
        )));
    }

    if header.nmatrix > 0 {
        let matrix_end =
            u64::from(header.addr[0]) + u64::from(header.nmatrix) * 2 * MATRIX_SIZE;
        if matrix_end > stream_len {
            return Err(Error::malformed(format!(
                "{} matrices at 0x{:x} do not fit in {stream_len} bytes",
                header.nmatrix, header.addr[0]
            )));
        }
    }
    Ok(())
}

fn decode_mesh<R: Read + Seek>(
    reader: &mut R,
    index: usize,
    addr: u32,
    model: &mut Model,
    texture: Option<&Texture>,
    v_divisor: Option<f32>,
    diag: &mut Diagnostics,
) -> Result<Mesh> {
    reader.seek(SeekFrom::Start(u64::from(addr)))?;
    let header = MeshHeader::read(reader)?;
    let name = format!("{index:02}/{}/{}", header.group_name, header.bone_name);
    tracing::debug!(
        "mesh {name}: vertex_format=0x{:02x} weight_format={} data=0x{:x}+0x{:x} bone={} material='{}'",
        header.vertex_format,
        header.weight_format,
        header.data_offset,
        header.data_len,
        header.bone_idx,
        header.material_name
    );

    let mut color = header.color;
    let material = decode_material(&header.uv, &header.palette, color, texture, diag);
    let mut material_index = model.add_material(material);

    let layout = MeshLayout {
        vertex_format: header.vertex_format,
        weight_format: header.weight_format,
        joint_table: &header.joint_table,
    };

    let end = header.data_end(addr)?;
    reader.seek(SeekFrom::Start(u64::from(addr) + u64::from(header.data_offset)))?;

    let mut mesh = Mesh {
        name,
        weight_format: header.weight_format,
        triangles: Vec::new(),
    };
    let mut vif = VifInterpreter::new(end);
    loop {
        match vif.step(reader, diag)? {
            VifEvent::Continue => {}
            VifEvent::End => break,
            VifEvent::Material(block) => {
                color = block.color_or(color);
                let material = decode_material(block.uv(), block.palette(), color, texture, diag);
                material_index = model.add_material(material);
                tracing::debug!("mesh {index}: material -> {material_index}");
            }
            VifEvent::Batch(batch) => {
                let vertices = decode_vertices(&batch, &layout, model)?;
                emit_strip(model, &mut mesh.triangles, &vertices, material_index, v_divisor)?;
            }
        }
    }

    let pending = vif.pending_slots();
    if pending > 0 {
        diag.report(Anomaly::DiscardedBatch {
            mesh: index,
            slots: pending,
        });
    }
    Ok(mesh)
}

/// Open and decode a LEX file from disk.
pub fn read_lex<P: AsRef<Path>>(
    path: P,
    model: &mut Model,
    texture: Option<&Texture>,
    diag: &mut Diagnostics,
) -> Result<LexSummary> {
    let file = File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);
    tracing::info!("Reading LEX {}", path.as_ref().display());
    decode_lex(&mut reader, model, texture, diag)
}
