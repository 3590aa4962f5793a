//! Vertex reconstruction from flushed VIF batches.

use super::header::JOINT_TABLE_LEN;
use super::vif::{Batch, Slot};
use crate::error::{Error, Result};
use crate::model::{JOINT_UNUSED, Material, Model, Triangle, Vertex};

/// Position, UV and color layout: one slot per attribute group.
pub const VERTEX_FORMAT_SPLIT: u8 = 0x10;
/// Single-slot layout with normals and float colors.
pub const VERTEX_FORMAT_PACKED: u8 = 0x80;

/// Colors are stored with 128 as full intensity.
const COLOR_SCALE: f32 = 128.0;

/// Period shifts attempted per axis before a triangle is left as is.
const MAX_WRAP_STEPS: usize = 1 << 12;

/// Per-mesh parameters for vertex reconstruction.
#[derive(Debug, Clone, Copy)]
pub struct MeshLayout<'a> {
    pub vertex_format: u8,
    pub weight_format: u32,
    pub joint_table: &'a [u16; JOINT_TABLE_LEN],
}

/// Word-indexed view into a slot starting at `base` words.
#[derive(Clone, Copy)]
struct Region<'a> {
    slot: &'a Slot,
    base: usize,
    name: &'static str,
}

impl<'a> Region<'a> {
    fn new(slot: &'a Slot, base: usize, name: &'static str) -> Self {
        Self { slot, base, name }
    }

    fn out_of_range(&self, index: usize) -> Error {
        Error::batch(format!(
            "{} region word {} past slot end ({} bytes)",
            self.name,
            self.base + index,
            self.slot.data().len()
        ))
    }

    fn word(&self, index: usize) -> Result<u32> {
        self.slot
            .word(self.base + index)
            .ok_or_else(|| self.out_of_range(index))
    }

    fn float(&self, index: usize) -> Result<f32> {
        self.word(index).map(f32::from_bits)
    }
}

fn slot<'a>(batch: &'a Batch, index: usize) -> Result<&'a Slot> {
    batch.slots.get(index).ok_or_else(|| {
        Error::batch(format!(
            "vertex layout needs slot {index}, batch has {}",
            batch.slots.len()
        ))
    })
}

/// Rebuild the vertices of one batch.
///
/// Bones referenced by weights are added to the model's bone set in the
/// order they are first seen.
pub fn decode_vertices(batch: &Batch, layout: &MeshLayout, model: &mut Model) -> Result<Vec<Vertex>> {
    let format = layout.vertex_format & 0xF0;
    match batch.slots.len() {
        1 if format != VERTEX_FORMAT_PACKED => {
            return Err(Error::batch(format!(
                "single-slot batch with vertex format 0x{format:02x}"
            )));
        }
        1..=5 => {}
        n => return Err(Error::batch(format!("{n} slots in one batch"))),
    }

    let count = batch.count;
    let mut vertices = Vec::with_capacity(count);

    match format {
        VERTEX_FORMAT_SPLIT => {
            let pos = Region::new(slot(batch, 0)?, 0, "position");
            let tex = Region::new(slot(batch, 1)?, 0, "uv");
            let color_slot = if slot(batch, 2)?.components == 4 {
                slot(batch, 2)?
            } else {
                slot(batch, 3)?
            };
            let weights = batch.slots.get(2).map(|s| Region::new(s, 0, "weight"));

            for v in 0..count {
                let mut vertex = Vertex::unweighted();
                vertex.position = [pos.float(v * 4)?, pos.float(v * 4 + 1)?, pos.float(v * 4 + 2)?];
                vertex.uv = [pos.float(v * 4 + 3)?, tex.float(v)?];
                for (k, c) in vertex.color.iter_mut().enumerate() {
                    let byte = color_slot.byte(v * 4 + k).ok_or_else(|| {
                        Error::batch(format!("color byte {} past slot end", v * 4 + k))
                    })?;
                    *c = f32::from(byte) / COLOR_SCALE;
                }
                read_weights(&mut vertex, v, count, weights, layout, model)?;
                vertices.push(vertex);
            }
        }
        VERTEX_FORMAT_PACKED => {
            if batch.slots.len() != 1 {
                return Err(Error::batch(format!(
                    "vertex format 0x80 expects one slot, batch has {}",
                    batch.slots.len()
                )));
            }
            let data = slot(batch, 0)?;
            let a = Region::new(data, 0, "position");
            let b = Region::new(data, count * 4, "normal");
            let c = Region::new(data, count * 8, "color");
            let w = Region::new(data, count * 12, "weight");

            for v in 0..count {
                let mut vertex = Vertex::unweighted();
                vertex.position = [a.float(v * 4)?, a.float(v * 4 + 1)?, a.float(v * 4 + 2)?];
                vertex.normal = [b.float(v * 4)?, b.float(v * 4 + 1)?, b.float(v * 4 + 2)?];
                vertex.uv = [a.float(v * 4 + 3)?, b.float(v * 4 + 3)?];
                for (k, col) in vertex.color.iter_mut().enumerate() {
                    *col = c.float(v * 4 + k)? / COLOR_SCALE;
                }
                read_weights(&mut vertex, v, count, Some(w), layout, model)?;
                vertices.push(vertex);
            }
        }
        other => return Err(Error::UnsupportedVertexFormat { format: other }),
    }

    Ok(vertices)
}

fn read_weights(
    vertex: &mut Vertex,
    v: usize,
    count: usize,
    region: Option<Region<'_>>,
    layout: &MeshLayout,
    model: &mut Model,
) -> Result<()> {
    let format = layout.weight_format;
    if matches!(format, 0 | 1024) {
        return Ok(());
    }
    if !matches!(format, 1 | 3 | 5) {
        return Err(Error::UnknownWeightFormat { format });
    }
    let region = region.ok_or_else(|| Error::batch("weighted mesh without a weight slot"))?;

    for n in 0..4 {
        let (weight, joint) = match format {
            1 => {
                let raw = region.word(v * 4 + n)?;
                if raw == 0 {
                    (0.0, JOINT_UNUSED)
                } else {
                    let weight = region.float(count * 4 + v * 4 + n)?;
                    (weight, resolve_joint(raw, layout.joint_table, model)?)
                }
            }
            3 => {
                let raw = region.word(v * 4 + n)?;
                if raw == 0 {
                    (f32::from_bits(raw), 0)
                } else {
                    (1.0, resolve_joint(raw, layout.joint_table, model)?)
                }
            }
            _ if n < 2 => {
                let raw = region.word(v * 4 + n)?;
                if raw == 0 {
                    (0.0, JOINT_UNUSED)
                } else {
                    let weight = region.float(v * 4 + n + 2)?;
                    (weight, resolve_joint(raw, layout.joint_table, model)?)
                }
            }
            _ => (0.0, JOINT_UNUSED),
        };
        vertex.weights[n] = weight;
        vertex.joints[n] = joint;
    }
    Ok(())
}

/// Map a raw bone word to a model-wide joint index.
///
/// Raw words are VU memory addresses; `raw / 4 - 184` is the local bone,
/// whose global id sits one entry further into the joint table.
fn resolve_joint(raw: u32, table: &[u16; JOINT_TABLE_LEN], model: &mut Model) -> Result<i16> {
    let slot = i64::from(raw / 4) - 184 + 1;
    let bone = usize::try_from(slot)
        .ok()
        .and_then(|i| table.get(i))
        .ok_or(Error::InvalidJointReference { raw })?;
    let index = model.add_bone(u32::from(*bone));
    i16::try_from(index).map_err(|_| Error::InvalidJointReference { raw })
}

/// Local vertex indices of the strip's triangles with alternating winding.
pub fn strip_triangles(count: usize) -> impl Iterator<Item = [usize; 3]> {
    (0..count.saturating_sub(2)).map(|v| {
        if v % 2 == 0 {
            [v, v + 1, v + 2]
        } else {
            [v, v + 2, v + 1]
        }
    })
}

fn wrap_axis(tri: &mut [Vertex; 3], axis: usize, min: f32, max: f32) {
    if !min.is_finite() || !max.is_finite() || min >= max {
        return;
    }
    if tri.iter().any(|v| !v.uv[axis].is_finite()) {
        return;
    }
    let span = max - min;
    let mut steps = 0;
    while steps < MAX_WRAP_STEPS && tri.iter().all(|v| v.uv[axis] >= max) {
        for v in tri.iter_mut() {
            v.uv[axis] -= span;
        }
        steps += 1;
    }
    while steps < MAX_WRAP_STEPS && tri.iter().all(|v| v.uv[axis] < min) {
        for v in tri.iter_mut() {
            v.uv[axis] += span;
        }
        steps += 1;
    }
}

/// Shift a triangle's UVs by whole periods of the material rectangle.
///
/// Expects V measured from the bottom, like the material's normalized rect.
pub fn wrap_uvs(tri: &mut [Vertex; 3], material: &Material) {
    wrap_axis(tri, 0, material.uv.umin, material.uv.umax);
    wrap_axis(tri, 1, material.uv.vmin, material.uv.vmax);
}

/// Triangulate a strip and insert its vertices into the model pool.
///
/// `v_divisor` rescales V to the texture's used height.
pub fn emit_strip(
    model: &mut Model,
    triangles: &mut Vec<Triangle>,
    vertices: &[Vertex],
    material_index: usize,
    v_divisor: Option<f32>,
) -> Result<()> {
    let Some(material) = model.material(material_index).copied() else {
        return Err(Error::batch(format!(
            "strip references unknown material {material_index}"
        )));
    };

    for local in strip_triangles(vertices.len()) {
        let mut tri = local.map(|i| vertices[i]);
        for vertex in &mut tri {
            vertex.uv[1] = 1.0 - vertex.uv[1];
        }
        if material.has_texture {
            wrap_uvs(&mut tri, &material);
        }
        if let Some(divisor) = v_divisor {
            for vertex in &mut tri {
                vertex.uv[1] = 1.0 - (1.0 - vertex.uv[1]) / divisor;
            }
        }
        let indices = tri.map(|vertex| model.add_vertex(vertex));
        triangles.push(Triangle {
            indices,
            material: material_index,
        });
    }
    Ok(())
}
