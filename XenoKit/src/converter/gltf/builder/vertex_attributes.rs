//! Vertex attribute methods for `GltfBuilder`

use crate::model::{JOINT_UNUSED, Vertex};

use super::super::types::GltfAccessor;
use super::GltfBuilder;

const FLOAT: u32 = 5126;
const UNSIGNED_SHORT: u32 = 5123;
const UNSIGNED_INT: u32 = 5125;
const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;

fn accessor(
    buffer_view: usize,
    component_type: u32,
    count: usize,
    accessor_type: &str,
) -> GltfAccessor {
    GltfAccessor {
        buffer_view,
        component_type,
        count,
        accessor_type: accessor_type.to_string(),
        min: None,
        max: None,
    }
}

/// Weights scaled to sum to one. An all-zero set stays zero.
pub(crate) fn normalized_weights(weights: [f32; 4]) -> [f32; 4] {
    let sum: f32 = weights.iter().sum();
    if sum == 0.0 {
        return weights;
    }
    weights.map(|w| w / sum)
}

/// Joint indices with unused or zero-weight slots pointed at joint 0.
pub(crate) fn bound_joints(vertex: &Vertex) -> [u16; 4] {
    let mut joints = [0u16; 4];
    for (k, joint) in joints.iter_mut().enumerate() {
        let raw = vertex.joints[k];
        if vertex.weights[k] != 0.0 && raw != JOINT_UNUSED {
            *joint = raw as u16;
        }
    }
    joints
}

impl GltfBuilder {
    pub(super) fn add_positions(&mut self, vertices: &[Vertex]) -> usize {
        self.align(4);
        let byte_offset = self.buffer.len();

        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];

        for v in vertices {
            for (i, &c) in v.position.iter().enumerate() {
                self.buffer.extend_from_slice(&c.to_le_bytes());
                min[i] = min[i].min(c);
                max[i] = max[i].max(c);
            }
        }

        let bounded = !vertices.is_empty();
        self.push_view(byte_offset, ARRAY_BUFFER, |bv| GltfAccessor {
            min: bounded.then(|| min.to_vec()),
            max: bounded.then(|| max.to_vec()),
            ..accessor(bv, FLOAT, vertices.len(), "VEC3")
        })
    }

    pub(super) fn add_normals(&mut self, vertices: &[Vertex]) -> usize {
        self.align(4);
        let byte_offset = self.buffer.len();

        for v in vertices {
            for &c in &v.normal {
                self.buffer.extend_from_slice(&c.to_le_bytes());
            }
        }

        self.push_view(byte_offset, ARRAY_BUFFER, |bv| {
            accessor(bv, FLOAT, vertices.len(), "VEC3")
        })
    }

    /// UVs with V flipped into glTF's top-left origin.
    pub(super) fn add_texcoords(&mut self, vertices: &[Vertex]) -> usize {
        self.align(4);
        let byte_offset = self.buffer.len();

        for v in vertices {
            self.buffer.extend_from_slice(&v.uv[0].to_le_bytes());
            self.buffer.extend_from_slice(&(1.0 - v.uv[1]).to_le_bytes());
        }

        self.push_view(byte_offset, ARRAY_BUFFER, |bv| {
            accessor(bv, FLOAT, vertices.len(), "VEC2")
        })
    }

    pub(super) fn add_colors(&mut self, vertices: &[Vertex]) -> usize {
        self.align(4);
        let byte_offset = self.buffer.len();

        for v in vertices {
            for &c in &v.color {
                self.buffer.extend_from_slice(&c.to_le_bytes());
            }
        }

        self.push_view(byte_offset, ARRAY_BUFFER, |bv| {
            accessor(bv, FLOAT, vertices.len(), "VEC4")
        })
    }

    pub(super) fn add_weights(&mut self, vertices: &[Vertex]) -> usize {
        self.align(4);
        let byte_offset = self.buffer.len();

        for v in vertices {
            for w in normalized_weights(v.weights) {
                self.buffer.extend_from_slice(&w.to_le_bytes());
            }
        }

        self.push_view(byte_offset, ARRAY_BUFFER, |bv| {
            accessor(bv, FLOAT, vertices.len(), "VEC4")
        })
    }

    pub(super) fn add_joints(&mut self, vertices: &[Vertex]) -> usize {
        self.align(4);
        let byte_offset = self.buffer.len();

        for v in vertices {
            for j in bound_joints(v) {
                self.buffer.extend_from_slice(&j.to_le_bytes());
            }
        }

        self.push_view(byte_offset, ARRAY_BUFFER, |bv| {
            accessor(bv, UNSIGNED_SHORT, vertices.len(), "VEC4")
        })
    }

    pub(super) fn add_indices(&mut self, indices: &[u32]) -> usize {
        self.align(4);
        let byte_offset = self.buffer.len();

        for &idx in indices {
            self.buffer.extend_from_slice(&idx.to_le_bytes());
        }

        self.push_view(byte_offset, ELEMENT_ARRAY_BUFFER, |bv| {
            accessor(bv, UNSIGNED_INT, indices.len(), "SCALAR")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_weights_normalized_by_sum() {
        assert_eq!(normalized_weights([1.0, 1.0, 2.0, 0.0]), [0.25, 0.25, 0.5, 0.0]);
        assert_eq!(normalized_weights([0.0; 4]), [0.0; 4]);
    }

    #[test]
    fn test_unbound_joints_point_at_zero() {
        let mut v = Vertex::unweighted();
        v.weights = [0.5, 0.5, 0.0, 0.0];
        v.joints = [3, JOINT_UNUSED, 7, JOINT_UNUSED];
        assert_eq!(bound_joints(&v), [3, 0, 0, 0]);
    }

    #[test]
    fn test_position_bounds() {
        let mut a = Vertex::unweighted();
        a.position = [-1.0, 2.0, 0.5];
        let mut b = Vertex::unweighted();
        b.position = [3.0, -4.0, 0.0];

        let mut builder = GltfBuilder::new();
        let idx = builder.add_positions(&[a, b]);
        let acc = &builder.accessors[idx];
        assert_eq!(acc.min, Some(vec![-1.0, -4.0, 0.0]));
        assert_eq!(acc.max, Some(vec![3.0, 2.0, 0.5]));
        assert_eq!(builder.buffer_views[acc.buffer_view].byte_length, 24);

        let empty = builder.add_positions(&[]);
        assert_eq!(builder.accessors[empty].min, None);
    }

    #[test]
    fn test_texcoords_flip_v() {
        let mut v = Vertex::unweighted();
        v.uv = [0.5, 0.75];
        let mut builder = GltfBuilder::new();
        builder.add_texcoords(&[v]);
        assert_eq!(&builder.buffer[0..4], &0.5f32.to_le_bytes());
        assert_eq!(&builder.buffer[4..8], &0.25f32.to_le_bytes());
    }
}
