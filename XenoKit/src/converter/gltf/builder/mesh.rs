//! Mesh methods for `GltfBuilder`

use crate::model::{Mesh, Vertex};

use super::super::types::{GltfMesh, GltfNode, GltfPrimitive};
use super::GltfBuilder;

/// Accessors over the shared vertex pool.
#[derive(Debug, Clone, Copy)]
pub struct PoolAccessors {
    pub position: usize,
    pub normal: usize,
    pub texcoord: usize,
    pub color: usize,
    /// Present only when the pool carries skin data.
    pub skin: Option<(usize, usize)>,
}

/// Split a mesh's triangles into runs that share one material.
fn material_runs(mesh: &Mesh) -> Vec<(usize, Vec<u32>)> {
    let mut runs: Vec<(usize, Vec<u32>)> = Vec::new();
    for tri in &mesh.triangles {
        let indices = tri.indices.map(|i| i as u32);
        match runs.last_mut() {
            Some((material, run)) if *material == tri.material => run.extend(indices),
            _ => runs.push((tri.material, indices.to_vec())),
        }
    }
    runs
}

impl GltfBuilder {
    /// Write the vertex pool's attributes.
    pub fn add_vertex_pool(&mut self, vertices: &[Vertex], skinned: bool) -> PoolAccessors {
        let position = self.add_positions(vertices);
        let normal = self.add_normals(vertices);
        let texcoord = self.add_texcoords(vertices);
        let color = self.add_colors(vertices);
        let skin = skinned.then(|| (self.add_weights(vertices), self.add_joints(vertices)));
        PoolAccessors {
            position,
            normal,
            texcoord,
            color,
            skin,
        }
    }

    /// Add a mesh with one primitive per material run and a node for it.
    /// Returns the node index.
    pub fn add_mesh(&mut self, mesh: &Mesh, pool: PoolAccessors, skin: Option<usize>) -> usize {
        let skin = skin.filter(|_| mesh.is_skinned());

        let mut primitives = Vec::new();
        for (material, indices) in material_runs(mesh) {
            let mut attributes = std::collections::BTreeMap::new();
            attributes.insert("POSITION".to_string(), pool.position);
            attributes.insert("NORMAL".to_string(), pool.normal);
            attributes.insert("TEXCOORD_0".to_string(), pool.texcoord);
            attributes.insert("COLOR_0".to_string(), pool.color);
            if let (Some(_), Some((weights, joints))) = (skin, pool.skin) {
                attributes.insert("WEIGHTS_0".to_string(), weights);
                attributes.insert("JOINTS_0".to_string(), joints);
            }

            let indices = self.add_indices(&indices);
            primitives.push(GltfPrimitive {
                attributes,
                indices: Some(indices),
                material: Some(material),
            });
        }

        let mesh_idx = self.meshes.len();
        self.meshes.push(GltfMesh {
            name: Some(mesh.name.clone()),
            primitives,
        });

        let node_idx = self.nodes.len();
        self.nodes.push(GltfNode {
            name: Some(mesh.name.clone()),
            mesh: Some(mesh_idx),
            skin,
            ..GltfNode::default()
        });
        self.scene_nodes.push(node_idx);
        node_idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Triangle;
    use pretty_assertions::assert_eq;

    fn tri(base: usize, material: usize) -> Triangle {
        Triangle {
            indices: [base, base + 1, base + 2],
            material,
        }
    }

    #[test]
    fn test_runs_split_on_material_change() {
        let mesh = Mesh {
            name: "m".into(),
            weight_format: 0,
            triangles: vec![tri(0, 0), tri(1, 0), tri(2, 1), tri(3, 0)],
        };
        let runs = material_runs(&mesh);
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0], (0, vec![0, 1, 2, 1, 2, 3]));
        assert_eq!(runs[1].0, 1);
        assert_eq!(runs[2], (0, vec![3, 4, 5]));
    }

    #[test]
    fn test_unskinned_mesh_ignores_skin() {
        let mut builder = GltfBuilder::new();
        let pool = builder.add_vertex_pool(&[Vertex::unweighted(); 3], true);
        let mesh = Mesh {
            name: "00/body/root".into(),
            weight_format: 0,
            triangles: vec![tri(0, 0)],
        };
        let node = builder.add_mesh(&mesh, pool, Some(0));

        assert_eq!(builder.nodes[node].skin, None);
        let prim = &builder.meshes[0].primitives[0];
        assert!(!prim.attributes.contains_key("JOINTS_0"));
        assert_eq!(prim.attributes["POSITION"], pool.position);
    }
}
