//! Skeleton methods for `GltfBuilder`

use super::super::types::{GltfNode, GltfSkin};
use super::GltfBuilder;

impl GltfBuilder {
    /// Add one node per bone as a chain under an armature root node.
    ///
    /// `bones` holds global bone ids in bone-set order; vertex joint indices
    /// refer to positions in that set. Returns the skin index.
    pub fn add_skeleton(&mut self, bones: &[u32], armature_name: &str) -> usize {
        let base = self.nodes.len();
        let count = bones.len();

        // The last bone heads the chain; each node parents the one before it.
        for i in 0..count {
            let bone = count - 1 - i;
            self.nodes.push(GltfNode {
                name: Some(format!("Bone{bone:02}_{:02x}", bones[bone])),
                children: if i > 0 { vec![base + i - 1] } else { Vec::new() },
                ..GltfNode::default()
            });
        }

        let root = self.nodes.len();
        self.nodes.push(GltfNode {
            name: Some(armature_name.to_string()),
            children: count.checked_sub(1).map(|last| vec![base + last]).unwrap_or_default(),
            ..GltfNode::default()
        });
        self.scene_nodes.push(root);

        let skin_idx = self.skins.len();
        self.skins.push(GltfSkin {
            name: Some("Armature".to_string()),
            joints: (0..count).map(|k| base + count - 1 - k).collect(),
        });
        skin_idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bone_chain() {
        let mut builder = GltfBuilder::new();
        let skin = builder.add_skeleton(&[0xb8, 0xc0, 0xc4], "kosmos");

        let names: Vec<_> = builder.nodes.iter().map(|n| n.name.clone().unwrap_or_default()).collect();
        assert_eq!(names, ["Bone02_c4", "Bone01_c0", "Bone00_b8", "kosmos"]);
        assert_eq!(builder.nodes[0].children, Vec::<usize>::new());
        assert_eq!(builder.nodes[2].children, vec![1]);
        assert_eq!(builder.nodes[3].children, vec![2]);
        assert_eq!(builder.scene_nodes, vec![3]);
        // joint k is bone k of the bone set
        assert_eq!(builder.skins[skin].joints, vec![2, 1, 0]);
    }
}
