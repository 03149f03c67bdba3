//! Leaf path enumeration for a switch subtree.

use std::collections::BTreeMap;

use treeforge_core::index::{false_child, nodes_on_level, true_child};

use super::condition::BitOffsets;

/// Bit position to required branch outcome along one root-to-exit path.
pub type PathBits = BTreeMap<u32, bool>;

/// An exit of a switch subtree and the bits that lead to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafPath {
    /// Node index continued at when the path is taken: the next subtree root,
    /// or a tree leaf.
    pub leaf: usize,
    pub bits: PathBits,
}

/// Enumerates the `2^levels` exits of the subtree at `root`.
///
/// True branches come before false branches at every level; switch arms are
/// generated in this order.
pub fn leaf_paths(root: usize, levels: u32, offsets: &BitOffsets) -> Vec<LeafPath> {
    let mut result = Vec::with_capacity(nodes_on_level(levels));
    collect_leaf_paths(root, levels, offsets, &mut result);
    result
}

fn collect_leaf_paths(
    node: usize,
    remaining_levels: u32,
    offsets: &BitOffsets,
    result: &mut Vec<LeafPath>,
) {
    if remaining_levels == 0 {
        result.push(LeafPath {
            leaf: node,
            bits: PathBits::new(),
        });
        return;
    }

    let bit = offsets[&node];
    let paths_per_child = nodes_on_level(remaining_levels - 1);

    collect_leaf_paths(true_child(node), remaining_levels - 1, offsets, result);
    stamp_last(result, paths_per_child, bit, true);

    collect_leaf_paths(false_child(node), remaining_levels - 1, offsets, result);
    stamp_last(result, paths_per_child, bit, false);
}

fn stamp_last(result: &mut [LeafPath], count: usize, bit: u32, value: bool) {
    let start = result.len() - count;
    for path in &mut result[start..] {
        path.bits.insert(bit, value);
    }
}
