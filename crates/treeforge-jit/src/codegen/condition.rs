//! Condition-vector emission.
//!
//! Every node of a switch subtree is evaluated eagerly and its bit packed into
//! one `i64`. Bit `i` belongs to the `i`-th node of a breadth-first walk from
//! the subtree root, so a subtree of `S` levels writes the low `2^S - 1` bits.

use std::collections::HashMap;

use cranelift_codegen::ir::types::I64;
use cranelift_codegen::ir::{InstBuilder, Value};
use cranelift_frontend::FunctionBuilder;
use treeforge_core::index::{subtree_node_for_bit, tree_nodes};
use treeforge_core::DecisionTree;

use super::predicate::{emit_node_bit, widen_bit, Intrinsics};

/// Node index to bit position inside one condition vector.
pub type BitOffsets = HashMap<usize, u32>;

/// Bit offsets of the subtree rooted at `root` with `levels` levels.
pub fn subtree_bit_offsets(root: usize, levels: u32) -> BitOffsets {
    (0..tree_nodes(levels) as u32)
        .map(|bit| (subtree_node_for_bit(root, bit), bit))
        .collect()
}

/// Emits the condition vector of the subtree at `root` into the current block.
///
/// Returns the vector value and the bit offset of every subtree node.
pub fn emit_condition_vector(
    builder: &mut FunctionBuilder,
    tree: &DecisionTree,
    root: usize,
    levels: u32,
    features: Value,
    intrinsics: &Intrinsics,
) -> (Value, BitOffsets) {
    let node_count = tree_nodes(levels) as u32;
    let mut offsets = BitOffsets::with_capacity(node_count as usize);
    let mut vector = builder.ins().iconst(I64, 0);

    for bit in 0..node_count {
        let index = subtree_node_for_bit(root, bit);
        offsets.insert(index, bit);

        let node_bit = emit_node_bit(builder, tree.node(index), features, intrinsics);
        let wide = widen_bit(builder, node_bit);
        let shifted = if bit == 0 {
            wide
        } else {
            builder.ins().ishl_imm(wide, i64::from(bit))
        };
        vector = builder.ins().bor(vector, shifted);
    }

    (vector, offsets)
}
