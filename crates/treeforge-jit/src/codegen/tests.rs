//! Tests for subtree code generation.

use cranelift_frontend::FunctionBuilderContext;
use treeforge_core::index::{false_child, tree_nodes, true_child};
use treeforge_core::{DecisionTree, DecisionTreeFactory, Geometry, TreeForgeError};

use super::*;
use crate::driver::JitDriver;

fn random_tree(depth: u32) -> DecisionTree {
    DecisionTreeFactory::with_seed(7)
        .random_tree(depth, 8)
        .unwrap()
}

fn compose_root(
    tree: &DecisionTree,
    geometry: Geometry,
    selector: &dyn CodegenSelector,
) -> ComposedFunction {
    let mut driver = JitDriver::new().unwrap();
    let composer = Composer::new(tree, geometry, selector);
    let mut ctx = FunctionBuilderContext::new();
    composer.compose_function(&mut driver, &mut ctx, 0).unwrap()
}

// Follows the bits of `vector` down the subtree and returns the exit reached.
fn walk(root: usize, levels: u32, offsets: &BitOffsets, vector: u64) -> usize {
    let mut node = root;
    for _ in 0..levels {
        let bit = offsets[&node];
        node = if vector & (1 << bit) != 0 {
            true_child(node)
        } else {
            false_child(node)
        };
    }
    node
}

#[test]
fn test_single_level_paths_take_true_branch_first() {
    let offsets = subtree_bit_offsets(0, 1);
    let paths = leaf_paths(0, 1, &offsets);

    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0].leaf, 2);
    assert_eq!(paths[0].bits, PathBits::from([(0, true)]));
    assert_eq!(paths[1].leaf, 1);
    assert_eq!(paths[1].bits, PathBits::from([(0, false)]));
}

#[test]
fn test_two_level_path_order() {
    let offsets = subtree_bit_offsets(0, 2);
    let leaves: Vec<usize> = leaf_paths(0, 2, &offsets).iter().map(|p| p.leaf).collect();
    assert_eq!(leaves, vec![6, 5, 4, 3]);

    let paths = leaf_paths(0, 2, &offsets);
    assert_eq!(paths[1].bits, PathBits::from([(0, true), (2, false)]));
    assert_eq!(paths[2].bits, PathBits::from([(0, false), (1, true)]));
}

#[test]
fn test_paths_of_inner_subtree() {
    // node 5 sits on level 2, its exits on level 4
    let offsets = subtree_bit_offsets(5, 2);
    assert_eq!(offsets[&5], 0);
    assert_eq!(offsets[&11], 1);
    assert_eq!(offsets[&12], 2);

    let leaves: Vec<usize> = leaf_paths(5, 2, &offsets).iter().map(|p| p.leaf).collect();
    assert_eq!(leaves, vec![26, 25, 24, 23]);
}

#[test]
fn test_fixed_template() {
    let bits = PathBits::from([(0, true), (2, false)]);
    assert_eq!(fixed_template(&bits), 0b001);

    let bits = PathBits::from([(0, true), (2, true)]);
    assert_eq!(fixed_template(&bits), 0b101);
}

#[test]
fn test_variants_fill_free_bits_set_first() {
    let bits = PathBits::from([(0, true), (2, false)]);
    assert_eq!(expand_variants(3, &bits), vec![0b011, 0b001]);
}

#[test]
fn test_variants_partition_every_vector() {
    for levels in 1..=4u32 {
        let condition_bits = tree_nodes(levels) as u32;
        let offsets = subtree_bit_offsets(0, levels);
        let paths = leaf_paths(0, levels, &offsets);
        assert_eq!(paths.len(), 1 << levels);

        let mut seen = vec![false; 1 << condition_bits];
        for path in &paths {
            assert_eq!(path.bits.len(), levels as usize);
            let variants = expand_variants(condition_bits, &path.bits);
            assert_eq!(variants.len(), 1 << (condition_bits - levels));

            for vector in variants {
                assert!(!seen[vector as usize], "vector {vector:#b} owned twice");
                seen[vector as usize] = true;
                assert_eq!(walk(0, levels, &offsets, vector), path.leaf);
            }
        }
        assert!(seen.iter().all(|&s| s), "levels {levels} leave vectors uncovered");
    }
}

#[test]
fn test_single_switch_stats() {
    let tree = random_tree(3);
    let geometry = Geometry::new(3, 3, 3).unwrap();
    let composed = compose_root(&tree, geometry, &UniformSwitch::new(3));

    assert_eq!(composed.symbol, "node_evaluator_0");
    assert_eq!(
        composed.stats,
        EmitStats {
            switches: 1,
            cases: 128,
            branches: 0,
            predicates: 7,
        }
    );
}

#[test]
fn test_nested_switch_stats() {
    let tree = random_tree(4);
    let geometry = Geometry::new(4, 4, 2).unwrap();
    let composed = compose_root(&tree, geometry, &UniformSwitch::new(2));

    assert_eq!(composed.stats.switches, 5);
    assert_eq!(composed.stats.cases, 40);
    assert_eq!(composed.stats.predicates, 15);
}

#[test]
fn test_widest_switch_stats() {
    let tree = random_tree(4);
    let geometry = Geometry::new(4, 4, 4).unwrap();
    let composed = compose_root(&tree, geometry, &UniformSwitch::new(4));

    assert_eq!(composed.stats.switches, 1);
    assert_eq!(composed.stats.cases, 32768);
}

#[test]
fn test_if_then_else_stats() {
    let tree = random_tree(2);
    let geometry = Geometry::new(2, 2, 1).unwrap();
    let selector = |_remaining: u32| CodegenStrategy::IfThenElse;
    let composed = compose_root(&tree, geometry, &selector);

    assert_eq!(composed.stats.switches, 0);
    assert_eq!(composed.stats.branches, 3);
    assert_eq!(composed.stats.predicates, 3);
}

#[test]
fn test_compose_emits_one_function_per_boundary_node() {
    let tree = random_tree(6);
    let geometry = Geometry::new(6, 3, 3).unwrap();
    let selector = UniformSwitch::new(3);
    let mut driver = JitDriver::new().unwrap();

    let functions = Composer::new(&tree, geometry, &selector)
        .compose(&mut driver)
        .unwrap();

    assert_eq!(functions.len(), 9);
    assert_eq!(functions[0].root, 0);
    assert_eq!(functions[1].root, 7);
    assert_eq!(functions[8].symbol, "node_evaluator_14");
    assert!(functions.iter().all(|f| f.stats.cases == 128));
}

#[test]
fn test_oversized_strategy_is_rejected() {
    let tree = random_tree(2);
    let geometry = Geometry::new(2, 2, 1).unwrap();
    let selector = |_remaining: u32| CodegenStrategy::SubtreeSwitch { levels: 3 };
    let mut driver = JitDriver::new().unwrap();
    let mut ctx = FunctionBuilderContext::new();

    let result =
        Composer::new(&tree, geometry, &selector).compose_function(&mut driver, &mut ctx, 0);
    assert!(matches!(
        result,
        Err(TreeForgeError::EmitFailure { ref function, .. }) if function == "node_evaluator_0"
    ));
}

#[test]
fn test_strategy_must_make_progress() {
    let tree = random_tree(2);
    let geometry = Geometry::new(2, 2, 1).unwrap();
    let selector = |_remaining: u32| CodegenStrategy::SubtreeSwitch { levels: 0 };
    let mut driver = JitDriver::new().unwrap();
    let mut ctx = FunctionBuilderContext::new();

    let result =
        Composer::new(&tree, geometry, &selector).compose_function(&mut driver, &mut ctx, 0);
    assert!(matches!(result, Err(TreeForgeError::EmitFailure { .. })));
}
