//! Integration tests for the compiled resolver.
//!
//! Every compiled result is checked against the reference interpreter.

use treeforge_core::interpreter::interpret_hops;
use treeforge_core::{
    interpret, Comparator, DataSetFactory, DecisionTree, DecisionTreeFactory, Direction, Operation,
    TreeForgeError, TreeNode,
};
use treeforge_jit::codegen::{expand_variants, leaf_paths, subtree_bit_offsets, Composer};
use treeforge_jit::{CodegenStrategy, CompiledResolver, JitDriver, UniformSwitch};

fn assert_equivalent(resolver: &CompiledResolver, tree: &DecisionTree, samples: &[Vec<f32>]) {
    for features in samples {
        assert_eq!(
            resolver.run(tree, features),
            interpret(tree, features),
            "diverged on {features:?}"
        );
    }
}

#[test]
fn test_trivial_gradient_depth_two() {
    let tree = DecisionTreeFactory::new().trivial_gradient_tree(2).unwrap();
    let resolver = CompiledResolver::build(&tree, 1, 2, 1).unwrap();

    assert_eq!(resolver.run(&tree, &DataSetFactory::trivial(1.0 / 8.0)), 3);
    assert_eq!(resolver.run(&tree, &DataSetFactory::trivial(3.0 / 8.0)), 4);
    assert_eq!(resolver.run(&tree, &DataSetFactory::trivial(5.0 / 8.0)), 5);
    assert_eq!(resolver.run(&tree, &DataSetFactory::trivial(7.0 / 8.0)), 6);
}

#[test]
fn test_distinct_gradient_depth_two() {
    let tree = DecisionTreeFactory::new().distinct_gradient_tree(2).unwrap();
    let resolver = CompiledResolver::build(&tree, 3, 2, 1).unwrap();
    let (left, right) = (Direction::Left, Direction::Right);

    assert_eq!(resolver.run(&tree, &DataSetFactory::distinct(&tree, &[left, left])), 3);
    assert_eq!(resolver.run(&tree, &DataSetFactory::distinct(&tree, &[left, right])), 4);
    assert_eq!(resolver.run(&tree, &DataSetFactory::distinct(&tree, &[right, left])), 5);
    assert_eq!(resolver.run(&tree, &DataSetFactory::distinct(&tree, &[right, right])), 6);
}

#[test]
fn test_mixed_if_then_else_then_switch() {
    let selector = |remaining: u32| {
        if remaining > 1 {
            CodegenStrategy::IfThenElse
        } else {
            CodegenStrategy::SubtreeSwitch { levels: 1 }
        }
    };
    let tree = DecisionTreeFactory::new().trivial_gradient_tree(2).unwrap();
    let resolver = CompiledResolver::builder(&tree)
        .with_chunking(2, 1)
        .with_selector(selector)
        .build()
        .unwrap();

    for (k, leaf) in (3..7).enumerate() {
        let x = (2 * k + 1) as f32 / 8.0;
        assert_eq!(resolver.run(&tree, &DataSetFactory::trivial(x)), leaf);
    }
}

#[test]
fn test_mixed_switch_then_if_then_else() {
    let selector = |remaining: u32| {
        if remaining > 1 {
            CodegenStrategy::SubtreeSwitch { levels: 1 }
        } else {
            CodegenStrategy::IfThenElse
        }
    };
    let tree = DecisionTreeFactory::new().distinct_gradient_tree(2).unwrap();
    let resolver = CompiledResolver::builder(&tree)
        .with_chunking(2, 1)
        .with_selector(selector)
        .build()
        .unwrap();
    let (left, right) = (Direction::Left, Direction::Right);

    assert_eq!(resolver.run(&tree, &DataSetFactory::distinct(&tree, &[left, left])), 3);
    assert_eq!(resolver.run(&tree, &DataSetFactory::distinct(&tree, &[right, right])), 6);
}

#[test]
fn test_depth_four_single_function() {
    let tree = DecisionTreeFactory::with_seed(42).random_tree(4, 16).unwrap();
    let resolver = CompiledResolver::build(&tree, 16, 4, 2).unwrap();
    assert_eq!(resolver.function_count(), 1);

    let samples = DataSetFactory::with_seed(4).random_batch(10_000, 16);
    assert_equivalent(&resolver, &tree, &samples);

    // every leaf is reachable through a gradient tree of the same shape
    let gradient = DecisionTreeFactory::new().trivial_gradient_tree(4).unwrap();
    let resolver = CompiledResolver::build(&gradient, 1, 4, 2).unwrap();
    let leaves: Vec<usize> = (0..16)
        .map(|k| resolver.run(&gradient, &[(2 * k + 1) as f32 / 32.0]))
        .collect();
    assert_eq!(leaves, (15..31).collect::<Vec<_>>());
}

#[test]
fn test_depth_six_two_hops() {
    let tree = DecisionTreeFactory::with_seed(6).random_tree(6, 10).unwrap();
    let resolver = CompiledResolver::build(&tree, 10, 3, 3).unwrap();

    assert_eq!(resolver.function_count(), 9);
    let report = resolver.report();
    assert!(!report.cache_hit);
    assert_eq!(report.emitted_functions, 9);
    assert_eq!(report.total_cases, 9 * 128);

    for features in DataSetFactory::with_seed(7).random_batch(1_000, 10) {
        let hops = resolver.trace(&features);
        assert_eq!(hops.len(), 2);
        assert_eq!(hops, interpret_hops(&tree, &features, 3));
        assert_eq!(resolver.run(&tree, &features), interpret(&tree, &features));
    }
}

#[test]
fn test_depth_eight_widest_switch() {
    let offsets = subtree_bit_offsets(0, 4);
    for path in leaf_paths(0, 4, &offsets) {
        assert_eq!(expand_variants(15, &path.bits).len(), 2048);
    }

    let tree = DecisionTreeFactory::with_seed(8).random_tree(8, 12).unwrap();
    let resolver = CompiledResolver::build(&tree, 12, 8, 4).unwrap();
    assert_eq!(resolver.function_count(), 1);
    // one root switch plus one nested switch per exit
    assert_eq!(resolver.report().total_cases, 17 * 32768);

    let samples = DataSetFactory::with_seed(9).random_batch(1_000, 12);
    assert_equivalent(&resolver, &tree, &samples);
}

#[test]
fn test_every_operation_matches_interpreter() {
    for operation in Operation::ALL {
        for comparator in [Comparator::LessThan, Comparator::GreaterThan] {
            let nodes = (0..15)
                .map(|i| TreeNode::new(i % 5, operation, comparator, operation.balanced_bias()))
                .collect();
            let tree = DecisionTree::new(nodes).unwrap();
            let resolver = CompiledResolver::build(&tree, 5, 2, 2).unwrap();

            let samples = DataSetFactory::with_seed(11).random_batch(500, 5);
            assert_equivalent(&resolver, &tree, &samples);
        }
    }
}

#[test]
fn test_nan_and_equality_take_false_branch() {
    let tree = DecisionTree::new(vec![TreeNode::new(
        0,
        Operation::Bypass,
        Comparator::LessThan,
        0.5,
    )])
    .unwrap();
    let resolver = CompiledResolver::build(&tree, 1, 1, 1).unwrap();

    assert_eq!(resolver.run(&tree, &[0.25]), 2);
    assert_eq!(resolver.run(&tree, &[0.5]), 1);
    assert_eq!(resolver.run(&tree, &[f32::NAN]), 1);
    // ln of a negative number is NaN as well
    let ln_node = TreeNode::new(0, Operation::Ln, Comparator::LessThan, 0.0);
    let ln_tree = DecisionTree::new(vec![ln_node]).unwrap();
    let resolver = CompiledResolver::build(&ln_tree, 1, 1, 1).unwrap();
    assert_eq!(resolver.run(&ln_tree, &[-1.0]), 1);
    assert_eq!(resolver.run(&ln_tree, &[0.5]), 2);
}

#[test]
fn test_builds_are_deterministic() {
    let tree = DecisionTreeFactory::with_seed(3).random_tree(6, 8).unwrap();
    let selector = UniformSwitch::new(2);

    let symbols = |tree: &DecisionTree| -> Vec<String> {
        let geometry = treeforge_core::Geometry::new(6, 2, 2).unwrap();
        let mut driver = JitDriver::new().unwrap();
        Composer::new(tree, geometry, &selector)
            .compose(&mut driver)
            .unwrap()
            .into_iter()
            .map(|f| f.symbol)
            .collect()
    };
    assert_eq!(symbols(&tree), symbols(&tree));

    let first = CompiledResolver::build(&tree, 8, 2, 2).unwrap();
    let second = CompiledResolver::build(&tree, 8, 2, 2).unwrap();
    for features in DataSetFactory::with_seed(5).random_batch(1_000, 8) {
        assert_eq!(first.run(&tree, &features), second.run(&tree, &features));
    }
}

#[test]
fn test_concurrent_runs() {
    let tree = DecisionTreeFactory::with_seed(12).random_tree(6, 8).unwrap();
    let resolver = CompiledResolver::build(&tree, 8, 3, 1).unwrap();

    std::thread::scope(|scope| {
        for seed in 0..4 {
            let (resolver, tree) = (&resolver, &tree);
            scope.spawn(move || {
                let samples = DataSetFactory::with_seed(seed).random_batch(2_000, 8);
                assert_equivalent(resolver, tree, &samples);
            });
        }
    });
}

#[test]
fn test_invalid_chunking_is_rejected() {
    let tree = DecisionTreeFactory::new().trivial_gradient_tree(6).unwrap();

    for (f, s) in [(4, 2), (3, 2), (0, 1), (6, 0), (6, 6)] {
        let err = CompiledResolver::build(&tree, 1, f, s).unwrap_err();
        assert!(matches!(err, TreeForgeError::InvalidConfig(_)), "F={f} S={s}: {err}");
    }
}

#[test]
fn test_missing_features_are_rejected() {
    let tree = DecisionTreeFactory::new().distinct_gradient_tree(3).unwrap();
    let err = CompiledResolver::build(&tree, 4, 3, 1).unwrap_err();
    assert!(matches!(err, TreeForgeError::InvalidConfig(_)));
}

#[test]
#[should_panic(expected = "expected 3 features")]
fn test_short_feature_slice_panics() {
    let tree = DecisionTreeFactory::new().distinct_gradient_tree(2).unwrap();
    let resolver = CompiledResolver::build(&tree, 3, 2, 2).unwrap();
    resolver.run(&tree, &[0.0, 0.0]);
}

#[test]
#[should_panic(expected = "expected 3 features, got 1")]
fn test_short_feature_slice_panics_in_trace() {
    let tree = DecisionTreeFactory::new().distinct_gradient_tree(2).unwrap();
    let resolver = CompiledResolver::build(&tree, 3, 1, 1).unwrap();
    resolver.trace(&[0.0]);
}

#[test]
fn test_from_config() {
    let tree = DecisionTreeFactory::with_seed(1).random_tree(6, 16).unwrap();
    let config = treeforge_config::ResolverConfig::new()
        .with_tree_depth(6)
        .with_feature_count(16)
        .with_chunking(3, 3);
    let resolver = CompiledResolver::from_config(&tree, &config).unwrap();
    assert_eq!(resolver.function_count(), 9);

    let mismatched = config.with_tree_depth(8);
    assert!(matches!(
        CompiledResolver::from_config(&tree, &mismatched),
        Err(TreeForgeError::InvalidConfig(_))
    ));
}
