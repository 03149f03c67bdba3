//! Tests for the tree and data-set factories.

use super::*;
use crate::interpreter::interpret;

#[test]
fn test_trivial_gradient_tree_depth_two() {
    let tree = DecisionTreeFactory::new().trivial_gradient_tree(2).unwrap();

    assert_eq!(interpret(&tree, &DataSetFactory::trivial(1.0 / 8.0)), 3);
    assert_eq!(interpret(&tree, &DataSetFactory::trivial(3.0 / 8.0)), 4);
    assert_eq!(interpret(&tree, &DataSetFactory::trivial(5.0 / 8.0)), 5);
    assert_eq!(interpret(&tree, &DataSetFactory::trivial(7.0 / 8.0)), 6);
}

#[test]
fn test_trivial_gradient_tree_is_monotone() {
    let tree = DecisionTreeFactory::new().trivial_gradient_tree(5).unwrap();
    let leaves = tree.leaf_count();
    for slice in 0..leaves {
        let x = (slice as f32 + 0.5) / leaves as f32;
        assert_eq!(interpret(&tree, &DataSetFactory::trivial(x)), tree.len() + slice);
    }
}

#[test]
fn test_distinct_gradient_tree_paths() {
    let tree = DecisionTreeFactory::new().distinct_gradient_tree(2).unwrap();
    let (l, r) = (Direction::Left, Direction::Right);

    assert_eq!(interpret(&tree, &DataSetFactory::distinct(&tree, &[l, l])), 3);
    assert_eq!(interpret(&tree, &DataSetFactory::distinct(&tree, &[l, r])), 4);
    assert_eq!(interpret(&tree, &DataSetFactory::distinct(&tree, &[r, l])), 5);
    assert_eq!(interpret(&tree, &DataSetFactory::distinct(&tree, &[r, r])), 6);
}

#[test]
fn test_steering_handles_every_operation() {
    use crate::tree::{Comparator, DecisionTree, Operation, TreeNode};

    for operation in Operation::ALL {
        for comparator in [Comparator::LessThan, Comparator::GreaterThan] {
            let node = TreeNode::new(0, operation, comparator, operation.balanced_bias());
            let tree = DecisionTree::new(vec![node]).unwrap();
            assert_eq!(interpret(&tree, &DataSetFactory::distinct(&tree, &[Direction::Left])), 1);
            assert_eq!(interpret(&tree, &DataSetFactory::distinct(&tree, &[Direction::Right])), 2);
        }
    }
}

#[test]
fn test_random_tree_is_reproducible() {
    let a = DecisionTreeFactory::with_seed(42).random_tree(6, 10).unwrap();
    let b = DecisionTreeFactory::with_seed(42).random_tree(6, 10).unwrap();
    let c = DecisionTreeFactory::with_seed(43).random_tree(6, 10).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(a.max_feature_index() < 10);
}

#[test]
fn test_random_batch_shape() {
    let mut data = DataSetFactory::with_seed(1);
    let batch = data.random_batch(5, 3);
    assert_eq!(batch.len(), 5);
    assert!(batch.iter().all(|v| v.len() == 3));
    assert!(batch.iter().flatten().all(|x| (0.0..1.0).contains(x)));
}
