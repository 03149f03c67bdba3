//! Reference tree walker, used as the baseline the compiled resolver must
//! agree with.

use crate::tree::DecisionTree;

/// Walks `tree` from the root and returns the leaf index reached.
pub fn interpret(tree: &DecisionTree, features: &[f32]) -> usize {
    walk(tree, 0, features)
}

fn walk(tree: &DecisionTree, index: usize, features: &[f32]) -> usize {
    if tree.is_leaf(index) {
        return index;
    }
    let (false_child, true_child) = tree.children(index);
    if tree.node(index).evaluate(features) {
        walk(tree, true_child, features)
    } else {
        walk(tree, false_child, features)
    }
}

/// Boundary nodes visited while walking, one per `function_depth` levels.
///
/// Mirrors the hop sequence of a compiled resolver and is used to check it.
pub fn interpret_hops(tree: &DecisionTree, features: &[f32], function_depth: u32) -> Vec<usize> {
    let mut hops = Vec::new();
    let mut index = 0;
    let mut level = 0;
    while !tree.is_leaf(index) {
        if level % function_depth == 0 {
            hops.push(index);
        }
        let (false_child, true_child) = tree.children(index);
        index = if tree.node(index).evaluate(features) {
            true_child
        } else {
            false_child
        };
        level += 1;
    }
    hops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Comparator, Operation, TreeNode};

    fn gt(feature: u32, bias: f32) -> TreeNode {
        TreeNode::new(feature, Operation::Bypass, Comparator::GreaterThan, bias)
    }

    #[test]
    fn test_depth_one() {
        let tree = DecisionTree::new(vec![gt(0, 0.5)]).unwrap();
        assert_eq!(interpret(&tree, &[0.25]), 1);
        assert_eq!(interpret(&tree, &[0.75]), 2);
        // equality falls on the false side
        assert_eq!(interpret(&tree, &[0.5]), 1);
        assert_eq!(interpret(&tree, &[f32::NAN]), 1);
    }

    #[test]
    fn test_hops_follow_function_boundaries() {
        let tree = DecisionTree::new(vec![gt(0, 0.5); 15]).unwrap();
        // always true: 0 -> 2 -> 6 -> 14 -> leaf 30
        assert_eq!(interpret(&tree, &[1.0]), 30);
        assert_eq!(interpret_hops(&tree, &[1.0], 2), vec![0, 6]);
        assert_eq!(interpret_hops(&tree, &[0.0], 1), vec![0, 1, 3, 7]);
    }
}
