//! Decision tree generators.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::Result;
use crate::index::{first_index_on_level, level_of, tree_nodes};
use crate::tree::{Comparator, DecisionTree, Operation, TreeNode};

/// Builds perfect decision trees.
///
/// Random trees are reproducible: the factory owns a seeded ChaCha8 stream.
pub struct DecisionTreeFactory {
    rng: ChaCha8Rng,
}

impl DecisionTreeFactory {
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Random operations and comparators, each node reading a random feature
    /// in `0..feature_count` with a bias that halves `[0, 1)` input.
    pub fn random_tree(&mut self, depth: u32, feature_count: u32) -> Result<DecisionTree> {
        let nodes = (0..tree_nodes(depth))
            .map(|_| self.random_node(feature_count))
            .collect();
        DecisionTree::new(nodes)
    }

    fn random_node(&mut self, feature_count: u32) -> TreeNode {
        let operation = Operation::ALL[self.rng.random_range(0..Operation::ALL.len())];
        let comparator = if self.rng.random_bool(0.5) {
            Comparator::LessThan
        } else {
            Comparator::GreaterThan
        };
        let feature_index = self.rng.random_range(0..feature_count.max(1));
        TreeNode::new(feature_index, operation, comparator, operation.balanced_bias())
    }

    /// Every node reads feature 0 and splits its own interval of `[0, 1)` at
    /// the midpoint, so input `x` lands in leaf `N + floor(x * 2^D)`.
    pub fn trivial_gradient_tree(&self, depth: u32) -> Result<DecisionTree> {
        let nodes = (0..tree_nodes(depth))
            .map(|index| {
                let level = level_of(index);
                let offset = index - first_index_on_level(level);
                let bias = (2 * offset + 1) as f32 / (1u64 << (level + 1)) as f32;
                TreeNode::new(0, Operation::Bypass, Comparator::GreaterThan, bias)
            })
            .collect();
        DecisionTree::new(nodes)
    }

    /// Node `i` reads feature `i` and goes right when it exceeds 0.5.
    pub fn distinct_gradient_tree(&self, depth: u32) -> Result<DecisionTree> {
        let nodes = (0..tree_nodes(depth))
            .map(|index| {
                TreeNode::new(index as u32, Operation::Bypass, Comparator::GreaterThan, 0.5)
            })
            .collect();
        DecisionTree::new(nodes)
    }
}

impl Default for DecisionTreeFactory {
    fn default() -> Self {
        Self::new()
    }
}
