//! Feature vector generators.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::tree::{Comparator, DecisionTree, Operation, TreeNode};

/// Branch to take at a node while steering an input down a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Predicate false, continue at `2i + 1`.
    Left,
    /// Predicate true, continue at `2i + 2`.
    Right,
}

// distance from the bias of a steered value, before inverting the operation
const STEER_DELTA: f32 = 0.25;

/// Builds feature vectors.
pub struct DataSetFactory {
    rng: ChaCha8Rng,
}

impl DataSetFactory {
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// A single-feature vector.
    pub fn trivial(value: f32) -> Vec<f32> {
        vec![value]
    }

    /// Uniform `[0, 1)` features.
    pub fn random(&mut self, feature_count: usize) -> Vec<f32> {
        (0..feature_count).map(|_| self.rng.random::<f32>()).collect()
    }

    /// `count` random vectors of `feature_count` features each.
    pub fn random_batch(&mut self, count: usize, feature_count: usize) -> Vec<Vec<f32>> {
        (0..count).map(|_| self.random(feature_count)).collect()
    }

    /// A vector that takes `path` from the root, one direction per level.
    ///
    /// Only the features read by nodes on the path are steered; the rest stay
    /// zero. Later nodes win when two path nodes share a feature.
    pub fn distinct(tree: &DecisionTree, path: &[Direction]) -> Vec<f32> {
        let mut features = vec![0.0; tree.required_features()];
        let mut index = 0;
        for direction in path {
            if tree.is_leaf(index) {
                break;
            }
            let node = tree.node(index);
            features[node.feature_index as usize] = steer(node, *direction);
            let (false_child, true_child) = tree.children(index);
            index = match direction {
                Direction::Left => false_child,
                Direction::Right => true_child,
            };
        }
        features
    }
}

impl Default for DataSetFactory {
    fn default() -> Self {
        Self::new()
    }
}

fn steer(node: &TreeNode, direction: Direction) -> f32 {
    let want_true = direction == Direction::Right;
    let above = (node.comparator == Comparator::GreaterThan) == want_true;
    let target = if above {
        node.bias + STEER_DELTA
    } else {
        node.bias - STEER_DELTA
    };

    match node.operation {
        Operation::Bypass => target,
        Operation::Ln => target.exp(),
        Operation::Sqrt if target >= 0.0 => target * target,
        // no square root lands below a non-positive bias; NaN compares false
        Operation::Sqrt if node.bias > 0.0 => 0.0,
        Operation::Sqrt => -1.0,
    }
}
