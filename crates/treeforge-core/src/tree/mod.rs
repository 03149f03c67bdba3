//! Immutable perfect binary decision tree.

mod node;


use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeForgeError};
use crate::geometry::MAX_TREE_DEPTH;
use crate::index::{false_child, level_of, nodes_on_level, true_child};

pub use node::{Comparator, Operation, TreeNode};

/// A perfect binary tree of predicate nodes in level order.
///
/// Holds `N = 2^D - 1` interior nodes. Leaves are not stored: their indices
/// are `[N, N + 2^D)` and a finished evaluation returns one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TreeNode>", into = "Vec<TreeNode>")]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    depth: u32,
}

impl DecisionTree {
    /// Creates a tree from level-ordered interior nodes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the node count is not `2^D - 1` for some
    /// depth `1..=MAX_TREE_DEPTH`.
    pub fn new(nodes: Vec<TreeNode>) -> Result<Self> {
        let count = nodes.len();
        if count == 0 || !(count + 1).is_power_of_two() {
            return Err(TreeForgeError::invalid_config(format!(
                "{count} nodes do not form a perfect binary tree"
            )));
        }
        let depth = level_of(count);
        if depth > MAX_TREE_DEPTH {
            return Err(TreeForgeError::invalid_config(format!(
                "tree depth {depth} exceeds {MAX_TREE_DEPTH}"
            )));
        }
        Ok(Self { nodes, depth })
    }

    /// Number of levels of interior nodes.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Number of interior nodes, which is also the first leaf index.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn leaf_count(&self) -> usize {
        nodes_on_level(self.depth)
    }

    /// Returns the interior node at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is a leaf index.
    #[inline]
    pub fn node(&self, index: usize) -> &TreeNode {
        &self.nodes[index]
    }

    pub fn get(&self, index: usize) -> Option<&TreeNode> {
        self.nodes.get(index)
    }

    /// `(false_child, true_child)` of an interior node.
    #[inline]
    pub fn children(&self, index: usize) -> (usize, usize) {
        (false_child(index), true_child(index))
    }

    #[inline]
    pub fn is_leaf(&self, index: usize) -> bool {
        index >= self.nodes.len()
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Largest feature index referenced by any node.
    pub fn max_feature_index(&self) -> u32 {
        self.nodes
            .iter()
            .map(|n| n.feature_index)
            .max()
            .unwrap_or_default()
    }

    /// Minimum feature vector length needed to evaluate this tree.
    pub fn required_features(&self) -> usize {
        self.max_feature_index() as usize + 1
    }
}

impl TryFrom<Vec<TreeNode>> for DecisionTree {
    type Error = TreeForgeError;

    fn try_from(nodes: Vec<TreeNode>) -> Result<Self> {
        DecisionTree::new(nodes)
    }
}

impl From<DecisionTree> for Vec<TreeNode> {
    fn from(tree: DecisionTree) -> Self {
        tree.nodes
    }
}
