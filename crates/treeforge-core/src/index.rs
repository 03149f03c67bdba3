//! Index arithmetic over the level-order layout of a perfect binary tree.
//!
//! ```text
//! Level 0:           [0]
//! Level 1:        [1]   [2]
//! Level 2:      [3][4] [5][6]
//! ```
//!
//! The false branch of node `i` continues at `2i + 1`, the true branch at
//! `2i + 2`. Leaf indices continue contiguously after the interior nodes.

/// Number of nodes in a perfect tree with `levels` levels.
#[inline]
pub const fn tree_nodes(levels: u32) -> usize {
    (1usize << levels) - 1
}

/// Number of nodes on `level`.
#[inline]
pub const fn nodes_on_level(level: u32) -> usize {
    1usize << level
}

/// Index of the leftmost node on `level`.
#[inline]
pub const fn first_index_on_level(level: u32) -> usize {
    tree_nodes(level)
}

/// Level that `index` lives on.
#[inline]
pub const fn level_of(index: usize) -> u32 {
    usize::BITS - 1 - (index + 1).leading_zeros()
}

#[inline]
pub const fn false_child(index: usize) -> usize {
    2 * index + 1
}

#[inline]
pub const fn true_child(index: usize) -> usize {
    2 * index + 2
}

/// Maps a breadth-first bit offset inside the subtree rooted at `root` back
/// to the node index in the full tree.
///
/// Bit 0 is `root` itself, bits 1 and 2 are its children, and so on.
pub fn subtree_node_for_bit(root: usize, bit: u32) -> usize {
    let root_level = level_of(root);
    let level_in_subtree = level_of(bit as usize);

    let root_offset = root - first_index_on_level(root_level);
    let nodes_on_subtree_level = nodes_on_level(level_in_subtree);
    let first_on_subtree_level = first_index_on_level(root_level + level_in_subtree)
        + root_offset * nodes_on_subtree_level;

    let offset_in_level = bit as usize - tree_nodes(level_in_subtree);
    first_on_subtree_level + offset_in_level
}

/// Number of compiled functions for a tree of `tree_depth` levels chunked
/// into functions of `function_depth` levels: `Σ 2^(F·i)` for `i < D/F`.
pub fn compiled_function_count(tree_depth: u32, function_depth: u32) -> usize {
    let chunks = tree_depth.div_ceil(function_depth);
    (0..chunks)
        .map(|i| nodes_on_level(function_depth * i))
        .sum()
}

/// Dense slot numbering of function-boundary nodes.
///
/// Boundary nodes live on levels `0, F, 2F, …`. Slots are assigned level by
/// level, left to right, so the function table needs no holes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryLayout {
    function_depth: u32,
    tree_depth: u32,
    // first slot of each boundary level
    level_starts: Vec<usize>,
}

impl BoundaryLayout {
    pub fn new(tree_depth: u32, function_depth: u32) -> Self {
        let mut level_starts = Vec::new();
        let mut next = 0;
        let mut level = 0;
        while level < tree_depth {
            level_starts.push(next);
            next += nodes_on_level(level);
            level += function_depth;
        }
        Self {
            function_depth,
            tree_depth,
            level_starts,
        }
    }

    /// Total number of boundary nodes.
    pub fn len(&self) -> usize {
        compiled_function_count(self.tree_depth, self.function_depth)
    }

    pub fn is_empty(&self) -> bool {
        self.level_starts.is_empty()
    }

    pub fn function_depth(&self) -> u32 {
        self.function_depth
    }

    pub fn is_boundary(&self, index: usize) -> bool {
        let level = level_of(index);
        level < self.tree_depth && level % self.function_depth == 0
    }

    /// Slot of a boundary node. `index` must be a boundary node.
    #[inline]
    pub fn slot(&self, index: usize) -> usize {
        let level = level_of(index);
        debug_assert!(level % self.function_depth == 0, "node {index} is not on a boundary level");
        self.level_starts[(level / self.function_depth) as usize] + index
            - first_index_on_level(level)
    }

    /// Boundary node indices in slot order.
    pub fn boundary_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.tree_depth)
            .step_by(self.function_depth as usize)
            .flat_map(|level| {
                let first = first_index_on_level(level);
                first..first + nodes_on_level(level)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_arithmetic() {
        assert_eq!(tree_nodes(3), 7);
        assert_eq!(level_of(0), 0);
        assert_eq!(level_of(2), 1);
        assert_eq!(level_of(3), 2);
        assert_eq!(level_of(6), 2);
        assert_eq!(level_of(7), 3);
        assert_eq!(first_index_on_level(2), 3);
    }

    #[test]
    fn test_children() {
        assert_eq!(false_child(0), 1);
        assert_eq!(true_child(0), 2);
        assert_eq!(false_child(2), 5);
        assert_eq!(true_child(2), 6);
    }

    #[test]
    fn test_subtree_bits_follow_breadth_first_order() {
        // subtree of 3 levels rooted at node 2
        let nodes: Vec<usize> = (0..7).map(|bit| subtree_node_for_bit(2, bit)).collect();
        assert_eq!(nodes, vec![2, 5, 6, 11, 12, 13, 14]);

        let nodes: Vec<usize> = (0..3).map(|bit| subtree_node_for_bit(4, bit)).collect();
        assert_eq!(nodes, vec![4, 9, 10]);
    }

    #[test]
    fn test_compiled_function_count() {
        assert_eq!(compiled_function_count(4, 4), 1);
        assert_eq!(compiled_function_count(6, 3), 9);
        assert_eq!(compiled_function_count(6, 2), 1 + 4 + 16);
        assert_eq!(compiled_function_count(2, 2), 1);
    }

    #[test]
    fn test_boundary_layout_slots_are_dense() {
        let layout = BoundaryLayout::new(6, 3);
        let nodes: Vec<usize> = layout.boundary_nodes().collect();
        assert_eq!(nodes.len(), 9);
        assert_eq!(nodes[0], 0);
        assert_eq!(&nodes[1..], &[7, 8, 9, 10, 11, 12, 13, 14]);

        for (slot, node) in nodes.iter().enumerate() {
            assert_eq!(layout.slot(*node), slot);
            assert!(layout.is_boundary(*node));
        }
        assert!(!layout.is_boundary(1));
        assert!(!layout.is_boundary(63));
    }
}
