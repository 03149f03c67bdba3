//! Chunking geometry: how tree levels are folded into functions and switches.

use crate::error::{Result, TreeForgeError};
use crate::index::{compiled_function_count, tree_nodes};

/// Deepest tree the index layout supports.
pub const MAX_TREE_DEPTH: u32 = 30;

/// Deepest switch subtree. A switch over `S` levels has `2^(2^S - 1)` cases,
/// so 4 levels already means 32768 jump-table entries per switch.
pub const MAX_SWITCH_DEPTH: u32 = 4;

/// Tree depth `D`, function depth `F` and switch depth `S` of a compiled
/// resolver.
///
/// Valid when `D mod F == 0` and `F mod S == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    pub tree_depth: u32,
    pub function_depth: u32,
    pub switch_depth: u32,
}

impl Geometry {
    /// Creates and validates a geometry.
    pub fn new(tree_depth: u32, function_depth: u32, switch_depth: u32) -> Result<Self> {
        let geometry = Self {
            tree_depth,
            function_depth,
            switch_depth,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn validate(&self) -> Result<()> {
        let Geometry {
            tree_depth,
            function_depth,
            switch_depth,
        } = *self;

        if tree_depth == 0 || tree_depth > MAX_TREE_DEPTH {
            return Err(TreeForgeError::invalid_config(format!(
                "tree depth {tree_depth} outside 1..={MAX_TREE_DEPTH}"
            )));
        }
        if function_depth == 0 || switch_depth == 0 {
            return Err(TreeForgeError::invalid_config(
                "function depth and switch depth must be positive",
            ));
        }
        if switch_depth > MAX_SWITCH_DEPTH {
            return Err(TreeForgeError::invalid_config(format!(
                "switch depth {switch_depth} exceeds {MAX_SWITCH_DEPTH}"
            )));
        }
        if tree_depth % function_depth != 0 {
            return Err(TreeForgeError::invalid_config(format!(
                "tree depth {tree_depth} is not a multiple of function depth {function_depth}"
            )));
        }
        if function_depth % switch_depth != 0 {
            return Err(TreeForgeError::invalid_config(format!(
                "function depth {function_depth} is not a multiple of switch depth {switch_depth}"
            )));
        }
        Ok(())
    }

    /// Interior node count `N = 2^D - 1`.
    pub fn node_count(&self) -> usize {
        tree_nodes(self.tree_depth)
    }

    /// Number of compiled functions, one per boundary node.
    pub fn function_count(&self) -> usize {
        compiled_function_count(self.tree_depth, self.function_depth)
    }

    /// Boundary hops per evaluation.
    pub fn hops(&self) -> u32 {
        self.tree_depth / self.function_depth
    }

    /// Bits written into a condition vector, `M = 2^S - 1`.
    pub fn condition_bits(&self) -> u32 {
        tree_nodes(self.switch_depth) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_geometry() {
        let g = Geometry::new(6, 3, 3).unwrap();
        assert_eq!(g.function_count(), 9);
        assert_eq!(g.hops(), 2);
        assert_eq!(g.condition_bits(), 7);
        assert_eq!(g.node_count(), 63);
    }

    #[test]
    fn test_divisibility_is_enforced() {
        assert!(matches!(
            Geometry::new(6, 4, 2),
            Err(TreeForgeError::InvalidConfig(_))
        ));
        assert!(matches!(
            Geometry::new(6, 3, 2),
            Err(TreeForgeError::InvalidConfig(_))
        ));
        assert!(Geometry::new(0, 1, 1).is_err());
        assert!(Geometry::new(4, 0, 1).is_err());
        assert!(Geometry::new(10, 5, 5).is_err());
    }
}
