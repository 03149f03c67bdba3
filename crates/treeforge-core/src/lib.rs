//! TreeForge Core - tree model and index algebra
//!
//! This crate provides the pieces shared by the code generator and its
//! callers:
//! - An immutable perfect decision tree of predicate nodes
//! - Index arithmetic over its level-order layout
//! - Chunking geometry validation
//! - A reference interpreter and tree / data-set factories

pub mod error;
pub mod factory;
pub mod geometry;
pub mod index;
pub mod interpreter;
pub mod tree;

pub use error::{Result, TreeForgeError};
pub use factory::{DataSetFactory, DecisionTreeFactory, Direction};
pub use geometry::{Geometry, MAX_SWITCH_DEPTH, MAX_TREE_DEPTH};
pub use index::BoundaryLayout;
pub use interpreter::interpret;
pub use tree::{Comparator, DecisionTree, Operation, TreeNode};
