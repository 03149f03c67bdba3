//! TreeForge - A Decision Tree JIT Compiler in Rust
//!
//! Compiles perfect decision trees into native evaluators: nested jump
//! tables over bit-packed condition vectors, one function per `F` levels.
//!
//! # Example
//!
//! ```rust,no_run
//! use treeforge::prelude::*;
//!
//! let tree = DecisionTreeFactory::with_seed(7).random_tree(8, 32).unwrap();
//! let resolver = CompiledResolver::build(&tree, 32, 4, 2).unwrap();
//!
//! let features = DataSetFactory::with_seed(1).random(32);
//! assert_eq!(resolver.run(&tree, &features), interpret(&tree, &features));
//! ```

// Tree model
pub use treeforge_core::{
    interpret, BoundaryLayout, Comparator, DataSetFactory, DecisionTree, DecisionTreeFactory,
    Direction, Geometry, Operation, Result, TreeForgeError, TreeNode, MAX_SWITCH_DEPTH,
    MAX_TREE_DEPTH,
};

// Configuration
pub use treeforge_config::{ConfigError, ResolverConfig};

// Compiled resolver
pub use treeforge_jit::{
    BuildReport, CodegenSelector, CodegenStrategy, CompiledResolver, FileObjectCache,
    MemoryObjectCache, ObjectCache, ResolverBuilder, UniformSwitch,
};

/// Lower-level code generation and JIT access.
pub mod jit {
    pub use treeforge_jit::{cache, codegen, driver};
}

#[cfg(feature = "console")]
pub use treeforge_console as console;

#[cfg(feature = "benchmark")]
pub use treeforge_benchmark as benchmark;

mod compile;
pub use compile::{compile, compile_with};

pub mod prelude {
    pub use super::{compile, compile_with};
    pub use super::{
        interpret, DataSetFactory, DecisionTree, DecisionTreeFactory, Direction, TreeNode,
    };
    pub use super::{Comparator, Operation};
    pub use super::{CompiledResolver, ResolverConfig, TreeForgeError};
}
