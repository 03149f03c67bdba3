//! Code generation of decision-tree evaluators via Cranelift.
//!
//! A tree of depth `D` is cut into functions of `F` levels. Every node on
//! levels `0, F, 2F, …` roots one compiled function, which evaluates its `F`
//! levels and returns the index of the node to continue at: the root of the
//! next function, or a tree leaf.
//!
//! Inside a function, levels are folded into jump tables of `S` levels each.
//! The `2^S - 1` nodes of such a subtree are evaluated eagerly into a
//! condition vector, and every possible vector value gets a case label that
//! jumps to the arm of the exit it selects.
//!
//! # Function Signature
//!
//! - **Evaluator**: `fn(features: *const f32) -> i64`

#[cfg(test)]
mod tests;

mod composer;
mod condition;
mod paths;
mod predicate;
mod selector;
mod subtree;
mod variants;

pub use composer::{evaluator_symbol, ComposedFunction, Composer, SYMBOL_PREFIX};
pub use condition::{subtree_bit_offsets, BitOffsets};
pub use paths::{leaf_paths, LeafPath, PathBits};
pub use predicate::Intrinsics;
pub use selector::{CodegenSelector, CodegenStrategy, UniformSwitch};
pub use subtree::EmitStats;
pub use variants::{expand_variants, fixed_template};
