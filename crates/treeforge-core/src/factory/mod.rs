//! Tree and data-set construction for tests, benchmarks and the CLI.

mod dataset;
mod tree_factory;

#[cfg(test)]
mod tests;

pub use dataset::{DataSetFactory, Direction};
pub use tree_factory::DecisionTreeFactory;
