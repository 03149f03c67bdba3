//! Predicate node types.

use serde::{Deserialize, Serialize};

/// Unary operation applied to a feature before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Bypass,
    Sqrt,
    Ln,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Operation::Bypass, Operation::Sqrt, Operation::Ln];

    #[inline]
    pub fn apply(self, value: f32) -> f32 {
        match self {
            Operation::Bypass => value,
            Operation::Sqrt => value.sqrt(),
            Operation::Ln => value.ln(),
        }
    }

    /// Bias that splits uniform input on `[0, 1)` in half after this operation.
    pub fn balanced_bias(self) -> f32 {
        match self {
            Operation::Bypass => 0.5,
            Operation::Sqrt => 0.5f32.sqrt(),
            Operation::Ln => 0.5f32.ln(),
        }
    }
}

/// Ordered comparison against the node bias. NaN and equality compare false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    LessThan,
    GreaterThan,
}

impl Comparator {
    #[inline]
    pub fn compare(self, value: f32, bias: f32) -> bool {
        match self {
            Comparator::LessThan => value < bias,
            Comparator::GreaterThan => value > bias,
        }
    }
}

/// An interior predicate node.
///
/// Truth value for input `x` is `comparator(operation(x[feature_index]), bias)`.
/// A true result continues at the right child (`2i + 2`), false at the left
/// child (`2i + 1`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub feature_index: u32,
    pub operation: Operation,
    pub comparator: Comparator,
    pub bias: f32,
}

impl TreeNode {
    pub fn new(
        feature_index: u32,
        operation: Operation,
        comparator: Comparator,
        bias: f32,
    ) -> Self {
        Self {
            feature_index,
            operation,
            comparator,
            bias,
        }
    }

    /// Evaluates the predicate against a feature vector.
    #[inline]
    pub fn evaluate(&self, features: &[f32]) -> bool {
        let value = self.operation.apply(features[self.feature_index as usize]);
        self.comparator.compare(value, self.bias)
    }
}
