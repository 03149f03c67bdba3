//! Per-level choice of code generator.

/// How the next levels of a function body are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodegenStrategy {
    /// Evaluate a whole subtree of `levels` levels into a condition vector
    /// and dispatch through one jump table.
    SubtreeSwitch { levels: u32 },
    /// Evaluate one node and branch on it.
    IfThenElse,
}

impl CodegenStrategy {
    /// Tree levels consumed by this strategy.
    pub fn levels(&self) -> u32 {
        match self {
            CodegenStrategy::SubtreeSwitch { levels } => *levels,
            CodegenStrategy::IfThenElse => 1,
        }
    }
}

/// Picks a strategy given the levels left in the current function.
///
/// Consulted during composition only, never at evaluation time.
pub trait CodegenSelector: Send + Sync {
    fn select(&self, remaining_levels: u32) -> CodegenStrategy;
}

/// Always a subtree switch of the same depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSwitch {
    pub switch_depth: u32,
}

impl UniformSwitch {
    pub fn new(switch_depth: u32) -> Self {
        Self { switch_depth }
    }
}

impl CodegenSelector for UniformSwitch {
    fn select(&self, _remaining_levels: u32) -> CodegenStrategy {
        CodegenStrategy::SubtreeSwitch {
            levels: self.switch_depth,
        }
    }
}

impl<F> CodegenSelector for F
where
    F: Fn(u32) -> CodegenStrategy + Send + Sync,
{
    fn select(&self, remaining_levels: u32) -> CodegenStrategy {
        self(remaining_levels)
    }
}
