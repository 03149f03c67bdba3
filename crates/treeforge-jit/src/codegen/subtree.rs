//! Subtree emission: nested jump tables over condition vectors.
//!
//! A function body covering `F` levels is emitted as a chain of strategies
//! chosen by a [`CodegenSelector`]. With the uniform selector every step is
//! a subtree switch of `S` levels, giving `F/S` nested switches:
//!
//! ```text
//! entry:   v = condition vector of root        (2^S - 1 eager predicates)
//!          switch v -> arm_0 .. arm_{2^S-1}, default: return
//! arm_k:   <nested switch rooted at exit k>  |  slot = exit k
//!          jump return
//! return:  slot
//! ```

use cranelift_codegen::ir::types::I64;
use cranelift_codegen::ir::{Block, InstBuilder, Value};
use cranelift_frontend::{FunctionBuilder, Switch, Variable};
use tracing::trace;
use treeforge_core::index::tree_nodes;
use treeforge_core::{DecisionTree, Result, TreeForgeError, MAX_SWITCH_DEPTH};

use super::condition::emit_condition_vector;
use super::paths::leaf_paths;
use super::predicate::{emit_node_bit, Intrinsics};
use super::selector::{CodegenSelector, CodegenStrategy};
use super::variants::expand_variants;

/// Counters for one emitted function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitStats {
    /// Jump tables emitted.
    pub switches: usize,
    /// Case labels over all jump tables.
    pub cases: usize,
    /// Single-node conditional branches emitted.
    pub branches: usize,
    /// Node predicates evaluated on every call.
    pub predicates: usize,
}

/// Emits the body of one compiled function.
pub struct SubtreeEmitter<'a, 'b> {
    builder: &'a mut FunctionBuilder<'b>,
    tree: &'a DecisionTree,
    selector: &'a dyn CodegenSelector,
    features: Value,
    intrinsics: Intrinsics,
    symbol: &'a str,
    next_variable: u32,
    stats: EmitStats,
}

impl<'a, 'b> SubtreeEmitter<'a, 'b> {
    pub fn new(
        builder: &'a mut FunctionBuilder<'b>,
        tree: &'a DecisionTree,
        selector: &'a dyn CodegenSelector,
        features: Value,
        intrinsics: Intrinsics,
        symbol: &'a str,
    ) -> Self {
        Self {
            builder,
            tree,
            selector,
            features,
            intrinsics,
            symbol,
            next_variable: 0,
            stats: EmitStats::default(),
        }
    }

    pub fn stats(&self) -> EmitStats {
        self.stats
    }

    /// Emits `levels` levels below `root` starting in the current block.
    ///
    /// Returns the next node index, valid in the block the builder is left in.
    pub fn emit(&mut self, root: usize, levels: u32) -> Result<Value> {
        let strategy = self.selector.select(levels);
        let consumed = strategy.levels();
        if consumed == 0 || consumed > levels || consumed > MAX_SWITCH_DEPTH {
            return Err(TreeForgeError::emit_failure(
                self.symbol,
                format!("{strategy:?} does not fit {levels} remaining levels at node {root}"),
            ));
        }

        match strategy {
            CodegenStrategy::SubtreeSwitch { levels: switch_levels } => {
                self.emit_switch(root, switch_levels, levels - switch_levels)
            }
            CodegenStrategy::IfThenElse => self.emit_if_then_else(root, levels - 1),
        }
    }

    fn emit_switch(&mut self, root: usize, switch_levels: u32, remaining: u32) -> Result<Value> {
        let (vector, offsets) = emit_condition_vector(
            self.builder,
            self.tree,
            root,
            switch_levels,
            self.features,
            &self.intrinsics,
        );
        let condition_bits = tree_nodes(switch_levels) as u32;
        self.stats.switches += 1;
        self.stats.predicates += condition_bits as usize;

        let return_block = self.builder.create_block();
        let slot = self.declare_slot();

        let paths = leaf_paths(root, switch_levels, &offsets);
        let mut switch = Switch::new();
        let mut arms = Vec::with_capacity(paths.len());
        let mut cases = 0;
        for path in &paths {
            let arm = self.builder.create_block();
            let variants = expand_variants(condition_bits, &path.bits);
            cases += variants.len();
            for variant in variants {
                switch.set_entry(u128::from(variant), arm);
            }
            arms.push((arm, path.leaf));
        }
        self.stats.cases += cases;
        trace!(event = "switch", root, cases, arms = arms.len());
        // variants cover every vector value, so the default arm is never taken
        switch.emit(self.builder, vector, return_block);

        for (arm, leaf) in arms {
            self.builder.switch_to_block(arm);
            self.emit_continuation(slot, leaf, remaining, return_block)?;
        }

        self.builder.switch_to_block(return_block);
        Ok(self.builder.use_var(slot))
    }

    fn emit_if_then_else(&mut self, root: usize, remaining: u32) -> Result<Value> {
        let bit = emit_node_bit(
            self.builder,
            self.tree.node(root),
            self.features,
            &self.intrinsics,
        );
        self.stats.branches += 1;
        self.stats.predicates += 1;

        let (false_child, true_child) = self.tree.children(root);
        let true_block = self.builder.create_block();
        let false_block = self.builder.create_block();
        let return_block = self.builder.create_block();
        let slot = self.declare_slot();

        self.builder
            .ins()
            .brif(bit, true_block, &[], false_block, &[]);

        self.builder.switch_to_block(true_block);
        self.emit_continuation(slot, true_child, remaining, return_block)?;
        self.builder.switch_to_block(false_block);
        self.emit_continuation(slot, false_child, remaining, return_block)?;

        self.builder.switch_to_block(return_block);
        Ok(self.builder.use_var(slot))
    }

    // Stores the next index for `node` into `slot` and jumps to `return_block`.
    fn emit_continuation(
        &mut self,
        slot: Variable,
        node: usize,
        remaining: u32,
        return_block: Block,
    ) -> Result<()> {
        let next = if remaining > 0 {
            self.emit(node, remaining)?
        } else {
            self.builder.ins().iconst(I64, node as i64)
        };
        self.builder.def_var(slot, next);
        self.builder.ins().jump(return_block, &[]);
        Ok(())
    }

    fn declare_slot(&mut self) -> Variable {
        let slot = Variable::from_u32(self.next_variable);
        self.next_variable += 1;
        self.builder.declare_var(slot, I64);
        slot
    }
}
