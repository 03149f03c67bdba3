//! Function composition: one compiled evaluator per function-boundary node.

use std::time::Instant;

use cranelift_codegen::ir::{Function, InstBuilder, UserFuncName};
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_module::FuncId;
use tracing::{debug, info};
use treeforge_core::index::BoundaryLayout;
use treeforge_core::{DecisionTree, Geometry, Result};

use super::selector::CodegenSelector;
use super::subtree::{EmitStats, SubtreeEmitter};
use crate::driver::JitDriver;

/// Prefix of every evaluator symbol; the decimal node index follows.
pub const SYMBOL_PREFIX: &str = "node_evaluator_";

/// Symbol of the evaluator compiled for boundary node `root`.
pub fn evaluator_symbol(root: usize) -> String {
    format!("{SYMBOL_PREFIX}{root}")
}

/// A verified, not yet compiled evaluator.
pub struct ComposedFunction {
    pub root: usize,
    pub symbol: String,
    pub func_id: FuncId,
    pub function: Function,
    pub stats: EmitStats,
}

/// Emits the evaluator functions of a tree.
pub struct Composer<'a> {
    tree: &'a DecisionTree,
    geometry: Geometry,
    selector: &'a dyn CodegenSelector,
}

impl<'a> Composer<'a> {
    pub fn new(
        tree: &'a DecisionTree,
        geometry: Geometry,
        selector: &'a dyn CodegenSelector,
    ) -> Self {
        Self {
            tree,
            geometry,
            selector,
        }
    }

    /// Emits one function per boundary node, in slot order.
    pub fn compose(&self, driver: &mut JitDriver) -> Result<Vec<ComposedFunction>> {
        let layout = BoundaryLayout::new(self.geometry.tree_depth, self.geometry.function_depth);
        let start = Instant::now();
        let mut builder_ctx = FunctionBuilderContext::new();

        let functions = layout
            .boundary_nodes()
            .map(|root| self.compose_function(driver, &mut builder_ctx, root))
            .collect::<Result<Vec<_>>>()?;

        let cases: usize = functions.iter().map(|f| f.stats.cases).sum();
        info!(
            event = "compose_end",
            functions = functions.len(),
            cases,
            duration_ms = start.elapsed().as_millis() as u64,
        );
        Ok(functions)
    }

    /// Emits and verifies the evaluator for `root`.
    pub fn compose_function(
        &self,
        driver: &mut JitDriver,
        builder_ctx: &mut FunctionBuilderContext,
        root: usize,
    ) -> Result<ComposedFunction> {
        let symbol = evaluator_symbol(root);
        let func_id = driver.declare_evaluator(&symbol)?;
        let mut function = Function::with_name_signature(
            UserFuncName::user(0, func_id.as_u32()),
            driver.evaluator_signature(),
        );
        let intrinsics = driver.import_intrinsics(&mut function);

        let stats = {
            let mut builder = FunctionBuilder::new(&mut function, builder_ctx);
            let entry = builder.create_block();
            builder.append_block_params_for_function_params(entry);
            builder.switch_to_block(entry);
            let features = builder.block_params(entry)[0];

            let mut emitter = SubtreeEmitter::new(
                &mut builder,
                self.tree,
                self.selector,
                features,
                intrinsics,
                &symbol,
            );
            let next_index = emitter.emit(root, self.geometry.function_depth)?;
            let stats = emitter.stats();

            builder.ins().return_(&[next_index]);
            builder.seal_all_blocks();
            builder.finalize();
            stats
        };

        driver.verify(&symbol, &function)?;
        debug!(
            event = "function_composed",
            root,
            switches = stats.switches,
            cases = stats.cases,
            predicates = stats.predicates,
        );

        Ok(ComposedFunction {
            root,
            symbol,
            func_id,
            function,
            stats,
        })
    }
}
