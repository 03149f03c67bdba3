//! Single-node predicate emission.

use cranelift_codegen::ir::condcodes::FloatCC;
use cranelift_codegen::ir::types::{F32, I64};
use cranelift_codegen::ir::{FuncRef, InstBuilder, MemFlags, Value};
use cranelift_frontend::FunctionBuilder;
use treeforge_core::{Comparator, Operation, TreeNode};

/// External functions a compiled evaluator may call.
#[derive(Debug, Clone, Copy)]
pub struct Intrinsics {
    /// `fn(f32) -> f32` natural logarithm.
    pub ln: FuncRef,
}

/// Emits `comparator(operation(features[feature_index]), bias)` and returns
/// the `i8` result (0 or 1).
pub fn emit_node_bit(
    builder: &mut FunctionBuilder,
    node: &TreeNode,
    features: Value,
    intrinsics: &Intrinsics,
) -> Value {
    let feature = emit_feature_load(builder, node.feature_index, features);
    let operand = emit_operation(builder, node.operation, feature, intrinsics);
    emit_comparison(builder, node.comparator, node.bias, operand)
}

fn emit_feature_load(builder: &mut FunctionBuilder, feature_index: u32, features: Value) -> Value {
    let byte_offset = i64::from(feature_index) * 4;
    // the load immediate is a signed 32-bit offset
    match i32::try_from(byte_offset) {
        Ok(offset) => builder.ins().load(F32, MemFlags::trusted(), features, offset),
        Err(_) => {
            let addr = builder.ins().iadd_imm(features, byte_offset);
            builder.ins().load(F32, MemFlags::trusted(), addr, 0)
        }
    }
}

fn emit_operation(
    builder: &mut FunctionBuilder,
    operation: Operation,
    value: Value,
    intrinsics: &Intrinsics,
) -> Value {
    match operation {
        Operation::Bypass => value,
        Operation::Sqrt => builder.ins().sqrt(value),
        Operation::Ln => {
            let call = builder.ins().call(intrinsics.ln, &[value]);
            builder.inst_results(call)[0]
        }
    }
}

fn emit_comparison(
    builder: &mut FunctionBuilder,
    comparator: Comparator,
    bias: f32,
    value: Value,
) -> Value {
    let bias = builder.ins().f32const(bias);
    // ordered comparisons: NaN and equality are false
    let cc = match comparator {
        Comparator::LessThan => FloatCC::LessThan,
        Comparator::GreaterThan => FloatCC::GreaterThan,
    };
    builder.ins().fcmp(cc, value, bias)
}

/// Widens a node bit to the condition-vector width.
pub fn widen_bit(builder: &mut FunctionBuilder, bit: Value) -> Value {
    builder.ins().uextend(I64, bit)
}
