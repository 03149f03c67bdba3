//! Cranelift JIT driver.
//!
//! Owns the `JITModule` (executable memory), the native ISA and the
//! intrinsic symbols evaluators may call. The code generator hands it
//! finished IR functions; the resolver resolves its own symbols through
//! [`JitDriver::lookup`].

use std::mem::ManuallyDrop;
use std::sync::OnceLock;

use cranelift_codegen::ir::types::{F32, I64};
use cranelift_codegen::ir::{AbiParam, Function, Signature};
use cranelift_codegen::isa::OwnedTargetIsa;
use cranelift_codegen::settings::{self, Configurable};
use cranelift_codegen::Context;
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{FuncId, FuncOrDataId, Linkage, Module};
use treeforge_core::{Result, TreeForgeError};

use crate::codegen::Intrinsics;

/// Signature of a compiled evaluator: feature pointer in, next node index out.
pub type EvaluatorFn = unsafe extern "C" fn(*const f32) -> i64;

const LN_SYMBOL: &str = "treeforge_ln_f32";

extern "C" fn ln_f32(value: f32) -> f32 {
    value.ln()
}

static NATIVE_ISA: OnceLock<std::result::Result<OwnedTargetIsa, String>> = OnceLock::new();

/// Native target, detected once per process and shared by every driver.
fn native_isa() -> Result<OwnedTargetIsa> {
    NATIVE_ISA
        .get_or_init(build_native_isa)
        .clone()
        .map_err(TreeForgeError::BackendUnavailable)
}

fn build_native_isa() -> std::result::Result<OwnedTargetIsa, String> {
    let mut flag_builder = settings::builder();
    for (name, value) in [
        ("use_colocated_libcalls", "false"),
        ("is_pic", "false"),
        ("opt_level", "speed"),
    ] {
        flag_builder
            .set(name, value)
            .map_err(|e| format!("cranelift setting {name}: {e}"))?;
    }
    let isa_builder =
        cranelift_native::builder().map_err(|e| format!("cranelift ISA builder: {e}"))?;
    isa_builder
        .finish(settings::Flags::new(flag_builder))
        .map_err(|e| format!("cranelift ISA finish: {e}"))
}

/// JIT compiler for evaluator functions.
pub struct JitDriver {
    module: ManuallyDrop<JITModule>,
    ln: FuncId,
}

impl JitDriver {
    /// Creates a driver on the native target.
    ///
    /// # Errors
    ///
    /// Returns `BackendUnavailable` if Cranelift does not support this host.
    pub fn new() -> Result<Self> {
        let isa = native_isa()?;
        let mut builder = JITBuilder::with_isa(isa, cranelift_module::default_libcall_names());
        builder.symbol(LN_SYMBOL, ln_f32 as *const u8);
        let mut module = JITModule::new(builder);

        // declared first so it keeps the same FuncId in every driver, which
        // cached IR relies on
        let mut ln_signature = module.make_signature();
        ln_signature.params.push(AbiParam::new(F32));
        ln_signature.returns.push(AbiParam::new(F32));
        let ln = module
            .declare_function(LN_SYMBOL, Linkage::Import, &ln_signature)
            .map_err(|e| TreeForgeError::emit_failure(LN_SYMBOL, e))?;

        Ok(Self {
            module: ManuallyDrop::new(module),
            ln,
        })
    }

    /// `(pointer) -> i64` in the target's default calling convention.
    pub fn evaluator_signature(&self) -> Signature {
        let mut signature = self.module.make_signature();
        signature
            .params
            .push(AbiParam::new(self.module.target_config().pointer_type()));
        signature.returns.push(AbiParam::new(I64));
        signature
    }

    /// Declares an exported evaluator named `symbol`.
    pub fn declare_evaluator(&mut self, symbol: &str) -> Result<FuncId> {
        let signature = self.evaluator_signature();
        self.module
            .declare_function(symbol, Linkage::Export, &signature)
            .map_err(|e| TreeForgeError::emit_failure(symbol, e))
    }

    /// Makes the intrinsics callable from `function`.
    pub fn import_intrinsics(&mut self, function: &mut Function) -> Intrinsics {
        Intrinsics {
            ln: self.module.declare_func_in_func(self.ln, function),
        }
    }

    /// Runs the Cranelift IR verifier on `function`.
    pub fn verify(&self, symbol: &str, function: &Function) -> Result<()> {
        cranelift_codegen::verify_function(function, self.module.isa())
            .map_err(|errors| TreeForgeError::emit_failure(symbol, errors))
    }

    /// Compiles `functions` and makes them callable.
    pub fn submit<I>(&mut self, functions: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, FuncId, Function)>,
    {
        for (symbol, func_id, function) in functions {
            let mut ctx = Context::for_function(function);
            self.module
                .define_function(func_id, &mut ctx)
                .map_err(|e| TreeForgeError::emit_failure(&symbol, e))?;
            self.module.clear_context(&mut ctx);
        }
        self.module
            .finalize_definitions()
            .map_err(|e| TreeForgeError::emit_failure("<module>", e))
    }

    /// Parses serialized IR of previously emitted evaluators and compiles it.
    ///
    /// Symbols must be loaded into a fresh driver so intrinsic references
    /// resolve to the same declarations they were emitted against.
    pub fn load<'s, I>(&mut self, functions: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'s str, &'s str)>,
    {
        let mut parsed = Vec::new();
        for (symbol, clif) in functions {
            let mut candidates = cranelift_reader::parse_functions(clif)
                .map_err(|e| TreeForgeError::cache_corruption(symbol, e))?;
            let function = match (candidates.pop(), candidates.is_empty()) {
                (Some(function), true) => function,
                _ => {
                    return Err(TreeForgeError::cache_corruption(
                        symbol,
                        "expected exactly one function",
                    ))
                }
            };
            let func_id = self.declare_evaluator(symbol)?;
            parsed.push((symbol.to_string(), func_id, function));
        }
        self.submit(parsed)
    }

    /// Address of a finalized function.
    pub fn lookup(&self, symbol: &str) -> Result<*const u8> {
        match self.module.get_name(symbol) {
            Some(FuncOrDataId::Func(func_id)) => Ok(self.module.get_finalized_function(func_id)),
            _ => Err(TreeForgeError::emit_failure(symbol, "symbol not declared")),
        }
    }

    /// Address of a finalized evaluator as a callable function pointer.
    pub fn lookup_evaluator(&self, symbol: &str) -> Result<EvaluatorFn> {
        let ptr = self.lookup(symbol)?;
        // SAFETY: every evaluator is declared with `evaluator_signature`,
        // which matches `EvaluatorFn` in the native calling convention.
        Ok(unsafe { std::mem::transmute::<*const u8, EvaluatorFn>(ptr) })
    }
}

impl Drop for JitDriver {
    fn drop(&mut self) {
        // SAFETY: the module is taken exactly once, here. Function pointers
        // handed out by `lookup` must not outlive the driver.
        unsafe {
            let module = ManuallyDrop::take(&mut self.module);
            module.free_memory();
        }
    }
}
