//! TreeForge JIT - native evaluators for perfect decision trees
//!
//! A tree is cut into functions of `F` levels, each compiled through
//! Cranelift into a body of nested jump tables over `S`-level condition
//! vectors. [`CompiledResolver`] owns the compiled code and hops from
//! function to function until a leaf index comes back.

pub mod cache;
pub mod codegen;
pub mod driver;
pub mod resolver;

pub use cache::{CacheKey, CachedModule, FileObjectCache, MemoryObjectCache, ObjectCache};
pub use codegen::{CodegenSelector, CodegenStrategy, EmitStats, UniformSwitch};
pub use driver::{EvaluatorFn, JitDriver};
pub use resolver::{BuildReport, CompiledResolver, ResolverBuilder};
