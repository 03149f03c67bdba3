//! Compiled resolver: builds evaluators for a tree and dispatches through them.
//!
//! # Example
//!
//! ```no_run
//! use treeforge_core::{DataSetFactory, DecisionTreeFactory};
//! use treeforge_jit::CompiledResolver;
//!
//! let tree = DecisionTreeFactory::with_seed(1).random_tree(6, 16).unwrap();
//! let resolver = CompiledResolver::build(&tree, 16, 3, 3).unwrap();
//!
//! let features = DataSetFactory::with_seed(2).random(16);
//! let leaf = resolver.run(&tree, &features);
//! assert!(leaf >= tree.len());
//! ```

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};
use treeforge_config::ResolverConfig;
use treeforge_core::{BoundaryLayout, DecisionTree, Geometry, Result, TreeForgeError};

use crate::cache::{CacheKey, CachedFunction, CachedModule, FileObjectCache, ObjectCache};
use crate::codegen::{evaluator_symbol, CodegenSelector, Composer, UniformSwitch};
use crate::driver::{EvaluatorFn, JitDriver};

/// What a build did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Evaluators were loaded from the cache; nothing was emitted.
    pub cache_hit: bool,
    /// Functions emitted by the composer.
    pub emitted_functions: usize,
    /// Jump-table cases over all emitted functions.
    pub total_cases: usize,
    pub duration_ms: u64,
}

/// Native evaluators for one decision tree.
///
/// Immutable once built. `run` may be called from any number of threads.
pub struct CompiledResolver {
    table: Vec<EvaluatorFn>,
    layout: BoundaryLayout,
    geometry: Geometry,
    feature_count: usize,
    report: BuildReport,
    // owns the code `table` points into
    _driver: JitDriver,
}

// SAFETY: the driver is never touched after build, and compiled evaluators
// only read the caller's feature buffer.
unsafe impl Send for CompiledResolver {}
unsafe impl Sync for CompiledResolver {}

impl CompiledResolver {
    /// Builds a resolver with `function_depth` levels per function and
    /// `switch_depth` levels per jump table, without caching.
    pub fn build(
        tree: &DecisionTree,
        feature_count: usize,
        function_depth: u32,
        switch_depth: u32,
    ) -> Result<Self> {
        Self::builder(tree)
            .with_feature_count(feature_count)
            .with_chunking(function_depth, switch_depth)
            .build()
    }

    pub fn builder(tree: &DecisionTree) -> ResolverBuilder<'_> {
        ResolverBuilder::new(tree)
    }

    /// Builds from a loaded configuration, using `cache_dir` when set.
    pub fn from_config(tree: &DecisionTree, config: &ResolverConfig) -> Result<Self> {
        if config.tree_depth != tree.depth() {
            return Err(TreeForgeError::invalid_config(format!(
                "configured tree depth {} but tree has depth {}",
                config.tree_depth,
                tree.depth()
            )));
        }
        let mut builder = Self::builder(tree)
            .with_feature_count(config.feature_count as usize)
            .with_chunking(config.function_depth, config.switch_depth);
        if let Some(dir) = &config.cache_dir {
            builder = builder.with_cache(Arc::new(FileObjectCache::new(dir)));
        }
        builder.build()
    }

    /// Evaluates `tree` on `features` and returns the leaf index reached,
    /// in `[N, N + 2^D)`.
    ///
    /// # Panics
    ///
    /// Panics if `features` is shorter than the feature count the resolver
    /// was built for, or if `tree` has a different shape.
    #[inline]
    pub fn run(&self, tree: &DecisionTree, features: &[f32]) -> usize {
        self.check_features(features);
        assert_eq!(tree.depth(), self.geometry.tree_depth, "resolver built for another tree");
        // SAFETY: length checked above, evaluators read below `feature_count`.
        unsafe { self.run_unchecked(features.as_ptr()) }
    }

    /// Dispatch loop without bounds checks.
    ///
    /// # Safety
    ///
    /// `features` must point to at least `feature_count` readable `f32`s.
    #[inline]
    pub unsafe fn run_unchecked(&self, features: *const f32) -> usize {
        let node_count = self.geometry.node_count();
        let mut index = 0;
        while index < node_count {
            let evaluator = self.table[self.layout.slot(index)];
            index = evaluator(features) as usize;
        }
        index
    }

    /// Boundary nodes visited for `features`, in order.
    ///
    /// # Panics
    ///
    /// Panics if `features` is shorter than the resolver's feature count.
    pub fn trace(&self, features: &[f32]) -> Vec<usize> {
        self.check_features(features);
        let node_count = self.geometry.node_count();
        let mut hops = Vec::with_capacity(self.geometry.hops() as usize);
        let mut index = 0;
        while index < node_count {
            hops.push(index);
            let evaluator = self.table[self.layout.slot(index)];
            // SAFETY: length checked above.
            index = unsafe { evaluator(features.as_ptr()) } as usize;
        }
        hops
    }

    #[inline]
    fn check_features(&self, features: &[f32]) {
        assert!(
            features.len() >= self.feature_count,
            "expected {} features, got {}",
            self.feature_count,
            features.len()
        );
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    /// Number of compiled functions.
    pub fn function_count(&self) -> usize {
        self.table.len()
    }

    pub fn report(&self) -> BuildReport {
        self.report
    }
}

impl std::fmt::Debug for CompiledResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledResolver")
            .field("geometry", &self.geometry)
            .field("feature_count", &self.feature_count)
            .field("functions", &self.table.len())
            .field("report", &self.report)
            .finish()
    }
}

/// Options for [`CompiledResolver`].
///
/// Defaults: one function spanning the whole tree, single-level switches,
/// as many features as the tree reads, no cache.
pub struct ResolverBuilder<'a> {
    tree: &'a DecisionTree,
    feature_count: usize,
    function_depth: u32,
    switch_depth: u32,
    cache: Option<Arc<dyn ObjectCache>>,
    selector: Option<Box<dyn CodegenSelector>>,
}

impl<'a> ResolverBuilder<'a> {
    pub fn new(tree: &'a DecisionTree) -> Self {
        Self {
            tree,
            feature_count: tree.required_features(),
            function_depth: tree.depth(),
            switch_depth: 1,
            cache: None,
            selector: None,
        }
    }

    pub fn with_feature_count(mut self, feature_count: usize) -> Self {
        self.feature_count = feature_count;
        self
    }

    pub fn with_chunking(mut self, function_depth: u32, switch_depth: u32) -> Self {
        self.function_depth = function_depth;
        self.switch_depth = switch_depth;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn ObjectCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replaces the uniform switch strategy.
    ///
    /// Cache entries are keyed by geometry only; a cached module emitted with
    /// another selector is reused as is.
    pub fn with_selector(mut self, selector: impl CodegenSelector + 'static) -> Self {
        self.selector = Some(Box::new(selector));
        self
    }

    pub fn build(self) -> Result<CompiledResolver> {
        let start = Instant::now();
        let geometry = Geometry::new(self.tree.depth(), self.function_depth, self.switch_depth)?;
        if self.feature_count < self.tree.required_features() {
            return Err(TreeForgeError::invalid_config(format!(
                "tree reads feature {} but only {} features are available",
                self.tree.max_feature_index(),
                self.feature_count
            )));
        }

        info!(
            event = "build_start",
            tree_depth = geometry.tree_depth,
            feature_count = self.feature_count,
            function_depth = geometry.function_depth,
            switch_depth = geometry.switch_depth,
            functions = geometry.function_count(),
        );

        let key = CacheKey::new(geometry, self.feature_count);
        let (driver, mut report) = match &self.cache {
            Some(cache) => self.build_cached(cache.as_ref(), key)?,
            None => self.compile(geometry, None)?,
        };

        let layout = BoundaryLayout::new(geometry.tree_depth, geometry.function_depth);
        let table = layout
            .boundary_nodes()
            .map(|root| driver.lookup_evaluator(&evaluator_symbol(root)))
            .collect::<Result<Vec<_>>>()?;
        info!(event = "collect_end", functions = table.len());

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            event = "build_end",
            cache_hit = report.cache_hit,
            emitted_functions = report.emitted_functions,
            duration_ms = report.duration_ms,
        );

        Ok(CompiledResolver {
            table,
            layout,
            geometry,
            feature_count: self.feature_count,
            report,
            _driver: driver,
        })
    }

    fn build_cached(
        &self,
        cache: &dyn ObjectCache,
        key: CacheKey,
    ) -> Result<(JitDriver, BuildReport)> {
        match self.load_cached(cache, key) {
            Ok(Some(driver)) => {
                info!(event = "cache_hit", entry = %key.module_entry());
                let report = BuildReport {
                    cache_hit: true,
                    ..BuildReport::default()
                };
                return Ok((driver, report));
            }
            Ok(None) => info!(event = "cache_miss", entry = %key.module_entry()),
            Err(TreeForgeError::CacheCorruption { key: entry, message }) => {
                warn!(event = "cache_corruption", entry = %entry, message = %message);
            }
            Err(e) => return Err(e),
        }

        let mut functions = Vec::new();
        let compiled = self.compile(key.geometry, Some(&mut functions))?;
        self.store(cache, key, functions);
        Ok(compiled)
    }

    // Ok(None) on a plain miss, CacheCorruption when entries exist but are unusable.
    fn load_cached(&self, cache: &dyn ObjectCache, key: CacheKey) -> Result<Option<JitDriver>> {
        let tree_entry = key.tree_entry();
        let module_entry = key.module_entry();
        let (Some(tree_bytes), Some(module_bytes)) =
            (cache.get(&tree_entry)?, cache.get(&module_entry)?)
        else {
            return Ok(None);
        };

        let cached_tree: DecisionTree = serde_json::from_slice(&tree_bytes)
            .map_err(|e| TreeForgeError::cache_corruption(&tree_entry, e))?;
        if cached_tree != *self.tree {
            info!(event = "cache_stale", entry = %tree_entry);
            return Ok(None);
        }

        let module = CachedModule::from_bytes(&module_entry, &module_bytes)?;
        if !module.matches(&key) {
            return Err(TreeForgeError::cache_corruption(
                &module_entry,
                "header does not match key",
            ));
        }
        // the tree entry is shared across chunkings and may be newer than the module
        if module.tree != *self.tree {
            info!(event = "cache_stale", entry = %module_entry);
            return Ok(None);
        }
        let layout = BoundaryLayout::new(key.geometry.tree_depth, key.geometry.function_depth);
        let expected = layout.boundary_nodes().map(evaluator_symbol);
        if !expected.eq(module.functions.iter().map(|f| f.symbol.clone())) {
            return Err(TreeForgeError::cache_corruption(&module_entry, "unexpected symbol set"));
        }

        let mut driver = JitDriver::new()?;
        driver.load(
            module
                .functions
                .iter()
                .map(|f| (f.symbol.as_str(), f.clif.as_str())),
        )?;
        Ok(Some(driver))
    }

    // Emits and compiles every evaluator; keeps their IR text when `ir` is given.
    fn compile(
        &self,
        geometry: Geometry,
        ir: Option<&mut Vec<CachedFunction>>,
    ) -> Result<(JitDriver, BuildReport)> {
        let uniform = UniformSwitch::new(geometry.switch_depth);
        let selector: &dyn CodegenSelector = match &self.selector {
            Some(selector) => selector.as_ref(),
            None => &uniform,
        };

        let mut driver = JitDriver::new()?;
        let functions = Composer::new(self.tree, geometry, selector).compose(&mut driver)?;
        let report = BuildReport {
            cache_hit: false,
            emitted_functions: functions.len(),
            total_cases: functions.iter().map(|f| f.stats.cases).sum(),
            duration_ms: 0,
        };
        if let Some(ir) = ir {
            ir.extend(functions.iter().map(|f| CachedFunction {
                symbol: f.symbol.clone(),
                clif: f.function.display().to_string(),
            }));
        }

        let start = Instant::now();
        driver.submit(
            functions
                .into_iter()
                .map(|f| (f.symbol, f.func_id, f.function)),
        )?;
        info!(
            event = "compile_end",
            functions = report.emitted_functions,
            duration_ms = start.elapsed().as_millis() as u64,
        );
        Ok((driver, report))
    }

    // Write failures leave the resolver usable, so they are only logged.
    fn store(&self, cache: &dyn ObjectCache, key: CacheKey, functions: Vec<CachedFunction>) {
        let module = CachedModule::new(key, self.tree.clone(), functions);
        let written = serde_json::to_vec(self.tree)
            .map_err(|e| TreeForgeError::Serialization(e.to_string()))
            .and_then(|tree| cache.put(&key.tree_entry(), &tree))
            .and_then(|()| module.to_bytes())
            .and_then(|bytes| cache.put(&key.module_entry(), &bytes));
        match written {
            Ok(()) => info!(event = "cache_store", entry = %key.module_entry()),
            Err(e) => warn!(event = "cache_write_failed", entry = %key.module_entry(), error = %e),
        }
    }
}
