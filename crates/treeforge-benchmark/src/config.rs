//! Benchmark configuration.

use std::path::{Path, PathBuf};

/// How an evaluator is timed over a data set, plus optional report paths.
///
/// A run is `passes_per_run` back-to-back passes over the whole batch, so
/// small batches still yield measurable wall time.
///
/// # Example
///
/// ```
/// use treeforge_benchmark::BenchmarkConfig;
///
/// let config = BenchmarkConfig::new("Depth 12")
///     .with_warmup_count(3)
///     .with_run_count(10)
///     .with_passes_per_run(4)
///     .with_csv_output("results.csv");
///
/// assert_eq!(config.warmup_count(), 3);
/// assert_eq!(config.passes_per_run(), 4);
/// assert!(config.markdown_output_path().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    name: String,
    warmup_count: usize,
    run_count: usize,
    passes_per_run: usize,
    csv_output: Option<PathBuf>,
    markdown_output: Option<PathBuf>,
}

impl BenchmarkConfig {
    /// One warmup run, three measured runs of a single pass each.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            warmup_count: 1,
            run_count: 3,
            passes_per_run: 1,
            csv_output: None,
            markdown_output: None,
        }
    }

    pub fn with_warmup_count(mut self, count: usize) -> Self {
        self.warmup_count = count;
        self
    }

    pub fn with_run_count(mut self, count: usize) -> Self {
        self.run_count = count;
        self
    }

    /// Batch passes per timed run. Zero is treated as one.
    pub fn with_passes_per_run(mut self, passes: usize) -> Self {
        self.passes_per_run = passes.max(1);
        self
    }

    pub fn with_csv_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.csv_output = Some(path.into());
        self
    }

    pub fn with_markdown_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.markdown_output = Some(path.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn warmup_count(&self) -> usize {
        self.warmup_count
    }

    pub fn run_count(&self) -> usize {
        self.run_count
    }

    pub fn passes_per_run(&self) -> usize {
        self.passes_per_run
    }

    pub fn csv_output_path(&self) -> Option<&Path> {
        self.csv_output.as_deref()
    }

    pub fn markdown_output_path(&self) -> Option<&Path> {
        self.markdown_output.as_deref()
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self::new("Decision tree")
    }
}
