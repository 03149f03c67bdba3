//! Benchmarking framework for TreeForge evaluators.
//!
//! Measures how many feature vectors per second an evaluator resolves to a
//! leaf, so the reference interpreter and compiled resolvers of different
//! chunking can be compared on the same data.
//!
//! # Overview
//!
//! - Warmup passes over the data set before measurement
//! - Several measured passes, each timing the whole batch
//! - Export to CSV and Markdown, including side-by-side comparisons
//!
//! # Example
//!
//! ```
//! use treeforge_benchmark::{Benchmark, BenchmarkConfig, MarkdownReport};
//!
//! let config = BenchmarkConfig::new("Threshold")
//!     .with_warmup_count(1)
//!     .with_run_count(2);
//! let samples = vec![vec![0.25_f32], vec![0.75]];
//!
//! let benchmark = Benchmark::new(config, "threshold", "depth 1", |x: &[f32]| {
//!     if x[0] > 0.5 { 2 } else { 1 }
//! });
//! let result = benchmark.run(&samples);
//!
//! assert_eq!(result.run_count(), 2);
//! assert_eq!(result.runs[0].evaluations, 2);
//! assert_eq!(result.runs[0].checksum, 3);
//! assert!(MarkdownReport::to_string(&result).contains("# Benchmark: Threshold"));
//! ```

mod config;
mod report;
mod result;
mod runner;

pub use config::BenchmarkConfig;
pub use report::{CsvExporter, MarkdownReport};
pub use result::{BenchmarkResult, BenchmarkRun};
pub use runner::Benchmark;
