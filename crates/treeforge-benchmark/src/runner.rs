//! Benchmark runner.

use std::hint::black_box;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::BenchmarkConfig;
use crate::result::{BenchmarkResult, BenchmarkRun};

/// Times an evaluator over a batch of feature vectors.
///
/// The evaluator is stored as a concrete type parameter, so a compiled
/// resolver and the interpreter are both called without dynamic dispatch.
///
/// * `E` - Evaluator: `Fn(&[f32]) -> usize`, returning the leaf index
pub struct Benchmark<E>
where
    E: Fn(&[f32]) -> usize,
{
    config: BenchmarkConfig,
    evaluator_name: String,
    tree_name: String,
    evaluator: E,
}

impl<E> Benchmark<E>
where
    E: Fn(&[f32]) -> usize,
{
    pub fn new(
        config: BenchmarkConfig,
        evaluator_name: impl Into<String>,
        tree_name: impl Into<String>,
        evaluator: E,
    ) -> Self {
        Self {
            config,
            evaluator_name: evaluator_name.into(),
            tree_name: tree_name.into(),
            evaluator,
        }
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Runs warmup runs, then measured runs, over `samples`.
    pub fn run(&self, samples: &[Vec<f32>]) -> BenchmarkResult {
        let passes = self.config.passes_per_run();
        for _ in 0..self.config.warmup_count() {
            self.timed_run(samples, passes);
        }

        let mut result = BenchmarkResult::new(
            self.config.name(),
            &self.evaluator_name,
            &self.tree_name,
        );
        for run_index in 0..self.config.run_count() {
            let start = Instant::now();
            let checksum = self.timed_run(samples, passes);
            let run = BenchmarkRun {
                run_index,
                elapsed: start.elapsed(),
                evaluations: (samples.len() * passes) as u64,
                checksum,
            };
            debug!(
                event = "benchmark_run",
                evaluator = %self.evaluator_name,
                run_index,
                evaluations_per_second = run.evaluations_per_second() as u64,
            );
            result.add_run(run);
        }

        info!(
            event = "benchmark_end",
            evaluator = %self.evaluator_name,
            runs = result.run_count(),
            evaluations_per_second = result.avg_evaluations_per_second() as u64,
        );
        result
    }

    // Sum of leaf indices over `passes` passes.
    fn timed_run(&self, samples: &[Vec<f32>], passes: usize) -> u64 {
        let mut checksum = 0u64;
        for _ in 0..passes {
            for features in samples {
                let leaf = black_box((self.evaluator)(black_box(features)));
                checksum = checksum.wrapping_add(leaf as u64);
            }
        }
        checksum
    }
}
