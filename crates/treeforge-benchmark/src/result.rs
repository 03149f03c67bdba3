//! Benchmark result types.

use std::time::Duration;

/// One measured pass over the data set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkRun {
    /// Run index (0-based).
    pub run_index: usize,
    /// Wall time of the whole pass.
    pub elapsed: Duration,
    /// Feature vectors evaluated.
    pub evaluations: u64,
    /// Sum of the returned leaf indices.
    pub checksum: u64,
}

impl BenchmarkRun {
    /// Evaluations per second.
    ///
    /// ```
    /// use treeforge_benchmark::BenchmarkRun;
    /// use std::time::Duration;
    ///
    /// let run = BenchmarkRun {
    ///     run_index: 0,
    ///     elapsed: Duration::from_millis(500),
    ///     evaluations: 1_000,
    ///     checksum: 0,
    /// };
    /// assert!((run.evaluations_per_second() - 2_000.0).abs() < 1e-9);
    /// ```
    pub fn evaluations_per_second(&self) -> f64 {
        if self.elapsed.is_zero() {
            0.0
        } else {
            self.evaluations as f64 / self.elapsed.as_secs_f64()
        }
    }

    /// Average nanoseconds per evaluation.
    pub fn nanos_per_evaluation(&self) -> f64 {
        if self.evaluations == 0 {
            0.0
        } else {
            self.elapsed.as_nanos() as f64 / self.evaluations as f64
        }
    }
}

/// All measured passes of one evaluator on one data set.
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    /// Benchmark name.
    pub name: String,
    /// Evaluator under test, e.g. `interpreter` or `F=4 S=2`.
    pub evaluator_name: String,
    /// Tree or data-set description.
    pub tree_name: String,
    pub runs: Vec<BenchmarkRun>,
}

impl BenchmarkResult {
    pub fn new(
        name: impl Into<String>,
        evaluator_name: impl Into<String>,
        tree_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            evaluator_name: evaluator_name.into(),
            tree_name: tree_name.into(),
            runs: Vec::new(),
        }
    }

    pub fn add_run(&mut self, run: BenchmarkRun) {
        self.runs.push(run);
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Checksum shared by every run, or `None` when runs disagree.
    ///
    /// A deterministic evaluator returns the same leaves on every pass.
    pub fn checksum(&self) -> Option<u64> {
        let first = self.runs.first()?.checksum;
        self.runs
            .iter()
            .all(|r| r.checksum == first)
            .then_some(first)
    }

    /// Average pass time.
    ///
    /// ```
    /// use treeforge_benchmark::{BenchmarkResult, BenchmarkRun};
    /// use std::time::Duration;
    ///
    /// let mut result = BenchmarkResult::new("Test", "interpreter", "depth 8");
    /// for (i, ms) in [100, 200].into_iter().enumerate() {
    ///     result.add_run(BenchmarkRun {
    ///         run_index: i,
    ///         elapsed: Duration::from_millis(ms),
    ///         evaluations: 1_000,
    ///         checksum: 42,
    ///     });
    /// }
    ///
    /// assert_eq!(result.avg_time(), Duration::from_millis(150));
    /// assert_eq!(result.checksum(), Some(42));
    /// ```
    pub fn avg_time(&self) -> Duration {
        if self.runs.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.runs.iter().map(|r| r.elapsed).sum();
        total / self.runs.len() as u32
    }

    pub fn min_time(&self) -> Duration {
        self.runs
            .iter()
            .map(|r| r.elapsed)
            .min()
            .unwrap_or(Duration::ZERO)
    }

    pub fn max_time(&self) -> Duration {
        self.runs
            .iter()
            .map(|r| r.elapsed)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    pub fn avg_evaluations_per_second(&self) -> f64 {
        if self.runs.is_empty() {
            return 0.0;
        }
        let total: f64 = self.runs.iter().map(|r| r.evaluations_per_second()).sum();
        total / self.runs.len() as f64
    }

    /// Throughput of the fastest pass.
    pub fn best_evaluations_per_second(&self) -> f64 {
        self.runs
            .iter()
            .map(|r| r.evaluations_per_second())
            .fold(0.0, f64::max)
    }
}
