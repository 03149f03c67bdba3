//! Report generation for benchmark results.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::result::BenchmarkResult;

/// CSV exporter for benchmark results.
///
/// One row per measured run.
///
/// # Example
///
/// ```
/// use treeforge_benchmark::{BenchmarkResult, BenchmarkRun, CsvExporter};
/// use std::time::Duration;
///
/// let mut result = BenchmarkResult::new("Test", "F=4 S=2", "depth 8");
/// result.add_run(BenchmarkRun {
///     run_index: 0,
///     elapsed: Duration::from_millis(100),
///     evaluations: 1000,
///     checksum: 12345,
/// });
///
/// let csv = CsvExporter::to_string(&result);
/// assert!(csv.starts_with("evaluator,run_index,elapsed_ms"));
/// assert!(csv.contains("F=4 S=2,0,100.000,1000,10000.00,100000.00,12345"));
/// ```
pub struct CsvExporter;

impl CsvExporter {
    const HEADER: &'static str =
        "evaluator,run_index,elapsed_ms,evaluations,evaluations_per_second,ns_per_evaluation,checksum";

    /// Exports one result to a CSV string.
    pub fn to_string(result: &BenchmarkResult) -> String {
        Self::to_string_all(&[result])
    }

    /// Exports several results into one table.
    pub fn to_string_all(results: &[&BenchmarkResult]) -> String {
        let mut output = String::new();
        writeln!(output, "{}", Self::HEADER).unwrap();

        for result in results {
            for run in &result.runs {
                writeln!(
                    output,
                    "{},{},{:.3},{},{:.2},{:.2},{}",
                    result.evaluator_name,
                    run.run_index,
                    run.elapsed.as_secs_f64() * 1000.0,
                    run.evaluations,
                    run.evaluations_per_second(),
                    run.nanos_per_evaluation(),
                    run.checksum,
                )
                .unwrap();
            }
        }

        output
    }

    /// Exports results to a CSV file.
    pub fn to_file(results: &[&BenchmarkResult], path: impl AsRef<Path>) -> io::Result<()> {
        fs::write(path, Self::to_string_all(results))
    }

    /// Writes results as CSV to a writer.
    pub fn write<W: Write>(results: &[&BenchmarkResult], mut writer: W) -> io::Result<()> {
        writer.write_all(Self::to_string_all(results).as_bytes())
    }
}

/// Markdown report generator.
///
/// # Example
///
/// ```
/// use treeforge_benchmark::{BenchmarkResult, MarkdownReport};
///
/// let result = BenchmarkResult::new("Test", "interpreter", "depth 8");
/// let md = MarkdownReport::to_string(&result);
/// assert!(md.contains("# Benchmark: Test"));
/// assert!(md.contains("*No runs completed.*"));
/// ```
pub struct MarkdownReport;

impl MarkdownReport {
    /// Generates a report for one evaluator.
    pub fn to_string(result: &BenchmarkResult) -> String {
        let mut output = String::new();

        writeln!(output, "# Benchmark: {}", result.name).unwrap();
        writeln!(output).unwrap();
        writeln!(output, "- **Evaluator**: {}", result.evaluator_name).unwrap();
        writeln!(output, "- **Tree**: {}", result.tree_name).unwrap();
        writeln!(output, "- **Runs**: {}", result.run_count()).unwrap();
        writeln!(output).unwrap();

        writeln!(output, "## Summary").unwrap();
        writeln!(output).unwrap();
        if result.runs.is_empty() {
            writeln!(output, "*No runs completed.*").unwrap();
            return output;
        }

        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Avg Time | {:.3} ms |", millis(result.avg_time())).unwrap();
        writeln!(output, "| Min Time | {:.3} ms |", millis(result.min_time())).unwrap();
        writeln!(output, "| Max Time | {:.3} ms |", millis(result.max_time())).unwrap();
        writeln!(
            output,
            "| Avg Evaluations/sec | {:.0} |",
            result.avg_evaluations_per_second()
        )
        .unwrap();
        writeln!(
            output,
            "| Best Evaluations/sec | {:.0} |",
            result.best_evaluations_per_second()
        )
        .unwrap();
        writeln!(output).unwrap();

        writeln!(output, "## Run Details").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "| Run | Time (ms) | Evaluations/sec | ns/eval |").unwrap();
        writeln!(output, "|-----|-----------|-----------------|---------|").unwrap();
        for run in &result.runs {
            writeln!(
                output,
                "| {} | {:.3} | {:.0} | {:.2} |",
                run.run_index,
                millis(run.elapsed),
                run.evaluations_per_second(),
                run.nanos_per_evaluation(),
            )
            .unwrap();
        }

        output
    }

    /// Side-by-side table of several evaluators on the same data.
    ///
    /// Speedups are relative to the first result.
    ///
    /// ```
    /// use treeforge_benchmark::{BenchmarkResult, MarkdownReport};
    ///
    /// let baseline = BenchmarkResult::new("Test", "interpreter", "depth 8");
    /// let compiled = BenchmarkResult::new("Test", "F=4 S=2", "depth 8");
    ///
    /// let md = MarkdownReport::comparison(&[&baseline, &compiled]);
    /// assert!(md.contains("## Comparison"));
    /// assert!(md.contains("| F=4 S=2 |"));
    /// ```
    pub fn comparison(results: &[&BenchmarkResult]) -> String {
        let mut output = String::new();
        let baseline = results
            .first()
            .map(|r| r.avg_evaluations_per_second())
            .unwrap_or(0.0);

        writeln!(output, "## Comparison").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "| Evaluator | Tree | Avg Time (ms) | Evaluations/sec | Speedup | Checksum |"
        )
        .unwrap();
        writeln!(
            output,
            "|-----------|------|---------------|-----------------|---------|----------|"
        )
        .unwrap();

        for result in results {
            let speed = result.avg_evaluations_per_second();
            let speedup = if baseline > 0.0 { speed / baseline } else { 0.0 };
            let checksum = result
                .checksum()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unstable".to_string());
            writeln!(
                output,
                "| {} | {} | {:.3} | {:.0} | {:.2}x | {} |",
                result.evaluator_name,
                result.tree_name,
                millis(result.avg_time()),
                speed,
                speedup,
                checksum,
            )
            .unwrap();
        }

        output
    }

    /// Writes the comparison of `results` followed by each detailed report.
    pub fn to_file(results: &[&BenchmarkResult], path: impl AsRef<Path>) -> io::Result<()> {
        let mut output = Self::comparison(results);
        for result in results {
            output.push('\n');
            output.push_str(&Self::to_string(result));
        }
        fs::write(path, output)
    }
}

fn millis(duration: std::time::Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::BenchmarkRun;
    use std::time::Duration;

    fn result(evaluator: &str, ms: u64) -> BenchmarkResult {
        let mut result = BenchmarkResult::new("Compare", evaluator, "depth 4");
        result.add_run(BenchmarkRun {
            run_index: 0,
            elapsed: Duration::from_millis(ms),
            evaluations: 1000,
            checksum: 99,
        });
        result
    }

    #[test]
    fn test_comparison_speedup_is_relative_to_first() {
        let slow = result("interpreter", 100);
        let fast = result("compiled", 25);
        let md = MarkdownReport::comparison(&[&slow, &fast]);
        assert!(md.contains("| 1.00x |"));
        assert!(md.contains("| 4.00x |"));
    }

    #[test]
    fn test_reports_written_to_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = result("interpreter", 10);
        let b = result("compiled", 5);

        CsvExporter::to_file(&[&a, &b], dir.path().join("bench.csv")).unwrap();
        MarkdownReport::to_file(&[&a, &b], dir.path().join("bench.md")).unwrap();

        let csv = fs::read_to_string(dir.path().join("bench.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
        let md = fs::read_to_string(dir.path().join("bench.md")).unwrap();
        assert!(md.starts_with("## Comparison"));
        assert_eq!(md.matches("# Benchmark: Compare").count(), 2);
    }
}
