use std::collections::HashSet;
use std::path::{Path, PathBuf};

use clap::Args;
use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use rayon::prelude::*;
use treeforge::benchmark::{Benchmark, BenchmarkConfig, CsvExporter, MarkdownReport};
use treeforge::{
    console, interpret, CompiledResolver, DataSetFactory, DecisionTree, DecisionTreeFactory,
    ResolverConfig,
};

use crate::error::CliError;

/// Tree shape, chunking and data set, overriding the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct TreeArgs {
    /// Tree depth D
    #[arg(short, long)]
    pub depth: Option<u32>,

    /// Features per vector
    #[arg(short, long)]
    pub features: Option<u32>,

    /// Tree levels per compiled function (F)
    #[arg(long)]
    pub function_depth: Option<u32>,

    /// Tree levels per jump table (S)
    #[arg(long)]
    pub switch_depth: Option<u32>,

    /// Directory for cached evaluators
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Feature vectors to evaluate
    #[arg(short = 'n', long, default_value = "100000")]
    pub samples: usize,

    /// Seed for the random tree and data set
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct BenchArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    /// Unmeasured runs before timing
    #[arg(long, default_value = "1")]
    pub warmup: usize,

    /// Measured runs per evaluator
    #[arg(long, default_value = "5")]
    pub runs: usize,

    /// Passes over the samples per run
    #[arg(long, default_value = "1")]
    pub passes: usize,

    /// Write per-run results as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Write a Markdown report
    #[arg(long)]
    pub markdown: Option<PathBuf>,
}

impl TreeArgs {
    /// Loads `config` (or defaults) and applies the flags on top.
    pub fn resolve(&self, config: Option<&Path>) -> Result<ResolverConfig, CliError> {
        let mut resolved = match config {
            Some(path) => load_config(path)?,
            None => ResolverConfig::default(),
        };

        if let Some(depth) = self.depth {
            resolved.tree_depth = depth;
        }
        if let Some(features) = self.features {
            resolved.feature_count = features;
        }
        if let Some(function_depth) = self.function_depth {
            resolved.function_depth = function_depth;
        }
        if let Some(switch_depth) = self.switch_depth {
            resolved.switch_depth = switch_depth;
        }
        if let Some(dir) = &self.cache_dir {
            resolved.cache_dir = Some(dir.clone());
        }
        if let Some(seed) = self.seed {
            resolved.random_seed = Some(seed);
        }

        resolved.validate()?;
        Ok(resolved)
    }
}

fn load_config(path: &Path) -> Result<ResolverConfig, CliError> {
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let config = if yaml {
        ResolverConfig::from_yaml_file(path)?
    } else {
        ResolverConfig::load(path)?
    };
    Ok(config)
}

struct Workload {
    config: ResolverConfig,
    tree: DecisionTree,
    samples: Vec<Vec<f32>>,
}

fn workload(args: &TreeArgs, config: Option<&Path>) -> Result<Workload, CliError> {
    let config = args.resolve(config)?;
    let seed = config.random_seed.unwrap_or(0);

    let tree = DecisionTreeFactory::with_seed(seed)
        .random_tree(config.tree_depth, config.feature_count)?;
    let samples = DataSetFactory::with_seed(seed.wrapping_add(1))
        .random_batch(args.samples, config.feature_count as usize);

    Ok(Workload {
        config,
        tree,
        samples,
    })
}

/// `treeforge run`: compile, check every sample against the interpreter,
/// print statistics.
pub fn run(args: &TreeArgs, config: Option<&Path>) -> Result<(), CliError> {
    console::init();
    let Workload {
        config,
        tree,
        samples,
    } = workload(args, config)?;

    let resolver = CompiledResolver::from_config(&tree, &config)?;

    let mismatches = samples
        .par_iter()
        .filter(|features| resolver.run(&tree, features) != interpret(&tree, features))
        .count();
    let leaves: HashSet<usize> = samples
        .par_iter()
        .map(|features| resolver.run(&tree, features))
        .collect();

    let geometry = resolver.geometry();
    let report = resolver.report();
    println!();
    stat(
        "Tree",
        format!(
            "depth {} ({} nodes, {} features)",
            geometry.tree_depth,
            count(tree.len()),
            resolver.feature_count()
        ),
    );
    stat(
        "Chunking",
        format!(
            "F={} S={} ({} functions, {} hops)",
            geometry.function_depth,
            geometry.switch_depth,
            count(resolver.function_count()),
            geometry.hops()
        ),
    );
    stat(
        "Build",
        if report.cache_hit {
            format!("cache hit in {}ms", report.duration_ms)
        } else {
            format!(
                "{} functions, {} cases in {}ms",
                count(report.emitted_functions),
                count(report.total_cases),
                report.duration_ms
            )
        },
    );
    stat(
        "Samples",
        format!(
            "{} evaluated, {} distinct leaves of {}",
            count(samples.len()),
            count(leaves.len()),
            count(tree.leaf_count())
        ),
    );

    if mismatches > 0 {
        return Err(CliError::Mismatch {
            count: mismatches,
            samples: samples.len(),
        });
    }
    println!(
        "{} compiled resolver agrees with the interpreter",
        "✓".bright_green().bold()
    );
    Ok(())
}

/// `treeforge bench`: time the interpreter and the compiled resolver on the
/// same samples.
pub fn bench(args: &BenchArgs, config: Option<&Path>) -> Result<(), CliError> {
    console::init();
    let Workload {
        config,
        tree,
        samples,
    } = workload(&args.tree, config)?;

    let resolver = CompiledResolver::from_config(&tree, &config)?;

    let mut bench_config = BenchmarkConfig::new(format!("Decision tree depth {}", tree.depth()))
        .with_warmup_count(args.warmup)
        .with_run_count(args.runs)
        .with_passes_per_run(args.passes);
    if let Some(path) = &args.csv {
        bench_config = bench_config.with_csv_output(path);
    }
    if let Some(path) = &args.markdown {
        bench_config = bench_config.with_markdown_output(path);
    }

    let tree_name = format!("depth {}, {} features", tree.depth(), config.feature_count);
    let interpreted = Benchmark::new(
        bench_config.clone(),
        "interpreter",
        &tree_name,
        |features: &[f32]| interpret(&tree, features),
    )
    .run(&samples);

    let geometry = resolver.geometry();
    let compiled = Benchmark::new(
        bench_config.clone(),
        format!("F={} S={}", geometry.function_depth, geometry.switch_depth),
        &tree_name,
        |features: &[f32]| resolver.run(&tree, features),
    )
    .run(&samples);

    let results = [&interpreted, &compiled];
    println!();
    println!("{}", MarkdownReport::comparison(&results));

    if let Some(path) = bench_config.csv_output_path() {
        CsvExporter::to_file(&results, path)?;
        stat("CSV", path.display());
    }
    if let Some(path) = bench_config.markdown_output_path() {
        MarkdownReport::to_file(&results, path)?;
        stat("Markdown", path.display());
    }

    if interpreted.checksum() != compiled.checksum() {
        return Err(CliError::ChecksumMismatch {
            interpreted: interpreted.checksum(),
            compiled: compiled.checksum(),
        });
    }
    Ok(())
}

fn stat(label: &str, value: impl std::fmt::Display) {
    println!("  {:<10} {}", label.bright_cyan().bold(), value);
}

fn count(n: usize) -> String {
    n.to_formatted_string(&Locale::en)
}
