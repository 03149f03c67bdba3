//! TreeForge CLI

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;

use commands::{BenchArgs, TreeArgs};

#[derive(Parser)]
#[command(name = "treeforge")]
#[command(about = "TreeForge - decision tree JIT compiler")]
#[command(version)]
struct Cli {
    /// Resolver configuration (TOML, or YAML with a .yaml/.yml extension).
    /// Flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a random tree and check it against the interpreter
    Run(TreeArgs),

    /// Compare interpreter and compiled throughput
    Bench(BenchArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match &cli.command {
        Commands::Run(args) => commands::run(args, config),
        Commands::Bench(args) => commands::bench(args, config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
