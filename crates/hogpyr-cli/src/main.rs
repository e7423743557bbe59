mod commands;
mod summary;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hogpyr", about = "HOG feature pyramids and part-filter scoring")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Worker threads (default: one per core)
    #[arg(short = 'j', long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print or save the default feature configuration
    Config(commands::config::ConfigArgs),
    /// Build a feature pyramid and describe its levels
    Features(commands::features::FeaturesArgs),
    /// Score a filter bank against every pyramid level
    Score(commands::score::ScoreArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure worker pool")?;
    }

    match &cli.command {
        Commands::Config(args) => commands::config::run(args),
        Commands::Features(args) => commands::features::run(args),
        Commands::Score(args) => commands::score::run(args),
    }
}
