//! ev_bracket: write the expected-value-maximizing bracket for a pool.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bracket_core::{run, AppConfig};

#[derive(Parser, Debug)]
#[command(name = "ev_bracket")]
#[command(
    version,
    about = "Pick the bracket with the highest expected pool score",
    long_about = None
)]
struct Args {
    /// Folder holding the probability table; the bracket is written here
    #[arg(short, long)]
    folder: Option<PathBuf>,

    /// Probability table file name inside the folder
    #[arg(short = 'i', long)]
    filename: Option<String>,

    /// Scoring system (flat, seed, round, SR); flat when omitted
    #[arg(short, long)]
    scoring: Option<String>,

    /// Number of rounds the table must describe
    #[arg(short, long)]
    rounds: Option<u32>,

    /// Output file name inside the folder
    #[arg(short, long)]
    output_file: Option<String>,

    /// Solve subproblems in parallel
    #[arg(long)]
    parallel: bool,

    /// Config file stem (without extension)
    #[arg(long, default_value = "ev_bracket")]
    config: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bracket_core=info,ev_bracket=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = AppConfig::load_from(&args.config)?;
    if let Some(folder) = args.folder {
        config.folder = folder.to_string_lossy().to_string();
    }
    if let Some(filename) = args.filename {
        config.filename = filename;
    }
    if args.scoring.is_some() {
        config.scoring = args.scoring;
    }
    if let Some(rounds) = args.rounds {
        config.rounds = rounds;
    }
    if let Some(output_file) = args.output_file {
        config.output_file = output_file;
    }
    if args.parallel {
        config.parallel = true;
    }
    tracing::debug!(?config, "configuration loaded");

    let summary = run(&config)?;

    println!("Scoring:         {}", summary.rule);
    println!("Champion:        {}", summary.champion);
    println!("Expected points: {:.4}", summary.expected_points);
    println!("Written to:      {}", summary.output_path.display());
    Ok(())
}
