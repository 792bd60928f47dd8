//! `wallrec-synth` - generate synthetic ratings and user embeddings.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wallrec_synth::{pipeline, SynthConfig};

/// Synthetic rating and user-embedding generator for wallpaper recommendation
#[derive(Parser, Debug)]
#[command(name = "wallrec-synth")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file with any of the settings below
    #[arg(short, long, env = "WALLREC_CONFIG")]
    config: Option<PathBuf>,

    /// Generate and summarize without backing up or writing output files
    #[arg(long)]
    dry_run: bool,

    /// Also write the run summary as JSON to this path
    #[arg(long)]
    summary_json: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,
}

/// Settings that override the config file and `WALLREC_*` environment.
#[derive(ClapArgs, Serialize, Debug, Default)]
struct Overrides {
    /// Exact number of rating rows [default: 10000]
    #[arg(long = "num_ratings")]
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ratings: Option<usize>,

    /// Number of synthetic users [default: 200]
    #[arg(long = "num_users")]
    #[serde(skip_serializing_if = "Option::is_none")]
    num_users: Option<u32>,

    /// Random seed [default: 42]
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,

    /// Item catalog CSV [default: data/wallpapers.csv]
    #[arg(long = "wallpapers_csv")]
    #[serde(skip_serializing_if = "Option::is_none")]
    wallpapers_csv: Option<PathBuf>,

    /// Item embeddings file [default: data/wallpaper_embeddings.csv]
    #[arg(long = "wallpaper_emb_csv")]
    #[serde(skip_serializing_if = "Option::is_none")]
    wallpaper_emb_csv: Option<PathBuf>,

    /// Rating table output [default: data/ratings.csv]
    #[arg(long = "out_ratings_csv")]
    #[serde(skip_serializing_if = "Option::is_none")]
    out_ratings_csv: Option<PathBuf>,

    /// User embedding output [default: data/user_embeddings.csv]
    #[arg(long = "out_user_emb")]
    #[serde(skip_serializing_if = "Option::is_none")]
    out_user_emb: Option<PathBuf>,

    /// Minimum rating counted as liked [default: 4.0]
    #[arg(long = "like_threshold")]
    #[serde(skip_serializing_if = "Option::is_none")]
    like_threshold: Option<f64>,

    /// First user's timeline epoch in seconds [default: 1700000000]
    #[arg(long = "start_ts")]
    #[serde(skip_serializing_if = "Option::is_none")]
    start_ts: Option<i64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = SynthConfig::load(args.config.as_deref(), &args.overrides)
        .context("failed to load configuration")?;
    tracing::debug!(?config, "Resolved configuration");

    let summary = pipeline::run(&config, args.dry_run)?;
    summary.log();
    println!("{}", summary.status_line());

    if let Some(path) = &args.summary_json {
        summary
            .write_json(path)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        tracing::info!("Summary written to {}", path.display());
    }
    Ok(())
}
