//! Dataset inspection tool.
//!
//! Loads a reference dataset, prints its load report, and optionally
//! normalizes one set of identifiers or lists the entries below them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use georesolve::config::Config;
use georesolve::{GeoLevel, GeoResolver, RawGeo};

#[derive(Parser, Debug)]
#[command(name = "inspect")]
#[command(about = "Validate a geographic reference dataset and try lookups against it")]
struct Args {
    /// Dataset file or directory (overrides the config file)
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// State to normalize
    #[arg(long)]
    state: Option<String>,

    /// LGA to normalize
    #[arg(long)]
    lga: Option<String>,

    /// Ward to normalize
    #[arg(long)]
    ward: Option<String>,

    /// Polling unit to normalize
    #[arg(long)]
    polling_unit: Option<String>,

    /// List the entries below the given state / LGA / ward instead
    #[arg(long)]
    children: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref())?;
    let source = config.dataset_source(args.dataset.clone())?;

    info!("georesolve dataset inspection");
    info!("Dataset: {}", source.path().display());

    let resolver = GeoResolver::new(source);
    resolver
        .ensure_loaded()
        .context("Failed to load geographic dataset")?;

    if let Some(report) = resolver.report() {
        println!("{}", serde_json::to_string_pretty(report)?);
    }

    let raw = RawGeo::new(
        args.state.as_deref(),
        args.lga.as_deref(),
        args.ward.as_deref(),
        args.polling_unit.as_deref(),
    );

    if args.children {
        let keys: Vec<&str> = GeoLevel::all()
            .iter()
            .map_while(|level| raw.get(*level))
            .collect();
        let entries = resolver
            .children(&keys)?
            .with_context(|| format!("No entry matches {}", keys.join(" / ")))?;
        for entry in entries {
            println!("{}\t{}", entry.code, entry.name);
        }
    } else if raw != RawGeo::default() {
        let result = resolver.normalize(&raw);
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}
