use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use listing_pipeline::{Layout, PipelineConfig, PipelineRunner, StageKind};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Sort scraped listings into new, duplicate and rejected products.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Run directory holding data/, process/ and result/
    #[arg(long, env = "BASE_DIR")]
    base_dir: PathBuf,

    /// Store configuration file (defaults to <base-dir>/stores.toml)
    #[arg(long, env = "STORES_CONFIG")]
    stores: Option<PathBuf>,

    /// Last stage to run
    #[arg(long, value_enum, default_value = "stats")]
    target: StageKind,
}

/// Uses JSON output when `RUST_LOG_FORMAT=json`.
fn init_tracing() {
    let use_json = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    let filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().flatten_event(true))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let base_dir = cli
        .base_dir
        .canonicalize()
        .with_context(|| format!("base directory {:?} is not accessible", cli.base_dir))?;
    let stores_path = cli.stores.unwrap_or_else(|| base_dir.join("stores.toml"));
    let config = PipelineConfig::from_file(&stores_path)
        .with_context(|| format!("loading store configuration from {:?}", stores_path))?;
    let layout = Layout::new(base_dir);

    let report = PipelineRunner::new(&config, &layout)
        .run_until(cli.target)
        .context("pipeline run failed")?;
    for (kind, outcome) in report {
        info!("{:?}: {}", kind, outcome);
    }
    if cli.target == StageKind::Stats {
        info!("Stats table: {:?}", layout.stats_path());
    }
    Ok(())
}
