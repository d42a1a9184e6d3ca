//! Prism registry build
//!
//! Joins every configured source onto the canonical crosswalk and writes
//! each registry product (CSV, JSON, minified JSON, NDJSON and pivots).
//!
//! Usage:
//!   prism-build crosswalk.csv build/ --registry-file schema/leagues/mlb/players.yaml
//!
//! Exits non-zero if any product failed to write.

use anyhow::{Result, bail};
use clap::Parser;
use prism_cli::{Args, run};
use prism_registry::ProductOutcome;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("Prism registry build starting...");
    let report = run(&args)?;

    for outcome in &report.products {
        match outcome {
            ProductOutcome::Written(summary) => {
                info!(product = %summary.name, records = summary.records, "Written");
            }
            ProductOutcome::Skipped { name } => info!(product = %name, "Skipped"),
            ProductOutcome::Failed { name, error } => error!(product = %name, %error, "Failed"),
        }
    }

    let failed = report.failures().count();
    if failed > 0 {
        bail!("{failed} of {} products failed", report.products.len());
    }
    Ok(())
}
