//! Argument parsing and build driver for the `prism-build` binary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use prism_registry::{BuildOptions, BuildReport, RegistryBuild, load_crosswalk, load_registry};
use prism_sources::load_source_table;
use tracing::info;

#[derive(Parser, Debug, Clone)]
#[command(name = "prism-build")]
#[command(about = "Build the Prism player registry products from the crosswalk")]
pub struct Args {
    /// Canonical crosswalk (JSON array, or CSV with a header row)
    pub crosswalk: PathBuf,

    /// Directory the products are written to
    pub output_dir: PathBuf,

    /// Registry configuration file
    #[arg(long, default_value = "schema/leagues/mlb/players.yaml")]
    pub registry_file: PathBuf,

    /// Providers file mapping source names to data files
    #[arg(long, default_value = "schema/leagues/mlb/providers.yaml")]
    pub providers: PathBuf,

    /// Also write every intermediate record to intermediate.json
    #[arg(long)]
    pub dump_intermediate: bool,

    /// Ask every source to bypass its cache
    #[arg(long)]
    pub refresh: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            output_dir: self.output_dir.clone(),
            refresh: self.refresh,
            dump_intermediate: self.dump_intermediate,
        }
    }
}

/// Loads every input named by `args` and runs one build.
///
/// Configuration, source and crosswalk problems are errors. Per-product
/// write failures are only recorded in the returned report.
pub fn run(args: &Args) -> Result<BuildReport> {
    let config = load_registry(&args.registry_file).with_context(|| {
        format!("Failed to load registry {}", args.registry_file.display())
    })?;
    let sources = load_source_table(&args.providers)
        .with_context(|| format!("Failed to load providers {}", args.providers.display()))?;
    let crosswalk = load_crosswalk(&args.crosswalk)
        .with_context(|| format!("Failed to load crosswalk {}", args.crosswalk.display()))?;
    info!(identities = crosswalk.len(), "Crosswalk loaded");

    let build = RegistryBuild::new(&config, &sources).context("Invalid registry configuration")?;
    let report = build
        .run(&crosswalk, &args.build_options())
        .context("Registry build failed")?;
    Ok(report)
}
