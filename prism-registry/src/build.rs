//! Runs a complete registry build.

use std::fs;
use std::path::{Path, PathBuf};

use prism_model::{Record, RegistryConfig};
use tracing::{info, warn};

use crate::error::{RegistryError, RegistryResult};
use crate::intermediate::build_intermediates;
use crate::loader::write_intermediates;
use crate::plan::BuildPlan;
use crate::product::{ProductSummary, write_product};
use crate::resolve::transform_records;
use crate::source::SourceTable;

/// File name of the intermediate dump inside the output directory.
pub const INTERMEDIATE_DUMP: &str = "intermediate.json";

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub output_dir: PathBuf,
    /// Passed to every provider's `load`.
    pub refresh: bool,
    /// Also write every intermediate to [`INTERMEDIATE_DUMP`].
    pub dump_intermediate: bool,
}

impl BuildOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }
}

/// Result of one product within a build.
#[derive(Debug)]
pub enum ProductOutcome {
    Written(ProductSummary),
    /// The product resolved to zero fields; nothing was created.
    Skipped { name: String },
    /// Writing failed. Other products were still attempted.
    Failed { name: String, error: RegistryError },
}

impl ProductOutcome {
    pub fn name(&self) -> &str {
        match self {
            Self::Written(summary) => &summary.name,
            Self::Skipped { name } | Self::Failed { name, .. } => name,
        }
    }
}

#[derive(Debug, Default)]
pub struct BuildReport {
    pub identities: usize,
    pub intermediate_dump: Option<PathBuf>,
    pub products: Vec<ProductOutcome>,
}

impl BuildReport {
    pub fn failures(&self) -> impl Iterator<Item = (&str, &RegistryError)> {
        self.products.iter().filter_map(|outcome| match outcome {
            ProductOutcome::Failed { name, error } => Some((name.as_str(), error)),
            _ => None,
        })
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn outcome(&self, product: &str) -> Option<&ProductOutcome> {
        self.products.iter().find(|o| o.name() == product)
    }
}

/// A compiled registry bound to its source providers.
#[derive(Debug)]
pub struct RegistryBuild<'a> {
    plan: BuildPlan,
    sources: &'a SourceTable,
}

impl<'a> RegistryBuild<'a> {
    /// Compiles `config` and checks every source has a provider.
    pub fn new(config: &RegistryConfig, sources: &'a SourceTable) -> RegistryResult<Self> {
        let plan = BuildPlan::compile(config)?;
        plan.check_providers(sources)?;
        Ok(Self { plan, sources })
    }

    pub fn plan(&self) -> &BuildPlan {
        &self.plan
    }

    /// Joins, transforms and writes every product.
    ///
    /// Source failures abort the build. A product that fails to write is
    /// recorded in the report and the remaining products are still written.
    pub fn run(&self, crosswalk: &[Record], options: &BuildOptions) -> RegistryResult<BuildReport> {
        let intermediates =
            build_intermediates(crosswalk, &self.plan.sources, self.sources, options.refresh)?;

        let output_dir = options.output_dir.as_path();
        fs::create_dir_all(output_dir).map_err(|e| RegistryError::io(output_dir, e))?;

        let mut report = BuildReport {
            identities: intermediates.len(),
            ..BuildReport::default()
        };

        if options.dump_intermediate {
            let path = output_dir.join(INTERMEDIATE_DUMP);
            write_intermediates(&path, &intermediates)?;
            info!(path = %path.display(), "Intermediate data written");
            report.intermediate_dump = Some(path);
        }

        let records = transform_records(&intermediates, &self.plan.mappings);
        report.products = self.write_products(output_dir, &records);

        info!(output_dir = %output_dir.display(), "Build complete");
        Ok(report)
    }

    fn write_products(&self, output_dir: &Path, records: &[Record]) -> Vec<ProductOutcome> {
        self.plan
            .products
            .iter()
            .map(|product| match write_product(output_dir, product, records) {
                Ok(Some(summary)) => ProductOutcome::Written(summary),
                Ok(None) => {
                    info!(product = %product.name, "Product has no fields, skipping");
                    ProductOutcome::Skipped {
                        name: product.name.clone(),
                    }
                }
                Err(error) => {
                    warn!(product = %product.name, %error, "Product failed");
                    ProductOutcome::Failed {
                        name: product.name.clone(),
                        error,
                    }
                }
            })
            .collect()
    }
}

/// Compiles `config` and runs one build.
pub fn build_registry(
    crosswalk: &[Record],
    config: &RegistryConfig,
    sources: &SourceTable,
    options: &BuildOptions,
) -> RegistryResult<BuildReport> {
    RegistryBuild::new(config, sources)?.run(crosswalk, options)
}
