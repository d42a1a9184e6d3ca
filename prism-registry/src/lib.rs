//! Registry build engine for the Prism player registry.
//!
//! Reconciles player records from independently keyed sources onto the
//! canonical crosswalk, then writes every configured product.
//!
//! # Pipeline
//!
//! 1. [`BuildPlan::compile`] validates the registry: fieldsets are expanded
//!    (cycles rejected), pivots resolved, templates compiled.
//! 2. [`build_intermediates`] loads each source once and joins it onto every
//!    identity by exact key.
//! 3. [`transform_records`] resolves every mapping with first-non-empty
//!    fallback into one flat record per identity.
//! 4. [`write_product`] projects the records per product into CSV, JSON,
//!    minified JSON and NDJSON, and [`write_pivots`] writes grouped indexes.
//!
//! [`RegistryBuild`] ties the steps together.

mod build;
mod error;
mod fieldsets;
mod intermediate;
mod loader;
mod pivot;
mod plan;
mod preprocess;
mod product;
mod resolve;
mod source;

pub use build::{
    BuildOptions, BuildReport, INTERMEDIATE_DUMP, ProductOutcome, RegistryBuild, build_registry,
};
pub use error::{ConfigError, RegistryError, RegistryResult};
pub use fieldsets::{dedup_fields, product_fields, resolve_fieldsets};
pub use intermediate::{
    Intermediate, Intermediates, JoinStats, attach_source, build_intermediates, seed_intermediates,
};
pub use loader::{
    load_crosswalk, load_registry, parse_registry, read_crosswalk_csv, read_crosswalk_json,
    write_intermediates,
};
pub use pivot::{Bucket, NULL_INNER_KEY, PivotGroups, build_pivot, group_key, write_pivots};
pub use plan::{BuildPlan, ProductPlan, SourcePlan};
pub use preprocess::Preprocessor;
pub use product::{
    ProductSummary, csv_cell, csv_column, nest_fields, project, project_nested, write_csv,
    write_ndjson, write_product,
};
pub use resolve::{resolve_field, resolve_path, transform_record, transform_records};
pub use source::{SourceData, SourceError, SourceProvider, SourceTable};
