//! Core data model for the Prism player registry.
//!
//! Defines the plain types every other Prism crate depends on:
//! - [`Record`]: an insertion-ordered JSON object (crosswalk rows, source rows, output rows)
//! - [`RegistryConfig`]: the declarative registry: sources, mappings, fieldsets, pivots, products
//! - value helpers shared by joins, fallbacks and pivots ([`is_empty_value`], [`lookup_key`])
//!
//! Nothing here performs I/O. Loading and building live in `prism-registry`.

mod record;
mod registry;

pub use record::{CROSSWALK_SLOT, IDENTITY_KEY, Record, is_empty_value, lookup_key};
pub use registry::{
    FieldsetDef, MappingRule, MappingSource, PivotField, PivotRef, PivotSpec, PreprocessRule,
    ProductDef, RegistryConfig, SourceConfig,
};
