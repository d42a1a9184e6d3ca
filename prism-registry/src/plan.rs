//! Compiles a [`RegistryConfig`] into a validated build plan.
//!
//! Every configuration error surfaces here, so a build that gets past
//! [`BuildPlan::compile`] only fails on source or output problems.

use std::collections::HashSet;

use indexmap::IndexMap;
use prism_model::{CROSSWALK_SLOT, MappingRule, PivotRef, PivotSpec, RegistryConfig};

use crate::error::ConfigError;
use crate::fieldsets::{product_fields, resolve_fieldsets};
use crate::preprocess::Preprocessor;
use crate::source::SourceTable;

/// A source ready to be joined.
#[derive(Debug)]
pub struct SourcePlan {
    pub name: String,
    pub crosswalk_key: String,
    pub preprocessor: Preprocessor,
}

/// A product with its field list and pivot blocks resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPlan {
    pub name: String,
    pub fields: Vec<String>,
    pub pivots: Vec<PivotSpec>,
}

#[derive(Debug)]
pub struct BuildPlan {
    pub sources: Vec<SourcePlan>,
    pub mappings: Vec<MappingRule>,
    pub fieldsets: IndexMap<String, Vec<String>>,
    pub products: Vec<ProductPlan>,
}

impl BuildPlan {
    pub fn compile(config: &RegistryConfig) -> Result<Self, ConfigError> {
        let mut sources = Vec::with_capacity(config.sources.len());
        for (name, source) in &config.sources {
            if name == CROSSWALK_SLOT {
                return Err(ConfigError::ReservedSourceName(name.clone()));
            }
            sources.push(SourcePlan {
                name: name.clone(),
                crosswalk_key: source.crosswalk_key.clone(),
                preprocessor: Preprocessor::new(name, &source.preprocess)?,
            });
        }

        let fieldsets = resolve_fieldsets(&config.fieldsets)?;

        let mut products = Vec::with_capacity(config.products.len());
        for (name, product) in &config.products {
            let fields = product_fields(name, product, &fieldsets)?;
            check_nesting(name, &fields)?;
            let pivots = product
                .pivots
                .iter()
                .map(|pivot| resolve_pivot(name, pivot, &config.pivots))
                .collect::<Result<Vec<_>, _>>()?;
            products.push(ProductPlan {
                name: name.clone(),
                fields,
                pivots,
            });
        }

        Ok(Self {
            sources,
            mappings: config.mappings.clone(),
            fieldsets,
            products,
        })
    }

    /// Fails on the first configured source without a registered provider.
    pub fn check_providers(&self, table: &SourceTable) -> Result<(), ConfigError> {
        match self.sources.iter().find(|s| !table.contains(&s.name)) {
            Some(missing) => Err(ConfigError::MissingProvider(missing.name.clone())),
            None => Ok(()),
        }
    }

    pub fn product(&self, name: &str) -> Option<&ProductPlan> {
        self.products.iter().find(|p| p.name == name)
    }
}

fn resolve_pivot(
    product: &str,
    pivot: &PivotRef,
    shared: &IndexMap<String, PivotSpec>,
) -> Result<PivotSpec, ConfigError> {
    match pivot {
        PivotRef::Named(name) => {
            shared
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownPivot {
                    product: product.to_string(),
                    name: name.clone(),
                })
        }
        PivotRef::Inline(spec) => Ok(spec.clone()),
        PivotRef::Unsupported(raw) => Err(ConfigError::UnsupportedPivotSpec {
            product: product.to_string(),
            spec: raw.to_string(),
        }),
    }
}

/// Rejects field lists where one field is a dotted prefix of another.
fn check_nesting(product: &str, fields: &[String]) -> Result<(), ConfigError> {
    let names: HashSet<&str> = fields.iter().map(String::as_str).collect();
    for field in fields {
        let prefixes = field.match_indices('.').map(|(at, _)| &field[..at]);
        for prefix in prefixes {
            if names.contains(prefix) {
                return Err(ConfigError::ConflictingFieldPaths {
                    product: product.to_string(),
                    field: field.clone(),
                    prefix: prefix.to_string(),
                });
            }
        }
    }
    Ok(())
}
