//! Expansion of composable fieldsets into flat field lists.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use prism_model::{FieldsetDef, ProductDef};

use crate::error::ConfigError;

/// Removes duplicates, keeping each field at its first position.
pub fn dedup_fields<I>(fields: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    fields.into_iter().collect::<IndexSet<_>>().into_iter().collect()
}

/// Expands every fieldset: its direct fields, then each referenced
/// fieldset's expansion in declared order, deduplicated.
///
/// References are followed depth first, so declaration order does not
/// matter. Unknown references and cycles are rejected.
pub fn resolve_fieldsets(
    defs: &IndexMap<String, FieldsetDef>,
) -> Result<IndexMap<String, Vec<String>>, ConfigError> {
    let mut expander = Expander {
        defs,
        resolved: HashMap::with_capacity(defs.len()),
        stack: Vec::new(),
    };
    for name in defs.keys() {
        expander.expand(name)?;
    }

    let mut resolved = expander.resolved;
    Ok(defs
        .keys()
        .map(|name| {
            let fields = resolved.remove(name).unwrap_or_default();
            (name.clone(), fields)
        })
        .collect())
}

struct Expander<'a> {
    defs: &'a IndexMap<String, FieldsetDef>,
    resolved: HashMap<String, Vec<String>>,
    /// Fieldsets currently being expanded, outermost first.
    stack: Vec<String>,
}

impl Expander<'_> {
    fn expand(&mut self, name: &str) -> Result<(), ConfigError> {
        if self.resolved.contains_key(name) {
            return Ok(());
        }
        if let Some(start) = self.stack.iter().position(|n| n == name) {
            let mut cycle = self.stack[start..].to_vec();
            cycle.push(name.to_string());
            return Err(ConfigError::CyclicFieldset(cycle));
        }

        let defs = self.defs;
        let Some(def) = defs.get(name) else {
            return Ok(());
        };

        self.stack.push(name.to_string());
        let mut fields = def.fields.clone();
        for child in &def.fieldsets {
            if !defs.contains_key(child) {
                return Err(ConfigError::UnknownFieldset {
                    referenced_by: format!("fieldset '{name}'"),
                    name: child.clone(),
                });
            }
            self.expand(child)?;
            if let Some(child_fields) = self.resolved.get(child) {
                fields.extend(child_fields.iter().cloned());
            }
        }
        self.stack.pop();

        self.resolved.insert(name.to_string(), dedup_fields(fields));
        Ok(())
    }
}

/// A product's field list: its fieldsets' fields in declared order, then its
/// own fields, deduplicated.
pub fn product_fields(
    product_name: &str,
    product: &ProductDef,
    fieldsets: &IndexMap<String, Vec<String>>,
) -> Result<Vec<String>, ConfigError> {
    let mut fields = Vec::new();
    for name in &product.fieldsets {
        let expanded = fieldsets
            .get(name)
            .ok_or_else(|| ConfigError::UnknownFieldset {
                referenced_by: format!("product '{product_name}'"),
                name: name.clone(),
            })?;
        fields.extend(expanded.iter().cloned());
    }
    fields.extend(product.fields.iter().cloned());
    Ok(dedup_fields(fields))
}
