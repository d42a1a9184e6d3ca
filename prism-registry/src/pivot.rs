//! Grouped indexes over a product's records.
//!
//! A pivot field groups records by the value of one output field, or by two
//! fields for a two-level index. Buckets hold either every matching record
//! (array mode) or only the last one (single mode, last write wins).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use prism_model::{PivotField, Record, is_empty_value};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{RegistryError, RegistryResult};
use crate::plan::ProductPlan;
use crate::product::{project_nested, with_file, write_json_pretty};

/// Records sharing one grouping key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Bucket {
    Many(Vec<Value>),
    One(Value),
}

impl Bucket {
    fn new(row: Value, is_array: bool) -> Self {
        if is_array {
            Self::Many(vec![row])
        } else {
            Self::One(row)
        }
    }

    fn add(&mut self, row: Value) {
        match self {
            Self::Many(rows) => rows.push(row),
            Self::One(existing) => *existing = row,
        }
    }
}

/// A built pivot. Top-level keys are sorted; second-level keys keep the
/// order in which they first appeared.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PivotGroups {
    Flat(BTreeMap<String, Bucket>),
    Nested(BTreeMap<String, IndexMap<String, Bucket>>),
}

impl PivotGroups {
    pub fn len(&self) -> usize {
        match self {
            Self::Flat(groups) => groups.len(),
            Self::Nested(groups) => groups.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Inner key for a two-level record whose subfield is still empty after
/// `null_key` substitution.
pub const NULL_INNER_KEY: &str = "null";

/// Key text for a grouping value, or `None` when the value is empty
/// (`false` and zero included).
pub fn group_key(value: &Value) -> Option<String> {
    if is_empty_value(value) {
        return None;
    }
    match value {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn key_for(record: &Record, field: &str, null_key: Option<&str>) -> Option<String> {
    record
        .get(field)
        .and_then(group_key)
        .or_else(|| null_key.filter(|k| !k.is_empty()).map(str::to_string))
}

/// Groups `records` by `pivot`, storing each record projected onto
/// `fields` and nested.
///
/// Grouping values are read from the full record, so a pivot may group by a
/// field the product does not output. Records whose top-level key is empty
/// after `null_key` substitution are left out; an empty second-level key
/// files the record under [`NULL_INNER_KEY`].
pub fn build_pivot(pivot: &PivotField, fields: &[String], records: &[Record]) -> PivotGroups {
    let null_key = pivot.null_key.as_deref();
    let mut dropped = 0usize;

    let groups = match &pivot.subfield {
        None => {
            let mut groups: BTreeMap<String, Bucket> = BTreeMap::new();
            for record in records {
                let Some(key) = key_for(record, &pivot.field, null_key) else {
                    dropped += 1;
                    continue;
                };
                let row = project_nested(record, fields);
                match groups.get_mut(&key) {
                    Some(bucket) => bucket.add(row),
                    None => {
                        groups.insert(key, Bucket::new(row, pivot.is_array));
                    }
                }
            }
            PivotGroups::Flat(groups)
        }
        Some(subfield) => {
            let mut groups: BTreeMap<String, IndexMap<String, Bucket>> = BTreeMap::new();
            for record in records {
                let Some(outer) = key_for(record, &pivot.field, null_key) else {
                    dropped += 1;
                    continue;
                };
                let inner = key_for(record, subfield, null_key)
                    .unwrap_or_else(|| NULL_INNER_KEY.to_string());
                let row = project_nested(record, fields);
                let inner_groups = groups.entry(outer).or_default();
                match inner_groups.get_mut(&inner) {
                    Some(bucket) => bucket.add(row),
                    None => {
                        inner_groups.insert(inner, Bucket::new(row, pivot.is_array));
                    }
                }
            }
            PivotGroups::Nested(groups)
        }
    };

    if dropped > 0 {
        debug!(pivot = %pivot.name, field = %pivot.field, dropped, "Records without a pivot key");
    }
    groups
}

/// Writes every pivot block of `product` under `product_dir/<pivot name>/`,
/// one `<pivot field name>.json` per pivot field.
pub fn write_pivots(
    product_dir: &Path,
    product: &ProductPlan,
    records: &[Record],
) -> RegistryResult<Vec<PathBuf>> {
    let mut written = Vec::new();
    for spec in &product.pivots {
        if spec.fields.is_empty() {
            continue;
        }
        let dir = product_dir.join(&spec.name);
        fs::create_dir_all(&dir).map_err(|e| RegistryError::io(&dir, e))?;

        for pivot in &spec.fields {
            let groups = build_pivot(pivot, &product.fields, records);
            let path = dir.join(format!("{}.json", pivot.name));
            with_file(&path, |w| write_json_pretty(w, &groups))?;
            info!(
                product = %product.name,
                pivot = %spec.name,
                file = %pivot.name,
                keys = groups.len(),
                "Wrote pivot"
            );
            written.push(path);
        }
    }
    Ok(written)
}
