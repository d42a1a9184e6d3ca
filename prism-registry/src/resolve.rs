//! Field resolution over intermediates and the record transform.

use prism_model::{MappingRule, MappingSource, Record, is_empty_value};
use serde_json::Value;

use crate::intermediate::{Intermediate, Intermediates};

/// Walks `record` along a dotted path. Missing keys and non-object
/// intermediate values resolve to `None`.
pub fn resolve_path<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    segments.try_fold(record.get(first)?, |current, segment| {
        current.as_object()?.get(segment)
    })
}

/// First non-empty value among `src`'s paths. `false` and zero count as
/// empty and fall through.
///
/// When every path is empty, returns the last path's raw value, so `0`
/// stays `0` and a missing path is `null`.
pub fn resolve_field(intermediate: &Intermediate, src: &MappingSource) -> Value {
    let mut last = None;
    for path in src.paths() {
        let value = resolve_path(intermediate.as_record(), path);
        if let Some(found) = value.filter(|v| !is_empty_value(v)) {
            return found.clone();
        }
        last = value;
    }
    last.cloned().unwrap_or(Value::Null)
}

/// The identity's crosswalk fields, then every mapping's value under its
/// `dest`. A `dest` matching a crosswalk field replaces it in place.
pub fn transform_record(intermediate: &Intermediate, mappings: &[MappingRule]) -> Record {
    let mut output = intermediate.crosswalk().clone();
    for mapping in mappings {
        output.insert(mapping.dest.clone(), resolve_field(intermediate, &mapping.src));
    }
    output
}

/// One output record per intermediate, in crosswalk order.
pub fn transform_records(intermediates: &Intermediates, mappings: &[MappingRule]) -> Vec<Record> {
    intermediates
        .values()
        .map(|intermediate| transform_record(intermediate, mappings))
        .collect()
}
