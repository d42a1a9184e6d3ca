//! Projects output records onto a product's fields and writes the product
//! files: CSV, pretty JSON, minified JSON and NDJSON.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use prism_model::Record;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::{RegistryError, RegistryResult};
use crate::pivot::write_pivots;
use crate::plan::ProductPlan;

/// What was written for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSummary {
    pub name: String,
    pub dir: PathBuf,
    pub records: usize,
    pub files: Vec<PathBuf>,
    pub pivot_files: Vec<PathBuf>,
}

/// Exactly `fields` from `record`, flat, with missing fields as `null`.
pub fn project(record: &Record, fields: &[String]) -> Record {
    fields
        .iter()
        .map(|field| {
            let value = record.get(field).cloned().unwrap_or(Value::Null);
            (field.clone(), value)
        })
        .collect()
}

/// Turns dotted keys into nested objects: `{"name.first": "A"}` becomes
/// `{"name": {"first": "A"}}`.
///
/// A non-object value in the way of a deeper key is replaced by an object.
pub fn nest_fields(flat: &Record) -> Record {
    let mut nested = Record::new();
    for (key, value) in flat {
        let (parents, leaf) = match key.rsplit_once('.') {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, key.as_str()),
        };
        let mut current = &mut nested;
        for part in parents.into_iter().flat_map(|p| p.split('.')) {
            current = child_object(current, part);
        }
        current.insert(leaf.to_string(), value.clone());
    }
    nested
}

fn child_object<'a>(map: &'a mut Record, key: &str) -> &'a mut Record {
    let slot = map
        .entry(key)
        .or_insert_with(|| Value::Object(Record::new()));
    if !slot.is_object() {
        *slot = Value::Object(Record::new());
    }
    match slot {
        Value::Object(child) => child,
        _ => unreachable!("slot was just made an object"),
    }
}

/// [`project`] followed by [`nest_fields`], as a JSON value.
pub fn project_nested(record: &Record, fields: &[String]) -> Value {
    Value::Object(nest_fields(&project(record, fields)))
}

/// Column name for a field in flat formats.
pub fn csv_column(field: &str) -> String {
    field.replace('.', "_")
}

/// Cell text for a value: `null` is empty, strings are raw, everything else
/// is compact JSON.
pub fn csv_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Writes a header of [`csv_column`] names, then one row per record.
pub fn write_csv<W: Write>(writer: W, fields: &[String], records: &[Record]) -> RegistryResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(fields.iter().map(|f| csv_column(f)))?;
    for record in records {
        csv.write_record(fields.iter().map(|f| csv_cell(record.get(f))))?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// One compact JSON document per line, each line newline-terminated.
///
/// Writer failures come back as the writer's own `io::Error`.
pub fn write_ndjson<W: Write>(mut writer: W, rows: &[Value]) -> io::Result<()> {
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Writes every file of `product` under `output_dir/<product>/`.
///
/// Returns `None` without touching the filesystem when the product has no
/// fields.
pub fn write_product(
    output_dir: &Path,
    product: &ProductPlan,
    records: &[Record],
) -> RegistryResult<Option<ProductSummary>> {
    if product.fields.is_empty() {
        return Ok(None);
    }

    let name = &product.name;
    let dir = output_dir.join(name);
    fs::create_dir_all(&dir).map_err(|e| RegistryError::io(&dir, e))?;

    let csv_path = dir.join(format!("{name}.csv"));
    with_file(&csv_path, |w| write_csv(w, &product.fields, records))?;

    let nested: Vec<Value> = records
        .iter()
        .map(|record| project_nested(record, &product.fields))
        .collect();

    let json_path = dir.join(format!("{name}.json"));
    with_file(&json_path, |w| write_json_pretty(w, &nested))?;

    let min_path = dir.join(format!("{name}.min.json"));
    with_file(&min_path, |w| Ok(serde_json::to_writer(w, &nested)?))?;

    let ndjson_path = dir.join(format!("{name}.ndjson"));
    with_file(&ndjson_path, |w| {
        write_ndjson(w, &nested).map_err(|e| RegistryError::io(&ndjson_path, e))
    })?;

    let pivot_files = write_pivots(&dir, product, records)?;

    info!(
        product = %name,
        records = records.len(),
        fields = product.fields.len(),
        pivots = pivot_files.len(),
        "Wrote product"
    );

    Ok(Some(ProductSummary {
        name: name.clone(),
        dir,
        records: records.len(),
        files: vec![csv_path, json_path, min_path, ndjson_path],
        pivot_files,
    }))
}

/// Pretty JSON with two-space indentation.
pub(crate) fn write_json_pretty<W: Write, T: Serialize + ?Sized>(
    writer: W,
    value: &T,
) -> RegistryResult<()> {
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

/// Creates `path`, hands a buffered writer to `write`, then flushes.
pub(crate) fn with_file<F>(path: &Path, write: F) -> RegistryResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> RegistryResult<()>,
{
    let file = File::create(path).map_err(|e| RegistryError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer.flush().map_err(|e| RegistryError::io(path, e))
}
