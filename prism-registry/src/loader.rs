//! Reading the registry file and the canonical crosswalk, and the
//! intermediate dump.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

use prism_model::{Record, RegistryConfig};
use serde_json::Value;

use crate::error::{RegistryError, RegistryResult};
use crate::intermediate::Intermediates;
use crate::product::{with_file, write_json_pretty};

/// Parses a registry YAML document.
pub fn parse_registry(yaml: &str) -> Result<RegistryConfig, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}

pub fn load_registry(path: &Path) -> RegistryResult<RegistryConfig> {
    let yaml = fs::read_to_string(path).map_err(|e| RegistryError::io(path, e))?;
    parse_registry(&yaml).map_err(|e| RegistryError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Reads a crosswalk JSON document: an array of objects.
pub fn read_crosswalk_json<R: Read>(reader: R) -> RegistryResult<Vec<Record>> {
    Ok(serde_json::from_reader(reader)?)
}

/// Reads a crosswalk CSV with a header row. Every cell is a string and
/// empty cells become `null`.
pub fn read_crosswalk_csv<R: Read>(reader: R) -> RegistryResult<Vec<Record>> {
    let mut csv = csv::Reader::from_reader(reader);
    let headers = csv.headers()?.clone();
    let mut rows = Vec::new();
    for row in csv.records() {
        let row = row?;
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(header, cell)| {
                let value = if cell.is_empty() {
                    Value::Null
                } else {
                    Value::String(cell.to_string())
                };
                (header.to_string(), value)
            })
            .collect();
        rows.push(record);
    }
    Ok(rows)
}

/// Loads the crosswalk, as CSV when the file has a `.csv` extension and as
/// JSON otherwise. Row order is kept.
pub fn load_crosswalk(path: &Path) -> RegistryResult<Vec<Record>> {
    let file = File::open(path).map_err(|e| RegistryError::io(path, e))?;
    let reader = BufReader::new(file);
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let rows = if is_csv {
        read_crosswalk_csv(reader)
    } else {
        read_crosswalk_json(reader)
    };
    rows.map_err(|e| match e {
        RegistryError::Io { .. } => e,
        other => RegistryError::Parse {
            path: path.to_path_buf(),
            message: other.to_string(),
        },
    })
}

/// Writes every intermediate as one pretty JSON object keyed by `prism_id`.
pub fn write_intermediates(path: &Path, intermediates: &Intermediates) -> RegistryResult<()> {
    with_file(path, |w| write_json_pretty(w, intermediates))
}
