use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use prism_model::Record;
use prism_registry::{SourceData, SourceError, SourceProvider};
use serde_json::Value;
use tracing::{debug, info};

/// Records read from one or more CSV files with a shared header layout.
///
/// Rows are keyed by `key_column` after trimming. Rows with an empty key are
/// skipped, and a key seen again in a later file replaces the earlier row.
/// Every cell is kept as a string.
#[derive(Debug, Clone)]
pub struct CsvSource {
    files: Vec<PathBuf>,
    key_column: String,
}

impl CsvSource {
    pub fn new<I, P>(files: I, key_column: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            key_column: key_column.into(),
        }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    fn read_file(&self, path: &Path, data: &mut SourceData) -> Result<usize, SourceError> {
        let file = File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let csv_error = |source| SourceError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::Reader::from_reader(BufReader::new(file));
        let headers = reader.headers().map_err(csv_error)?.clone();
        let key_index = headers
            .iter()
            .position(|h| h == self.key_column)
            .ok_or_else(|| SourceError::MissingKeyColumn {
                path: path.to_path_buf(),
                column: self.key_column.clone(),
            })?;

        let mut skipped = 0;
        let mut rows = 0;
        for row in reader.records() {
            let row = row.map_err(csv_error)?;
            let key = row.get(key_index).unwrap_or_default().trim();
            if key.is_empty() {
                skipped += 1;
                continue;
            }
            let record: Record = headers
                .iter()
                .zip(row.iter())
                .map(|(header, cell)| (header.to_string(), Value::String(cell.to_string())))
                .collect();
            data.insert(key.to_string(), record);
            rows += 1;
        }

        if skipped > 0 {
            debug!(path = %path.display(), skipped, "Skipped rows without a key");
        }
        Ok(rows)
    }
}

impl SourceProvider for CsvSource {
    fn load(&self, refresh: bool) -> Result<SourceData, SourceError> {
        if refresh {
            debug!(key_column = %self.key_column, "Local CSV files have nothing to refresh");
        }

        let mut data = SourceData::new();
        for path in &self.files {
            self.read_file(path, &mut data)?;
        }

        info!(
            files = self.files.len(),
            records = data.len(),
            "Loaded CSV source"
        );
        Ok(data)
    }
}
