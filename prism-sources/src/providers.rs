//! The providers file: which concrete provider backs each source name.
//!
//! ```yaml
//! sources:
//!   chadwick:
//!     kind: csv
//!     files: [register/people-0.csv, register/people-1.csv]
//!     key_column: key_mlbam
//!   people:
//!     kind: json
//!     files: [people/1.json, people/11.json]
//!     records: /people
//!     key: /id
//!     attach:
//!       - field: team
//!         on: /currentTeam/id
//!         files: [people/teams_1.json, people/teams_11.json]
//!         records: /teams
//!         key: /id
//! ```
//!
//! A JSON provider's `files` may also be written as a single `path`.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use prism_registry::SourceTable;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::csv_source::CsvSource;
use crate::error::{ProvidersError, ProvidersResult};
use crate::json_source::{Attachment, JsonSource};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub sources: IndexMap<String, ProviderConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProviderConfig {
    Csv {
        files: Vec<PathBuf>,
        key_column: String,
    },
    Json {
        #[serde(alias = "path", deserialize_with = "one_or_many")]
        files: Vec<PathBuf>,
        /// JSON pointer to the records array; the document root when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        records: Option<String>,
        /// JSON pointer to each record's key.
        key: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        attach: Vec<AttachConfig>,
    },
}

/// A lookup file set joined into each JSON record under `field`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachConfig {
    pub field: String,
    /// JSON pointer into the record whose value keys the lookup.
    pub on: String,
    #[serde(alias = "path", deserialize_with = "one_or_many")]
    pub files: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<String>,
    pub key: String,
}

impl AttachConfig {
    fn source(&self, base_dir: &Path) -> JsonSource {
        json_source(base_dir, &self.files, self.records.as_deref(), &self.key)
    }
}

fn json_source(base_dir: &Path, files: &[PathBuf], records: Option<&str>, key: &str) -> JsonSource {
    let source = JsonSource::new(files.iter().map(|f| base_dir.join(f)), key);
    match records {
        Some(pointer) => source.with_records(pointer),
        None => source,
    }
}

fn is_pointer(pointer: &str) -> bool {
    pointer.starts_with('/')
}

fn is_records_pointer(pointer: Option<&str>) -> bool {
    pointer.is_none_or(|p| p.is_empty() || is_pointer(p))
}

impl ProviderConfig {
    fn validate(&self, name: &str) -> ProvidersResult<()> {
        let invalid = |reason: &str| ProvidersError::InvalidProvider {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        match self {
            Self::Csv { files, key_column } => {
                if files.is_empty() {
                    return Err(invalid("no files listed"));
                }
                if key_column.is_empty() {
                    return Err(invalid("key_column is empty"));
                }
            }
            Self::Json {
                files,
                records,
                key,
                attach,
            } => {
                if files.is_empty() {
                    return Err(invalid("no files listed"));
                }
                if !is_pointer(key) {
                    return Err(invalid("key must be a JSON pointer starting with '/'"));
                }
                if !is_records_pointer(records.as_deref()) {
                    return Err(invalid("records must be a JSON pointer starting with '/'"));
                }
                for attachment in attach {
                    if attachment.field.is_empty() {
                        return Err(invalid("attachment field is empty"));
                    }
                    if attachment.files.is_empty() {
                        return Err(invalid("attachment lists no files"));
                    }
                    if !is_pointer(&attachment.on) || !is_pointer(&attachment.key) {
                        return Err(invalid("attachment on and key must be JSON pointers"));
                    }
                    if !is_records_pointer(attachment.records.as_deref()) {
                        return Err(invalid("attachment records must be a JSON pointer"));
                    }
                }
            }
        }
        Ok(())
    }
}

pub fn parse_providers(yaml: &str) -> Result<ProvidersConfig, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}

pub fn load_providers(path: &Path) -> ProvidersResult<ProvidersConfig> {
    let yaml = fs::read_to_string(path).map_err(|source| ProvidersError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_providers(&yaml).map_err(|source| ProvidersError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Registers one provider per configured source. Relative paths are resolved
/// against `base_dir`.
pub fn build_table(config: &ProvidersConfig, base_dir: &Path) -> ProvidersResult<SourceTable> {
    let mut table = SourceTable::new();
    for (name, provider) in &config.sources {
        provider.validate(name)?;
        match provider {
            ProviderConfig::Csv { files, key_column } => {
                let files = files.iter().map(|f| base_dir.join(f));
                table.register(name.as_str(), CsvSource::new(files, key_column.as_str()));
            }
            ProviderConfig::Json {
                files,
                records,
                key,
                attach,
            } => {
                let source = attach.iter().fold(
                    json_source(base_dir, files, records.as_deref(), key),
                    |source, a| {
                        source.with_attachment(Attachment::new(
                            a.field.as_str(),
                            a.on.as_str(),
                            a.source(base_dir),
                        ))
                    },
                );
                table.register(name.as_str(), source);
            }
        }
    }
    info!(sources = table.len(), "Registered source providers");
    Ok(table)
}

/// Loads a providers file and builds its table, resolving paths against the
/// file's own directory.
pub fn load_source_table(path: &Path) -> ProvidersResult<SourceTable> {
    let config = load_providers(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    build_table(&config, base_dir)
}

// `path: a.json` and `files: [a.json, b.json]` both name a file list.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(PathBuf),
        Many(Vec<PathBuf>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(path) => vec![path],
        OneOrMany::Many(paths) => paths,
    })
}
