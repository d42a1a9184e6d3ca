//! Shared fixtures for registry tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use prism_model::{Record, RegistryConfig};
use prism_registry::{SourceData, SourceError, SourceProvider, SourceTable, parse_registry};
use serde_json::{Value, json};

/// Converts a `json!` object into a record.
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture must be an object, got {other}"),
    }
}

/// Converts a `json!` array of objects into records.
pub fn records(value: Value) -> Vec<Record> {
    match value {
        Value::Array(rows) => rows.into_iter().map(record).collect(),
        other => panic!("fixture must be an array, got {other}"),
    }
}

/// Keys a `json!` object of objects into source data.
pub fn keyed(value: Value) -> SourceData {
    record(value)
        .into_iter()
        .map(|(key, row)| (key, record(row)))
        .collect()
}

/// A provider that always returns `data`.
pub fn static_source(data: SourceData) -> impl SourceProvider {
    move |_refresh: bool| -> Result<SourceData, SourceError> { Ok(data.clone()) }
}

/// A provider that always fails.
pub fn failing_source() -> impl SourceProvider {
    |_refresh: bool| -> Result<SourceData, SourceError> {
        Err(SourceError::InvalidData("upstream unavailable".into()))
    }
}

/// A provider that records how often, and with which flag, it was loaded.
pub struct CountingSource {
    data: SourceData,
    calls: Arc<AtomicUsize>,
    refreshes: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new(data: SourceData) -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let refreshes = Arc::new(AtomicUsize::new(0));
        let source = Self {
            data,
            calls: Arc::clone(&calls),
            refreshes: Arc::clone(&refreshes),
        };
        (source, calls, refreshes)
    }
}

impl SourceProvider for CountingSource {
    fn load(&self, refresh: bool) -> Result<SourceData, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if refresh {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(self.data.clone())
    }
}

// ── Three-player fixture ─────────────────────────────────────────

pub const REGISTRY_YAML: &str = r#"
sources:
  chadwick:
    crosswalk_key: mlbam_id
  sfbb:
    crosswalk_key: mlbam_id
    preprocess:
      - field: display
        template: "{{FIRSTNAME}} {{LASTNAME}} ({{TEAM}})"
mappings:
  - dest: name.first
    src: [sfbb.FIRSTNAME, chadwick.name_first]
  - dest: name.last
    src: chadwick.name_last
  - dest: team
    src: sfbb.TEAM
  - dest: bats
    src: sfbb.BATS
  - dest: display
    src: sfbb.display
fieldsets:
  bio:
    fields: [prism_id, name.first, name.last]
products:
  players:
    fieldsets: [bio]
    fields: [team]
    pivots:
      - name: teams
        fields:
          - name: team
            field: team
  nothing:
"#;

pub fn registry() -> RegistryConfig {
    parse_registry(REGISTRY_YAML).unwrap()
}

pub fn crosswalk() -> Vec<Record> {
    records(json!([
        {"prism_id": "p1", "mlbam_id": "592450"},
        {"prism_id": "p2", "mlbam_id": "605141"},
        {"prism_id": "p3", "mlbam_id": "660271"}
    ]))
}

pub fn chadwick_data() -> SourceData {
    keyed(json!({
        "592450": {"key_mlbam": "592450", "name_first": "Aaron", "name_last": "Judge"},
        "605141": {"key_mlbam": "605141", "name_first": "Mookie", "name_last": "Betts"},
        "660271": {"key_mlbam": "660271", "name_first": "Shohei", "name_last": "Ohtani"}
    }))
}

/// Missing the second player.
pub fn sfbb_data() -> SourceData {
    keyed(json!({
        "592450": {
            "MLBID": "592450",
            "FIRSTNAME": "Aaron",
            "LASTNAME": "Judge",
            "TEAM": "NYY",
            "BATS": "R"
        },
        "660271": {
            "MLBID": "660271",
            "FIRSTNAME": "Shohei",
            "LASTNAME": "Ohtani",
            "TEAM": "LAD",
            "BATS": "L"
        }
    }))
}

pub fn source_table() -> SourceTable {
    SourceTable::new()
        .with("chadwick", static_source(chadwick_data()))
        .with("sfbb", static_source(sfbb_data()))
}
