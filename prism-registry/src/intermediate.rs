//! Joins every source onto the canonical crosswalk.

use indexmap::IndexMap;
use indexmap::map::Entry;
use prism_model::{CROSSWALK_SLOT, IDENTITY_KEY, Record, lookup_key};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, RegistryError, RegistryResult};
use crate::plan::SourcePlan;
use crate::source::{SourceData, SourceTable};

/// One identity's crosswalk row plus its record from every source.
///
/// Serializes as a plain object: `{"crosswalk": {...}, "<source>": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Intermediate(Record);

impl Intermediate {
    pub fn new(crosswalk: Record) -> Self {
        let mut slots = Record::new();
        slots.insert(CROSSWALK_SLOT.to_string(), Value::Object(crosswalk));
        Self(slots)
    }

    pub fn crosswalk(&self) -> &Record {
        match self.0.get(CROSSWALK_SLOT) {
            Some(Value::Object(row)) => row,
            _ => unreachable!("crosswalk slot is set at construction"),
        }
    }

    /// The record joined from `source`, if that source has been attached.
    pub fn source(&self, source: &str) -> Option<&Record> {
        match self.0.get(source) {
            Some(Value::Object(record)) if source != CROSSWALK_SLOT => Some(record),
            _ => None,
        }
    }

    /// The whole composite, walked by dotted mapping paths.
    pub fn as_record(&self) -> &Record {
        &self.0
    }

    fn attach(&mut self, source: &str, record: Record) {
        self.0.insert(source.to_string(), Value::Object(record));
    }
}

/// Intermediates keyed by `prism_id`, in crosswalk order.
pub type Intermediates = IndexMap<String, Intermediate>;

/// Seeds one intermediate per crosswalk row.
///
/// A row without a usable `prism_id` is rejected. A repeated `prism_id`
/// keeps its first position and takes the later row.
pub fn seed_intermediates(crosswalk: &[Record]) -> RegistryResult<Intermediates> {
    let mut intermediates = Intermediates::with_capacity(crosswalk.len());
    for (index, row) in crosswalk.iter().enumerate() {
        let prism_id = row
            .get(IDENTITY_KEY)
            .and_then(lookup_key)
            .ok_or_else(|| RegistryError::InvalidIdentity {
                index,
                reason: format!("missing or empty '{IDENTITY_KEY}'"),
            })?;
        match intermediates.entry(prism_id) {
            Entry::Occupied(mut slot) => {
                warn!(
                    prism_id = %slot.key(),
                    row = index,
                    "Duplicate identity in crosswalk, keeping later row"
                );
                slot.insert(Intermediate::new(row.clone()));
            }
            Entry::Vacant(slot) => {
                slot.insert(Intermediate::new(row.clone()));
            }
        }
    }
    Ok(intermediates)
}

/// Counts from joining one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub matched: usize,
    pub unmatched: usize,
}

/// Attaches `source`'s record to every intermediate, preprocessed, or an
/// empty record when the identity has no key or the key is not found.
pub fn attach_source(
    intermediates: &mut Intermediates,
    source: &SourcePlan,
    data: &SourceData,
) -> RegistryResult<JoinStats> {
    let mut stats = JoinStats::default();
    for (prism_id, intermediate) in intermediates.iter_mut() {
        let key = intermediate
            .crosswalk()
            .get(&source.crosswalk_key)
            .and_then(lookup_key);
        let found = key.as_ref().and_then(|k| data.get(k));

        let record = match found {
            Some(record) if !record.is_empty() => {
                let mut record = record.clone();
                source.preprocessor.apply(&mut record)?;
                stats.matched += 1;
                record
            }
            _ => {
                debug!(
                    prism_id = %prism_id,
                    source = %source.name,
                    key = key.as_deref().unwrap_or(""),
                    "No source record for identity"
                );
                stats.unmatched += 1;
                Record::new()
            }
        };
        intermediate.attach(&source.name, record);
    }
    Ok(stats)
}

/// Builds every intermediate: seeds from the crosswalk, then loads each
/// source once, in declaration order, and joins it.
///
/// Any provider failure aborts the build.
pub fn build_intermediates(
    crosswalk: &[Record],
    sources: &[SourcePlan],
    table: &SourceTable,
    refresh: bool,
) -> RegistryResult<Intermediates> {
    let mut intermediates = seed_intermediates(crosswalk)?;
    info!(identities = intermediates.len(), "Seeded intermediates from crosswalk");

    for source in sources {
        let provider = table
            .get(&source.name)
            .ok_or_else(|| ConfigError::MissingProvider(source.name.clone()))?;

        info!(
            source = %source.name,
            crosswalk_key = %source.crosswalk_key,
            "Loading data from source"
        );
        let data = provider
            .load(refresh)
            .map_err(|e| RegistryError::SourceLoad {
                name: source.name.clone(),
                source: e,
            })?;

        let stats = attach_source(&mut intermediates, source, &data)?;
        info!(
            source = %source.name,
            records = data.len(),
            matched = stats.matched,
            unmatched = stats.unmatched,
            "Joined source"
        );
    }

    Ok(intermediates)
}
