use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use prism_model::{Record, lookup_key};
use prism_registry::{SourceData, SourceError, SourceProvider};
use serde_json::Value;
use tracing::{debug, info};

/// Records read from an array inside one or more JSON documents.
///
/// `records` is a JSON pointer to the array (`/people`); `None` means the
/// document itself is the array. Each element is keyed by the value at the
/// `key` pointer (`/id`, `/person/id`). Elements without a usable key are
/// skipped, and a key seen again in a later file replaces the earlier record.
///
/// Attachments run after every file is read, in the order they were added.
#[derive(Debug, Clone)]
pub struct JsonSource {
    files: Vec<PathBuf>,
    records: Option<String>,
    key: String,
    attachments: Vec<Attachment>,
}

/// Copies a record from `lookup` into `field` of every record whose value at
/// the `on` pointer keys into it.
///
/// A later attachment can point `on` into an earlier attachment's field, so
/// `parentTeam` may be looked up from `/team/parentOrgId`.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub field: String,
    pub on: String,
    pub lookup: JsonSource,
}

impl Attachment {
    pub fn new(field: impl Into<String>, on: impl Into<String>, lookup: JsonSource) -> Self {
        Self {
            field: field.into(),
            on: on.into(),
            lookup,
        }
    }
}

impl JsonSource {
    pub fn new<I, P>(files: I, key: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            records: None,
            key: key.into(),
            attachments: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_records(mut self, pointer: impl Into<String>) -> Self {
        self.records = Some(pointer.into());
        self
    }

    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    fn read_file(&self, path: &Path, data: &mut SourceData) -> Result<usize, SourceError> {
        let file = File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document: Value =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| SourceError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let pointer = self.records.as_deref().unwrap_or("");
        let elements = document
            .pointer(pointer)
            .ok_or_else(|| invalid(path, format_args!("nothing at '{pointer}'")))?
            .as_array()
            .ok_or_else(|| invalid(path, format_args!("'{pointer}' is not an array")))?;

        let mut skipped = 0;
        for (index, element) in elements.iter().enumerate() {
            let Some(record) = element.as_object() else {
                return Err(invalid(path, format_args!("element {index} is not an object")));
            };
            match record_pointer(record, &self.key).and_then(lookup_key) {
                Some(key) => {
                    data.insert(key, record.clone());
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!(path = %path.display(), skipped, "Skipped elements without a key");
        }
        Ok(elements.len() - skipped)
    }

    fn attach(
        &self,
        attachment: &Attachment,
        data: &mut SourceData,
        refresh: bool,
    ) -> Result<(), SourceError> {
        let lookup = attachment.lookup.load(refresh)?;
        let mut attached = 0usize;
        let mut unmatched = 0usize;
        for record in data.values_mut() {
            let Some(key) = record_pointer(record, &attachment.on).and_then(lookup_key) else {
                continue;
            };
            match lookup.get(&key) {
                Some(found) => {
                    record.insert(attachment.field.clone(), Value::Object(found.clone()));
                    attached += 1;
                }
                None => unmatched += 1,
            }
        }
        if unmatched > 0 {
            debug!(field = %attachment.field, unmatched, "Attachment keys without a match");
        }
        debug!(field = %attachment.field, attached, "Attached lookup records");
        Ok(())
    }
}

impl SourceProvider for JsonSource {
    fn load(&self, refresh: bool) -> Result<SourceData, SourceError> {
        if refresh {
            debug!(files = self.files.len(), "Local JSON files have nothing to refresh");
        }

        let mut data = SourceData::new();
        for path in &self.files {
            let rows = self.read_file(path, &mut data)?;
            debug!(path = %path.display(), rows, "Read JSON file");
        }
        for attachment in &self.attachments {
            self.attach(attachment, &mut data, refresh)?;
        }

        info!(files = self.files.len(), records = data.len(), "Loaded JSON source");
        Ok(data)
    }
}

fn invalid(path: &Path, reason: impl std::fmt::Display) -> SourceError {
    SourceError::InvalidData(format!("{}: {reason}", path.display()))
}

/// [`Value::pointer`] over a record.
fn record_pointer<'a>(record: &'a Record, pointer: &str) -> Option<&'a Value> {
    let rest = pointer.strip_prefix('/')?;
    let (head, tail) = rest.split_at(rest.find('/').unwrap_or(rest.len()));
    let head = head.replace("~1", "/").replace("~0", "~");
    record.get(&head)?.pointer(tail)
}
