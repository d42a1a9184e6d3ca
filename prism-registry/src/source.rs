//! The seam between the build engine and external data sources.
//!
//! Sources are registered by name in a [`SourceTable`] before the build
//! starts. The engine only ever calls [`SourceProvider::load`], once per
//! source per build.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use prism_model::Record;
use thiserror::Error;

/// One source's records, keyed by the value of its join key.
pub type SourceData = HashMap<String, Record>;

/// Errors a source provider can report.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} has no key column '{column}'", path.display())]
    MissingKeyColumn { path: PathBuf, column: String },

    #[error("invalid source data: {0}")]
    InvalidData(String),
}

/// Supplies the complete keyed record set of one source.
///
/// Implementations must return either every record or an error; the engine
/// never works from a partial load. `refresh` asks the provider to bypass
/// whatever cache it keeps.
pub trait SourceProvider: Send + Sync {
    fn load(&self, refresh: bool) -> Result<SourceData, SourceError>;
}

impl<F> SourceProvider for F
where
    F: Fn(bool) -> Result<SourceData, SourceError> + Send + Sync,
{
    fn load(&self, refresh: bool) -> Result<SourceData, SourceError> {
        self(refresh)
    }
}

/// Static registration of providers by source name.
#[derive(Default)]
pub struct SourceTable {
    providers: HashMap<String, Box<dyn SourceProvider>>,
}

impl SourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` under `name`, replacing any earlier registration.
    pub fn register<P>(&mut self, name: impl Into<String>, provider: P) -> &mut Self
    where
        P: SourceProvider + 'static,
    {
        self.providers.insert(name.into(), Box::new(provider));
        self
    }

    /// Builder form of [`SourceTable::register`].
    #[must_use]
    pub fn with<P>(mut self, name: impl Into<String>, provider: P) -> Self
    where
        P: SourceProvider + 'static,
    {
        self.register(name, provider);
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn SourceProvider> {
        self.providers.get(name).map(|p| p.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for SourceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.providers.keys().collect();
        names.sort();
        f.debug_struct("SourceTable").field("sources", &names).finish()
    }
}
