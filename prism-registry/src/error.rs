//! Error types for the registry build.

use std::path::PathBuf;
use thiserror::Error;

use crate::source::SourceError;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Problems in the registry configuration.
///
/// All of these are detected while compiling the build plan, before any
/// source is loaded or any output written.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A fieldset or product references a fieldset that does not exist.
    #[error("unknown fieldset '{name}' referenced by {referenced_by}")]
    UnknownFieldset { referenced_by: String, name: String },

    /// A fieldset includes itself, directly or transitively.
    #[error("cyclic fieldset reference: {}", .0.join(" -> "))]
    CyclicFieldset(Vec<String>),

    /// A product references a shared pivot that does not exist.
    #[error("unknown pivot '{name}' referenced by product '{product}'")]
    UnknownPivot { product: String, name: String },

    /// A product pivot entry is neither a name nor a pivot block.
    #[error("unsupported pivot format in product '{product}': {spec}")]
    UnsupportedPivotSpec { product: String, spec: String },

    /// Two product fields cannot both be nested, e.g. `team` and `team.id`.
    #[error("field '{field}' in product '{product}' nests under field '{prefix}'")]
    ConflictingFieldPaths {
        product: String,
        field: String,
        prefix: String,
    },

    /// A source uses the name reserved for the crosswalk slot.
    #[error("source name '{0}' is reserved")]
    ReservedSourceName(String),

    /// A configured source has no registered provider.
    #[error("no provider registered for source '{0}'")]
    MissingProvider(String),

    /// A preprocessing template does not compile.
    #[error("invalid template for '{source_name}.{field}': {message}")]
    InvalidTemplate {
        source_name: String,
        field: String,
        message: String,
    },
}

/// Errors that can occur during a registry build.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Invalid registry configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A configuration or input file could not be parsed.
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A source provider failed to load. Aborts the build.
    #[error("source '{name}' failed to load: {source}")]
    SourceLoad {
        name: String,
        #[source]
        source: SourceError,
    },

    /// A preprocessing template failed to render.
    #[error("template render failed for '{source_name}.{field}': {message}")]
    Template {
        source_name: String,
        field: String,
        message: String,
    },

    /// A crosswalk row has no usable identity key.
    #[error("crosswalk row {index}: {reason}")]
    InvalidIdentity { index: usize, reason: String },

    /// IO error on a specific path.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV read/write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RegistryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
