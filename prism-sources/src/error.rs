use std::path::PathBuf;
use thiserror::Error;

pub type ProvidersResult<T> = Result<T, ProvidersError>;

/// Errors reading or validating a providers file.
#[derive(Debug, Error)]
pub enum ProvidersError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("provider '{name}' is invalid: {reason}")]
    InvalidProvider { name: String, reason: String },
}
