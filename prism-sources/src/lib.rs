//! File-backed source providers for Prism builds.
//!
//! [`CsvSource`] and [`JsonSource`] implement
//! [`prism_registry::SourceProvider`] over local files. A providers file
//! maps each registry source name to one of them, see [`load_source_table`].

mod csv_source;
mod error;
mod json_source;
mod providers;

pub use csv_source::CsvSource;
pub use error::{ProvidersError, ProvidersResult};
pub use json_source::{Attachment, JsonSource};
pub use providers::{
    AttachConfig, ProviderConfig, ProvidersConfig, build_table, load_providers, load_source_table,
    parse_providers,
};
