//! Versioned migration sources
//!
//! Discovers migration scripts named `{version}_{identifier}.{up|down}.{ext}` in
//! a storage backend, indexes them by version once, and serves navigation
//! (`first`/`prev`/`next`) and lazily fetched script content to a migration
//! engine.

pub mod address;
pub mod backends;
pub mod driver;
pub mod error;
pub mod index;
pub mod parser;
pub mod registry;
pub mod testing;
pub mod types;

// Re-export main types and traits
pub use address::SourceAddress;
pub use backends::embedded::{EmbeddedBackend, EmbeddedMigration};
#[cfg(feature = "filesystem")]
pub use backends::filesystem::FilesystemBackend;
#[cfg(feature = "http")]
pub use backends::http::HttpBackend;
pub use backends::object_store::{ObjectStoreBackend, ObjectStoreClient};
pub use backends::Backend;
pub use driver::{MigrationSource, SourceDriver, SourceOptions};
pub use error::{BackendError, Result, SourceError};
pub use index::Migrations;
pub use registry::{SourceOpener, SourceRegistry};
pub use types::{Direction, Migration, MigrationScript, ScriptReader, Version};

pub use sluice_config::ParsePolicy;

pub mod prelude {
    pub use crate::{
        Backend, Direction, MigrationScript, MigrationSource, ParsePolicy, SourceDriver, SourceError,
        SourceOptions, SourceRegistry, Version,
    };
}
