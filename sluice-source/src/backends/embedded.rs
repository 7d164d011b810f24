//! Embedded migration backend
//!
//! Serves migrations compiled into the binary, typically with `include_str!`:
//!
//! ```
//! use sluice_source::backends::embedded::{EmbeddedBackend, EmbeddedMigration};
//!
//! static MIGRATIONS: &[EmbeddedMigration] = &[
//!     EmbeddedMigration::new("1_init.up.sql", "CREATE TABLE users (id INTEGER);"),
//!     EmbeddedMigration::new("1_init.down.sql", "DROP TABLE users;"),
//! ];
//!
//! let backend = EmbeddedBackend::new(MIGRATIONS);
//! assert_eq!(backend.len(), 2);
//! ```
//!
//! Every entry is expected to be a migration, so a name that does not parse
//! fails construction by default.

use async_trait::async_trait;
use std::io::Cursor;

use sluice_config::ParsePolicy;

use crate::backends::Backend;
use crate::error::BackendError;
use crate::types::ScriptReader;

#[derive(Debug, Clone, Copy)]
pub struct EmbeddedMigration {
    pub name: &'static str,
    pub content: &'static [u8],
}

impl EmbeddedMigration {
    pub const fn new(name: &'static str, content: &'static str) -> Self {
        Self {
            name,
            content: content.as_bytes(),
        }
    }

    pub const fn from_bytes(name: &'static str, content: &'static [u8]) -> Self {
        Self { name, content }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EmbeddedBackend {
    migrations: &'static [EmbeddedMigration],
}

impl EmbeddedBackend {
    pub const fn new(migrations: &'static [EmbeddedMigration]) -> Self {
        Self { migrations }
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

#[async_trait]
impl Backend for EmbeddedBackend {
    fn describe(&self) -> String {
        format!("embedded://({} entries)", self.migrations.len())
    }

    fn default_parse_policy(&self) -> ParsePolicy {
        ParsePolicy::Reject
    }

    async fn list(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.migrations.iter().map(|m| m.name.to_string()).collect())
    }

    async fn fetch(&self, raw: &str) -> Result<ScriptReader, BackendError> {
        let migration = self
            .migrations
            .iter()
            .find(|m| m.name == raw)
            .ok_or_else(|| BackendError::NotFound(raw.to_string()))?;

        Ok(Box::new(Cursor::new(migration.content)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    static MIGRATIONS: &[EmbeddedMigration] = &[
        EmbeddedMigration::new("1_init.up.sql", "CREATE TABLE t (id int);"),
        EmbeddedMigration::new("1_init.down.sql", "DROP TABLE t;"),
        EmbeddedMigration::from_bytes("2_seed.up.sql", b"INSERT INTO t VALUES (1);"),
    ];

    #[tokio::test]
    async fn test_list_embedded() {
        let backend = EmbeddedBackend::new(MIGRATIONS);
        let names = backend.list().await.unwrap();
        assert_eq!(names, vec!["1_init.up.sql", "1_init.down.sql", "2_seed.up.sql"]);
        assert_eq!(backend.default_parse_policy(), ParsePolicy::Reject);
    }

    #[tokio::test]
    async fn test_fetch_embedded() {
        let backend = EmbeddedBackend::new(MIGRATIONS);

        let mut body = String::new();
        backend
            .fetch("2_seed.up.sql")
            .await
            .unwrap()
            .read_to_string(&mut body)
            .await
            .unwrap();
        assert_eq!(body, "INSERT INTO t VALUES (1);");

        assert!(matches!(backend.fetch("3_missing.up.sql").await, Err(BackendError::NotFound(_))));
    }
}
