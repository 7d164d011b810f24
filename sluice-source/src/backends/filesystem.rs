use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use sluice_config::ParsePolicy;

use crate::address::SourceAddress;
use crate::backends::Backend;
use crate::error::{BackendError, Result};
use crate::types::ScriptReader;

/// Migrations stored as files in one local directory.
///
/// Listing is flat: subdirectories and other non-file entries are ignored.
/// Directories commonly hold READMEs and editor files next to migrations, so
/// names that do not parse are skipped by default.
#[derive(Debug, Clone)]
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Backend for a `file://path` address.
    pub fn from_address(address: &SourceAddress) -> Result<Self> {
        if address.scheme() != "file" {
            return Err(address.invalid("filesystem sources use the file:// scheme"));
        }

        if address.path().is_empty() {
            return Err(address.invalid("file:// address has no path"));
        }

        Ok(Self::new(address.path()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, raw: &str) -> std::result::Result<PathBuf, BackendError> {
        // Only names produced by list() are valid; never escape the root.
        let name = Path::new(raw);
        if name.components().count() != 1 || name.file_name().is_none() {
            return Err(BackendError::NotFound(raw.to_string()));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl Backend for FilesystemBackend {
    fn describe(&self) -> String {
        format!("file://{}", self.root.display())
    }

    fn default_parse_policy(&self) -> ParsePolicy {
        ParsePolicy::Skip
    }

    async fn list(&self) -> std::result::Result<Vec<String>, BackendError> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            // follow symlinks so linked migration files are listed
            let metadata = match fs::metadata(entry.path()).await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("Ignoring dangling entry {:?}", entry.path());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if !metadata.is_file() {
                continue;
            }

            // Lossy so the parse policy still sees names that are not UTF-8.
            names.push(entry.file_name().to_string_lossy().into_owned());
        }

        Ok(names)
    }

    async fn fetch(&self, raw: &str) -> std::result::Result<ScriptReader, BackendError> {
        let path = self.resolve(raw)?;
        match fs::File::open(&path).await {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BackendError::NotFound(path.display().to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_list_is_flat_and_files_only() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("1_init.up.sql"), "CREATE TABLE t (id int);").unwrap();
        std::fs::write(temp_dir.path().join("README.md"), "docs").unwrap();
        std::fs::create_dir(temp_dir.path().join("2_nested.up.sql")).unwrap();
        std::fs::create_dir(temp_dir.path().join("archive")).unwrap();
        std::fs::write(temp_dir.path().join("archive").join("0_old.up.sql"), "").unwrap();

        let backend = FilesystemBackend::new(temp_dir.path());
        let mut names = backend.list().await.unwrap();
        names.sort();

        assert_eq!(names, vec!["1_init.up.sql".to_string(), "README.md".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("1_init.up.sql"), "CREATE TABLE t (id int);").unwrap();

        let backend = FilesystemBackend::new(temp_dir.path());
        let mut reader = backend.fetch("1_init.up.sql").await.unwrap();
        let mut body = String::new();
        reader.read_to_string(&mut body).await.unwrap();

        assert_eq!(body, "CREATE TABLE t (id int);");
    }

    #[tokio::test]
    async fn test_fetch_missing_and_escaping_names() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FilesystemBackend::new(temp_dir.path());

        assert!(matches!(backend.fetch("1_gone.up.sql").await, Err(BackendError::NotFound(_))));
        assert!(matches!(backend.fetch("../etc/passwd").await, Err(BackendError::NotFound(_))));
        assert!(matches!(backend.fetch("").await, Err(BackendError::NotFound(_))));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_non_utf8_name_follows_parse_policy() {
        use crate::driver::{MigrationSource, SourceDriver, SourceOptions};
        use crate::error::SourceError;
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("1_init.up.sql"), "").unwrap();
        std::fs::write(temp_dir.path().join(OsStr::from_bytes(b"notes\xff.txt")), "").unwrap();

        let backend = FilesystemBackend::new(temp_dir.path());
        let names = backend.list().await.unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"notes\u{FFFD}.txt".to_string()));

        let strict = SourceOptions::default().with_parse_policy(ParsePolicy::Reject);
        let err = MigrationSource::open(backend.clone(), strict).await.err().unwrap();
        assert!(matches!(err, SourceError::Parse { .. }));

        let source = MigrationSource::open(backend, SourceOptions::default()).await.unwrap();
        assert_eq!(source.migrations().len(), 1);
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_io_error() {
        let backend = FilesystemBackend::new("/definitely/not/a/migration/dir");
        assert!(matches!(backend.list().await, Err(BackendError::Io(_))));
    }

    #[test]
    fn test_from_address() {
        let address = SourceAddress::parse("file://./migrations").unwrap();
        let backend = FilesystemBackend::from_address(&address).unwrap();
        assert_eq!(backend.root(), Path::new("./migrations"));
        assert_eq!(backend.describe(), "file://./migrations");

        let empty = SourceAddress::parse("file://").unwrap();
        assert!(FilesystemBackend::from_address(&empty).is_err());

        let wrong = SourceAddress::parse("s3://bucket/migrations").unwrap();
        assert!(FilesystemBackend::from_address(&wrong).is_err());
    }
}
