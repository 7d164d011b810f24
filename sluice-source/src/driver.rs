//! Source drivers: the navigation and read API consumed by a migration engine

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use sluice_config::{ParsePolicy, SourceConfig};

use crate::backends::Backend;
use crate::error::{Result, SourceError};
use crate::index::Migrations;
use crate::parser;
use crate::types::{Direction, MigrationScript, Version};

/// What a migration engine needs from a source.
///
/// Navigation answers come from an index built when the source was opened;
/// only `read_up`/`read_down` touch the backend. Absence is reported as
/// [`SourceError::NotFound`] (or [`SourceError::Empty`] for `first`), which
/// [`SourceError::is_not_found`] separates from real failures.
#[async_trait]
pub trait SourceDriver: Send + Sync {
    /// Lowest version present in either direction.
    async fn first(&self) -> Result<Version>;

    /// Largest version strictly below `version`.
    async fn prev(&self, version: Version) -> Result<Version>;

    /// Smallest version strictly above `version`.
    async fn next(&self, version: Version) -> Result<Version>;

    async fn read_up(&self, version: Version) -> Result<MigrationScript>;

    async fn read_down(&self, version: Version) -> Result<MigrationScript>;

    /// Release backend resources. Every later call, `close` included, fails
    /// with [`SourceError::Closed`].
    async fn close(&self) -> Result<()>;

    /// The index built at open. Still readable after `close`.
    fn migrations(&self) -> &Migrations;
}

/// Per-open settings that override backend defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceOptions {
    pub parse_policy: Option<ParsePolicy>,
}

impl SourceOptions {
    pub fn with_parse_policy(mut self, policy: ParsePolicy) -> Self {
        self.parse_policy = Some(policy);
        self
    }
}

impl From<&SourceConfig> for SourceOptions {
    fn from(config: &SourceConfig) -> Self {
        Self {
            parse_policy: config.parse_policy,
        }
    }
}

/// A ready-to-query source over one backend.
pub struct MigrationSource<B> {
    backend: B,
    migrations: Migrations,
    closed: AtomicBool,
}

impl<B: Backend> MigrationSource<B> {
    /// List the backend and build the version index.
    ///
    /// Fails without returning a source when listing fails, when two entries
    /// claim the same version and direction, or when a name does not parse
    /// under [`ParsePolicy::Reject`]. Script contents are not read here.
    pub async fn open(backend: B, options: SourceOptions) -> Result<Self> {
        let location = backend.describe();
        let policy = options
            .parse_policy
            .unwrap_or_else(|| backend.default_parse_policy());

        debug!("Listing migrations at {} (parse policy: {})", location, policy);

        let names = backend
            .list()
            .await
            .map_err(|source| SourceError::Enumeration {
                location: location.clone(),
                source,
            })?;

        let migrations = build_index(names, policy)?;

        info!(
            "Indexed {} migration versions from {}",
            migrations.len(),
            location
        );

        Ok(Self {
            backend,
            migrations,
            closed: AtomicBool::new(false),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(SourceError::Closed);
        }
        Ok(())
    }

    async fn read(&self, version: Version, direction: Direction) -> Result<MigrationScript> {
        self.ensure_open()?;

        let migration = self
            .migrations
            .get(version, direction)
            .ok_or(SourceError::NotFound {
                version,
                direction: Some(direction),
            })?;

        let reader = self
            .backend
            .fetch(&migration.raw)
            .await
            .map_err(|source| SourceError::Fetch {
                raw: migration.raw.clone(),
                source,
            })?;

        Ok(MigrationScript::new(migration, reader))
    }
}

/// Parse and index listed names.
///
/// Names are processed in sorted order so that a duplicate is always reported
/// against the same earlier entry regardless of listing order.
pub fn build_index(names: impl IntoIterator<Item = String>, policy: ParsePolicy) -> Result<Migrations> {
    let mut names: Vec<String> = names.into_iter().collect();
    names.sort();

    let mut migrations = Migrations::new();
    for name in names {
        let migration = match parser::parse(&name) {
            Ok(migration) => migration,
            Err(e) => match policy {
                ParsePolicy::Skip => {
                    warn!("Skipping {}: not a migration file", name);
                    continue;
                }
                ParsePolicy::Reject => {
                    warn!("Rejecting source: {}", e);
                    return Err(e);
                }
            },
        };

        let (version, direction) = (migration.version, migration.direction);
        let existing = migrations.get(version, direction).map(|m| m.raw.clone());
        if !migrations.insert(migration) {
            return Err(SourceError::DuplicateVersion {
                version,
                direction,
                existing: existing.unwrap_or_default(),
                duplicate: name,
            });
        }
        debug!("Indexed {} {} as {}", direction, version, name);
    }

    Ok(migrations)
}

#[async_trait]
impl<B: Backend> SourceDriver for MigrationSource<B> {
    async fn first(&self) -> Result<Version> {
        self.ensure_open()?;
        self.migrations.first().ok_or(SourceError::Empty)
    }

    async fn prev(&self, version: Version) -> Result<Version> {
        self.ensure_open()?;
        self.migrations
            .prev(version)
            .ok_or(SourceError::NotFound { version, direction: None })
    }

    async fn next(&self, version: Version) -> Result<Version> {
        self.ensure_open()?;
        self.migrations
            .next(version)
            .ok_or(SourceError::NotFound { version, direction: None })
    }

    async fn read_up(&self, version: Version) -> Result<MigrationScript> {
        self.read(version, Direction::Up).await
    }

    async fn read_down(&self, version: Version) -> Result<MigrationScript> {
        self.read(version, Direction::Down).await
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(SourceError::Closed);
        }

        debug!("Closing source {}", self.backend.describe());
        self.backend
            .close()
            .await
            .map_err(|source| SourceError::Close {
                location: self.backend.describe(),
                source,
            })
    }

    fn migrations(&self) -> &Migrations {
        &self.migrations
    }
}
