use std::fmt;
use std::str::FromStr;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Position of a migration in the history. Gaps between versions are legal.
pub type Version = u64;

/// Owned byte stream over one migration script.
pub type ScriptReader = Box<dyn AsyncRead + Send + Unpin>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(format!("Invalid migration direction: {}", s)),
        }
    }
}

/// A migration file as named by its backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub version: Version,
    /// Human label taken from the name, e.g. `add_users` in `3_add_users.up.sql`.
    pub identifier: String,
    pub direction: Direction,
    /// Backend-relative name, used to fetch the content later.
    pub raw: String,
}

/// The content of one migration, handed to the caller on read.
///
/// The reader is fetched fresh for every read and is owned by the caller, who
/// must consume or drop it.
pub struct MigrationScript {
    pub version: Version,
    pub identifier: String,
    pub direction: Direction,
    pub raw: String,
    pub reader: ScriptReader,
}

impl MigrationScript {
    pub(crate) fn new(migration: &Migration, reader: ScriptReader) -> Self {
        Self {
            version: migration.version,
            identifier: migration.identifier.clone(),
            direction: migration.direction,
            raw: migration.raw.clone(),
            reader,
        }
    }

    pub async fn read_to_end(mut self) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    pub async fn read_to_string(mut self) -> std::io::Result<String> {
        let mut buf = String::new();
        self.reader.read_to_string(&mut buf).await?;
        Ok(buf)
    }
}

impl fmt::Debug for MigrationScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationScript")
            .field("version", &self.version)
            .field("identifier", &self.identifier)
            .field("direction", &self.direction)
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}
