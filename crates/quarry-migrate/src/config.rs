//! Migrator configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::connection::Driver;
use crate::error::{MigrateError, Result};

/// Settings for a [`Connection`](crate::Connection) and a
/// [`Runner`](crate::Runner).
///
/// Every field has a default, so a JSON file only needs the keys it wants to
/// change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigratorConfig {
    /// Database connection URL.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Name of the table that records applied units.
    #[serde(default = "default_bookkeeping_table")]
    pub bookkeeping_table: String,

    /// Whether seeds run after migrations.
    #[serde(default)]
    pub include_seeds: bool,

    /// Directory export scripts are written to.
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// Whether read statements are cached per connection.
    #[serde(default = "default_true")]
    pub query_cache: bool,

    /// Maximum pool size. SQLite always uses a single connection.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_url() -> String {
    "sqlite::memory:".to_string()
}

fn default_bookkeeping_table() -> String {
    "migrations".to_string()
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

const fn default_true() -> bool {
    true
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            bookkeeping_table: default_bookkeeping_table(),
            include_seeds: false,
            export_dir: default_export_dir(),
            query_cache: true,
            max_connections: default_max_connections(),
        }
    }
}

impl MigratorConfig {
    /// Creates a configuration for the given database URL.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parses a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the bookkeeping table name.
    #[must_use]
    pub fn bookkeeping_table(mut self, table: impl Into<String>) -> Self {
        self.bookkeeping_table = table.into();
        self
    }

    /// Enables or disables seeds.
    #[must_use]
    pub const fn include_seeds(mut self, include: bool) -> Self {
        self.include_seeds = include;
        self
    }

    /// Sets the export directory.
    #[must_use]
    pub fn export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    /// Enables or disables the read cache.
    #[must_use]
    pub const fn query_cache(mut self, enabled: bool) -> Self {
        self.query_cache = enabled;
        self
    }

    /// The driver selected by the URL scheme.
    pub fn driver(&self) -> Result<Driver> {
        Driver::from_url(&self.database_url).ok_or_else(|| {
            MigrateError::Config(format!(
                "unsupported database URL scheme: {}",
                self.database_url
            ))
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(MigrateError::Config("database_url is required".to_string()));
        }
        if self.bookkeeping_table.trim().is_empty() {
            return Err(MigrateError::Config(
                "bookkeeping_table cannot be empty".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(MigrateError::Config(
                "max_connections must be greater than 0".to_string(),
            ));
        }
        self.driver()?;
        Ok(())
    }
}
