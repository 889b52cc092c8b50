//! Database driver detection from connection URLs.

use std::fmt;
use std::sync::Arc;

use quarry_core::{Dialect, MysqlDialect, PostgresDialect, SqliteDialect};
use url::Url;

use crate::error::{MigrateError, Result};

/// The database engines a [`Connection`](super::Connection) can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    /// MySQL or MariaDB.
    Mysql,
    /// PostgreSQL.
    Postgres,
    /// SQLite.
    Sqlite,
}

impl Driver {
    /// Detects the driver from a database URL's scheme.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split_once(':')?.0.to_ascii_lowercase();
        match scheme.as_str() {
            "mysql" | "mariadb" => Some(Self::Mysql),
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Short lowercase name, used in logs and export file names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// The SQL dialect matching this driver.
    #[must_use]
    pub fn dialect(self) -> Arc<dyn Dialect> {
        match self {
            Self::Mysql => Arc::new(MysqlDialect::new()),
            Self::Postgres => Arc::new(PostgresDialect::new()),
            Self::Sqlite => Arc::new(SqliteDialect::new()),
        }
    }

    /// Returns `url` with its database component replaced by `database`.
    ///
    /// For network databases this is the URL path. For SQLite it is the last
    /// segment of the file path, so `sqlite://data/app.db` switched to
    /// `other.db` becomes `sqlite://data/other.db`.
    pub fn url_with_database(self, url: &str, database: &str) -> Result<String> {
        if database.trim().is_empty() {
            return Err(MigrateError::Validation(
                "database name cannot be empty".to_string(),
            ));
        }
        match self {
            Self::Mysql | Self::Postgres => {
                let mut parsed = Url::parse(url)
                    .map_err(|e| MigrateError::Config(format!("invalid database URL: {e}")))?;
                parsed.set_path(&format!("/{database}"));
                Ok(parsed.to_string())
            }
            Self::Sqlite => Ok(sqlite_url_with_database(url, database)),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn sqlite_url_with_database(url: &str, database: &str) -> String {
    let (base, options) = match url.find('?') {
        Some(pos) => url.split_at(pos),
        None => (url, ""),
    };
    let rest = base.get("sqlite:".len()..).unwrap_or_default();
    let (prefix, path) = rest
        .strip_prefix("//")
        .map_or(("sqlite:", rest), |path| ("sqlite://", path));
    let path = match path.rfind('/') {
        Some(pos) => format!("{}/{database}", &path[..pos]),
        None => database.to_string(),
    };
    format!("{prefix}{path}{options}")
}
