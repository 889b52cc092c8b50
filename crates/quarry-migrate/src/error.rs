//! Error types for the migration system.

/// Errors that can occur while executing queries or running migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Any failure reported by the database driver, including statement
    /// preparation and connection errors.
    #[error("Database error: {message}")]
    Database {
        /// The driver's error message.
        message: String,
    },

    /// Misuse of the transaction API (nested `begin`, `commit` without
    /// `begin`, ...).
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// An identifier that the registry cannot resolve to a unit.
    #[error("Unknown migration unit: {0}")]
    UnknownUnit(String),

    /// A unit has no reverse action.
    #[error("Migration '{0}' is not reversible")]
    NotReversible(String),

    /// A unit failed while the runner was applying a batch. The batch has
    /// already been rolled back when this is returned.
    #[error("Migration '{identifier}' failed: {source}")]
    UnitFailed {
        /// Identifier of the failing unit.
        identifier: String,
        /// What went wrong inside the unit.
        source: Box<MigrateError>,
    },

    /// Invalid input handed to the migration system.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (reading config, writing export scripts).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Creates a database error from any message.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Returns true if this is a driver-level failure.
    #[must_use]
    pub const fn is_database(&self) -> bool {
        matches!(self, Self::Database { .. })
    }
}

impl From<sqlx::Error> for MigrateError {
    fn from(err: sqlx::Error) -> Self {
        Self::database(err.to_string())
    }
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
