//! Migration bookkeeping.
//!
//! This module manages the table (`migrations` by default) that records
//! which units have been applied, in which batch, and in which state.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use quarry_core::schema::{datetime, integer, small_integer, string, Blueprint};
use quarry_core::{Direction, QueryCondition, SqlValue};

use crate::connection::Record;
use crate::error::{MigrateError, Result};
use crate::executor::Executor;
use crate::unit::stable_key;

/// Lifecycle of a unit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Known but not applied (or rolled back).
    Pending = 1,
    /// Being applied right now, or interrupted while being applied.
    InProgress = 2,
    /// Applied.
    Completed = 3,
}

impl Status {
    /// Decodes the stored status code.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Pending),
            2 => Some(Self::InProgress),
            3 => Some(Self::Completed),
            _ => None,
        }
    }

    /// The stored status code.
    #[must_use]
    pub const fn code(self) -> i64 {
        self as i64
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// A row of the bookkeeping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    /// Row id; later units have larger ids.
    pub id: i64,
    /// Unit identifier.
    pub name: String,
    /// Where the unit came from, if the caller said.
    pub path: Option<String>,
    /// Current state.
    pub status: Status,
    /// Batch the unit was last applied in.
    pub batch_id: i64,
    /// When the record was created.
    pub date_created: Option<DateTime<Utc>>,
    /// When the record last changed.
    pub date_updated: Option<DateTime<Utc>>,
}

impl MigrationRecord {
    /// The stable key of this record's identifier.
    #[must_use]
    pub fn key(&self) -> String {
        stable_key(&self.name)
    }

    fn from_record(record: &Record) -> Result<Self> {
        let malformed = || MigrateError::database("malformed bookkeeping row");
        let status = record
            .get_i64("status")
            .and_then(Status::from_code)
            .ok_or_else(malformed)?;
        Ok(Self {
            id: record.get_i64("id").ok_or_else(malformed)?,
            name: record.get_str("name").ok_or_else(malformed)?.to_string(),
            path: record.get_str("path").map(str::to_string),
            status,
            batch_id: record.get_i64("batch_id").unwrap_or_default(),
            date_created: record.get_str("date_created").and_then(parse_timestamp),
            date_updated: record.get_str("date_updated").and_then(parse_timestamp),
        })
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
                .map(|dt| dt.and_utc())
                .ok()
        })
}

/// Reads and writes the bookkeeping table through any [`Executor`].
#[derive(Debug, Clone)]
pub struct MigrationHistory {
    table: String,
}

impl MigrationHistory {
    /// Creates a history manager for `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    /// The bookkeeping table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The bookkeeping table's schema. The `id` primary key is implicit.
    #[must_use]
    pub fn blueprint(&self) -> Blueprint {
        Blueprint::new(&self.table)
            .column(string("name", 255).not_null())
            .column(string("path", 255))
            .column(small_integer("status").not_null())
            .column(integer("batch_id").not_null())
            .column(datetime("date_created").not_null())
            .column(datetime("date_updated"))
    }

    /// Creates the table if it does not exist yet.
    pub async fn ensure_table(&self, db: &mut dyn Executor) -> Result<()> {
        let query = db
            .builder()
            .create_table_if_not_exists(self.blueprint())
            .build();
        db.execute(query).await?;
        Ok(())
    }

    /// Fails with a database error when the table is missing.
    pub async fn check_exists(&self, db: &mut dyn Executor) -> Result<()> {
        let query = db.builder().table(&self.table).count().build();
        db.execute(query).await?;
        Ok(())
    }

    /// Every record, oldest first.
    pub async fn records(&self, db: &mut dyn Executor) -> Result<Vec<MigrationRecord>> {
        self.select(db, None, Direction::Asc).await
    }

    /// Records of one batch, newest first.
    pub async fn batch_records(
        &self,
        db: &mut dyn Executor,
        batch_id: i64,
    ) -> Result<Vec<MigrationRecord>> {
        self.select(
            db,
            Some(QueryCondition::equals("batch_id", batch_id)),
            Direction::Desc,
        )
        .await
    }

    /// The record of one unit.
    pub async fn find(
        &self,
        db: &mut dyn Executor,
        name: &str,
    ) -> Result<Option<MigrationRecord>> {
        let records = self
            .select(db, Some(QueryCondition::equals("name", name)), Direction::Asc)
            .await?;
        Ok(records.into_iter().next())
    }

    /// The highest batch that still has completed units, or 0.
    pub async fn last_batch(&self, db: &mut dyn Executor) -> Result<i64> {
        let query = db
            .builder()
            .table(&self.table)
            .select(&["MAX(batch_id) AS last_batch"])
            .where_condition(QueryCondition::equals(
                "status",
                Status::Completed.code(),
            ))
            .build();
        let result = db.execute(query).await?;
        Ok(result.scalar_i64().unwrap_or(0))
    }

    /// Marks a unit as being applied in `batch_id`, creating its record if
    /// needed.
    pub async fn mark_in_progress(
        &self,
        db: &mut dyn Executor,
        name: &str,
        path: Option<&str>,
        batch_id: i64,
    ) -> Result<()> {
        let dialect = db.dialect();
        let table = dialect.quote_identifier(&self.table);
        let q = |c: &str| dialect.quote_identifier(c);
        let status = SqlValue::Int(Status::InProgress.code());

        let query = if self.find(db, name).await?.is_some() {
            db.builder().raw(
                &format!(
                    "UPDATE {table} SET {} = :status, {} = :batch_id, {} = CURRENT_TIMESTAMP \
                     WHERE {} = :name",
                    q("status"),
                    q("batch_id"),
                    q("date_updated"),
                    q("name"),
                ),
                vec![
                    ("status".to_string(), status),
                    ("batch_id".to_string(), SqlValue::Int(batch_id)),
                    ("name".to_string(), SqlValue::Text(name.to_string())),
                ],
            )
        } else {
            db.builder().raw(
                &format!(
                    "INSERT INTO {table} ({}, {}, {}, {}, {}) \
                     VALUES (:name, :path, :status, :batch_id, CURRENT_TIMESTAMP)",
                    q("name"),
                    q("path"),
                    q("status"),
                    q("batch_id"),
                    q("date_created"),
                ),
                vec![
                    ("name".to_string(), SqlValue::Text(name.to_string())),
                    (
                        "path".to_string(),
                        path.map_or(SqlValue::Null, |p| SqlValue::Text(p.to_string())),
                    ),
                    ("status".to_string(), status),
                    ("batch_id".to_string(), SqlValue::Int(batch_id)),
                ],
            )
        };
        db.execute(query.build()).await?;
        Ok(())
    }

    /// Moves a unit's record to `status`.
    pub async fn set_status(
        &self,
        db: &mut dyn Executor,
        name: &str,
        status: Status,
    ) -> Result<()> {
        let dialect = db.dialect();
        let sql = format!(
            "UPDATE {} SET {} = :status, {} = CURRENT_TIMESTAMP WHERE {} = :name",
            dialect.quote_identifier(&self.table),
            dialect.quote_identifier("status"),
            dialect.quote_identifier("date_updated"),
            dialect.quote_identifier("name"),
        );
        let query = db
            .builder()
            .raw(
                &sql,
                vec![
                    ("status".to_string(), SqlValue::Int(status.code())),
                    ("name".to_string(), SqlValue::Text(name.to_string())),
                ],
            )
            .build();
        db.execute(query).await?;
        Ok(())
    }

    async fn select(
        &self,
        db: &mut dyn Executor,
        filter: Option<QueryCondition>,
        direction: Direction,
    ) -> Result<Vec<MigrationRecord>> {
        // Timestamps are read back as text; not every driver can decode
        // native date types generically.
        let text = if db.dialect().name() == "mysql" {
            "CHAR"
        } else {
            "TEXT"
        };
        let created = format!("CAST(date_created AS {text}) AS date_created");
        let updated = format!("CAST(date_updated AS {text}) AS date_updated");

        let mut builder = db.builder().table(&self.table).select(&[
            "id",
            "name",
            "path",
            "status",
            "batch_id",
            &created,
            &updated,
        ]);
        if let Some(filter) = filter {
            builder = builder.where_condition(filter);
        }
        let query = builder.order_by("id", direction).build();
        let result = db.execute(query).await?;
        result.records.iter().map(MigrationRecord::from_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quarry_core::{Dialect, SqliteDialect};

    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Status::Pending.code(), 1);
        assert_eq!(Status::from_code(3), Some(Status::Completed));
        assert_eq!(Status::from_code(9), None);
    }

    #[test]
    fn test_blueprint_renders_bookkeeping_table() {
        let dialect: Arc<dyn Dialect> = Arc::new(SqliteDialect::new());
        let query = quarry_core::QueryBuilder::new(dialect)
            .create_table_if_not_exists(MigrationHistory::new("migrations").blueprint())
            .build();
        assert_eq!(
            query.sql(),
            "CREATE TABLE IF NOT EXISTS \"migrations\" (\n    \
             \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n    \
             \"name\" VARCHAR(255) NOT NULL,\n    \
             \"path\" VARCHAR(255),\n    \
             \"status\" INTEGER NOT NULL,\n    \
             \"batch_id\" INTEGER NOT NULL,\n    \
             \"date_created\" TEXT NOT NULL,\n    \
             \"date_updated\" TEXT\n)"
        );
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-03-01 10:00:00").is_some());
        assert!(parse_timestamp("2024-03-01 10:00:00.123456").is_some());
        assert!(parse_timestamp("2024-03-01T10:00:00+00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_record_from_row() {
        let row = Record::new(
            vec![
                "id".into(),
                "name".into(),
                "path".into(),
                "status".into(),
                "batch_id".into(),
                "date_created".into(),
                "date_updated".into(),
            ],
            vec![
                SqlValue::Int(4),
                SqlValue::Text("m_2024_01_01_A_1".into()),
                SqlValue::Null,
                SqlValue::Int(3),
                SqlValue::Int(2),
                SqlValue::Text("2024-01-01 00:00:00".into()),
                SqlValue::Null,
            ],
        );
        let record = MigrationRecord::from_record(&row).unwrap();
        assert_eq!(record.id, 4);
        assert_eq!(record.status, Status::Completed);
        assert_eq!(record.batch_id, 2);
        assert_eq!(record.path, None);
        assert!(record.date_created.is_some());
        assert_eq!(record.key(), stable_key("m_2024_01_01_A_1"));
    }
}
