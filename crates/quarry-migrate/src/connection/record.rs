//! Result rows and statement outcomes.

use quarry_core::SqlValue;
use sqlx::any::AnyRow;
use sqlx::{Column, Row};

/// One result row, with column names in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Record {
    /// Creates a record from parallel column and value lists.
    #[must_use]
    pub fn new(columns: Vec<String>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Looks up a value by column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    /// Looks up an integer column.
    #[must_use]
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(SqlValue::as_i64)
    }

    /// Looks up a text column.
    #[must_use]
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(SqlValue::as_str)
    }

    /// Column names in select order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in select order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn from_any_row(row: &AnyRow) -> Self {
        let columns = row.columns().iter().map(|c| c.name().to_string()).collect();
        let values = (0..row.len()).map(|i| decode(row, i)).collect();
        Self { columns, values }
    }
}

// The Any driver only exposes a handful of portable types; try them from the
// most to the least specific. NULL decodes successfully as the first `None`.
fn decode(row: &AnyRow, index: usize) -> SqlValue {
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return value.map_or(SqlValue::Null, SqlValue::Int);
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return value.map_or(SqlValue::Null, SqlValue::Float);
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return value.map_or(SqlValue::Null, SqlValue::Text);
    }
    if let Ok(value) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return value.map_or(SqlValue::Null, SqlValue::Blob);
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(index) {
        return value.map_or(SqlValue::Null, SqlValue::Bool);
    }
    SqlValue::Null
}

/// What a statement produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Rows returned by a read (or a `RETURNING` clause).
    pub records: Vec<Record>,
    /// Rows changed by a write.
    pub affected_rows: u64,
    /// Identifier generated by an insert, when the driver reports one.
    pub insert_id: Option<i64>,
}

impl QueryResult {
    /// A result carrying rows only.
    #[must_use]
    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// The first row, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    /// The first column of the first row as an integer. Handy for `COUNT(*)`
    /// and `MAX(..)` queries.
    #[must_use]
    pub fn scalar_i64(&self) -> Option<i64> {
        self.first()
            .and_then(|r| r.values().first())
            .and_then(SqlValue::as_i64)
    }
}
