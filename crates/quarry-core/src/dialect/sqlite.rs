//! SQLite dialect.

use super::common::{self, LimitStrategy};
use super::Dialect;
use crate::builder::BuilderState;
use crate::query::{Action, Query};
use crate::schema::{ColumnDefinition, ColumnType};
use crate::value::quote_literal;

/// SQLite dialect.
///
/// SQLite cannot add or drop foreign keys on an existing table; those verbs
/// render an empty [`Query`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn datetime_cast(&self, literal: &str) -> String {
        format!("datetime({literal})")
    }

    fn type_name(&self, column: &ColumnDefinition) -> String {
        // Type affinity: every integer is INTEGER, which is also what
        // `INTEGER PRIMARY KEY` requires to alias the rowid.
        match column.column_type {
            ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::MediumInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::Boolean => "INTEGER".to_string(),
            ColumnType::String => format!("VARCHAR({})", column.length.unwrap_or(255)),
            ColumnType::Char => format!("CHAR({})", column.length.unwrap_or(1)),
            ColumnType::TinyText
            | ColumnType::Text
            | ColumnType::MediumText
            | ColumnType::LongText
            | ColumnType::Json => "TEXT".to_string(),
            ColumnType::Numeric => "NUMERIC".to_string(),
            ColumnType::Float | ColumnType::Double => "REAL".to_string(),
            ColumnType::Date
            | ColumnType::Time
            | ColumnType::DateTime
            | ColumnType::Timestamp => "TEXT".to_string(),
            ColumnType::Blob => "BLOB".to_string(),
        }
    }

    fn inline_primary_key(&self, column: &ColumnDefinition) -> bool {
        column.is_identity() && column.column_type.is_integer()
    }

    fn auto_increment_modifier(&self, column: &ColumnDefinition) -> &'static str {
        if self.inline_primary_key(column) {
            " AUTOINCREMENT"
        } else {
            ""
        }
    }

    fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) => format!("LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!("LIMIT {limit}"),
            (None, Some(offset)) => format!("LIMIT -1 OFFSET {offset}"),
            (None, None) => String::new(),
        }
    }

    fn select(&self, state: &BuilderState) -> Query {
        common::select(self, state)
    }

    fn count(&self, state: &BuilderState) -> Query {
        common::count(self, state)
    }

    fn insert(&self, state: &BuilderState) -> Query {
        common::insert(self, state)
    }

    fn update(&self, state: &BuilderState) -> Query {
        common::update(self, state, LimitStrategy::PrimaryKeySubquery)
    }

    fn delete(&self, state: &BuilderState) -> Query {
        common::delete(self, state, LimitStrategy::PrimaryKeySubquery)
    }

    fn columns(&self, state: &BuilderState) -> Query {
        let Some(table) = state.table_name() else {
            return Query::empty();
        };
        // Table-valued pragma functions take no bind parameters on older
        // engines, so the name is inlined as an escaped literal.
        let mut query = Query::new(Action::Columns, Some(table));
        query.set_sql(format!(
            "SELECT name AS column_name FROM pragma_table_info({}) ORDER BY cid",
            quote_literal(table)
        ));
        query
    }

    fn create_table(&self, state: &BuilderState, if_not_exists: bool) -> Query {
        common::create_table(self, state, if_not_exists)
    }

    fn drop_table(&self, state: &BuilderState, if_exists: bool) -> Query {
        common::drop_table(self, state, if_exists)
    }

    fn drop_columns(&self, state: &BuilderState) -> Query {
        common::drop_columns(self, state, true)
    }

    fn add_column(&self, state: &BuilderState) -> Query {
        common::add_column(self, state, true)
    }

    fn create_index(&self, state: &BuilderState) -> Query {
        common::create_index(self, state)
    }

    fn drop_index(&self, state: &BuilderState) -> Query {
        common::drop_index(self, state, false)
    }

    fn truncate_table(&self, state: &BuilderState) -> Query {
        common::truncate_table(self, state, |table| format!("DELETE FROM {table}"))
    }

    fn raw(&self, state: &BuilderState) -> Query {
        common::raw(state)
    }
}
