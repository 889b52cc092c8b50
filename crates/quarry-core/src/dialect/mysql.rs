//! MySQL / MariaDB dialect.

use super::common::{self, LimitStrategy};
use super::Dialect;
use crate::builder::BuilderState;
use crate::query::{Action, Query};
use crate::schema::{ColumnDefinition, ColumnType};
use crate::value::SqlValue;

/// Largest row count MySQL accepts; stands in for "no limit" when only an
/// offset is given.
const MAX_ROWS: u64 = u64::MAX;

/// MySQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_char(&self) -> char {
        '`'
    }

    fn datetime_cast(&self, literal: &str) -> String {
        format!("CAST({literal} AS DATETIME)")
    }

    fn type_name(&self, column: &ColumnDefinition) -> String {
        let base = match column.column_type {
            ColumnType::TinyInteger => "TINYINT".to_string(),
            ColumnType::SmallInteger => "SMALLINT".to_string(),
            ColumnType::MediumInteger => "MEDIUMINT".to_string(),
            ColumnType::Integer => "INT".to_string(),
            ColumnType::BigInteger => "BIGINT".to_string(),
            ColumnType::Boolean => "TINYINT(1)".to_string(),
            ColumnType::String => format!("VARCHAR({})", column.length.unwrap_or(255)),
            ColumnType::Char => format!("CHAR({})", column.length.unwrap_or(1)),
            ColumnType::TinyText => "TINYTEXT".to_string(),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::MediumText => "MEDIUMTEXT".to_string(),
            ColumnType::LongText => "LONGTEXT".to_string(),
            ColumnType::Numeric => format!(
                "DECIMAL({}, {})",
                column.precision.unwrap_or(10),
                column.scale.unwrap_or(0)
            ),
            ColumnType::Float => "FLOAT".to_string(),
            ColumnType::Double => "DOUBLE".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::DateTime => "DATETIME".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Json => "JSON".to_string(),
            ColumnType::Blob => "BLOB".to_string(),
        };
        if column.unsigned && column.column_type.is_integer() {
            format!("{base} UNSIGNED")
        } else {
            base
        }
    }

    fn auto_increment_modifier(&self, _column: &ColumnDefinition) -> &'static str {
        " AUTO_INCREMENT"
    }

    fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) => format!("LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!("LIMIT {limit}"),
            (None, Some(offset)) => format!("LIMIT {MAX_ROWS} OFFSET {offset}"),
            (None, None) => String::new(),
        }
    }

    fn empty_insert_values(&self) -> &'static str {
        "() VALUES ()"
    }

    fn inline_indexes(&self) -> bool {
        true
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
        common::update(self, state, LimitStrategy::Direct)
    }

    fn delete(&self, state: &BuilderState) -> Query {
        common::delete(self, state, LimitStrategy::Direct)
    }

    fn columns(&self, state: &BuilderState) -> Query {
        let Some(table) = state.table_name() else {
            return Query::empty();
        };
        let mut query = Query::new(Action::Columns, Some(table));
        let p = query.bind("table_name", SqlValue::Text(table.to_string()));
        query.set_sql(format!(
            "SELECT COLUMN_NAME AS column_name FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = {p} ORDER BY ORDINAL_POSITION"
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
        common::drop_columns(self, state, false)
    }

    fn add_column(&self, state: &BuilderState) -> Query {
        common::add_column(self, state, false)
    }

    fn create_index(&self, state: &BuilderState) -> Query {
        common::create_index(self, state)
    }

    fn drop_index(&self, state: &BuilderState) -> Query {
        common::drop_index(self, state, true)
    }

    fn add_foreign_key(&self, state: &BuilderState) -> Query {
        common::add_foreign_key(self, state)
    }

    fn drop_foreign_key(&self, state: &BuilderState) -> Query {
        common::drop_foreign_key(self, state, "FOREIGN KEY")
    }

    fn truncate_table(&self, state: &BuilderState) -> Query {
        common::truncate_table(self, state, |table| format!("TRUNCATE TABLE {table}"))
    }

    fn raw(&self, state: &BuilderState) -> Query {
        common::raw(state)
    }
}
