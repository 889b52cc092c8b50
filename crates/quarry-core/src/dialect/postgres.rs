//! PostgreSQL dialect.

use super::common::{self, LimitStrategy};
use super::Dialect;
use crate::builder::BuilderState;
use crate::query::{Action, Query};
use crate::schema::{ColumnDefinition, ColumnType};
use crate::value::SqlValue;

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn positional_placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn type_name(&self, column: &ColumnDefinition) -> String {
        if column.auto_increment && column.column_type.is_integer() {
            return match column.column_type {
                ColumnType::TinyInteger | ColumnType::SmallInteger => "SMALLSERIAL",
                ColumnType::BigInteger => "BIGSERIAL",
                _ => "SERIAL",
            }
            .to_string();
        }
        match column.column_type {
            ColumnType::TinyInteger | ColumnType::SmallInteger => "SMALLINT".to_string(),
            ColumnType::MediumInteger | ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::BigInteger => "BIGINT".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::String => format!("VARCHAR({})", column.length.unwrap_or(255)),
            ColumnType::Char => format!("CHAR({})", column.length.unwrap_or(1)),
            ColumnType::TinyText
            | ColumnType::Text
            | ColumnType::MediumText
            | ColumnType::LongText => "TEXT".to_string(),
            ColumnType::Numeric => format!(
                "NUMERIC({}, {})",
                column.precision.unwrap_or(10),
                column.scale.unwrap_or(0)
            ),
            ColumnType::Float => "REAL".to_string(),
            ColumnType::Double => "DOUBLE PRECISION".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::DateTime | ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Json => "JSONB".to_string(),
            ColumnType::Blob => "BYTEA".to_string(),
        }
    }

    // SERIAL already implies NOT NULL and a sequence default.
    fn inline_primary_key(&self, column: &ColumnDefinition) -> bool {
        column.is_identity() && column.column_type.is_integer()
    }

    fn select(&self, state: &BuilderState) -> Query {
        common::select(self, state)
    }

    fn count(&self, state: &BuilderState) -> Query {
        common::count(self, state)
    }

    fn insert(&self, state: &BuilderState) -> Query {
        let mut query = common::insert(self, state);
        // Only a declared key is known to exist on the table.
        if let (false, Some(pk)) = (query.is_empty(), state.declared_primary_key()) {
            query.push_sql(&format!(" RETURNING {}", self.quote_identifier(pk)));
        }
        query
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
        let mut query = Query::new(Action::Columns, Some(table));
        let p = query.bind("table_name", SqlValue::Text(table.to_string()));
        // `sql_identifier` is a domain type; cast so every client decodes text.
        query.set_sql(format!(
            "SELECT CAST(column_name AS TEXT) AS column_name FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name = {p} ORDER BY ordinal_position"
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
        common::drop_index(self, state, false)
    }

    fn add_foreign_key(&self, state: &BuilderState) -> Query {
        common::add_foreign_key(self, state)
    }

    fn drop_foreign_key(&self, state: &BuilderState) -> Query {
        common::drop_foreign_key(self, state, "CONSTRAINT")
    }

    fn truncate_table(&self, state: &BuilderState) -> Query {
        common::truncate_table(self, state, |table| {
            format!("TRUNCATE TABLE {table} RESTART IDENTITY")
        })
    }

    fn raw(&self, state: &BuilderState) -> Query {
        common::raw(state)
    }
}
