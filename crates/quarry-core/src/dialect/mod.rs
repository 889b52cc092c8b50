//! SQL dialects.
//!
//! A [`Dialect`] turns the accumulated [`BuilderState`] of a
//! [`QueryBuilder`](crate::QueryBuilder) into a [`Query`]. The trait has two
//! layers:
//!
//! - primitives (quoting, type map, column definitions, limit clause) with
//!   ANSI defaults that concrete dialects override where they differ;
//! - render verbs, one per [`Action`], defaulting to [`Query::empty`]. A
//!   dialect that does not implement a verb renders nothing for it instead of
//!   failing.
//!
//! [`NullDialect`] implements nothing but its name and is useful for tests and
//! for executors that must never touch SQL.

mod common;
mod mysql;
mod null;
mod postgres;
mod sqlite;

pub use mysql::MysqlDialect;
pub use null::NullDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use std::fmt;

use crate::builder::BuilderState;
use crate::query::{Action, Query};
use crate::schema::{ColumnDefinition, ColumnType, DefaultValue};

/// Dialect-specific SQL rendering.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Returns the dialect name (`mysql`, `postgres`, `sqlite`, ...).
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character.
    fn quote_char(&self) -> char {
        '"'
    }

    /// Quotes an identifier, doubling embedded quote characters.
    fn quote_identifier(&self, name: &str) -> String {
        let q = self.quote_char();
        let escaped = name.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Positional placeholder for the 1-based `index`.
    fn positional_placeholder(&self, _index: usize) -> String {
        String::from("?")
    }

    /// Wraps an already-quoted literal so the engine compares it as a
    /// datetime.
    fn datetime_cast(&self, literal: &str) -> String {
        format!("CAST({literal} AS TIMESTAMP)")
    }

    /// Maps a column to its native type.
    fn type_name(&self, column: &ColumnDefinition) -> String {
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
            | ColumnType::LongText
            | ColumnType::Json => "TEXT".to_string(),
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
            ColumnType::Blob => "BLOB".to_string(),
        }
    }

    /// Whether `column` carries its PRIMARY KEY clause inline instead of in a
    /// table-level constraint.
    fn inline_primary_key(&self, _column: &ColumnDefinition) -> bool {
        false
    }

    /// Auto-increment modifier appended to a column definition.
    fn auto_increment_modifier(&self, _column: &ColumnDefinition) -> &'static str {
        ""
    }

    /// Renders a default value.
    fn render_default(&self, default: &DefaultValue) -> String {
        default.to_sql()
    }

    /// Generates SQL for a column definition.
    fn column_definition(&self, column: &ColumnDefinition) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&column.name),
            self.type_name(column)
        );

        if self.inline_primary_key(column) {
            sql.push_str(" PRIMARY KEY");
            sql.push_str(self.auto_increment_modifier(column));
            return sql;
        }

        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        if column.auto_increment {
            sql.push_str(self.auto_increment_modifier(column));
        }
        if column.unique && !column.primary {
            sql.push_str(" UNIQUE");
        }
        if let Some(ref default) = column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.render_default(default));
        }

        sql
    }

    /// Renders `LIMIT`/`OFFSET`, or an empty string when neither is set.
    fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) => format!("LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!("LIMIT {limit}"),
            (None, Some(offset)) => format!("OFFSET {offset}"),
            (None, None) => String::new(),
        }
    }

    /// Tail of an INSERT without values.
    fn empty_insert_values(&self) -> &'static str {
        "DEFAULT VALUES"
    }

    /// Whether plain indexes are declared inside `CREATE TABLE`.
    fn inline_indexes(&self) -> bool {
        false
    }

    /// Dispatches on the state's action.
    fn render(&self, state: &BuilderState) -> Query {
        match state.action {
            Some(Action::Select) => self.select(state),
            Some(Action::Count) => self.count(state),
            Some(Action::Insert) => self.insert(state),
            Some(Action::Update) => self.update(state),
            Some(Action::Delete) => self.delete(state),
            Some(Action::Columns) => self.columns(state),
            Some(Action::CreateTable) => self.create_table(state, false),
            Some(Action::CreateTableIfNotExists) => self.create_table(state, true),
            Some(Action::DropTable) => self.drop_table(state, false),
            Some(Action::DropTableIfExists) => self.drop_table(state, true),
            Some(Action::DropColumns) => self.drop_columns(state),
            Some(Action::AddColumn) => self.add_column(state),
            Some(Action::CreateIndex) => self.create_index(state),
            Some(Action::DropIndex) => self.drop_index(state),
            Some(Action::AddForeignKey) => self.add_foreign_key(state),
            Some(Action::DropForeignKey) => self.drop_foreign_key(state),
            Some(Action::TruncateTable) => self.truncate_table(state),
            Some(Action::Raw) => self.raw(state),
            None => Query::empty(),
        }
    }

    /// `SELECT`
    fn select(&self, _state: &BuilderState) -> Query {
        Query::empty()
    }

    /// `SELECT COUNT(*)`
    fn count(&self, _state: &BuilderState) -> Query {
        Query::empty()
    }

    /// `INSERT`
    fn insert(&self, _state: &BuilderState) -> Query {
        Query::empty()
    }

    /// `UPDATE`
    fn update(&self, _state: &BuilderState) -> Query {
        Query::empty()
    }

    /// `DELETE`
    fn delete(&self, _state: &BuilderState) -> Query {
        Query::empty()
    }

    /// Lists the columns of the target table as rows with a `column_name`
    /// field, in declaration order.
    fn columns(&self, _state: &BuilderState) -> Query {
        Query::empty()
    }

    /// `CREATE TABLE [IF NOT EXISTS]`
    fn create_table(&self, _state: &BuilderState, _if_not_exists: bool) -> Query {
        Query::empty()
    }

    /// `DROP TABLE [IF EXISTS]`
    fn drop_table(&self, _state: &BuilderState, _if_exists: bool) -> Query {
        Query::empty()
    }

    /// `ALTER TABLE ... DROP COLUMN`
    fn drop_columns(&self, _state: &BuilderState) -> Query {
        Query::empty()
    }

    /// `ALTER TABLE ... ADD COLUMN`
    fn add_column(&self, _state: &BuilderState) -> Query {
        Query::empty()
    }

    /// `CREATE [UNIQUE] INDEX`
    fn create_index(&self, _state: &BuilderState) -> Query {
        Query::empty()
    }

    /// `DROP INDEX`
    fn drop_index(&self, _state: &BuilderState) -> Query {
        Query::empty()
    }

    /// `ALTER TABLE ... ADD CONSTRAINT ... FOREIGN KEY`
    fn add_foreign_key(&self, _state: &BuilderState) -> Query {
        Query::empty()
    }

    /// Drops a named foreign key.
    fn drop_foreign_key(&self, _state: &BuilderState) -> Query {
        Query::empty()
    }

    /// Empties the table.
    fn truncate_table(&self, _state: &BuilderState) -> Query {
        Query::empty()
    }

    /// Caller-supplied SQL, passed through.
    fn raw(&self, _state: &BuilderState) -> Query {
        Query::empty()
    }
}
