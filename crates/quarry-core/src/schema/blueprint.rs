//! Declarative table description used to render DDL.

use super::column::ColumnDefinition;
use super::key::Key;

/// A table name plus ordered columns and keys.
///
/// # Example
///
/// ```rust
/// use quarry_core::schema::{Blueprint, Key, string, integer};
///
/// let blueprint = Blueprint::new("posts")
///     .column(string("title", 200).not_null())
///     .column(integer("user_id").unsigned())
///     .key(Key::foreign("user_id", "id", "users"));
///
/// assert_eq!(blueprint.columns().len(), 2);
/// assert!(!blueprint.has_primary_key());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    table: String,
    columns: Vec<ColumnDefinition>,
    keys: Vec<Key>,
}

impl Blueprint {
    /// Creates an empty blueprint for `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            keys: Vec::new(),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    /// Appends a key.
    #[must_use]
    pub fn key(mut self, key: Key) -> Self {
        self.keys.push(key);
        self
    }

    /// The table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Keys in declaration order.
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Whether any column or key declares a primary key.
    #[must_use]
    pub fn has_primary_key(&self) -> bool {
        self.columns.iter().any(|c| c.primary)
            || self.keys.iter().any(|k| matches!(k, Key::Primary { .. }))
    }

    /// Columns to render, with an implicit auto-increment primary key named
    /// `primary_key` prepended when none is declared.
    #[must_use]
    pub fn resolved_columns(&self, primary_key: &str) -> Vec<ColumnDefinition> {
        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        if !self.has_primary_key() {
            columns.push(ColumnDefinition::implicit_primary_key(primary_key));
        }
        columns.extend(self.columns.iter().cloned());
        columns
    }

    /// Names of all primary-key columns, from column flags and keys.
    #[must_use]
    pub fn primary_columns(&self, primary_key: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .resolved_columns(primary_key)
            .into_iter()
            .filter(|c| c.primary)
            .map(|c| c.name)
            .collect();
        for key in &self.keys {
            if let Key::Primary { columns, .. } = key {
                for column in columns {
                    if !names.contains(column) {
                        names.push(column.clone());
                    }
                }
            }
        }
        names
    }
}
