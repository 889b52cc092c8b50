//! Table keys: primary, unique, plain index, foreign.

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyAction {
    /// No action.
    NoAction,
    /// Restrict deletion/update.
    Restrict,
    /// Cascade the operation.
    Cascade,
    /// Set to NULL.
    SetNull,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of the action.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
        }
    }
}

/// The reference side of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignReference {
    /// Local column.
    pub from_column: String,
    /// Referenced column.
    pub to_column: String,
    /// Referenced table.
    pub on_table: String,
    /// Schema (database) of the referenced table.
    pub schema: Option<String>,
    /// Action on delete.
    pub on_delete: Option<ForeignKeyAction>,
    /// Action on update.
    pub on_update: Option<ForeignKeyAction>,
}

/// A key declared on a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// `PRIMARY KEY (cols)`
    Primary {
        /// Explicit name.
        name: Option<String>,
        /// Key columns.
        columns: Vec<String>,
    },
    /// `UNIQUE (cols)`
    Unique {
        /// Explicit name.
        name: Option<String>,
        /// Key columns.
        columns: Vec<String>,
    },
    /// Non-unique index.
    Index {
        /// Explicit name.
        name: Option<String>,
        /// Indexed columns.
        columns: Vec<String>,
    },
    /// `FOREIGN KEY (from) REFERENCES on_table (to)`
    Foreign {
        /// Explicit name.
        name: Option<String>,
        /// Reference details.
        reference: ForeignReference,
    },
}

fn owned(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| (*c).to_string()).collect()
}

impl Key {
    /// A primary key over `columns`.
    #[must_use]
    pub fn primary(columns: &[&str]) -> Self {
        Self::Primary {
            name: None,
            columns: owned(columns),
        }
    }

    /// A unique key over `columns`.
    #[must_use]
    pub fn unique(columns: &[&str]) -> Self {
        Self::Unique {
            name: None,
            columns: owned(columns),
        }
    }

    /// A plain index over `columns`.
    #[must_use]
    pub fn index(columns: &[&str]) -> Self {
        Self::Index {
            name: None,
            columns: owned(columns),
        }
    }

    /// A foreign key from `from_column` to `on_table.to_column`.
    #[must_use]
    pub fn foreign(from_column: &str, to_column: &str, on_table: &str) -> Self {
        Self::Foreign {
            name: None,
            reference: ForeignReference {
                from_column: from_column.to_string(),
                to_column: to_column.to_string(),
                on_table: on_table.to_string(),
                schema: None,
                on_delete: None,
                on_update: None,
            },
        }
    }

    /// Sets an explicit name.
    #[must_use]
    pub fn named(mut self, key_name: &str) -> Self {
        match &mut self {
            Self::Primary { name, .. }
            | Self::Unique { name, .. }
            | Self::Index { name, .. }
            | Self::Foreign { name, .. } => *name = Some(key_name.to_string()),
        }
        self
    }

    /// Sets the referenced schema on a foreign key. No-op on other keys.
    #[must_use]
    pub fn in_schema(mut self, schema: &str) -> Self {
        if let Self::Foreign { reference, .. } = &mut self {
            reference.schema = Some(schema.to_string());
        }
        self
    }

    /// Sets ON DELETE on a foreign key. No-op on other keys.
    #[must_use]
    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        if let Self::Foreign { reference, .. } = &mut self {
            reference.on_delete = Some(action);
        }
        self
    }

    /// Sets ON UPDATE on a foreign key. No-op on other keys.
    #[must_use]
    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        if let Self::Foreign { reference, .. } = &mut self {
            reference.on_update = Some(action);
        }
        self
    }

    /// Prefix of derived names.
    #[must_use]
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Primary { .. } => "pk",
            Self::Unique { .. } => "uk",
            Self::Index { .. } => "idx",
            Self::Foreign { .. } => "fk",
        }
    }

    /// Local columns covered by the key.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Self::Primary { columns, .. }
            | Self::Unique { columns, .. }
            | Self::Index { columns, .. } => columns.iter().map(String::as_str).collect(),
            Self::Foreign { reference, .. } => vec![reference.from_column.as_str()],
        }
    }

    /// The explicit name, or `<prefix>_<col1>_<col2>...`.
    ///
    /// Foreign keys derive `fk_<from>_<on_table>_<to>`: constraint names are
    /// schema-wide on some engines.
    #[must_use]
    pub fn name(&self) -> String {
        let explicit = match self {
            Self::Primary { name, .. }
            | Self::Unique { name, .. }
            | Self::Index { name, .. }
            | Self::Foreign { name, .. } => name.as_ref(),
        };
        if let Some(name) = explicit {
            return name.clone();
        }
        match self {
            Self::Foreign { reference, .. } => format!(
                "fk_{}_{}_{}",
                reference.from_column, reference.on_table, reference.to_column
            ),
            _ => {
                let mut parts = vec![self.prefix()];
                parts.extend(self.columns());
                parts.join("_")
            }
        }
    }
}
