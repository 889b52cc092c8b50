//! Rendered queries.
//!
//! A [`Query`] is the output of one builder invocation: SQL text with named
//! `:placeholders`, the values bound to them, and the [`Action`] that produced
//! it. Executors decide how the named placeholders reach the engine
//! (positional binding for a live connection, inline literals for a script).

use crate::value::SqlValue;

/// The statement kind a builder was asked to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// `SELECT ...`
    Select,
    /// `SELECT COUNT(*) ...`
    Count,
    /// `INSERT INTO ...`
    Insert,
    /// `UPDATE ...`
    Update,
    /// `DELETE FROM ...`
    Delete,
    /// Column listing of a table.
    Columns,
    /// `CREATE TABLE`
    CreateTable,
    /// `CREATE TABLE IF NOT EXISTS`
    CreateTableIfNotExists,
    /// `DROP TABLE`
    DropTable,
    /// `DROP TABLE IF EXISTS`
    DropTableIfExists,
    /// `ALTER TABLE ... DROP COLUMN`
    DropColumns,
    /// `ALTER TABLE ... ADD COLUMN`
    AddColumn,
    /// `CREATE [UNIQUE] INDEX`
    CreateIndex,
    /// `DROP INDEX`
    DropIndex,
    /// `ALTER TABLE ... ADD CONSTRAINT ... FOREIGN KEY`
    AddForeignKey,
    /// `ALTER TABLE ... DROP FOREIGN KEY / CONSTRAINT`
    DropForeignKey,
    /// `TRUNCATE TABLE` (or the dialect's equivalent).
    TruncateTable,
    /// Caller-supplied SQL.
    Raw,
}

impl Action {
    /// Returns a stable lowercase name, used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Count => "count",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Columns => "columns",
            Self::CreateTable => "create_table",
            Self::CreateTableIfNotExists => "create_table_if_not_exists",
            Self::DropTable => "drop_table",
            Self::DropTableIfExists => "drop_table_if_exists",
            Self::DropColumns => "drop_columns",
            Self::AddColumn => "add_column",
            Self::CreateIndex => "create_index",
            Self::DropIndex => "drop_index",
            Self::AddForeignKey => "add_foreign_key",
            Self::DropForeignKey => "drop_foreign_key",
            Self::TruncateTable => "truncate_table",
            Self::Raw => "raw",
        }
    }

    /// Whether the table alias is honored for this action.
    #[must_use]
    pub const fn is_alias_aware(self) -> bool {
        matches!(self, Self::Select | Self::Count)
    }

    /// Whether the action only reads.
    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Select | Self::Count | Self::Columns)
    }
}

/// A rendered SQL statement plus its named bind parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    sql: String,
    params: Vec<(String, SqlValue)>,
    action: Option<Action>,
    table: Option<String>,
}

impl Query {
    /// Creates an empty query for the given action and table.
    #[must_use]
    pub fn new(action: Action, table: Option<&str>) -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
            action: Some(action),
            table: table.map(String::from),
        }
    }

    /// The no-op query: no SQL, no action.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a query from caller-supplied SQL and parameters.
    #[must_use]
    pub fn raw(sql: impl Into<String>, params: Vec<(String, SqlValue)>) -> Self {
        Self {
            sql: sql.into(),
            params,
            action: Some(Action::Raw),
            table: None,
        }
    }

    /// Returns true when there is nothing to execute.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }

    /// The SQL text with `:name` placeholders.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound parameters in binding order.
    #[must_use]
    pub fn params(&self) -> &[(String, SqlValue)] {
        &self.params
    }

    /// Looks up a bound parameter by placeholder name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&SqlValue> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// The action that produced this query.
    #[must_use]
    pub fn action(&self) -> Option<Action> {
        self.action
    }

    /// The target table, if the action has one.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Appends SQL text.
    pub fn push_sql(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Replaces the SQL text.
    pub fn set_sql(&mut self, sql: impl Into<String>) {
        self.sql = sql.into();
    }

    /// Returns `base` if it is free in this query, otherwise `base_1`,
    /// `base_2`, ... Non-identifier characters are replaced by `_`.
    #[must_use]
    pub fn unique_name(&self, base: &str) -> String {
        let base = sanitize(base);
        if !self.has_param(&base) {
            return base;
        }
        let mut n = 1usize;
        loop {
            let candidate = format!("{base}_{n}");
            if !self.has_param(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Binds a value under a unique name derived from `base` and returns the
    /// placeholder token (`:name`) to splice into the SQL.
    pub fn bind(&mut self, base: &str, value: SqlValue) -> String {
        let name = self.unique_name(base);
        let token = format!(":{name}");
        self.params.push((name, value));
        token
    }

    /// Rewrites named placeholders into positional ones.
    ///
    /// `placeholder` receives the 1-based position of each occurrence. Unknown
    /// `:names` are left untouched.
    #[must_use]
    pub fn to_positional(&self, placeholder: impl Fn(usize) -> String) -> (String, Vec<SqlValue>) {
        let mut values = Vec::with_capacity(self.params.len());
        let sql = rewrite_placeholders(&self.sql, |name| {
            let value = self.param(name)?;
            values.push(value.clone());
            Some(placeholder(values.len()))
        });
        (sql, values)
    }

    /// Substitutes every bound placeholder with its escaped literal.
    #[must_use]
    pub fn to_inline_sql(&self) -> String {
        rewrite_placeholders(&self.sql, |name| self.param(name).map(SqlValue::to_sql_inline))
    }

    fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|(n, _)| n == name)
    }
}

fn sanitize(base: &str) -> String {
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        String::from("p")
    } else {
        cleaned
    }
}

/// Walks `sql`, calling `replace` for every `:name` outside of quoted
/// literals and identifiers. `::` (PostgreSQL casts) is left alone.
fn rewrite_placeholders(sql: &str, mut replace: impl FnMut(&str) -> Option<String>) -> String {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                out.push(c);
                i += 1;
            }
            ':' if chars.get(i + 1) == Some(&':') => {
                out.push_str("::");
                i += 2;
            }
            ':' if chars
                .get(i + 1)
                .is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') =>
            {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_')
                {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                match replace(&name) {
                    Some(replacement) => out.push_str(&replacement),
                    None => {
                        out.push(':');
                        out.push_str(&name);
                    }
                }
                i = end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}
