//! Dialect-agnostic query builder.
//!
//! Verbs (`select`, `insert`, `create_table`, ...) set the [`Action`] and
//! capture what it needs; filters, joins, ordering and limits accumulate
//! independently. [`QueryBuilder::build`] hands the state to the dialect.
//!
//! ```rust
//! use std::sync::Arc;
//! use quarry_core::{QueryBuilder, QueryCondition, SqliteDialect};
//!
//! let query = QueryBuilder::new(Arc::new(SqliteDialect::new()))
//!     .table("users")
//!     .select(&["id", "email"])
//!     .where_condition(QueryCondition::equals("active", true))
//!     .limit(10)
//!     .build();
//!
//! assert_eq!(
//!     query.sql(),
//!     "SELECT \"id\", \"email\" FROM \"users\" WHERE \"active\" = :active LIMIT 10"
//! );
//! ```

use std::sync::Arc;

use crate::condition::{ConditionGroup, ConditionNode, QueryCondition};
use crate::dialect::Dialect;
use crate::query::{Action, Query};
use crate::schema::{Blueprint, Key};
use crate::value::SqlValue;

/// Primary key column assumed when none is configured.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl Direction {
    /// SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// The statement's target table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Table name.
    pub name: String,
    /// Primary key column, when the caller declared one.
    pub primary_key: Option<String>,
    /// Alias, honored for `Select`/`Count`.
    pub alias: Option<String>,
}

impl TableRef {
    /// A table with no declared primary key and no alias.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: None,
            alias: None,
        }
    }

    /// The declared primary key, or [`DEFAULT_PRIMARY_KEY`].
    #[must_use]
    pub fn primary_key(&self) -> &str {
        self.primary_key.as_deref().unwrap_or(DEFAULT_PRIMARY_KEY)
    }
}

/// A WHERE member with an optional explicit alias.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Alias prefix; falls back to the table alias for aliased actions.
    pub alias: Option<String>,
    /// The condition tree.
    pub node: ConditionNode,
}

/// A LEFT JOIN and the columns it contributes to the select list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// Joined table.
    pub table: String,
    /// Alias of the joined table.
    pub alias: String,
    /// Column on the base table.
    pub local_column: String,
    /// Column on the joined table.
    pub foreign_column: String,
    /// Selected as `<alias>__<column>`.
    pub columns: Vec<String>,
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Column or expression.
    pub column: String,
    /// Direction.
    pub direction: Direction,
}

/// Everything a dialect needs to render one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuilderState {
    /// Requested statement kind.
    pub action: Option<Action>,
    /// Target table.
    pub table: Option<TableRef>,
    /// Selected or dropped columns.
    pub columns: Vec<String>,
    /// Values for INSERT/UPDATE, in column order.
    pub values: Vec<(String, SqlValue)>,
    /// Table description for CREATE TABLE / ADD COLUMN.
    pub blueprint: Option<Blueprint>,
    /// Key for CREATE INDEX / ADD FOREIGN KEY.
    pub key: Option<Key>,
    /// Name for DROP INDEX / DROP FOREIGN KEY.
    pub key_name: Option<String>,
    /// WHERE members, joined with AND.
    pub filters: Vec<Filter>,
    /// LEFT JOINs.
    pub joins: Vec<Join>,
    /// ORDER BY terms.
    pub order_by: Vec<OrderBy>,
    /// Row limit.
    pub limit: Option<u64>,
    /// Row offset.
    pub offset: Option<u64>,
    /// SQL for [`Action::Raw`].
    pub raw_sql: Option<String>,
    /// Parameters for [`Action::Raw`].
    pub raw_params: Vec<(String, SqlValue)>,
}

impl BuilderState {
    /// Target table name, falling back to the blueprint's.
    #[must_use]
    pub fn table_name(&self) -> Option<&str> {
        self.table
            .as_ref()
            .map(|t| t.name.as_str())
            .or_else(|| self.blueprint.as_ref().map(Blueprint::table))
    }

    /// Primary key column of the target table.
    #[must_use]
    pub fn primary_key(&self) -> &str {
        self.table
            .as_ref()
            .map_or(DEFAULT_PRIMARY_KEY, TableRef::primary_key)
    }

    /// Primary key column only when it was set through
    /// [`QueryBuilder::table_with`].
    #[must_use]
    pub fn declared_primary_key(&self) -> Option<&str> {
        self.table.as_ref().and_then(|t| t.primary_key.as_deref())
    }

    /// The table alias, when the action honors it.
    #[must_use]
    pub fn effective_alias(&self) -> Option<&str> {
        match self.action {
            Some(action) if action.is_alias_aware() => {
                self.table.as_ref().and_then(|t| t.alias.as_deref())
            }
            _ => None,
        }
    }
}

/// Builds [`Query`] values for one dialect.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    dialect: Arc<dyn Dialect>,
    state: BuilderState,
    next_alias: usize,
}

impl QueryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            state: BuilderState::default(),
            next_alias: 0,
        }
    }

    /// The dialect this builder renders for.
    #[must_use]
    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    /// The accumulated state.
    #[must_use]
    pub fn state(&self) -> &BuilderState {
        &self.state
    }

    /// Sets the target table.
    #[must_use]
    pub fn table(mut self, name: &str) -> Self {
        self.state.table = Some(TableRef::new(name));
        self
    }

    /// Sets the target table with its primary key and alias.
    #[must_use]
    pub fn table_with(mut self, name: &str, primary_key: &str, alias: Option<&str>) -> Self {
        self.state.table = Some(TableRef {
            name: name.to_string(),
            primary_key: Some(primary_key.to_string()),
            alias: alias.map(String::from),
        });
        self
    }

    fn action(mut self, action: Action) -> Self {
        self.state.action = Some(action);
        self
    }

    /// `SELECT columns`; an empty slice selects `*`.
    #[must_use]
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.state.columns = columns.iter().map(|c| (*c).to_string()).collect();
        self.action(Action::Select)
    }

    /// `SELECT COUNT(*) AS aggregate`
    #[must_use]
    pub fn count(self) -> Self {
        self.action(Action::Count)
    }

    /// `INSERT` with the given column values.
    #[must_use]
    pub fn insert<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SqlValue>,
    {
        self.state.values = collect_values(values);
        self.action(Action::Insert)
    }

    /// `UPDATE` with the given column values.
    #[must_use]
    pub fn update<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SqlValue>,
    {
        self.state.values = collect_values(values);
        self.action(Action::Update)
    }

    /// Appends one value for a pending INSERT/UPDATE.
    #[must_use]
    pub fn set(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.state
            .values
            .push((column.to_string(), value.into()));
        self
    }

    /// `DELETE`
    #[must_use]
    pub fn delete(self) -> Self {
        self.action(Action::Delete)
    }

    /// Lists the target table's columns.
    #[must_use]
    pub fn list_columns(self) -> Self {
        self.action(Action::Columns)
    }

    /// `CREATE TABLE`
    #[must_use]
    pub fn create_table(mut self, blueprint: Blueprint) -> Self {
        self.state.blueprint = Some(blueprint);
        self.action(Action::CreateTable)
    }

    /// `CREATE TABLE IF NOT EXISTS`
    #[must_use]
    pub fn create_table_if_not_exists(mut self, blueprint: Blueprint) -> Self {
        self.state.blueprint = Some(blueprint);
        self.action(Action::CreateTableIfNotExists)
    }

    /// `DROP TABLE`
    #[must_use]
    pub fn drop_table(self) -> Self {
        self.action(Action::DropTable)
    }

    /// `DROP TABLE IF EXISTS`
    #[must_use]
    pub fn drop_table_if_exists(self) -> Self {
        self.action(Action::DropTableIfExists)
    }

    /// Drops the named columns.
    #[must_use]
    pub fn drop_columns(mut self, columns: &[&str]) -> Self {
        self.state.columns = columns.iter().map(|c| (*c).to_string()).collect();
        self.action(Action::DropColumns)
    }

    /// Adds every column of `blueprint` to its table.
    #[must_use]
    pub fn add_column(mut self, blueprint: Blueprint) -> Self {
        self.state.blueprint = Some(blueprint);
        self.action(Action::AddColumn)
    }

    /// Creates an index (or unique key, or foreign key) on the target table.
    #[must_use]
    pub fn create_index(mut self, key: Key) -> Self {
        self.state.key = Some(key);
        self.action(Action::CreateIndex)
    }

    /// Drops the named index.
    #[must_use]
    pub fn drop_index(mut self, name: &str) -> Self {
        self.state.key_name = Some(name.to_string());
        self.action(Action::DropIndex)
    }

    /// Adds a foreign key to the target table.
    #[must_use]
    pub fn add_foreign_key(mut self, key: Key) -> Self {
        self.state.key = Some(key);
        self.action(Action::AddForeignKey)
    }

    /// Drops the named foreign key.
    #[must_use]
    pub fn drop_foreign_key(mut self, name: &str) -> Self {
        self.state.key_name = Some(name.to_string());
        self.action(Action::DropForeignKey)
    }

    /// Empties the target table.
    #[must_use]
    pub fn truncate_table(self) -> Self {
        self.action(Action::TruncateTable)
    }

    /// Caller-supplied SQL with `:name` placeholders.
    #[must_use]
    pub fn raw(mut self, sql: &str, params: Vec<(String, SqlValue)>) -> Self {
        self.state.raw_sql = Some(sql.to_string());
        self.state.raw_params = params;
        self.action(Action::Raw)
    }

    /// Adds a condition (or a group) to the WHERE clause.
    #[must_use]
    pub fn where_condition(mut self, condition: QueryCondition) -> Self {
        self.state.filters.push(Filter {
            alias: None,
            node: condition.into(),
        });
        self
    }

    /// Adds a condition group to the WHERE clause.
    #[must_use]
    pub fn where_group(mut self, group: ConditionGroup) -> Self {
        self.state.filters.push(Filter {
            alias: None,
            node: group.into(),
        });
        self
    }

    /// Adds a condition or group whose columns are prefixed with `alias`.
    #[must_use]
    pub fn where_aliased(mut self, alias: &str, node: impl Into<ConditionNode>) -> Self {
        self.state.filters.push(Filter {
            alias: Some(alias.to_string()),
            node: node.into(),
        });
        self
    }

    /// `LEFT JOIN table ON base.local = j<n>.foreign`, selecting `columns`
    /// from the joined table. The alias is assigned `j0`, `j1`, ...
    #[must_use]
    pub fn left_join(
        mut self,
        table: &str,
        local_column: &str,
        foreign_column: &str,
        columns: &[&str],
    ) -> Self {
        let alias = format!("j{}", self.next_alias);
        self.next_alias += 1;
        self.left_join_as(table, &alias, local_column, foreign_column, columns)
    }

    /// [`left_join`](Self::left_join) with an explicit alias.
    #[must_use]
    pub fn left_join_as(
        mut self,
        table: &str,
        alias: &str,
        local_column: &str,
        foreign_column: &str,
        columns: &[&str],
    ) -> Self {
        self.state.joins.push(Join {
            table: table.to_string(),
            alias: alias.to_string(),
            local_column: local_column.to_string(),
            foreign_column: foreign_column.to_string(),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
        });
        self
    }

    /// Adds an ORDER BY term.
    #[must_use]
    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.state.order_by.push(OrderBy {
            column: column.to_string(),
            direction,
        });
        self
    }

    /// Sets LIMIT.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.state.limit = Some(limit);
        self
    }

    /// Sets OFFSET.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.state.offset = Some(offset);
        self
    }

    /// Renders the statement. Unset or unsupported state yields
    /// [`Query::empty`].
    #[must_use]
    pub fn build(&self) -> Query {
        self.dialect.render(&self.state)
    }
}

fn collect_values<I, K, V>(values: I) -> Vec<(String, SqlValue)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<SqlValue>,
{
    values
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{NullDialect, SqliteDialect};

    fn sqlite() -> QueryBuilder {
        QueryBuilder::new(Arc::new(SqliteDialect::new()))
    }

    #[test]
    fn test_alias_only_for_select_family() {
        let builder = sqlite().table_with("users", "id", Some("u"));
        assert_eq!(builder.clone().select(&[]).state().effective_alias(), Some("u"));
        assert_eq!(builder.clone().count().state().effective_alias(), Some("u"));
        assert_eq!(builder.delete().state().effective_alias(), None);
    }

    #[test]
    fn test_aliased_update_ignores_table_alias() {
        let query = sqlite()
            .table_with("users", "id", Some("u"))
            .update([("name", "x")])
            .where_condition(QueryCondition::equals("id", 1))
            .build();
        assert_eq!(
            query.sql(),
            "UPDATE \"users\" SET \"name\" = :name WHERE \"id\" = :id"
        );
    }

    #[test]
    fn test_join_aliases_are_sequential() {
        let builder = sqlite()
            .table("users")
            .left_join("posts", "id", "user_id", &["title"])
            .left_join("teams", "team_id", "id", &[]);
        let aliases: Vec<&str> = builder
            .state()
            .joins
            .iter()
            .map(|j| j.alias.as_str())
            .collect();
        assert_eq!(aliases, vec!["j0", "j1"]);
    }

    #[test]
    fn test_missing_state_renders_empty() {
        assert!(sqlite().build().is_empty());
        assert!(sqlite().select(&[]).build().is_empty());
        assert!(sqlite().table("t").update(Vec::<(String, i64)>::new()).build().is_empty());
        assert!(sqlite().table("t").drop_index("").drop_columns(&[]).build().is_empty());
    }

    #[test]
    fn test_null_dialect_builds_nothing() {
        let query = QueryBuilder::new(Arc::new(NullDialect::new()))
            .table("users")
            .select(&["id"])
            .build();
        assert!(query.is_empty());
    }

    #[test]
    fn test_set_appends_values() {
        let query = sqlite()
            .table("users")
            .insert([("name", "bob")])
            .set("age", 30)
            .build();
        assert_eq!(
            query.sql(),
            "INSERT INTO \"users\" (\"name\", \"age\") VALUES (:name, :age)"
        );
        assert_eq!(query.param("age"), Some(&SqlValue::Int(30)));
    }
}
