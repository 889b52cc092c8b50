//! Renderers shared by the concrete dialects.
//!
//! Each function takes the dialect as `&dyn Dialect` so primitive overrides
//! (quoting, type map, limit clause) flow through.

use crate::builder::{BuilderState, TableRef};
use crate::condition::ConditionResolver;
use crate::query::{Action, Query};
use crate::schema::{ForeignReference, Key};

use super::Dialect;

/// How UPDATE/DELETE honor a row limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LimitStrategy {
    /// `... ORDER BY ... LIMIT n` on the statement itself.
    Direct,
    /// `WHERE pk IN (SELECT pk FROM t ... LIMIT n)`.
    PrimaryKeySubquery,
}

/// Quotes a column, prefixing `owner.` when given. `*` and expressions
/// (anything with parentheses, spaces or dots) pass through.
pub(crate) fn column_ref(dialect: &dyn Dialect, owner: Option<&str>, column: &str) -> String {
    if column == "*" {
        return match owner {
            Some(owner) => format!("{owner}.*"),
            None => String::from("*"),
        };
    }
    if column.contains(|c: char| matches!(c, '(' | ' ' | '.')) {
        return column.to_string();
    }
    let quoted = dialect.quote_identifier(column);
    match owner {
        Some(owner) => format!("{owner}.{quoted}"),
        None => quoted,
    }
}

pub(crate) fn quote_list<S: AsRef<str>>(dialect: &dyn Dialect, names: &[S]) -> String {
    names
        .iter()
        .map(|n| dialect.quote_identifier(n.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// ` WHERE a AND b`, or empty.
pub(crate) fn where_clause(dialect: &dyn Dialect, state: &BuilderState, query: &mut Query) -> String {
    let resolver = ConditionResolver::new(dialect);
    let default_alias = state.effective_alias();
    let parts: Vec<String> = state
        .filters
        .iter()
        .map(|filter| {
            resolver.resolve_node(&filter.node, filter.alias.as_deref().or(default_alias), query)
        })
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// ` ORDER BY a ASC, b DESC`, or empty.
pub(crate) fn order_clause(dialect: &dyn Dialect, state: &BuilderState, owner: Option<&str>) -> String {
    if state.order_by.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = state
        .order_by
        .iter()
        .map(|o| format!("{} {}", column_ref(dialect, owner, &o.column), o.direction.as_sql()))
        .collect();
    format!(" ORDER BY {}", parts.join(", "))
}

fn limit_suffix(dialect: &dyn Dialect, state: &BuilderState) -> String {
    let clause = dialect.limit_clause(state.limit, state.offset);
    if clause.is_empty() {
        clause
    } else {
        format!(" {clause}")
    }
}

/// `FROM t [AS a] [LEFT JOIN ...]`, plus the owner used for unqualified
/// columns.
fn from_and_joins(dialect: &dyn Dialect, state: &BuilderState, table: &TableRef) -> (String, Option<String>) {
    let alias = state.effective_alias();
    let mut sql = format!("FROM {}", dialect.quote_identifier(&table.name));
    if let Some(alias) = alias {
        sql.push_str(" AS ");
        sql.push_str(alias);
    }

    let base = alias.map_or_else(|| dialect.quote_identifier(&table.name), String::from);
    for join in &state.joins {
        sql.push_str(&format!(
            " LEFT JOIN {} AS {} ON {} = {}",
            dialect.quote_identifier(&join.table),
            join.alias,
            column_ref(dialect, Some(&base), &join.local_column),
            column_ref(dialect, Some(&join.alias), &join.foreign_column),
        ));
    }

    let owner = if state.joins.is_empty() {
        alias.map(String::from)
    } else {
        Some(base)
    };
    (sql, owner)
}

pub(crate) fn select(dialect: &dyn Dialect, state: &BuilderState) -> Query {
    let Some(table) = state.table.as_ref() else {
        return Query::empty();
    };
    let mut query = Query::new(Action::Select, Some(&table.name));
    let (from, owner) = from_and_joins(dialect, state, table);

    let mut columns: Vec<String> = if state.columns.is_empty() {
        vec![column_ref(dialect, owner.as_deref(), "*")]
    } else {
        state
            .columns
            .iter()
            .map(|c| column_ref(dialect, owner.as_deref(), c))
            .collect()
    };
    for join in &state.joins {
        for column in &join.columns {
            columns.push(format!(
                "{} AS {}",
                column_ref(dialect, Some(&join.alias), column),
                dialect.quote_identifier(&format!("{}__{}", join.alias, column))
            ));
        }
    }

    let where_sql = where_clause(dialect, state, &mut query);
    let order_sql = order_clause(dialect, state, owner.as_deref());
    let limit_sql = limit_suffix(dialect, state);
    query.set_sql(format!(
        "SELECT {} {from}{where_sql}{order_sql}{limit_sql}",
        columns.join(", ")
    ));
    query
}

pub(crate) fn count(dialect: &dyn Dialect, state: &BuilderState) -> Query {
    let Some(table) = state.table.as_ref() else {
        return Query::empty();
    };
    let mut query = Query::new(Action::Count, Some(&table.name));
    let (from, _) = from_and_joins(dialect, state, table);
    let where_sql = where_clause(dialect, state, &mut query);
    query.set_sql(format!("SELECT COUNT(*) AS aggregate {from}{where_sql}"));
    query
}

pub(crate) fn insert(dialect: &dyn Dialect, state: &BuilderState) -> Query {
    let Some(table) = state.table.as_ref() else {
        return Query::empty();
    };
    let mut query = Query::new(Action::Insert, Some(&table.name));
    let target = dialect.quote_identifier(&table.name);

    if state.values.is_empty() {
        query.set_sql(format!("INSERT INTO {target} {}", dialect.empty_insert_values()));
        return query;
    }

    let columns: Vec<&str> = state.values.iter().map(|(c, _)| c.as_str()).collect();
    let placeholders: Vec<String> = state
        .values
        .iter()
        .map(|(column, value)| query.bind(column, value.clone()))
        .collect();
    query.set_sql(format!(
        "INSERT INTO {target} ({}) VALUES ({})",
        quote_list(dialect, &columns),
        placeholders.join(", ")
    ));
    query
}

/// WHERE/ORDER/LIMIT tail of an UPDATE or DELETE.
fn restriction(
    dialect: &dyn Dialect,
    state: &BuilderState,
    table: &TableRef,
    strategy: LimitStrategy,
    query: &mut Query,
) -> String {
    let where_sql = where_clause(dialect, state, query);
    let order_sql = order_clause(dialect, state, None);
    match (state.limit, strategy) {
        (Some(limit), LimitStrategy::Direct) => format!("{where_sql}{order_sql} LIMIT {limit}"),
        (Some(limit), LimitStrategy::PrimaryKeySubquery) => {
            let pk = dialect.quote_identifier(table.primary_key());
            format!(
                " WHERE {pk} IN (SELECT {pk} FROM {}{where_sql}{order_sql} LIMIT {limit})",
                dialect.quote_identifier(&table.name)
            )
        }
        (None, LimitStrategy::Direct) => format!("{where_sql}{order_sql}"),
        (None, LimitStrategy::PrimaryKeySubquery) => where_sql,
    }
}

pub(crate) fn update(dialect: &dyn Dialect, state: &BuilderState, strategy: LimitStrategy) -> Query {
    let Some(table) = state.table.as_ref() else {
        return Query::empty();
    };
    if state.values.is_empty() {
        return Query::empty();
    }
    let mut query = Query::new(Action::Update, Some(&table.name));
    let assignments: Vec<String> = state
        .values
        .iter()
        .map(|(column, value)| {
            let p = query.bind(column, value.clone());
            format!("{} = {p}", dialect.quote_identifier(column))
        })
        .collect();
    let tail = restriction(dialect, state, table, strategy, &mut query);
    query.set_sql(format!(
        "UPDATE {} SET {}{tail}",
        dialect.quote_identifier(&table.name),
        assignments.join(", ")
    ));
    query
}

pub(crate) fn delete(dialect: &dyn Dialect, state: &BuilderState, strategy: LimitStrategy) -> Query {
    let Some(table) = state.table.as_ref() else {
        return Query::empty();
    };
    let mut query = Query::new(Action::Delete, Some(&table.name));
    let tail = restriction(dialect, state, table, strategy, &mut query);
    query.set_sql(format!(
        "DELETE FROM {}{tail}",
        dialect.quote_identifier(&table.name)
    ));
    query
}

pub(crate) fn foreign_clause(dialect: &dyn Dialect, reference: &ForeignReference) -> String {
    let target = match reference.schema {
        Some(ref schema) => format!(
            "{}.{}",
            dialect.quote_identifier(schema),
            dialect.quote_identifier(&reference.on_table)
        ),
        None => dialect.quote_identifier(&reference.on_table),
    };
    let mut sql = format!(
        "FOREIGN KEY ({}) REFERENCES {target} ({})",
        dialect.quote_identifier(&reference.from_column),
        dialect.quote_identifier(&reference.to_column)
    );
    if let Some(action) = reference.on_delete {
        sql.push_str(" ON DELETE ");
        sql.push_str(action.as_sql());
    }
    if let Some(action) = reference.on_update {
        sql.push_str(" ON UPDATE ");
        sql.push_str(action.as_sql());
    }
    sql
}

/// `CREATE [UNIQUE] INDEX` for an index or unique key. Other keys yield
/// `None`.
pub(crate) fn index_statement(
    dialect: &dyn Dialect,
    table: &str,
    key: &Key,
    if_not_exists: bool,
) -> Option<String> {
    let unique = match key {
        Key::Index { .. } => "",
        Key::Unique { .. } => "UNIQUE ",
        Key::Primary { .. } | Key::Foreign { .. } => return None,
    };
    Some(format!(
        "CREATE {unique}INDEX {}{} ON {} ({})",
        if if_not_exists { "IF NOT EXISTS " } else { "" },
        dialect.quote_identifier(&key.name()),
        dialect.quote_identifier(table),
        quote_list(dialect, &key.columns())
    ))
}

pub(crate) fn create_table(dialect: &dyn Dialect, state: &BuilderState, if_not_exists: bool) -> Query {
    let Some(blueprint) = state.blueprint.as_ref() else {
        return Query::empty();
    };
    let table = blueprint.table();
    let primary_key = state.primary_key();
    let action = if if_not_exists {
        Action::CreateTableIfNotExists
    } else {
        Action::CreateTable
    };
    let mut query = Query::new(action, Some(table));

    let columns = blueprint.resolved_columns(primary_key);
    let mut lines: Vec<String> = columns.iter().map(|c| dialect.column_definition(c)).collect();

    if !columns.iter().any(|c| dialect.inline_primary_key(c)) {
        let primary = blueprint.primary_columns(primary_key);
        if !primary.is_empty() {
            lines.push(format!("PRIMARY KEY ({})", quote_list(dialect, &primary)));
        }
    }

    let mut trailing = Vec::new();
    for key in blueprint.keys() {
        match key {
            Key::Primary { .. } => {}
            Key::Unique { .. } => lines.push(format!(
                "CONSTRAINT {} UNIQUE ({})",
                dialect.quote_identifier(&key.name()),
                quote_list(dialect, &key.columns())
            )),
            Key::Index { .. } if dialect.inline_indexes() => lines.push(format!(
                "INDEX {} ({})",
                dialect.quote_identifier(&key.name()),
                quote_list(dialect, &key.columns())
            )),
            Key::Index { .. } => {
                trailing.extend(index_statement(dialect, table, key, if_not_exists));
            }
            Key::Foreign { reference, .. } => lines.push(format!(
                "CONSTRAINT {} {}",
                dialect.quote_identifier(&key.name()),
                foreign_clause(dialect, reference)
            )),
        }
    }

    let mut sql = format!(
        "CREATE TABLE {}{} (\n    {}\n)",
        if if_not_exists { "IF NOT EXISTS " } else { "" },
        dialect.quote_identifier(table),
        lines.join(",\n    ")
    );
    for statement in trailing {
        sql.push_str(";\n");
        sql.push_str(&statement);
    }
    query.set_sql(sql);
    query
}

pub(crate) fn drop_table(dialect: &dyn Dialect, state: &BuilderState, if_exists: bool) -> Query {
    let Some(table) = state.table_name() else {
        return Query::empty();
    };
    let action = if if_exists {
        Action::DropTableIfExists
    } else {
        Action::DropTable
    };
    let mut query = Query::new(action, Some(table));
    query.set_sql(format!(
        "DROP TABLE {}{}",
        if if_exists { "IF EXISTS " } else { "" },
        dialect.quote_identifier(table)
    ));
    query
}

/// Joins per-column ALTER clauses into one statement, or into one statement
/// per clause when `separate` is set.
fn alter_table(dialect: &dyn Dialect, table: &str, clauses: &[String], separate: bool) -> String {
    let target = format!("ALTER TABLE {}", dialect.quote_identifier(table));
    if separate {
        clauses
            .iter()
            .map(|clause| format!("{target} {clause}"))
            .collect::<Vec<_>>()
            .join(";\n")
    } else {
        format!("{target} {}", clauses.join(", "))
    }
}

pub(crate) fn drop_columns(dialect: &dyn Dialect, state: &BuilderState, separate: bool) -> Query {
    let Some(table) = state.table_name() else {
        return Query::empty();
    };
    if state.columns.is_empty() {
        return Query::empty();
    }
    let clauses: Vec<String> = state
        .columns
        .iter()
        .map(|c| format!("DROP COLUMN {}", dialect.quote_identifier(c)))
        .collect();
    let mut query = Query::new(Action::DropColumns, Some(table));
    query.set_sql(alter_table(dialect, table, &clauses, separate));
    query
}

pub(crate) fn add_column(dialect: &dyn Dialect, state: &BuilderState, separate: bool) -> Query {
    let Some(blueprint) = state.blueprint.as_ref() else {
        return Query::empty();
    };
    if blueprint.columns().is_empty() {
        return Query::empty();
    }
    let table = blueprint.table();
    let clauses: Vec<String> = blueprint
        .columns()
        .iter()
        .map(|c| format!("ADD COLUMN {}", dialect.column_definition(c)))
        .collect();
    let mut query = Query::new(Action::AddColumn, Some(table));
    query.set_sql(alter_table(dialect, table, &clauses, separate));
    query
}

pub(crate) fn create_index(dialect: &dyn Dialect, state: &BuilderState) -> Query {
    let (Some(table), Some(key)) = (state.table_name(), state.key.as_ref()) else {
        return Query::empty();
    };
    if matches!(key, Key::Foreign { .. }) {
        return dialect.add_foreign_key(state);
    }
    match index_statement(dialect, table, key, false) {
        Some(sql) => {
            let mut query = Query::new(Action::CreateIndex, Some(table));
            query.set_sql(sql);
            query
        }
        None => Query::empty(),
    }
}

pub(crate) fn drop_index(dialect: &dyn Dialect, state: &BuilderState, qualify_table: bool) -> Query {
    let (Some(table), Some(name)) = (state.table_name(), state.key_name.as_deref()) else {
        return Query::empty();
    };
    let mut sql = format!("DROP INDEX {}", dialect.quote_identifier(name));
    if qualify_table {
        sql.push_str(" ON ");
        sql.push_str(&dialect.quote_identifier(table));
    }
    let mut query = Query::new(Action::DropIndex, Some(table));
    query.set_sql(sql);
    query
}

pub(crate) fn add_foreign_key(dialect: &dyn Dialect, state: &BuilderState) -> Query {
    let (Some(table), Some(key)) = (state.table_name(), state.key.as_ref()) else {
        return Query::empty();
    };
    let Key::Foreign { reference, .. } = key else {
        return Query::empty();
    };
    let mut query = Query::new(Action::AddForeignKey, Some(table));
    query.set_sql(format!(
        "ALTER TABLE {} ADD CONSTRAINT {} {}",
        dialect.quote_identifier(table),
        dialect.quote_identifier(&key.name()),
        foreign_clause(dialect, reference)
    ));
    query
}

/// `ALTER TABLE t DROP <keyword> name`.
pub(crate) fn drop_foreign_key(dialect: &dyn Dialect, state: &BuilderState, keyword: &str) -> Query {
    let (Some(table), Some(name)) = (state.table_name(), state.key_name.as_deref()) else {
        return Query::empty();
    };
    let mut query = Query::new(Action::DropForeignKey, Some(table));
    query.set_sql(format!(
        "ALTER TABLE {} DROP {keyword} {}",
        dialect.quote_identifier(table),
        dialect.quote_identifier(name)
    ));
    query
}

/// Applies `render` to the quoted table name.
pub(crate) fn truncate_table(
    dialect: &dyn Dialect,
    state: &BuilderState,
    render: impl FnOnce(&str) -> String,
) -> Query {
    let Some(table) = state.table_name() else {
        return Query::empty();
    };
    let mut query = Query::new(Action::TruncateTable, Some(table));
    query.set_sql(render(&dialect.quote_identifier(table)));
    query
}

pub(crate) fn raw(state: &BuilderState) -> Query {
    match state.raw_sql {
        Some(ref sql) => Query::raw(sql.clone(), state.raw_params.clone()),
        None => Query::empty(),
    }
}
