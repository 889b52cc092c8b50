//! Renders conditions into SQL fragments.

use crate::dialect::Dialect;
use crate::query::Query;
use crate::value::{quote_literal, SqlValue};

use super::{ConditionGroup, ConditionNode, QueryCondition};

/// Renders conditions and condition groups for one dialect.
///
/// Bound values are appended to the [`Query`] passed in, which also owns the
/// placeholder namespace: two conditions on the same column get `col` and
/// `col_1`.
#[derive(Clone, Copy)]
pub struct ConditionResolver<'d> {
    dialect: &'d dyn Dialect,
}

impl<'d> ConditionResolver<'d> {
    /// Creates a resolver for the given dialect.
    #[must_use]
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self { dialect }
    }

    /// Renders a single condition, binding its values into `query`.
    pub fn resolve(
        &self,
        condition: &QueryCondition,
        alias: Option<&str>,
        query: &mut Query,
    ) -> String {
        let column = self.column_ref(condition.column(), alias);
        match condition {
            QueryCondition::Equals { value, .. } => {
                let p = query.bind(&placeholder_base(condition.column(), alias), value.clone());
                format!("{column} = {p}")
            }
            QueryCondition::NotEquals { value, .. } => {
                let p = query.bind(&placeholder_base(condition.column(), alias), value.clone());
                format!("{column} <> {p}")
            }
            QueryCondition::Like { pattern, .. } => {
                let p = query.bind(
                    &placeholder_base(condition.column(), alias),
                    SqlValue::Text(pattern.clone()),
                );
                format!("{column} LIKE {p}")
            }
            QueryCondition::Null { .. } => format!("{column} IS NULL"),
            QueryCondition::NotNull { .. } => format!("{column} IS NOT NULL"),
            QueryCondition::In { values, .. } => {
                if values.is_empty() {
                    // Nothing can match an empty list.
                    String::from("1 = 0")
                } else {
                    format!("{column} IN ({})", values.join(", "))
                }
            }
            QueryCondition::Between { low, high, .. } => {
                format!("{column} BETWEEN {low} AND {high}")
            }
            QueryCondition::BetweenDates { from, to, .. } => format!(
                "{column} BETWEEN {} AND {}",
                self.dialect.datetime_cast(&quote_literal(from)),
                self.dialect.datetime_cast(&quote_literal(to))
            ),
        }
    }

    /// Renders a group. A single member renders bare; several are wrapped
    /// in parentheses. Empty groups render to an empty string.
    pub fn resolve_group(
        &self,
        group: &ConditionGroup,
        alias: Option<&str>,
        query: &mut Query,
    ) -> String {
        let parts: Vec<String> = group
            .members()
            .iter()
            .map(|member| self.resolve_node(member, alias, query))
            .filter(|part| !part.is_empty())
            .collect();

        match parts.len() {
            0 => String::new(),
            1 => parts.into_iter().next().unwrap_or_default(),
            _ => format!(
                "({})",
                parts.join(&format!(" {} ", group.connective().as_sql()))
            ),
        }
    }

    /// Renders either kind of node.
    pub fn resolve_node(
        &self,
        node: &ConditionNode,
        alias: Option<&str>,
        query: &mut Query,
    ) -> String {
        match node {
            ConditionNode::Condition(condition) => self.resolve(condition, alias, query),
            ConditionNode::Group(group) => self.resolve_group(group, alias, query),
        }
    }

    /// Renders a node on its own, returning the fragment and the parameters
    /// it bound.
    #[must_use]
    pub fn resolve_detached(
        &self,
        node: &ConditionNode,
        alias: Option<&str>,
    ) -> (String, Vec<(String, SqlValue)>) {
        let mut scratch = Query::empty();
        let sql = self.resolve_node(node, alias, &mut scratch);
        (sql, scratch.params().to_vec())
    }

    fn column_ref(&self, column: &str, alias: Option<&str>) -> String {
        let quoted = self.dialect.quote_identifier(column);
        match alias {
            Some(alias) => format!("{alias}.{quoted}"),
            None => quoted,
        }
    }
}

fn placeholder_base(column: &str, alias: Option<&str>) -> String {
    match alias {
        Some(alias) => format!("{alias}_{column}"),
        None => column.to_string(),
    }
}
