//! Condition model.
//!
//! Conditions are immutable value types; they know nothing about dialects or
//! placeholders. [`ConditionResolver`] turns them into SQL.

mod resolver;

pub use resolver::ConditionResolver;

use crate::value::SqlValue;

/// A single predicate on one column.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryCondition {
    /// `column = :value`
    Equals {
        /// Column name.
        column: String,
        /// Bound value.
        value: SqlValue,
    },
    /// `column <> :value`
    NotEquals {
        /// Column name.
        column: String,
        /// Bound value.
        value: SqlValue,
    },
    /// `column IS NULL`
    Null {
        /// Column name.
        column: String,
    },
    /// `column IS NOT NULL`
    NotNull {
        /// Column name.
        column: String,
    },
    /// `column LIKE :pattern`
    Like {
        /// Column name.
        column: String,
        /// Bound pattern.
        pattern: String,
    },
    /// `column IN (v1, v2, ...)`, values inlined verbatim.
    In {
        /// Column name.
        column: String,
        /// Pre-quoted literal values.
        values: Vec<String>,
    },
    /// `column BETWEEN low AND high`, bounds inlined verbatim.
    Between {
        /// Column name.
        column: String,
        /// Lower bound literal.
        low: String,
        /// Upper bound literal.
        high: String,
    },
    /// `column BETWEEN <cast from> AND <cast to>` on datetime values.
    BetweenDates {
        /// Column name.
        column: String,
        /// Lower bound, e.g. `2024-01-01 00:00:00`.
        from: String,
        /// Upper bound.
        to: String,
    },
}

impl QueryCondition {
    /// `column = value`
    #[must_use]
    pub fn equals(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::Equals {
            column: column.into(),
            value: value.into(),
        }
    }

    /// `column <> value`
    #[must_use]
    pub fn not_equals(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::NotEquals {
            column: column.into(),
            value: value.into(),
        }
    }

    /// `column IS NULL`
    #[must_use]
    pub fn null(column: impl Into<String>) -> Self {
        Self::Null {
            column: column.into(),
        }
    }

    /// `column IS NOT NULL`
    #[must_use]
    pub fn not_null(column: impl Into<String>) -> Self {
        Self::NotNull {
            column: column.into(),
        }
    }

    /// `column LIKE pattern`
    #[must_use]
    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Like {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    /// `column IN (...)`. The caller quotes string values.
    #[must_use]
    pub fn in_list<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `column BETWEEN low AND high`
    #[must_use]
    pub fn between(
        column: impl Into<String>,
        low: impl Into<String>,
        high: impl Into<String>,
    ) -> Self {
        Self::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
        }
    }

    /// `column BETWEEN` two datetimes.
    #[must_use]
    pub fn between_dates(
        column: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::BetweenDates {
            column: column.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// The column this condition applies to.
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Equals { column, .. }
            | Self::NotEquals { column, .. }
            | Self::Null { column }
            | Self::NotNull { column }
            | Self::Like { column, .. }
            | Self::In { column, .. }
            | Self::Between { column, .. }
            | Self::BetweenDates { column, .. } => column,
        }
    }
}

/// How the members of a [`ConditionGroup`] are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connective {
    /// All members must hold.
    #[default]
    And,
    /// Any member may hold.
    Or,
}

impl Connective {
    /// SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Either a leaf condition or a nested group.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    /// A single predicate.
    Condition(QueryCondition),
    /// A nested group.
    Group(ConditionGroup),
}

impl From<QueryCondition> for ConditionNode {
    fn from(condition: QueryCondition) -> Self {
        Self::Condition(condition)
    }
}

impl From<ConditionGroup> for ConditionNode {
    fn from(group: ConditionGroup) -> Self {
        Self::Group(group)
    }
}

/// A boolean tree of conditions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionGroup {
    connective: Connective,
    members: Vec<ConditionNode>,
}

impl ConditionGroup {
    /// Creates an empty group with the given connective.
    #[must_use]
    pub fn new(connective: Connective) -> Self {
        Self {
            connective,
            members: Vec::new(),
        }
    }

    /// An empty AND group.
    #[must_use]
    pub fn all() -> Self {
        Self::new(Connective::And)
    }

    /// An empty OR group.
    #[must_use]
    pub fn any() -> Self {
        Self::new(Connective::Or)
    }

    /// Adds a condition or a nested group.
    #[must_use]
    pub fn with(mut self, node: impl Into<ConditionNode>) -> Self {
        self.members.push(node.into());
        self
    }

    /// Adds a condition or a nested group in place.
    pub fn push(&mut self, node: impl Into<ConditionNode>) {
        self.members.push(node.into());
    }

    /// The group's connective.
    #[must_use]
    pub fn connective(&self) -> Connective {
        self.connective
    }

    /// Members in insertion order.
    #[must_use]
    pub fn members(&self) -> &[ConditionNode] {
        &self.members
    }

    /// Returns true if the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
