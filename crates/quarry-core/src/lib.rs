//! # quarry-core
//!
//! Describe queries and schema changes once, render them for MySQL,
//! PostgreSQL or SQLite.
//!
//! This crate provides:
//! - A condition model ([`QueryCondition`], [`ConditionGroup`]) and its
//!   resolver
//! - Declarative table [`Blueprint`](schema::Blueprint)s with typed columns and
//!   keys
//! - A fluent [`QueryBuilder`] that delegates rendering to a [`Dialect`]
//!
//! Rendering never fails: state a dialect cannot express produces an empty
//! [`Query`].
//!
//! ```rust
//! use std::sync::Arc;
//! use quarry_core::schema::{Blueprint, string};
//! use quarry_core::{PostgresDialect, QueryBuilder};
//!
//! let query = QueryBuilder::new(Arc::new(PostgresDialect::new()))
//!     .create_table(Blueprint::new("tags").column(string("label", 50).not_null()))
//!     .build();
//!
//! assert_eq!(
//!     query.sql(),
//!     "CREATE TABLE \"tags\" (\n    \"id\" SERIAL PRIMARY KEY,\n    \"label\" VARCHAR(50) NOT NULL\n)"
//! );
//! ```

pub mod builder;
pub mod condition;
pub mod dialect;
pub mod query;
pub mod schema;
pub mod value;

pub use builder::{Direction, QueryBuilder};
pub use condition::{ConditionGroup, ConditionNode, ConditionResolver, Connective, QueryCondition};
pub use dialect::{Dialect, MysqlDialect, NullDialect, PostgresDialect, SqliteDialect};
pub use query::{Action, Query};
pub use value::SqlValue;
