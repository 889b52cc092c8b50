//! Live database access through sqlx's `Any` driver.
//!
//! A [`Connection`] owns a lazily opened pool, an optional transaction and a
//! [`QueryCache`]. Queries arrive with `:name` placeholders and are rewritten
//! to the driver's positional syntax before they are bound.

mod cache;
mod driver;
mod record;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quarry_core::{Dialect, Query, SqlValue};
use sqlx::any::{Any, AnyArguments, AnyPoolOptions, AnyQueryResult, AnyRow};
use sqlx::{AnyConnection, AnyPool, Executor as SqlxExecutor, Transaction};
use tracing::{debug, info};

pub use cache::{is_read_statement, QueryCache};
pub use driver::Driver;
pub use record::{QueryResult, Record};

use crate::config::MigratorConfig;
use crate::error::{MigrateError, Result};
use crate::executor::Executor;

/// A connection to one database.
pub struct Connection {
    url: String,
    driver: Driver,
    dialect: Arc<dyn Dialect>,
    max_connections: u32,
    pool: Option<AnyPool>,
    transaction: Option<Transaction<'static, Any>>,
    cache: QueryCache,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("driver", &self.driver)
            .field("connected", &self.pool.is_some())
            .field("in_transaction", &self.transaction.is_some())
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Creates a connection for `url`. Nothing is opened until the first
    /// query.
    pub fn new(url: &str) -> Result<Self> {
        Self::from_config(&MigratorConfig::new(url))
    }

    /// Creates a connection from a validated configuration.
    pub fn from_config(config: &MigratorConfig) -> Result<Self> {
        config.validate()?;
        let driver = config.driver()?;
        Ok(Self {
            url: config.database_url.clone(),
            driver,
            dialect: driver.dialect(),
            max_connections: config.max_connections,
            pool: None,
            transaction: None,
            cache: QueryCache::new(config.query_cache),
        })
    }

    /// The URL currently connected to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The driver selected by the URL scheme.
    #[must_use]
    pub const fn driver(&self) -> Driver {
        self.driver
    }

    /// The read cache.
    #[must_use]
    pub const fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Enables or disables the read cache.
    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.cache.set_enabled(enabled);
    }

    /// Returns true while a transaction is open.
    #[must_use]
    pub const fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    fn pool(&mut self) -> Result<AnyPool> {
        if let Some(pool) = &self.pool {
            return Ok(pool.clone());
        }
        sqlx::any::install_default_drivers();
        let options = match self.driver {
            // Every in-memory SQLite connection is its own database, so the
            // pool must hold on to exactly one.
            Driver::Sqlite => AnyPoolOptions::new()
                .max_connections(1)
                .idle_timeout(Option::<Duration>::None)
                .max_lifetime(Option::<Duration>::None),
            Driver::Mysql | Driver::Postgres => {
                AnyPoolOptions::new().max_connections(self.max_connections)
            }
        };
        let pool = options.connect_lazy(&self.url)?;
        debug!(driver = %self.driver, "Opened connection pool");
        self.pool = Some(pool.clone());
        Ok(pool)
    }

    /// Runs SQL with named `:placeholders` bound from `params`.
    pub async fn query(
        &mut self,
        sql: &str,
        params: &[(String, SqlValue)],
    ) -> Result<QueryResult> {
        self.execute_query(&Query::raw(sql, params.to_vec())).await
    }

    /// Runs a rendered query.
    pub async fn execute_query(&mut self, query: &Query) -> Result<QueryResult> {
        if query.is_empty() {
            return Ok(QueryResult::default());
        }
        let dialect = Arc::clone(&self.dialect);
        let (sql, values) = query.to_positional(|i| dialect.positional_placeholder(i));
        let read = is_read_statement(&sql);

        let key = (read && self.cache.is_enabled())
            .then(|| QueryCache::key(self.driver, &sql, &values));
        if let Some(hit) = key.and_then(|k| self.cache.get(k)) {
            debug!(sql = %sql, "Cache hit");
            return Ok(hit);
        }

        debug!(sql = %sql, "Executing SQL");
        let returns_rows = read || sql.contains(" RETURNING ");
        let result = if let Some(tx) = self.transaction.as_mut() {
            run(tx, &sql, &values, returns_rows).await?
        } else {
            let pool = self.pool()?;
            let mut conn = pool.acquire().await?;
            run(&mut conn, &sql, &values, returns_rows).await?
        };

        if let Some(key) = key {
            self.cache.insert(key, result.clone());
        } else if result.affected_rows > 0 {
            self.cache.flush();
        }
        Ok(result)
    }

    /// Lists the columns of `table` in declaration order.
    pub async fn columns(&mut self, table: &str) -> Result<Vec<String>> {
        let query = quarry_core::QueryBuilder::new(Arc::clone(&self.dialect))
            .table(table)
            .list_columns()
            .build();
        let result = self.execute_query(&query).await?;
        Ok(result
            .records
            .iter()
            .filter_map(|r| r.get_str("column_name").map(str::to_string))
            .collect())
    }

    /// Points the connection at another database on the same server.
    ///
    /// MySQL switches with `USE`; the URL is rewritten for every driver so
    /// pooled connections opened later land on the new database too.
    pub async fn switch_database(&mut self, database: &str) -> Result<()> {
        if self.in_transaction() {
            return Err(MigrateError::Transaction(
                "cannot switch database inside a transaction".to_string(),
            ));
        }
        let url = self.driver.url_with_database(&self.url, database)?;
        if self.driver == Driver::Mysql {
            let statement = format!("USE {}", self.dialect.quote_identifier(database));
            self.execute_query(&Query::raw(statement, Vec::new())).await?;
        }
        if let Some(pool) = self.pool.take() {
            pool.close().await;
        }
        self.cache.flush();
        self.url = url;
        info!(driver = %self.driver, database = %database, "Switched database");
        Ok(())
    }

    /// Opens a transaction. Transactions do not nest.
    pub async fn begin(&mut self) -> Result<()> {
        if self.in_transaction() {
            return Err(MigrateError::Transaction(
                "a transaction is already active".to_string(),
            ));
        }
        let pool = self.pool()?;
        self.transaction = Some(pool.begin().await?);
        debug!("Transaction started");
        Ok(())
    }

    /// Commits the open transaction.
    pub async fn commit(&mut self) -> Result<()> {
        let tx = self
            .transaction
            .take()
            .ok_or_else(|| MigrateError::Transaction("no active transaction".to_string()))?;
        tx.commit().await?;
        debug!("Transaction committed");
        Ok(())
    }

    /// Rolls back the open transaction.
    pub async fn rollback(&mut self) -> Result<()> {
        let tx = self
            .transaction
            .take()
            .ok_or_else(|| MigrateError::Transaction("no active transaction".to_string()))?;
        tx.rollback().await?;
        // Reads made inside the transaction may have been cached.
        self.cache.flush();
        debug!("Transaction rolled back");
        Ok(())
    }

    /// Closes the pool. The connection reopens lazily if used again.
    pub async fn close(&mut self) {
        if let Some(tx) = self.transaction.take() {
            if let Err(e) = tx.rollback().await {
                debug!(error = %e, "Rollback on close failed");
            }
        }
        if let Some(pool) = self.pool.take() {
            pool.close().await;
        }
        self.cache.flush();
    }
}

#[async_trait]
impl Executor for Connection {
    fn dialect(&self) -> Arc<dyn Dialect> {
        Arc::clone(&self.dialect)
    }

    async fn execute(&mut self, query: Query) -> Result<QueryResult> {
        self.execute_query(&query).await
    }
}

async fn run(
    conn: &mut AnyConnection,
    sql: &str,
    values: &[SqlValue],
    returns_rows: bool,
) -> Result<QueryResult> {
    let insert = sql.trim_start().get(..6).is_some_and(|v| v.eq_ignore_ascii_case("INSERT"));

    if values.is_empty() {
        let statement = sqlx::raw_sql(sql);
        return if returns_rows {
            let rows = SqlxExecutor::fetch_all(&mut *conn, statement).await?;
            Ok(rows_result(&rows, insert))
        } else {
            let done = SqlxExecutor::execute(&mut *conn, statement).await?;
            Ok(done_result(&done, insert))
        };
    }

    let mut statement = sqlx::query(sql);
    for value in values {
        statement = bind_value(statement, value);
    }
    if returns_rows {
        let rows = SqlxExecutor::fetch_all(&mut *conn, statement).await?;
        Ok(rows_result(&rows, insert))
    } else {
        let done = SqlxExecutor::execute(&mut *conn, statement).await?;
        Ok(done_result(&done, insert))
    }
}

fn bind_value<'q>(
    statement: sqlx::query::Query<'q, Any, AnyArguments<'q>>,
    value: &SqlValue,
) -> sqlx::query::Query<'q, Any, AnyArguments<'q>> {
    match value {
        SqlValue::Null => statement.bind(Option::<String>::None),
        SqlValue::Bool(b) => statement.bind(*b),
        SqlValue::Int(n) => statement.bind(*n),
        SqlValue::Float(f) => statement.bind(*f),
        SqlValue::Text(s) => statement.bind(s.clone()),
        SqlValue::Blob(b) => statement.bind(b.clone()),
    }
}

fn rows_result(rows: &[AnyRow], insert: bool) -> QueryResult {
    let records: Vec<Record> = rows.iter().map(Record::from_any_row).collect();
    if !insert {
        return QueryResult::with_records(records);
    }
    // INSERT .. RETURNING: the first returned column is the new key.
    let insert_id = records
        .first()
        .and_then(|r| r.values().first())
        .and_then(SqlValue::as_i64);
    QueryResult {
        affected_rows: records.len() as u64,
        records,
        insert_id,
    }
}

fn done_result(done: &AnyQueryResult, insert: bool) -> QueryResult {
    QueryResult {
        records: Vec::new(),
        affected_rows: done.rows_affected(),
        insert_id: if insert { done.last_insert_id() } else { None },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_scheme_is_rejected() {
        let err = Connection::new("oracle://localhost/db").unwrap_err();
        assert!(matches!(err, MigrateError::Config(_)));
    }

    #[test]
    fn test_dialect_follows_driver() {
        let conn = Connection::new("postgres://localhost/app").unwrap();
        assert_eq!(conn.driver(), Driver::Postgres);
        assert_eq!(Executor::dialect(&conn).name(), "postgres");
        assert!(!conn.in_transaction());
    }

    #[tokio::test]
    async fn test_empty_query_is_a_no_op() {
        let mut conn = Connection::new("postgres://localhost/app").unwrap();
        let result = conn.execute_query(&Query::empty()).await.unwrap();
        assert_eq!(result, QueryResult::default());
    }

    #[tokio::test]
    async fn test_commit_without_begin() {
        let mut conn = Connection::new("sqlite::memory:").unwrap();
        let err = conn.commit().await.unwrap_err();
        assert!(matches!(err, MigrateError::Transaction(_)));
    }
}
