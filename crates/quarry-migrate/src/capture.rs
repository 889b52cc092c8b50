//! Record-only executor used to build export scripts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use quarry_core::{Action, Dialect, Query};
use tracing::debug;

use crate::connection::{is_read_statement, QueryResult};
use crate::error::Result;
use crate::executor::Executor;

/// Collects the SQL a unit would run instead of running it.
///
/// Only statements that change the database are kept. Reads return an empty
/// result, and inserts report a made-up key so units that chain inserts keep
/// working.
#[derive(Debug)]
pub struct CaptureExecutor {
    dialect: Arc<dyn Dialect>,
    statements: Vec<String>,
    insert_ids: HashMap<String, i64>,
}

impl CaptureExecutor {
    /// Creates an empty capture for `dialect`.
    #[must_use]
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            statements: Vec::new(),
            insert_ids: HashMap::new(),
        }
    }

    /// Statements captured so far, in execution order.
    #[must_use]
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Removes and returns the captured statements.
    pub fn take_statements(&mut self) -> Vec<String> {
        std::mem::take(&mut self.statements)
    }

    fn captures(query: &Query) -> bool {
        match query.action() {
            Some(Action::Raw) => !is_read_statement(query.sql()),
            Some(
                Action::Insert
                | Action::Update
                | Action::Delete
                | Action::CreateTable
                | Action::CreateTableIfNotExists
                | Action::DropTable
                | Action::DropTableIfExists
                | Action::DropColumns
                | Action::AddColumn
                | Action::CreateIndex
                | Action::DropIndex
                | Action::AddForeignKey
                | Action::DropForeignKey
                | Action::TruncateTable,
            ) => true,
            _ => false,
        }
    }

    fn next_insert_id(&mut self, table: &str) -> i64 {
        let id = self.insert_ids.entry(table.to_string()).or_insert(0);
        *id += 1;
        *id
    }
}

#[async_trait]
impl Executor for CaptureExecutor {
    fn dialect(&self) -> Arc<dyn Dialect> {
        Arc::clone(&self.dialect)
    }

    async fn execute(&mut self, query: Query) -> Result<QueryResult> {
        if query.is_empty() || !Self::captures(&query) {
            debug!(sql = %query.sql(), "Not captured");
            return Ok(QueryResult::default());
        }
        self.statements.push(query.to_inline_sql());

        let insert_id = (query.action() == Some(Action::Insert))
            .then(|| self.next_insert_id(query.table().unwrap_or_default()));
        Ok(QueryResult {
            records: Vec::new(),
            affected_rows: 1,
            insert_id,
        })
    }
}
