//! The seam between migration units and the database.

use std::sync::Arc;

use async_trait::async_trait;
use quarry_core::{Dialect, Query, QueryBuilder};

use crate::connection::QueryResult;
use crate::error::Result;

/// Something that can run rendered queries.
///
/// [`Connection`](crate::Connection) executes them against a live database;
/// [`CaptureExecutor`](crate::CaptureExecutor) records them for an export
/// script. Migration units only ever see this trait, so the same unit code
/// serves both.
#[async_trait]
pub trait Executor: Send {
    /// The dialect queries should be rendered in.
    fn dialect(&self) -> Arc<dyn Dialect>;

    /// A fresh builder for this executor's dialect.
    fn builder(&self) -> QueryBuilder {
        QueryBuilder::new(self.dialect())
    }

    /// Runs a rendered query. Empty queries succeed with an empty result.
    async fn execute(&mut self, query: Query) -> Result<QueryResult>;
}
