//! Batched, reversible database migrations on top of `quarry-core`.
//!
//! Application code writes [`Migration`]s and [`Seed`]s against the
//! [`Executor`] trait and registers them under identifiers in a
//! [`Registry`]. A [`Runner`] then:
//!
//! - works out which units are pending from the bookkeeping table,
//! - applies them in identifier order as one numbered batch,
//! - reverts the whole batch if any unit fails,
//! - reverts earlier batches on request,
//! - or captures the SQL into a deployable script instead of running it.
//!
//! # Example
//!
//! ```rust,no_run
//! use quarry_migrate::prelude::*;
//! use quarry_core::schema::{string, Blueprint};
//!
//! struct CreateUsers;
//!
//! #[async_trait::async_trait]
//! impl Migration for CreateUsers {
//!     async fn up(&self, db: &mut dyn Executor) -> Result<()> {
//!         let blueprint = Blueprint::new("users").column(string("email", 255).not_null());
//!         let query = db.builder().create_table(blueprint).build();
//!         db.execute(query).await?;
//!         Ok(())
//!     }
//!
//!     async fn down(&self, db: &mut dyn Executor) -> Result<()> {
//!         let query = db.builder().table("users").drop_table().build();
//!         db.execute(query).await?;
//!         Ok(())
//!     }
//! }
//!
//! # async fn demo() -> Result<()> {
//! let registry = Registry::new()
//!     .with_migration("migration_2024_03_01_CreateUsers_1709251200", || CreateUsers);
//! let connection = Connection::new("sqlite://app.db?mode=rwc")?;
//! let mut runner = Runner::new(connection, registry);
//! let report = runner.migrate().await?;
//! println!("batch {} applied {} unit(s)", report.batch_id, report.applied.len());
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod cli;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod fetcher;
pub mod history;
pub mod runner;
pub mod unit;

pub use capture::CaptureExecutor;
pub use config::MigratorConfig;
pub use connection::{Connection, Driver, QueryCache, QueryResult, Record};
pub use error::{MigrateError, Result};
pub use executor::Executor;
pub use fetcher::{MigrationFetcher, PendingUnit};
pub use history::{MigrationHistory, MigrationRecord, Status};
pub use runner::{MigrationReport, Runner, RunnerState, UnitStatus};
pub use unit::{
    stable_key, Migration, MigrationSource, MigrationUnit, Registry, Seed, UnitIdentifier,
    UnitKind,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::capture::CaptureExecutor;
    pub use crate::config::MigratorConfig;
    pub use crate::connection::{Connection, QueryResult, Record};
    pub use crate::error::{MigrateError, Result};
    pub use crate::executor::Executor;
    pub use crate::runner::{MigrationReport, Runner};
    pub use crate::unit::{Migration, Registry, Seed};
    pub use quarry_core::{
        ConditionGroup, Direction, QueryBuilder, QueryCondition, SqlValue,
    };
}
