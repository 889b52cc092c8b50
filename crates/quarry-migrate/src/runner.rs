//! Applies, reverts and exports batches of units.
//!
//! A [`Runner`] owns a [`Connection`] and a [`Registry`]. Each successful
//! [`migrate`](Runner::migrate) call applies every pending unit under one new
//! batch id; a failure reverts that batch before the error is returned.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::capture::CaptureExecutor;
use crate::config::MigratorConfig;
use crate::connection::Connection;
use crate::error::{MigrateError, Result};
use crate::executor::Executor;
use crate::fetcher::{MigrationFetcher, PendingUnit};
use crate::history::{MigrationHistory, Status};
use crate::unit::{MigrationSource, Registry, UnitIdentifier, UnitKind};

/// Where the runner is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// Nothing has run yet.
    Idle,
    /// Reading sources and bookkeeping.
    Fetching,
    /// Allocating the batch id.
    Batching,
    /// Running forward actions.
    Applying,
    /// Running reverse actions.
    RollingBack,
    /// The last operation finished, successfully or not.
    Done,
}

/// Outcome of [`Runner::migrate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// The batch the units were applied in; 0 when nothing was pending.
    pub batch_id: i64,
    /// Units applied, in order.
    pub applied: Vec<String>,
    /// Units bypassed because of their skip flag.
    pub skipped: Vec<String>,
}

impl MigrationReport {
    /// Returns true if nothing was applied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}

/// One line of [`Runner::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitStatus {
    /// Unit identifier.
    pub identifier: String,
    /// Migration or seed.
    pub kind: UnitKind,
    /// Recorded state; units never seen are pending.
    pub status: Status,
    /// Batch of the record, if there is one.
    pub batch_id: Option<i64>,
}

/// Drives units against a connection.
#[derive(Debug)]
pub struct Runner {
    connection: Connection,
    registry: Registry,
    history: MigrationHistory,
    include_seeds: bool,
    state: RunnerState,
}

impl Runner {
    /// Creates a runner with the default bookkeeping table.
    #[must_use]
    pub fn new(connection: Connection, registry: Registry) -> Self {
        Self {
            connection,
            registry,
            history: MigrationHistory::new("migrations"),
            include_seeds: false,
            state: RunnerState::Idle,
        }
    }

    /// Creates a runner and its connection from a configuration.
    pub fn from_config(config: &MigratorConfig, registry: Registry) -> Result<Self> {
        let connection = Connection::from_config(config)?;
        Ok(Self::new(connection, registry)
            .bookkeeping_table(&config.bookkeeping_table)
            .include_seeds(config.include_seeds))
    }

    /// Uses `table` for bookkeeping.
    #[must_use]
    pub fn bookkeeping_table(mut self, table: &str) -> Self {
        self.history = MigrationHistory::new(table);
        self
    }

    /// Runs seeds after migrations.
    #[must_use]
    pub const fn include_seeds(mut self, include: bool) -> Self {
        self.include_seeds = include;
        self
    }

    /// The current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RunnerState {
        self.state
    }

    /// The live connection.
    pub fn connection(&mut self) -> &mut Connection {
        &mut self.connection
    }

    /// The bookkeeping table access.
    #[must_use]
    pub const fn history(&self) -> &MigrationHistory {
        &self.history
    }

    /// The unit registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    async fn fetch(&mut self, include_seeds: bool) -> Result<Vec<PendingUnit>> {
        self.state = RunnerState::Fetching;
        let fetcher = MigrationFetcher::new(&self.registry, &self.history);
        let sources: [&dyn MigrationSource; 1] = [&self.registry];
        fetcher
            .fetch(&mut self.connection, &sources, include_seeds, false)
            .await
    }

    /// Applies every pending unit as one new batch.
    ///
    /// On the first failure the batch is rolled back and
    /// [`MigrateError::UnitFailed`] is returned; later units are not tried.
    pub async fn migrate(&mut self) -> Result<MigrationReport> {
        let pending = match self.fetch(self.include_seeds).await {
            Ok(pending) => pending,
            Err(e) => {
                self.state = RunnerState::Done;
                return Err(e);
            }
        };
        if pending.is_empty() {
            info!("Nothing to migrate");
            self.state = RunnerState::Done;
            return Ok(MigrationReport::default());
        }

        self.state = RunnerState::Batching;
        let batch_id = match self.next_batch().await {
            Ok(batch_id) => batch_id,
            Err(e) => {
                self.state = RunnerState::Done;
                return Err(e);
            }
        };

        self.state = RunnerState::Applying;
        let mut report = MigrationReport {
            batch_id,
            ..MigrationReport::default()
        };
        for pending in &pending {
            if pending.unit.skip() {
                warn!(identifier = %pending.identifier, "Skipping unit");
                report.skipped.push(pending.identifier.clone());
                continue;
            }
            info!(
                identifier = %pending.identifier,
                kind = %pending.kind(),
                batch = batch_id,
                "Applying unit"
            );
            if let Err(e) = self.apply(pending, batch_id).await {
                error!(identifier = %pending.identifier, error = %e, "Unit failed, rolling back batch");
                if let Err(rollback) = self.rollback(Some(batch_id)).await {
                    error!(batch = batch_id, error = %rollback, "Rollback after failure failed");
                }
                self.state = RunnerState::Done;
                return Err(MigrateError::UnitFailed {
                    identifier: pending.identifier.clone(),
                    source: Box::new(e),
                });
            }
            report.applied.push(pending.identifier.clone());
        }

        info!(batch = batch_id, applied = report.applied.len(), "Migration complete");
        self.state = RunnerState::Done;
        Ok(report)
    }

    async fn next_batch(&mut self) -> Result<i64> {
        self.history.ensure_table(&mut self.connection).await?;
        match self.history.last_batch(&mut self.connection).await {
            Ok(last) => Ok(last + 1),
            Err(e) if e.is_database() => {
                debug!(error = %e, "Last batch lookup failed, starting at batch 1");
                Ok(1)
            }
            Err(e) => Err(e),
        }
    }

    async fn apply(&mut self, pending: &PendingUnit, batch_id: i64) -> Result<()> {
        let path = pending.record.as_ref().and_then(|r| r.path.clone());
        self.history
            .mark_in_progress(
                &mut self.connection,
                &pending.identifier,
                path.as_deref(),
                batch_id,
            )
            .await?;
        pending.unit.forward(&mut self.connection).await?;
        self.history
            .set_status(&mut self.connection, &pending.identifier, Status::Completed)
            .await
    }

    /// Reverts a batch (the most recent completed one by default) and
    /// returns the identifiers whose reverse action ran.
    ///
    /// Records are processed newest first. Completed migrations run `down`;
    /// seeds and interrupted units are only reset. Every record of the batch
    /// ends up pending.
    pub async fn rollback(&mut self, batch: Option<i64>) -> Result<Vec<String>> {
        self.state = RunnerState::RollingBack;
        let result = self.rollback_batch(batch).await;
        self.state = RunnerState::Done;
        if let Err(e) = &result {
            error!(error = %e, "Rollback failed");
        }
        result
    }

    /// Reverts the most recent completed batch.
    pub async fn rollback_last_batch(&mut self) -> Result<Vec<String>> {
        self.rollback(None).await
    }

    async fn rollback_batch(&mut self, batch: Option<i64>) -> Result<Vec<String>> {
        if let Err(e) = self.history.check_exists(&mut self.connection).await {
            if !e.is_database() {
                return Err(e);
            }
            debug!(table = %self.history.table(), "Bookkeeping table not found");
            info!("Nothing to roll back");
            return Ok(Vec::new());
        }
        let batch_id = match batch {
            Some(batch_id) => batch_id,
            None => match self.history.last_batch(&mut self.connection).await {
                Ok(last) => last,
                Err(e) if e.is_database() => {
                    debug!(error = %e, "Last batch lookup failed");
                    0
                }
                Err(e) => return Err(e),
            },
        };
        if batch_id == 0 {
            info!("Nothing to roll back");
            return Ok(Vec::new());
        }

        let records = self
            .history
            .batch_records(&mut self.connection, batch_id)
            .await?;
        let mut reverted = Vec::new();
        for record in records {
            match record.status {
                Status::Pending => continue,
                Status::InProgress => {
                    warn!(identifier = %record.name, "Resetting interrupted unit");
                }
                Status::Completed => {
                    let unit = self.registry.resolve(&record.name)?;
                    if unit.kind() == UnitKind::Migration {
                        info!(identifier = %record.name, batch = batch_id, "Reverting unit");
                        unit.reverse(&record.name, &mut self.connection).await?;
                        reverted.push(record.name.clone());
                    } else {
                        debug!(identifier = %record.name, "Resetting seed");
                    }
                }
            }
            self.history
                .set_status(&mut self.connection, &record.name, Status::Pending)
                .await?;
        }

        info!(batch = batch_id, reverted = reverted.len(), "Rollback complete");
        Ok(reverted)
    }

    /// Writes the SQL that [`migrate`](Self::migrate) would run to a script
    /// in `dir` and returns its path. Bookkeeping is read but never written.
    pub async fn export(&mut self, dir: &Path, include_seeds: bool) -> Result<PathBuf> {
        let result = self.export_script(dir, include_seeds).await;
        self.state = RunnerState::Done;
        if let Err(e) = &result {
            error!(error = %e, "Export failed");
        }
        result
    }

    async fn export_script(&mut self, dir: &Path, include_seeds: bool) -> Result<PathBuf> {
        let pending = self.fetch(include_seeds).await?;
        self.state = RunnerState::Applying;

        let driver = self.connection.driver();
        let generated_at = Utc::now();
        let mut capture = CaptureExecutor::new(Executor::dialect(&self.connection));
        let mut script = String::new();
        script.push_str(&format!(
            "-- Generated by quarry-migrate {}\n",
            env!("CARGO_PKG_VERSION")
        ));
        script.push_str(&format!(
            "-- Generated at: {} UTC\n",
            generated_at.format("%Y-%m-%d %H:%M:%S")
        ));
        script.push_str(&format!("-- Driver: {driver}\n"));
        script.push('\n');

        for pending in &pending {
            if pending.unit.skip() {
                warn!(identifier = %pending.identifier, "Skipping unit");
                continue;
            }
            debug!(identifier = %pending.identifier, "Capturing unit");
            pending.unit.forward(&mut capture).await?;
            script.push_str(&format!("-- File: {}\n", pending.identifier));
            for statement in capture.take_statements() {
                script.push_str(&statement);
                script.push_str(";\n");
            }
            script.push('\n');
        }
        script.push_str("-- End of export\n");

        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "export_{}_{}.sql",
            driver.name(),
            generated_at.format("%Y%m%d%H%M%S")
        ));
        std::fs::write(&path, script)?;
        info!(path = %path.display(), units = pending.len(), "Export written");
        Ok(path)
    }

    /// Every registered unit with its recorded state, migrations first.
    pub async fn status(&mut self) -> Result<Vec<UnitStatus>> {
        self.state = RunnerState::Fetching;
        let fetcher = MigrationFetcher::new(&self.registry, &self.history);
        let applied = fetcher.applied(&mut self.connection).await;
        self.state = RunnerState::Done;
        let applied = applied?;

        let mut units: Vec<UnitStatus> = Vec::new();
        for identifier in self.registry.identifiers() {
            let kind = self.registry.resolve(&identifier)?.kind();
            let record = applied.iter().find(|r| r.name == identifier);
            units.push(UnitStatus {
                kind,
                status: record.map_or(Status::Pending, |r| r.status),
                batch_id: record.map(|r| r.batch_id),
                identifier,
            });
        }
        units.sort_by(|a, b| {
            (a.kind == UnitKind::Seed)
                .cmp(&(b.kind == UnitKind::Seed))
                .then_with(|| {
                    UnitIdentifier::parse(&a.identifier).cmp(&UnitIdentifier::parse(&b.identifier))
                })
        });
        Ok(units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_runner_is_idle() {
        let connection = Connection::new("sqlite::memory:").unwrap();
        let runner = Runner::new(connection, Registry::new()).bookkeeping_table("history");
        assert_eq!(runner.state(), RunnerState::Idle);
        assert_eq!(runner.history().table(), "history");
        assert!(runner.registry().is_empty());
    }

    #[tokio::test]
    async fn test_empty_registry_is_a_no_op() {
        let connection = Connection::new("sqlite::memory:").unwrap();
        let mut runner = Runner::new(connection, Registry::new());

        let report = runner.migrate().await.unwrap();
        assert!(report.is_empty());
        assert_eq!(report.batch_id, 0);
        assert_eq!(runner.state(), RunnerState::Done);

        // The bookkeeping table was never created.
        assert!(runner.connection().columns("migrations").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rollback_without_history_is_a_no_op() {
        let connection = Connection::new("sqlite::memory:").unwrap();
        let mut runner = Runner::new(connection, Registry::new());

        let reverted = runner.rollback_last_batch().await.unwrap();
        assert!(reverted.is_empty());
        assert_eq!(runner.state(), RunnerState::Done);

        let reverted = runner.rollback(Some(3)).await.unwrap();
        assert!(reverted.is_empty());

        // Rolling back never creates the bookkeeping table.
        assert!(runner.connection().columns("migrations").await.unwrap().is_empty());
    }
}
