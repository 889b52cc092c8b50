//! End-to-end runner tests against in-memory SQLite.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use quarry_core::schema::{string, Blueprint};
use quarry_core::SqlValue;
use quarry_migrate::{
    Connection, Executor, MigrateError, Migration, MigrationFetcher, MigrationHistory,
    MigrationSource, Registry, Result, Runner, RunnerState, Seed, Status, UnitKind,
};

const FIRST: &str = "migration_2024_01_01_CreateFirst_1704067200";
const SECOND: &str = "migration_2024_02_01_CreateSecond_1706745600";
const THIRD: &str = "migration_2024_03_01_CreateThird_1709251200";
const SEED: &str = "seed_2023_12_31_Fixtures_1703980800";

struct TableMigration {
    table: &'static str,
    fail: Arc<AtomicBool>,
    skip: Arc<AtomicBool>,
}

#[async_trait]
impl Migration for TableMigration {
    async fn up(&self, db: &mut dyn Executor) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            let query = db
                .builder()
                .raw("INSERT INTO missing_table (x) VALUES (1)", Vec::new())
                .build();
            db.execute(query).await?;
            return Ok(());
        }
        let blueprint = Blueprint::new(self.table).column(string("label", 50));
        let query = db.builder().create_table(blueprint).build();
        db.execute(query).await?;
        Ok(())
    }

    async fn down(&self, db: &mut dyn Executor) -> Result<()> {
        let query = db.builder().table(self.table).drop_table().build();
        db.execute(query).await?;
        Ok(())
    }

    fn skip(&self) -> bool {
        self.skip.load(Ordering::SeqCst)
    }
}

struct Fixtures;

#[async_trait]
impl Seed for Fixtures {
    async fn run(&self, db: &mut dyn Executor) -> Result<()> {
        let query = db
            .builder()
            .table("first")
            .insert([("label", SqlValue::Text("seeded".into()))])
            .build();
        db.execute(query).await?;
        Ok(())
    }
}

/// Switches that tests flip to change unit behavior between runs.
#[derive(Default, Clone)]
struct Switches {
    third_fails: Arc<AtomicBool>,
    third_skipped: Arc<AtomicBool>,
}

fn registry(switches: &Switches) -> Registry {
    let never = Arc::new(AtomicBool::new(false));
    let (n1, n2, n3, n4) = (never.clone(), never.clone(), never.clone(), never);
    let fail = switches.third_fails.clone();
    let skip = switches.third_skipped.clone();

    // Registered out of order on purpose.
    Registry::new()
        .with_seed(SEED, || Fixtures)
        .with_migration(THIRD, move || TableMigration {
            table: "third",
            fail: fail.clone(),
            skip: skip.clone(),
        })
        .with_migration(SECOND, move || TableMigration {
            table: "second",
            fail: n1.clone(),
            skip: n2.clone(),
        })
        .with_migration(FIRST, move || TableMigration {
            table: "first",
            fail: n3.clone(),
            skip: n4.clone(),
        })
}

fn runner(switches: &Switches) -> Runner {
    let connection = Connection::new("sqlite::memory:").expect("Failed to create connection");
    Runner::new(connection, registry(switches))
}

async fn table_exists(runner: &mut Runner, table: &str) -> bool {
    !runner
        .connection()
        .columns(table)
        .await
        .expect("Failed to list columns")
        .is_empty()
}

async fn statuses(runner: &mut Runner) -> Vec<(String, Status)> {
    let history = runner.history().clone();
    history
        .records(runner.connection())
        .await
        .expect("Failed to read history")
        .into_iter()
        .map(|r| (r.name, r.status))
        .collect()
}

// =============================================================================
// Fetching
// =============================================================================

#[tokio::test]
async fn test_fetch_orders_migrations_then_seeds() {
    let registry = registry(&Switches::default());
    let history = MigrationHistory::new("migrations");
    let mut conn = Connection::new("sqlite::memory:").unwrap();

    let sources: [&dyn MigrationSource; 1] = [&registry];
    let pending = MigrationFetcher::new(&registry, &history)
        .fetch(&mut conn, &sources, true, false)
        .await
        .unwrap();

    let order: Vec<(&str, UnitKind)> = pending
        .iter()
        .map(|p| (p.identifier.as_str(), p.kind()))
        .collect();
    assert_eq!(
        order,
        vec![
            (FIRST, UnitKind::Migration),
            (SECOND, UnitKind::Migration),
            (THIRD, UnitKind::Migration),
            (SEED, UnitKind::Seed),
        ]
    );
}

#[tokio::test]
async fn test_fetch_ignoring_applied_state_returns_every_unit() {
    let mut runner = runner(&Switches::default()).include_seeds(true);
    runner.migrate().await.unwrap();

    let registry = registry(&Switches::default());
    let history = runner.history().clone();
    let sources: [&dyn MigrationSource; 1] = [&registry];
    let fetcher = MigrationFetcher::new(&registry, &history);

    let pending = fetcher
        .fetch(runner.connection(), &sources, true, false)
        .await
        .unwrap();
    assert!(pending.is_empty());

    let all: Vec<String> = fetcher
        .fetch(runner.connection(), &sources, true, true)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.identifier)
        .collect();
    assert_eq!(all, vec![FIRST, SECOND, THIRD, SEED]);
    assert!(all_unrecorded(&fetcher, runner.connection(), &sources).await);
}

/// A bookkeeping table with the wrong shape fails every history read, so a
/// fetch that succeeds against it never touched it.
async fn all_unrecorded(
    fetcher: &MigrationFetcher<'_>,
    conn: &mut Connection,
    sources: &[&dyn MigrationSource],
) -> bool {
    // DDL reports no affected rows, so earlier cached reads would survive it.
    conn.set_cache_enabled(false);
    conn.query("DROP TABLE migrations", &[]).await.unwrap();
    conn.query("CREATE TABLE migrations (unrelated INTEGER)", &[])
        .await
        .unwrap();

    let err = fetcher.fetch(&mut *conn, sources, true, false).await.unwrap_err();
    assert!(err.is_database());

    let pending = fetcher.fetch(&mut *conn, sources, true, true).await.unwrap();
    pending.iter().all(|p| p.record.is_none()) && pending.len() == 4
}

// =============================================================================
// Migrate / rollback
// =============================================================================

#[tokio::test]
async fn test_migrate_applies_everything_in_one_batch() {
    let mut runner = runner(&Switches::default()).include_seeds(true);

    let report = runner.migrate().await.unwrap();
    assert_eq!(report.batch_id, 1);
    assert_eq!(report.applied, vec![FIRST, SECOND, THIRD, SEED]);
    assert_eq!(runner.state(), RunnerState::Done);

    assert!(table_exists(&mut runner, "third").await);
    let seeded = runner
        .connection()
        .query("SELECT label FROM first", &[])
        .await
        .unwrap();
    assert_eq!(seeded.first().and_then(|r| r.get_str("label")), Some("seeded"));

    assert!(statuses(&mut runner)
        .await
        .iter()
        .all(|(_, status)| *status == Status::Completed));

    // Nothing left to do.
    let again = runner.migrate().await.unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn test_failing_unit_reverts_batch_and_rerun_retries_all() {
    let switches = Switches::default();
    switches.third_fails.store(true, Ordering::SeqCst);
    let mut runner = runner(&switches);

    let err = runner.migrate().await.unwrap_err();
    match &err {
        MigrateError::UnitFailed { identifier, source } => {
            assert_eq!(identifier, THIRD);
            assert!(source.is_database());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(runner.state(), RunnerState::Done);

    assert!(!table_exists(&mut runner, "first").await);
    assert!(!table_exists(&mut runner, "second").await);
    assert_eq!(
        statuses(&mut runner).await,
        vec![
            (FIRST.to_string(), Status::Pending),
            (SECOND.to_string(), Status::Pending),
            (THIRD.to_string(), Status::Pending),
        ]
    );

    switches.third_fails.store(false, Ordering::SeqCst);
    let report = runner.migrate().await.unwrap();
    assert_eq!(report.applied, vec![FIRST, SECOND, THIRD]);
    assert_eq!(report.batch_id, 1);
    assert!(table_exists(&mut runner, "first").await);
    assert!(table_exists(&mut runner, "third").await);
}

#[tokio::test]
async fn test_batches_increase_and_rollback_reverts_only_the_last() {
    let switches = Switches::default();
    switches.third_skipped.store(true, Ordering::SeqCst);
    let mut runner = runner(&switches);

    let first = runner.migrate().await.unwrap();
    assert_eq!(first.batch_id, 1);
    assert_eq!(first.applied, vec![FIRST, SECOND]);
    assert_eq!(first.skipped, vec![THIRD]);
    assert!(!table_exists(&mut runner, "third").await);

    switches.third_skipped.store(false, Ordering::SeqCst);
    let second = runner.migrate().await.unwrap();
    assert_eq!(second.batch_id, 2);
    assert_eq!(second.applied, vec![THIRD]);

    let reverted = runner.rollback_last_batch().await.unwrap();
    assert_eq!(reverted, vec![THIRD]);
    assert!(!table_exists(&mut runner, "third").await);
    assert!(table_exists(&mut runner, "second").await);

    let reverted = runner.rollback(Some(1)).await.unwrap();
    assert_eq!(reverted, vec![SECOND, FIRST]);
    assert!(!table_exists(&mut runner, "first").await);
}

#[tokio::test]
async fn test_rollback_resets_seeds_without_reverting() {
    let mut runner = runner(&Switches::default()).include_seeds(true);
    runner.migrate().await.unwrap();

    let reverted = runner.rollback_last_batch().await.unwrap();
    assert_eq!(reverted, vec![THIRD, SECOND, FIRST]);
    assert!(statuses(&mut runner)
        .await
        .iter()
        .all(|(_, status)| *status == Status::Pending));
}

#[tokio::test]
async fn test_status_lists_every_unit() {
    let mut runner = runner(&Switches::default());
    runner.migrate().await.unwrap();

    let units = runner.status().await.unwrap();
    let summary: Vec<(&str, Status, Option<i64>)> = units
        .iter()
        .map(|u| (u.identifier.as_str(), u.status, u.batch_id))
        .collect();
    assert_eq!(
        summary,
        vec![
            (FIRST, Status::Completed, Some(1)),
            (SECOND, Status::Completed, Some(1)),
            (THIRD, Status::Completed, Some(1)),
            (SEED, Status::Pending, None),
        ]
    );
}

// =============================================================================
// Export
// =============================================================================

#[tokio::test]
async fn test_export_writes_script_without_bookkeeping() {
    let dir = tempfile::tempdir().unwrap();
    let switches = Switches::default();
    switches.third_skipped.store(true, Ordering::SeqCst);
    let mut runner = runner(&switches);

    let path = runner.export(dir.path(), true).await.unwrap();

    let file_name = path.file_name().unwrap().to_str().unwrap();
    assert!(file_name.starts_with("export_sqlite_"));
    assert!(file_name.ends_with(".sql"));

    let script = std::fs::read_to_string(&path).unwrap();
    assert!(script.starts_with("-- Generated by quarry-migrate"));
    assert!(script.contains("-- Driver: sqlite\n"));
    let files: Vec<&str> = script
        .lines()
        .filter(|l| l.starts_with("-- File: "))
        .collect();
    assert_eq!(
        files,
        vec![
            format!("-- File: {FIRST}"),
            format!("-- File: {SECOND}"),
            format!("-- File: {SEED}"),
        ]
    );
    assert!(script.contains("CREATE TABLE \"first\" (\n"));
    assert!(script.contains("INSERT INTO \"first\" (\"label\") VALUES ('seeded');\n"));
    assert!(script.ends_with("-- End of export\n"));

    // Nothing was executed and nothing was recorded.
    assert!(!table_exists(&mut runner, "first").await);
    assert!(!table_exists(&mut runner, "migrations").await);
}
