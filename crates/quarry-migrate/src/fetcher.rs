//! Works out which units still need to run, and in what order.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::error::Result;
use crate::executor::Executor;
use crate::history::{MigrationHistory, MigrationRecord, Status};
use crate::unit::{stable_key, MigrationSource, MigrationUnit, Registry, UnitIdentifier, UnitKind};

/// A unit that has not been applied, ready to run.
#[derive(Debug)]
pub struct PendingUnit {
    /// The unit's identifier.
    pub identifier: String,
    /// SHA-256 hex of the identifier.
    pub key: String,
    /// The instantiated unit.
    pub unit: MigrationUnit,
    /// The existing bookkeeping record, if the unit was seen before.
    pub record: Option<MigrationRecord>,
}

impl PendingUnit {
    /// The unit's kind.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.unit.kind()
    }
}

/// Collects pending units from sources through a registry.
#[derive(Debug)]
pub struct MigrationFetcher<'a> {
    registry: &'a Registry,
    history: &'a MigrationHistory,
}

impl<'a> MigrationFetcher<'a> {
    /// Creates a fetcher.
    #[must_use]
    pub const fn new(registry: &'a Registry, history: &'a MigrationHistory) -> Self {
        Self { registry, history }
    }

    /// Lists the units that still need to run: migrations in order, then
    /// seeds in order when `include_seeds` is set.
    ///
    /// With `ignore_applied_state` the bookkeeping table is not consulted and
    /// every known unit is returned.
    pub async fn fetch(
        &self,
        db: &mut dyn Executor,
        sources: &[&dyn MigrationSource],
        include_seeds: bool,
        ignore_applied_state: bool,
    ) -> Result<Vec<PendingUnit>> {
        let applied = if ignore_applied_state {
            Vec::new()
        } else {
            self.applied(db).await?
        };
        let identifiers: Vec<String> = sources.iter().flat_map(|s| s.identifiers()).collect();
        Ok(select_pending(
            self.registry,
            &identifiers,
            &applied,
            include_seeds,
        ))
    }

    /// All bookkeeping records. A missing table means nothing was applied.
    pub async fn applied(&self, db: &mut dyn Executor) -> Result<Vec<MigrationRecord>> {
        if let Err(e) = self.history.check_exists(db).await {
            if e.is_database() {
                debug!(table = %self.history.table(), "Bookkeeping table not found");
                return Ok(Vec::new());
            }
            return Err(e);
        }
        self.history.records(db).await
    }
}

/// Resolves, filters and orders identifiers. Unknown identifiers are logged
/// and dropped; duplicates collapse.
#[must_use]
pub fn select_pending(
    registry: &Registry,
    identifiers: &[String],
    applied: &[MigrationRecord],
    include_seeds: bool,
) -> Vec<PendingUnit> {
    let by_key: HashMap<String, &MigrationRecord> =
        applied.iter().map(|r| (r.key(), r)).collect();

    let mut migrations = Vec::new();
    let mut seeds = Vec::new();
    let unique: BTreeSet<&String> = identifiers.iter().collect();
    for identifier in unique {
        let unit = match registry.resolve(identifier) {
            Ok(unit) => unit,
            Err(e) => {
                warn!(identifier = %identifier, error = %e, "Skipping unresolvable unit");
                continue;
            }
        };
        if unit.kind() == UnitKind::Seed && !include_seeds {
            continue;
        }
        let key = stable_key(identifier);
        let record = by_key.get(&key).map(|r| (*r).clone());
        if record.as_ref().is_some_and(|r| r.status == Status::Completed) {
            continue;
        }
        let pending = PendingUnit {
            identifier: identifier.clone(),
            key,
            unit,
            record,
        };
        match pending.kind() {
            UnitKind::Migration => migrations.push(pending),
            UnitKind::Seed => seeds.push(pending),
        }
    }

    let order = |a: &PendingUnit, b: &PendingUnit| {
        UnitIdentifier::parse(&a.identifier).cmp(&UnitIdentifier::parse(&b.identifier))
    };
    migrations.sort_by(order);
    seeds.sort_by(order);
    migrations.extend(seeds);
    migrations
}
