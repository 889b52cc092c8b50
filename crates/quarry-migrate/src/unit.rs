//! Migration units, the registry that builds them, and identifier parsing.
//!
//! Units are addressed by opaque identifiers. The conventional form is
//!
//! ```text
//! <prefix>_<YYYY_MM_DD>_<Name>_<epoch>[.<ext>]
//! ```
//!
//! e.g. `migration_2024_03_01_CreateUsers_1709251200.rs`. The date and epoch
//! tokens determine apply order; anything else still works but sorts last.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::{MigrateError, Result};
use crate::executor::Executor;

/// A reversible schema change.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Applies the change.
    async fn up(&self, db: &mut dyn Executor) -> Result<()>;

    /// Reverts what [`up`](Migration::up) did.
    async fn down(&self, db: &mut dyn Executor) -> Result<()>;

    /// When true, the runner logs the unit and leaves it untouched.
    fn skip(&self) -> bool {
        false
    }
}

/// A one-way data load. Seeds are never reverted, only marked pending again.
#[async_trait]
pub trait Seed: Send + Sync {
    /// Loads the data.
    async fn run(&self, db: &mut dyn Executor) -> Result<()>;

    /// When true, the runner logs the unit and leaves it untouched.
    fn skip(&self) -> bool {
        false
    }
}

/// Whether a unit is a migration or a seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// A [`Migration`].
    Migration,
    /// A [`Seed`].
    Seed,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Migration => write!(f, "migration"),
            Self::Seed => write!(f, "seed"),
        }
    }
}

/// An instantiated unit.
pub enum MigrationUnit {
    /// A reversible migration.
    Migration(Box<dyn Migration>),
    /// A seed.
    Seed(Box<dyn Seed>),
}

impl fmt::Debug for MigrationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MigrationUnit").field(&self.kind()).finish()
    }
}

impl MigrationUnit {
    /// The unit's kind.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        match self {
            Self::Migration(_) => UnitKind::Migration,
            Self::Seed(_) => UnitKind::Seed,
        }
    }

    /// The unit's skip flag.
    #[must_use]
    pub fn skip(&self) -> bool {
        match self {
            Self::Migration(m) => m.skip(),
            Self::Seed(s) => s.skip(),
        }
    }

    /// Runs `up` or `run`.
    pub async fn forward(&self, db: &mut dyn Executor) -> Result<()> {
        match self {
            Self::Migration(m) => m.up(db).await,
            Self::Seed(s) => s.run(db).await,
        }
    }

    /// Runs `down`. Seeds have no reverse action.
    pub async fn reverse(&self, identifier: &str, db: &mut dyn Executor) -> Result<()> {
        match self {
            Self::Migration(m) => m.down(db).await,
            Self::Seed(_) => Err(MigrateError::NotReversible(identifier.to_string())),
        }
    }
}

/// Anything that can list unit identifiers.
pub trait MigrationSource {
    /// The identifiers this source knows about, in any order.
    fn identifiers(&self) -> Vec<String>;
}

impl MigrationSource for Vec<String> {
    fn identifiers(&self) -> Vec<String> {
        self.clone()
    }
}

impl<const N: usize> MigrationSource for [&str; N] {
    fn identifiers(&self) -> Vec<String> {
        self.iter().map(|s| (*s).to_string()).collect()
    }
}

type Constructor = Box<dyn Fn() -> MigrationUnit + Send + Sync>;

/// Maps identifiers to unit constructors.
///
/// ```
/// use quarry_migrate::{Executor, Migration, Registry, Result};
///
/// struct CreateUsers;
///
/// #[async_trait::async_trait]
/// impl Migration for CreateUsers {
///     async fn up(&self, db: &mut dyn Executor) -> Result<()> {
///         let query = db.builder().table("users").drop_table_if_exists().build();
///         db.execute(query).await.map(|_| ())
///     }
///
///     async fn down(&self, _db: &mut dyn Executor) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// let registry = Registry::new()
///     .with_migration("migration_2024_03_01_CreateUsers_1709251200", || CreateUsers);
/// assert!(registry.contains("migration_2024_03_01_CreateUsers_1709251200"));
/// ```
#[derive(Default)]
pub struct Registry {
    constructors: BTreeMap<String, Constructor>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a migration constructor.
    pub fn register_migration<M, F>(&mut self, identifier: &str, factory: F)
    where
        M: Migration + 'static,
        F: Fn() -> M + Send + Sync + 'static,
    {
        self.constructors.insert(
            identifier.to_string(),
            Box::new(move || MigrationUnit::Migration(Box::new(factory()))),
        );
    }

    /// Registers a seed constructor.
    pub fn register_seed<S, F>(&mut self, identifier: &str, factory: F)
    where
        S: Seed + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        self.constructors.insert(
            identifier.to_string(),
            Box::new(move || MigrationUnit::Seed(Box::new(factory()))),
        );
    }

    /// Builder form of [`register_migration`](Self::register_migration).
    #[must_use]
    pub fn with_migration<M, F>(mut self, identifier: &str, factory: F) -> Self
    where
        M: Migration + 'static,
        F: Fn() -> M + Send + Sync + 'static,
    {
        self.register_migration(identifier, factory);
        self
    }

    /// Builder form of [`register_seed`](Self::register_seed).
    #[must_use]
    pub fn with_seed<S, F>(mut self, identifier: &str, factory: F) -> Self
    where
        S: Seed + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        self.register_seed(identifier, factory);
        self
    }

    /// Instantiates the unit registered under `identifier`.
    pub fn resolve(&self, identifier: &str) -> Result<MigrationUnit> {
        self.constructors
            .get(identifier)
            .map(|make| make())
            .ok_or_else(|| MigrateError::UnknownUnit(identifier.to_string()))
    }

    /// Returns true if `identifier` is registered.
    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.constructors.contains_key(identifier)
    }

    /// Number of registered units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl MigrationSource for Registry {
    fn identifiers(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }
}

/// SHA-256 of an identifier as lowercase hex. Applied records are matched
/// to units through this key.
#[must_use]
pub fn stable_key(identifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identifier.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?P<prefix>[^_]+)_(?P<date>\d{4}_\d{2}_\d{2}|\d{8})_(?P<name>.+)_(?P<epoch>\d+)(?:\.[A-Za-z0-9]+)?$",
        )
        .unwrap_or_else(|e| unreachable!("identifier pattern is valid: {e}"))
    })
}

/// The ordering tokens of an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitIdentifier {
    raw: String,
    date: Option<NaiveDate>,
    name: Option<String>,
    epoch: Option<i64>,
}

impl UnitIdentifier {
    /// Parses `identifier`. Identifiers that do not follow the conventional
    /// form keep only their raw text.
    #[must_use]
    pub fn parse(identifier: &str) -> Self {
        let untokenized = Self {
            raw: identifier.to_string(),
            date: None,
            name: None,
            epoch: None,
        };
        let Some(caps) = identifier_pattern().captures(identifier) else {
            return untokenized;
        };
        let digits: String = caps["date"].chars().filter(char::is_ascii_digit).collect();
        let date = NaiveDate::parse_from_str(&digits, "%Y%m%d").ok();
        let epoch = caps["epoch"].parse::<i64>().ok();
        match (date, epoch) {
            (Some(date), Some(epoch)) => Self {
                raw: identifier.to_string(),
                date: Some(date),
                name: Some(caps["name"].to_string()),
                epoch: Some(epoch),
            },
            _ => untokenized,
        }
    }

    /// The identifier as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The date token.
    #[must_use]
    pub const fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// The name token.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The epoch token.
    #[must_use]
    pub const fn epoch(&self) -> Option<i64> {
        self.epoch
    }

    /// Returns true if the date and epoch tokens were found.
    #[must_use]
    pub const fn is_tokenized(&self) -> bool {
        self.date.is_some()
    }
}

impl Ord for UnitIdentifier {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.date, other.date) {
            (Some(a), Some(b)) => a
                .cmp(&b)
                .then(self.epoch.cmp(&other.epoch))
                .then_with(|| self.raw.cmp(&other.raw)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.raw.cmp(&other.raw),
        }
    }
}

impl PartialOrd for UnitIdentifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
