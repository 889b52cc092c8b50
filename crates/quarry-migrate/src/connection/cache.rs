//! Per-connection cache of read results.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use quarry_core::SqlValue;

use super::driver::Driver;
use super::record::QueryResult;

const READ_VERBS: &[&str] = &[
    "SELECT", "SHOW", "DESCRIBE", "DESC", "EXPLAIN", "PRAGMA", "WITH",
];

/// Returns true if the statement's leading verb is a read.
#[must_use]
pub fn is_read_statement(sql: &str) -> bool {
    let verb: String = sql
        .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
        .chars()
        .take_while(char::is_ascii_alphabetic)
        .collect();
    READ_VERBS.iter().any(|v| v.eq_ignore_ascii_case(&verb))
}

/// Results of read statements, keyed by driver, SQL and bound values.
///
/// Any write that changes at least one row flushes the whole cache.
#[derive(Debug, Clone)]
pub struct QueryCache {
    enabled: bool,
    entries: HashMap<u64, QueryResult>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl QueryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: HashMap::new(),
        }
    }

    /// Computes the cache key of a positional statement.
    #[must_use]
    pub fn key(driver: Driver, sql: &str, values: &[SqlValue]) -> u64 {
        let mut hasher = DefaultHasher::new();
        driver.hash(&mut hasher);
        sql.hash(&mut hasher);
        for value in values {
            hash_value(value, &mut hasher);
        }
        hasher.finish()
    }

    /// Returns a cached result.
    #[must_use]
    pub fn get(&self, key: u64) -> Option<QueryResult> {
        if !self.enabled {
            return None;
        }
        self.entries.get(&key).cloned()
    }

    /// Stores a result. Does nothing when the cache is disabled.
    pub fn insert(&mut self, key: u64, result: QueryResult) {
        if self.enabled {
            self.entries.insert(key, result);
        }
    }

    /// Drops every entry.
    pub fn flush(&mut self) {
        self.entries.clear();
    }

    /// Turns the cache on or off. Turning it off flushes it.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.flush();
        }
    }

    /// Returns true if reads are being cached.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of cached results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn hash_value(value: &SqlValue, hasher: &mut DefaultHasher) {
    std::mem::discriminant(value).hash(hasher);
    match value {
        SqlValue::Null => {}
        SqlValue::Bool(b) => b.hash(hasher),
        SqlValue::Int(n) => n.hash(hasher),
        SqlValue::Float(f) => f.to_bits().hash(hasher),
        SqlValue::Text(s) => s.hash(hasher),
        SqlValue::Blob(b) => b.hash(hasher),
    }
}
