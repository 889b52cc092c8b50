//! Dialect that renders nothing.

use super::Dialect;

/// Every render verb yields an empty [`Query`](crate::Query).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDialect;

impl NullDialect {
    /// Creates a new null dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for NullDialect {
    fn name(&self) -> &'static str {
        "null"
    }
}
