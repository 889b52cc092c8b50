//! Column definitions.
//!
//! A [`ColumnDefinition`] is dialect-independent. Dialects translate its
//! [`ColumnType`] through their own type map when rendering DDL.

/// Generic column types. Dialects collapse variants they lack onto the
/// nearest native type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// 8-bit integer.
    TinyInteger,
    /// 16-bit integer.
    SmallInteger,
    /// 24-bit integer.
    MediumInteger,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInteger,
    /// Boolean.
    Boolean,
    /// Variable-length string (`VARCHAR`).
    String,
    /// Fixed-length string.
    Char,
    /// Short text.
    TinyText,
    /// Text.
    Text,
    /// Medium text.
    MediumText,
    /// Long text.
    LongText,
    /// Exact numeric with precision and scale.
    Numeric,
    /// Single precision float.
    Float,
    /// Double precision float.
    Double,
    /// Date only.
    Date,
    /// Time only.
    Time,
    /// Date and time.
    DateTime,
    /// Timestamp.
    Timestamp,
    /// JSON document.
    Json,
    /// Binary large object.
    Blob,
}

impl ColumnType {
    /// Whether this is one of the integer types.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::TinyInteger
                | Self::SmallInteger
                | Self::MediumInteger
                | Self::Integer
                | Self::BigInteger
        )
    }
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default.
    Boolean(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// Raw SQL expression (e.g., CURRENT_TIMESTAMP).
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL representation of the default value.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Boolean(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Expression(expr) => expr.clone(),
        }
    }
}

/// One column of a [`Blueprint`](super::Blueprint).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,
    /// Generic type.
    pub column_type: ColumnType,
    /// Length for string/char columns.
    pub length: Option<u32>,
    /// Precision for numeric columns.
    pub precision: Option<u8>,
    /// Scale for numeric columns.
    pub scale: Option<u8>,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Default value.
    pub default: Option<DefaultValue>,
    /// Whether the engine generates values.
    pub auto_increment: bool,
    /// Part of the primary key.
    pub primary: bool,
    /// Single-column unique constraint.
    pub unique: bool,
    /// Unsigned integer (ignored where unsupported).
    pub unsigned: bool,
}

impl ColumnDefinition {
    /// Creates a nullable column with no constraints.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            length: None,
            precision: None,
            scale: None,
            nullable: true,
            default: None,
            auto_increment: false,
            primary: false,
            unique: false,
            unsigned: false,
        }
    }

    /// The column added to tables that declare no primary key.
    #[must_use]
    pub fn implicit_primary_key(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Integer)
            .unsigned()
            .auto_increment()
            .primary()
    }

    /// Sets the length.
    #[must_use]
    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Sets precision and scale.
    #[must_use]
    pub fn precision(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column nullable (default).
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Marks the column auto-increment.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Marks the column as (part of) the primary key.
    #[must_use]
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self.nullable = false;
        self
    }

    /// Marks the column UNIQUE.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks an integer column unsigned.
    #[must_use]
    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    /// Whether the column is an auto-increment primary key.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.primary && self.auto_increment
    }
}

/// Creates an INTEGER column.
#[must_use]
pub fn integer(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::Integer)
}

/// Creates a TINYINT column.
#[must_use]
pub fn tiny_integer(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::TinyInteger)
}

/// Creates a SMALLINT column.
#[must_use]
pub fn small_integer(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::SmallInteger)
}

/// Creates a MEDIUMINT column.
#[must_use]
pub fn medium_integer(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::MediumInteger)
}

/// Creates a BIGINT column.
#[must_use]
pub fn big_integer(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::BigInteger)
}

/// Creates a BOOLEAN column.
#[must_use]
pub fn boolean(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::Boolean)
}

/// Creates a VARCHAR column.
#[must_use]
pub fn string(name: &str, length: u32) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::String).length(length)
}

/// Creates a CHAR column.
#[must_use]
pub fn char(name: &str, length: u32) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::Char).length(length)
}

/// Creates a TEXT column.
#[must_use]
pub fn text(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::Text)
}

/// Creates a LONGTEXT column.
#[must_use]
pub fn long_text(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::LongText)
}

/// Creates a DECIMAL/NUMERIC column.
#[must_use]
pub fn numeric(name: &str, precision: u8, scale: u8) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::Numeric).precision(precision, scale)
}

/// Creates a DOUBLE column.
#[must_use]
pub fn double(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::Double)
}

/// Creates a DATE column.
#[must_use]
pub fn date(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::Date)
}

/// Creates a DATETIME column.
#[must_use]
pub fn datetime(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::DateTime)
}

/// Creates a TIMESTAMP column.
#[must_use]
pub fn timestamp(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::Timestamp)
}

/// Creates a JSON column.
#[must_use]
pub fn json(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::Json)
}

/// Creates a BLOB column.
#[must_use]
pub fn blob(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::Blob)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_implies_not_null() {
        let col = integer("id").primary();
        assert!(col.primary);
        assert!(!col.nullable);
        assert!(!col.is_identity());
        assert!(col.auto_increment().is_identity());
    }

    #[test]
    fn test_implicit_primary_key() {
        let col = ColumnDefinition::implicit_primary_key("id");
        assert_eq!(col.column_type, ColumnType::Integer);
        assert!(col.unsigned && col.is_identity());
    }

    #[test]
    fn test_default_rendering() {
        assert_eq!(DefaultValue::String("it's".into()).to_sql(), "'it''s'");
        assert_eq!(DefaultValue::Boolean(false).to_sql(), "FALSE");
        assert_eq!(
            DefaultValue::Expression("CURRENT_TIMESTAMP".into()).to_sql(),
            "CURRENT_TIMESTAMP"
        );
    }
}
