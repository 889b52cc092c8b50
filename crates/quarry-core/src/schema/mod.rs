//! Dialect-independent schema description: blueprints, columns and keys.

mod blueprint;
mod column;
mod key;

pub use blueprint::Blueprint;
pub use column::{
    big_integer, blob, boolean, char, date, datetime, double, integer, json, long_text,
    medium_integer, numeric, small_integer, string, text, timestamp, tiny_integer,
    ColumnDefinition, ColumnType, DefaultValue,
};
pub use key::{ForeignKeyAction, ForeignReference, Key};
