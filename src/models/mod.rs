//! Data models shared across the crate.

pub mod connection;
pub mod value;

pub use connection::{ConnectionConfig, ConnectionConfigError, DatabaseType};
pub use value::{ConvertError, Value, ValueKind, format_timestamp, parse_timestamp, render_args};
