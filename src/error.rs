//! Error types for db-record.
//!
//! All fallible operations return [`DbResult`]. Configuration mistakes (bad
//! tags, ambiguous dialects) are reported before any statement reaches the
//! database; engine failures are wrapped with the statement that caused them.

use crate::models::ConvertError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// A single-row query matched nothing.
    #[error("no rows in result set")]
    NoRows,

    #[error("type {type_name} has no mappable fields")]
    NoMappableFields { type_name: &'static str },

    #[error("at most one dialect override is accepted, got {count}")]
    AmbiguousDialect { count: usize },

    #[error("auto-increment field '{field}' has unsupported kind {kind}, expected an integer")]
    UnsupportedAutoIncrement { field: String, kind: String },

    #[error("duplicate column '{name}' in result row")]
    DuplicateColumn { name: String },

    #[error("cannot convert column '{column}': {source}")]
    Convert {
        column: String,
        #[source]
        source: ConvertError,
    },

    #[error("{source} (statement: {statement}, args: {args})")]
    Statement {
        statement: String,
        args: String,
        #[source]
        source: Box<DbError>,
    },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u32,
    },

    #[error("Connection not found: {connection_id}")]
    ConnectionNotFound { connection_id: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    pub fn database(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, elapsed_secs: u32) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    pub fn connection_not_found(connection_id: impl Into<String>) -> Self {
        Self::ConnectionNotFound {
            connection_id: connection_id.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn convert(column: impl Into<String>, source: ConvertError) -> Self {
        Self::Convert {
            column: column.into(),
            source,
        }
    }

    /// Attach the statement and its rendered arguments to an engine error.
    ///
    /// `NoRows` is passed through untouched so callers can keep matching on it.
    pub fn with_statement(self, statement: &str, args: &[crate::Value]) -> Self {
        match self {
            Self::NoRows | Self::Statement { .. } => self,
            other => Self::Statement {
                statement: statement.to_string(),
                args: crate::models::render_args(args),
                source: Box::new(other),
            },
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Database { suggestion, .. } => Some(suggestion),
            Self::Statement { source, .. } => source.suggestion(),
            Self::NoMappableFields { .. } => {
                Some("Add at least one field without the \"-\" tag, or embed a record that has one")
            }
            Self::AmbiguousDialect { .. } => Some("Pass zero or one dialect override"),
            Self::UnsupportedAutoIncrement { .. } => {
                Some("Only integer fields can carry the auto_increment option")
            }
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection { .. } | Self::Timeout { .. } => true,
            Self::Statement { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// True for the "nothing matched" signal of single-row queries.
    pub fn is_no_rows(&self) -> bool {
        matches!(self, Self::NoRows)
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NoRows,
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::database(
                    db_err.message(),
                    code,
                    "Check the SQL syntax and referenced objects",
                )
            }
            sqlx::Error::PoolTimedOut => DbError::timeout("connection pool acquire", 30),
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "Reconnect to the database")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::invalid_input(format!("Column not found: {}", col))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => DbError::internal(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

impl From<toml::de::Error> for DbError {
    fn from(err: toml::de::Error) -> Self {
        DbError::config(err.to_string())
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
