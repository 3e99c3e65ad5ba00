//! Parameter binding for database queries.
//!
//! Binds `Value` arguments to database-specific query objects. Each backend gets the
//! widest native type it supports; values with no lossless representation are rejected.

use crate::error::{DbError, DbResult};
use crate::models::{Value, ValueKind};
use sqlx::mysql::MySqlArguments;
use sqlx::postgres::PgArguments;
use sqlx::sqlite::SqliteArguments;
use sqlx::{MySql, Postgres, Sqlite};

fn unsigned_overflow(v: u64) -> DbError {
    DbError::invalid_input(format!(
        "argument {} exceeds the largest signed 64-bit integer the database accepts",
        v
    ))
}

/// Bind a NULL of `kind` with the matching SQL type. The numeric arms name the Rust
/// type per kind so backends without unsigned or single-byte types can widen.
macro_rules! bind_typed_null {
    ($query:expr, $kind:expr, {
        $( $k:ident => $ty:ty ),+ $(,)?
    }) => {
        match $kind {
            $( ValueKind::$k => $query.bind(None::<$ty>), )+
            ValueKind::Bool => $query.bind(None::<bool>),
            ValueKind::Text => $query.bind(None::<String>),
            ValueKind::Bytes => $query.bind(None::<Vec<u8>>),
            ValueKind::Timestamp => $query.bind(None::<chrono::NaiveDateTime>),
        }
    };
}

/// Bind a parameter to a MySQL query.
pub(crate) fn bind_mysql_param<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    param: &'q Value,
) -> DbResult<sqlx::query::Query<'q, MySql, MySqlArguments>> {
    Ok(match param {
        Value::Null => query.bind(None::<String>),
        Value::TypedNull(kind) => bind_typed_null!(query, kind, {
            I8 => i8, I16 => i16, I32 => i32, I64 => i64,
            U8 => u8, U16 => u16, U32 => u32, U64 => u64,
            F32 => f32, F64 => f64,
        }),
        Value::Bool(v) => query.bind(*v),
        Value::I8(v) => query.bind(*v),
        Value::I16(v) => query.bind(*v),
        Value::I32(v) => query.bind(*v),
        Value::I64(v) => query.bind(*v),
        Value::U8(v) => query.bind(*v),
        Value::U16(v) => query.bind(*v),
        Value::U32(v) => query.bind(*v),
        Value::U64(v) => query.bind(*v),
        Value::F32(v) => query.bind(*v),
        Value::F64(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
        Value::Timestamp(v) => query.bind(*v),
    })
}

/// Bind a parameter to a PostgreSQL query.
///
/// PostgreSQL has no unsigned or single-byte integer types; those widen to the next
/// signed type.
pub(crate) fn bind_postgres_param<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    param: &'q Value,
) -> DbResult<sqlx::query::Query<'q, Postgres, PgArguments>> {
    Ok(match param {
        // Untyped NULL goes out as TEXT; nullable columns send TypedNull instead
        Value::Null => query.bind(None::<String>),
        Value::TypedNull(kind) => bind_typed_null!(query, kind, {
            I8 => i16, I16 => i16, I32 => i32, I64 => i64,
            U8 => i16, U16 => i32, U32 => i64, U64 => i64,
            F32 => f32, F64 => f64,
        }),
        Value::Bool(v) => query.bind(*v),
        Value::I8(v) => query.bind(i16::from(*v)),
        Value::I16(v) => query.bind(*v),
        Value::I32(v) => query.bind(*v),
        Value::I64(v) => query.bind(*v),
        Value::U8(v) => query.bind(i16::from(*v)),
        Value::U16(v) => query.bind(i32::from(*v)),
        Value::U32(v) => query.bind(i64::from(*v)),
        Value::U64(v) => query.bind(i64::try_from(*v).map_err(|_| unsigned_overflow(*v))?),
        Value::F32(v) => query.bind(*v),
        Value::F64(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
        Value::Timestamp(v) => query.bind(*v),
    })
}

/// Bind a parameter to a SQLite query.
///
/// SQLite stores every integer as a signed 64-bit value.
pub(crate) fn bind_sqlite_param<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    param: &'q Value,
) -> DbResult<sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>> {
    Ok(match param {
        Value::Null => query.bind(None::<String>),
        Value::TypedNull(kind) => bind_typed_null!(query, kind, {
            I8 => i64, I16 => i64, I32 => i64, I64 => i64,
            U8 => i64, U16 => i64, U32 => i64, U64 => i64,
            F32 => f64, F64 => f64,
        }),
        Value::Bool(v) => query.bind(*v),
        Value::I8(v) => query.bind(i64::from(*v)),
        Value::I16(v) => query.bind(i64::from(*v)),
        Value::I32(v) => query.bind(i64::from(*v)),
        Value::I64(v) => query.bind(*v),
        Value::U8(v) => query.bind(i64::from(*v)),
        Value::U16(v) => query.bind(i64::from(*v)),
        Value::U32(v) => query.bind(i64::from(*v)),
        Value::U64(v) => query.bind(i64::try_from(*v).map_err(|_| unsigned_overflow(*v))?),
        Value::F32(v) => query.bind(f64::from(*v)),
        Value::F64(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
        Value::Timestamp(v) => query.bind(*v),
    })
}

/// Build a bound query from `sql` and `params` for one backend.
macro_rules! bind_all {
    ($bind:ident, $sql:expr, $params:expr) => {{
        let mut query = sqlx::query($sql);
        for param in $params {
            query = $crate::db::params::$bind(query, param)?;
        }
        query
    }};
}

pub(crate) use bind_all;
