//! Row decoding into [`Value`]s.
//!
//! Decoding is two-phase:
//! 1. `TypeCategory` classifies the column's database type name
//! 2. A backend-specific decoder extracts the value with the matching Rust type

use crate::error::{DbError, DbResult};
use crate::models::{ConvertError, DatabaseType, Value};
use crate::scan::ResultSet;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column as _, Decode, Row, Type, TypeInfo};

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    DateTime,
    Date,
    Json,
    Uuid,
}

/// Classify a database type name into a logical category.
pub fn categorize_type(type_name: &str, db: DatabaseType) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Decimal/Numeric - check first as it overlaps with "numeric" in float checks
    if lower.contains("decimal") || lower.contains("numeric") {
        // SQLite's NUMERIC is actually a float
        if db == DatabaseType::SQLite && lower == "numeric" {
            return TypeCategory::Float;
        }
        return TypeCategory::Decimal;
    }

    if lower.starts_with("timestamp") || lower == "datetime" {
        return TypeCategory::DateTime;
    }
    if lower == "date" {
        return TypeCategory::Date;
    }

    if (lower.contains("int") && !lower.contains("interval") && !lower.contains("point"))
        || lower.contains("serial")
        || lower.contains("tiny")
    {
        return TypeCategory::Integer;
    }

    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    if lower.contains("float")
        || lower.contains("double")
        || lower == "real"
        || lower == "float4"
        || lower == "float8"
    {
        return TypeCategory::Float;
    }

    if lower == "json" || lower == "jsonb" {
        return TypeCategory::Json;
    }

    if lower == "uuid" {
        return TypeCategory::Uuid;
    }

    if lower.contains("blob") || lower.contains("binary") || lower == "bytea" {
        return TypeCategory::Binary;
    }

    // varchar, text, char, time, enum, NULL (SQLite expression columns) ...
    TypeCategory::Text
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// MySQL DECIMAL text, for values wider than `rust_decimal` can hold (up to 65 digits).
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

// =============================================================================
// Row Decoding
// =============================================================================

/// Convert a driver row into owned values.
pub trait DecodeRow {
    fn column_names(&self) -> Vec<String>;

    fn decode_values(&self) -> DbResult<Vec<Value>>;
}

/// Collect decoded rows. An empty result carries no column names.
pub fn into_result_set<R: DecodeRow>(rows: Vec<R>) -> DbResult<ResultSet> {
    let Some(first) = rows.first() else {
        return Ok(ResultSet::empty());
    };

    let columns = first.column_names();
    let values = rows
        .iter()
        .map(DecodeRow::decode_values)
        .collect::<DbResult<Vec<_>>>()?;
    Ok(ResultSet::new(columns, values))
}

fn column_name(row: &impl Row, idx: usize) -> String {
    row.columns()
        .get(idx)
        .map(|c| c.name().to_string())
        .unwrap_or_else(|| idx.to_string())
}

fn undecodable(row: &impl Row, idx: usize, type_name: &str) -> DbError {
    DbError::convert(
        column_name(row, idx),
        ConvertError::Undecodable {
            type_name: type_name.to_string(),
        },
    )
}

/// A value the driver recognized but could not represent (NUMERIC 'Infinity', 'NaN').
fn decode_failure(row: &impl Row, idx: usize, type_name: &str, err: sqlx::Error) -> DbError {
    let reason = match err {
        sqlx::Error::ColumnDecode { source, .. } => source.to_string(),
        other => other.to_string(),
    };
    DbError::convert(
        column_name(row, idx),
        ConvertError::Unrepresentable {
            type_name: type_name.to_string(),
            reason,
        },
    )
}

/// Exact decimal as text, keeping the column's scale.
fn decimal_text(d: Decimal) -> Value {
    Value::Text(d.to_string())
}

macro_rules! impl_decode_row {
    ($row:ty, $db:expr, $module:ident) => {
        impl DecodeRow for $row {
            fn column_names(&self) -> Vec<String> {
                self.columns().iter().map(|c| c.name().to_string()).collect()
            }

            fn decode_values(&self) -> DbResult<Vec<Value>> {
                self.columns()
                    .iter()
                    .enumerate()
                    .map(|(idx, col)| {
                        let type_name = col.type_info().name();
                        let category = categorize_type(type_name, $db);
                        $module::decode_column(self, idx, type_name, category)
                    })
                    .collect()
            }
        }
    };
}

impl_decode_row!(MySqlRow, DatabaseType::MySQL, mysql);
impl_decode_row!(PgRow, DatabaseType::PostgreSQL, postgres);
impl_decode_row!(SqliteRow, DatabaseType::SQLite, sqlite);

/// Try each Rust type in turn; NULL short-circuits to `Value::Null`.
macro_rules! try_cascade {
    ($row:expr, $idx:expr, $( $ty:ty => $wrap:expr ),+ $(,)?) => {{
        $(
            match $row.try_get::<Option<$ty>, _>($idx) {
                Ok(Some(v)) => return Ok($wrap(v)),
                Ok(None) => return Ok(Value::Null),
                Err(_) => {}
            }
        )+
    }};
}

// =============================================================================
// Database-Specific Decoders
// =============================================================================

mod mysql {
    use super::*;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

    pub fn decode_column(
        row: &MySqlRow,
        idx: usize,
        type_name: &str,
        category: TypeCategory,
    ) -> DbResult<Value> {
        match category {
            TypeCategory::Decimal => {
                try_cascade!(row, idx,
                    Decimal => decimal_text,
                    RawDecimal => |v: RawDecimal| Value::Text(v.0),
                );
            }
            TypeCategory::Integer => {
                // Widest first; BIGINT UNSIGNED only fits u64
                try_cascade!(row, idx,
                    i64 => Value::I64,
                    u64 => Value::U64,
                    bool => Value::Bool,
                );
            }
            TypeCategory::Boolean => {
                try_cascade!(row, idx, bool => Value::Bool, i8 => Value::I8);
            }
            TypeCategory::Float => {
                try_cascade!(row, idx, f64 => Value::F64, f32 => Value::F32);
            }
            TypeCategory::Binary => {
                try_cascade!(row, idx, Vec<u8> => Value::Bytes);
            }
            TypeCategory::DateTime => {
                try_cascade!(row, idx,
                    NaiveDateTime => Value::Timestamp,
                    DateTime<Utc> => |v: DateTime<Utc>| Value::Timestamp(v.naive_utc()),
                );
            }
            TypeCategory::Date => {
                try_cascade!(row, idx,
                    NaiveDate => |v: NaiveDate| Value::Timestamp(v.and_time(Default::default())),
                );
            }
            TypeCategory::Json => {
                try_cascade!(row, idx, serde_json::Value => |v: serde_json::Value| Value::Text(v.to_string()));
            }
            TypeCategory::Text | TypeCategory::Uuid => {}
        }

        // Anything else that is textual or binary in the wire protocol
        try_cascade!(row, idx,
            String => Value::Text,
            Vec<u8> => Value::Bytes,
        );
        Err(undecodable(row, idx, type_name))
    }
}

mod postgres {
    use super::*;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

    pub fn decode_column(
        row: &PgRow,
        idx: usize,
        type_name: &str,
        category: TypeCategory,
    ) -> DbResult<Value> {
        match category {
            TypeCategory::Decimal => {
                // NaN and the infinities have no exact decimal form
                return match row.try_get::<Option<Decimal>, _>(idx) {
                    Ok(v) => Ok(v.map_or(Value::Null, decimal_text)),
                    Err(e) => Err(decode_failure(row, idx, type_name, e)),
                };
            }
            TypeCategory::Integer => {
                try_cascade!(row, idx,
                    i16 => Value::I16,
                    i32 => Value::I32,
                    i64 => Value::I64,
                );
            }
            TypeCategory::Boolean => {
                try_cascade!(row, idx, bool => Value::Bool);
            }
            TypeCategory::Float => {
                try_cascade!(row, idx, f64 => Value::F64, f32 => Value::F32);
            }
            TypeCategory::Binary => {
                try_cascade!(row, idx, Vec<u8> => Value::Bytes);
            }
            TypeCategory::DateTime => {
                try_cascade!(row, idx,
                    NaiveDateTime => Value::Timestamp,
                    DateTime<Utc> => |v: DateTime<Utc>| Value::Timestamp(v.naive_utc()),
                );
            }
            TypeCategory::Date => {
                try_cascade!(row, idx,
                    NaiveDate => |v: NaiveDate| Value::Timestamp(v.and_time(Default::default())),
                );
            }
            TypeCategory::Json => {
                try_cascade!(row, idx, serde_json::Value => |v: serde_json::Value| Value::Text(v.to_string()));
            }
            TypeCategory::Uuid => {
                try_cascade!(row, idx, uuid::Uuid => |v: uuid::Uuid| Value::Text(v.to_string()));
            }
            TypeCategory::Text => {}
        }

        try_cascade!(row, idx, String => Value::Text);
        Err(undecodable(row, idx, type_name))
    }
}

mod sqlite {
    use super::*;

    pub fn decode_column(
        row: &SqliteRow,
        idx: usize,
        type_name: &str,
        category: TypeCategory,
    ) -> DbResult<Value> {
        match category {
            TypeCategory::Integer => {
                try_cascade!(row, idx, i64 => Value::I64);
            }
            TypeCategory::Boolean => {
                try_cascade!(row, idx, bool => Value::Bool);
            }
            TypeCategory::Float | TypeCategory::Decimal => {
                try_cascade!(row, idx, f64 => Value::F64);
            }
            TypeCategory::Binary => {
                try_cascade!(row, idx, Vec<u8> => Value::Bytes);
            }
            // Dates stay as text; column types parse them on demand
            _ => {}
        }

        // Dynamic typing: a TEXT-declared column may hold any storage class
        try_cascade!(row, idx,
            String => Value::Text,
            i64 => Value::I64,
            f64 => Value::F64,
            Vec<u8> => Value::Bytes,
        );
        Err(undecodable(row, idx, type_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_type_integer() {
        assert_eq!(
            categorize_type("INT", DatabaseType::MySQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("BIGINT", DatabaseType::PostgreSQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("TINYINT", DatabaseType::MySQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("SERIAL", DatabaseType::PostgreSQL),
            TypeCategory::Integer
        );
    }

    #[test]
    fn test_categorize_type_not_integer() {
        assert_eq!(
            categorize_type("INTERVAL", DatabaseType::PostgreSQL),
            TypeCategory::Text
        );
        assert_eq!(
            categorize_type("POINT", DatabaseType::PostgreSQL),
            TypeCategory::Text
        );
    }

    #[test]
    fn test_categorize_type_decimal() {
        assert_eq!(
            categorize_type("DECIMAL", DatabaseType::MySQL),
            TypeCategory::Decimal
        );
        assert_eq!(
            categorize_type("NUMERIC", DatabaseType::PostgreSQL),
            TypeCategory::Decimal
        );
        // SQLite NUMERIC is a float
        assert_eq!(
            categorize_type("numeric", DatabaseType::SQLite),
            TypeCategory::Float
        );
    }

    #[test]
    fn test_categorize_type_datetime() {
        assert_eq!(
            categorize_type("DATETIME", DatabaseType::MySQL),
            TypeCategory::DateTime
        );
        assert_eq!(
            categorize_type("TIMESTAMPTZ", DatabaseType::PostgreSQL),
            TypeCategory::DateTime
        );
        assert_eq!(
            categorize_type("DATE", DatabaseType::MySQL),
            TypeCategory::Date
        );
        assert_eq!(
            categorize_type("TIME", DatabaseType::MySQL),
            TypeCategory::Text
        );
    }

    #[test]
    fn test_categorize_type_json_and_uuid() {
        assert_eq!(
            categorize_type("jsonb", DatabaseType::PostgreSQL),
            TypeCategory::Json
        );
        assert_eq!(
            categorize_type("UUID", DatabaseType::PostgreSQL),
            TypeCategory::Uuid
        );
    }

    #[test]
    fn test_decimal_text_keeps_scale() {
        assert_eq!(
            decimal_text(Decimal::new(1200, 2)),
            Value::Text("12.00".to_string())
        );
        assert_eq!(
            decimal_text(Decimal::new(-5, 2)),
            Value::Text("-0.05".to_string())
        );
    }
}
