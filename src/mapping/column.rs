//! Leaf column types and their conversions to and from [`Value`].

use crate::models::{ConvertError, Value, ValueKind, format_timestamp};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::ops::Deref;

/// Produce a bind value. Object safe so records can hand out `&dyn ToValue`.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// A type stored in exactly one column.
pub trait Column: ToValue + Sized {
    /// Kind of the non-null value.
    fn kind() -> ValueKind;

    fn from_value(value: Value) -> Result<Self, ConvertError>;
}

/// A destination a decoded column value can be written into.
pub trait ScanTarget {
    fn set_value(&mut self, value: Value) -> Result<(), ConvertError>;
}

impl<T: Column> ScanTarget for T {
    fn set_value(&mut self, value: Value) -> Result<(), ConvertError> {
        *self = T::from_value(value)?;
        Ok(())
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

macro_rules! integer_column {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::$variant(*self)
                }
            }

            impl Column for $ty {
                fn kind() -> ValueKind {
                    ValueKind::$variant
                }

                fn from_value(value: Value) -> Result<Self, ConvertError> {
                    value.to_integer(ValueKind::$variant)
                }
            }
        )+
    };
}

integer_column! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::F32(*self)
    }
}

impl Column for f32 {
    fn kind() -> ValueKind {
        ValueKind::F32
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::F32(v) => Ok(v),
            other => other.to_float(ValueKind::F32).map(|v| v as f32),
        }
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::F64(*self)
    }
}

impl Column for f64 {
    fn kind() -> ValueKind {
        ValueKind::F64
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        value.to_float(ValueKind::F64)
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl Column for bool {
    fn kind() -> ValueKind {
        ValueKind::Bool
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        let expected = ValueKind::Bool;
        match value {
            Value::Bool(v) => Ok(v),
            Value::Null | Value::TypedNull(_) => Err(ConvertError::UnexpectedNull { expected }),
            Value::Text(s) => parse_bool(&s).ok_or(ConvertError::Parse { expected, value: s }),
            Value::Bytes(b) => {
                let s = String::from_utf8_lossy(&b).into_owned();
                parse_bool(&s).ok_or(ConvertError::Parse { expected, value: s })
            }
            other => other.as_i128().map(|v| v != 0).ok_or(ConvertError::Mismatch {
                expected,
                found: other.type_name(),
            }),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl Column for String {
    fn kind() -> ValueKind {
        ValueKind::Text
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Null | Value::TypedNull(_) => Err(ConvertError::UnexpectedNull {
                expected: ValueKind::Text,
            }),
            other => Ok(coerce_text(other)),
        }
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

impl Column for Vec<u8> {
    fn kind() -> ValueKind {
        ValueKind::Bytes
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            Value::Null | Value::TypedNull(_) => Err(ConvertError::UnexpectedNull {
                expected: ValueKind::Bytes,
            }),
            other => Err(ConvertError::Mismatch {
                expected: ValueKind::Bytes,
                found: other.type_name(),
            }),
        }
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }
}

impl Column for NaiveDateTime {
    fn kind() -> ValueKind {
        ValueKind::Timestamp
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        value.to_timestamp()
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self) -> Value {
        Value::Timestamp(self.naive_utc())
    }
}

impl Column for DateTime<Utc> {
    fn kind() -> ValueKind {
        ValueKind::Timestamp
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        value.to_timestamp().map(|ts| ts.and_utc())
    }
}

/// Nullable column: NULL maps to `None`. `None` binds as a NULL of `T`'s kind.
impl<T: Column> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::TypedNull(T::kind()),
        }
    }
}

impl<T: Column> Column for Option<T> {
    fn kind() -> ValueKind {
        T::kind()
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            v if v.is_null() => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// A string-coerced cell for ad hoc queries. NULL reads as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Cell(String);

impl Cell {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for Cell {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        match value {
            Value::Null | Value::TypedNull(_) => Self::default(),
            other => Self(coerce_text(other)),
        }
    }
}

impl PartialEq<str> for Cell {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Cell {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl ToValue for Cell {
    fn to_value(&self) -> Value {
        Value::Text(self.0.clone())
    }
}

impl Column for Cell {
    fn kind() -> ValueKind {
        ValueKind::Text
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        Ok(Self::from(value))
    }
}

fn coerce_text(value: Value) -> String {
    match value {
        Value::Null | Value::TypedNull(_) => String::new(),
        Value::Text(s) => s,
        Value::Bytes(b) => String::from_utf8(b)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()),
        Value::Timestamp(ts) => format_timestamp(&ts),
        other => other.to_string(),
    }
}

// Scalar destination elements. `Arc<T>` cannot be implemented for column types
// outside this crate, so the built-ins get it here.
macro_rules! scalar_elements {
    ($($ty:ty),+ $(,)?) => {
        $(
            crate::impl_element!($ty, Option<$ty>);

            impl crate::mapping::Element for std::sync::Arc<$ty> {
                type Inner = $ty;

                fn wrap(inner: $ty) -> Self {
                    std::sync::Arc::new(inner)
                }
            }
        )+
    };
}

scalar_elements!(
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    bool,
    String,
    Vec<u8>,
    NaiveDateTime,
    DateTime<Utc>,
    Cell,
);

/// Build an argument list from anything implementing [`ToValue`].
///
/// ```ignore
/// let args = args![42, "alice", None::<i64>];
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::ToValue::to_value(&$arg)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_option_maps_null() {
        assert_eq!(Option::<i32>::from_value(Value::Null), Ok(None));
        assert_eq!(Option::<i32>::from_value(Value::I64(5)), Ok(Some(5)));
        assert_eq!(Some(3i64).to_value(), Value::I64(3));
        assert_eq!(None::<i64>.to_value(), Value::TypedNull(ValueKind::I64));
        assert_eq!(
            None::<NaiveDateTime>.to_value(),
            Value::TypedNull(ValueKind::Timestamp)
        );
        assert_eq!(Option::<i64>::from_value(Value::TypedNull(ValueKind::I64)), Ok(None));
    }

    #[test]
    fn test_non_option_rejects_null() {
        assert!(matches!(
            String::from_value(Value::Null),
            Err(ConvertError::UnexpectedNull { .. })
        ));
    }

    #[test]
    fn test_bool_from_integer_and_text() {
        assert_eq!(bool::from_value(Value::I64(1)), Ok(true));
        assert_eq!(bool::from_value(Value::I64(0)), Ok(false));
        assert_eq!(bool::from_value(Value::Text("true".into())), Ok(true));
        assert!(bool::from_value(Value::Text("maybe".into())).is_err());
    }

    #[test]
    fn test_string_coercion() {
        assert_eq!(String::from_value(Value::I64(7)), Ok("7".to_string()));
        assert_eq!(String::from_value(Value::Bytes(b"ab".to_vec())), Ok("ab".to_string()));
    }

    #[test]
    fn test_cell_from_values() {
        assert_eq!(Cell::from(Value::Null), "");
        assert_eq!(Cell::from(Value::I64(-3)), "-3");
        assert_eq!(Cell::from(Value::Bool(true)), "true");
        assert_eq!(Cell::from(Value::Text("x".into())), "x");
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(Cell::from(Value::Timestamp(ts)), "2024-01-02T03:04:05Z");
    }

    #[test]
    fn test_datetime_utc_round_trip() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let value = ts.and_utc().to_value();
        assert_eq!(value, Value::Timestamp(ts));
        assert_eq!(DateTime::<Utc>::from_value(value), Ok(ts.and_utc()));
    }

    #[test]
    fn test_scan_target_assigns() {
        let mut slot = 0u16;
        slot.set_value(Value::I64(9)).unwrap();
        assert_eq!(slot, 9);
        assert!(slot.set_value(Value::I64(70_000)).is_err());
    }

    #[test]
    fn test_args_macro() {
        let args = crate::args![1i64, "a", None::<i32>, String::from("b")];
        assert_eq!(
            args,
            vec![
                Value::I64(1),
                Value::Text("a".into()),
                Value::TypedNull(ValueKind::I32),
                Value::Text("b".into()),
            ]
        );
        assert!(crate::args![].is_empty());
    }
}
