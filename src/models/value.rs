//! Owned SQL values exchanged between records and the execution layer.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::fmt;

/// Text formats accepted when a timestamp arrives as a string (SQLite stores them as TEXT).
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A single SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL with no declared type, as read back from a result row.
    Null,
    /// NULL produced by a nullable column of a known kind. Binds with that kind's
    /// database type so strictly typed servers accept it.
    TypedNull(ValueKind),
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
}

/// The kind of a non-null value, declared statically by each column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Text,
    Bytes,
    Timestamp,
}

impl ValueKind {
    /// Integer kinds are the only valid auto-increment targets.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::U8 | Self::U16 | Self::U32 | Self::U64
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Text => "text",
            Self::Bytes => "bytes",
            Self::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure converting a `Value` into a column type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    #[error("unexpected NULL for {expected} column")]
    UnexpectedNull { expected: ValueKind },

    #[error("cannot convert {found} into {expected}")]
    Mismatch {
        expected: ValueKind,
        found: &'static str,
    },

    #[error("value {value} out of range for {expected}")]
    OutOfRange { expected: ValueKind, value: String },

    #[error("cannot parse {value:?} as {expected}")]
    Parse { expected: ValueKind, value: String },

    /// The driver could not decode a column of this database type.
    #[error("cannot decode database type {type_name}")]
    Undecodable { type_name: String },

    #[error("{type_name} value has no exact representation: {reason}")]
    Unrepresentable { type_name: String, reason: String },
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::TypedNull(_))
    }

    /// Name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null | Self::TypedNull(_) => "null",
            Self::Bool(_) => "bool",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Timestamp(_) => "timestamp",
        }
    }

    pub fn kind(&self) -> Option<ValueKind> {
        Some(match self {
            Self::Null | Self::TypedNull(_) => return None,
            Self::Bool(_) => ValueKind::Bool,
            Self::I8(_) => ValueKind::I8,
            Self::I16(_) => ValueKind::I16,
            Self::I32(_) => ValueKind::I32,
            Self::I64(_) => ValueKind::I64,
            Self::U8(_) => ValueKind::U8,
            Self::U16(_) => ValueKind::U16,
            Self::U32(_) => ValueKind::U32,
            Self::U64(_) => ValueKind::U64,
            Self::F32(_) => ValueKind::F32,
            Self::F64(_) => ValueKind::F64,
            Self::Text(_) => ValueKind::Text,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::Timestamp(_) => ValueKind::Timestamp,
        })
    }

    /// Integer view of any integral value, wide enough for both i64 and u64.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Self::I8(v) => Some(*v as i128),
            Self::I16(v) => Some(*v as i128),
            Self::I32(v) => Some(*v as i128),
            Self::I64(v) => Some(*v as i128),
            Self::U8(v) => Some(*v as i128),
            Self::U16(v) => Some(*v as i128),
            Self::U32(v) => Some(*v as i128),
            Self::U64(v) => Some(*v as i128),
            Self::Bool(v) => Some(*v as i128),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F32(v) => Some(*v as f64),
            Self::F64(v) => Some(*v),
            other => other.as_i128().map(|v| v as f64),
        }
    }

    /// Convert an integral (or numeric text) value into an exact integer kind.
    pub(crate) fn to_integer<T>(self, expected: ValueKind) -> Result<T, ConvertError>
    where
        T: TryFrom<i128>,
    {
        let wide = match &self {
            Self::Null | Self::TypedNull(_) => {
                return Err(ConvertError::UnexpectedNull { expected });
            }
            Self::Text(s) => parse_integral(s).ok_or_else(|| ConvertError::Parse {
                expected,
                value: s.clone(),
            })?,
            Self::Bytes(b) => std::str::from_utf8(b)
                .ok()
                .and_then(parse_integral)
                .ok_or_else(|| ConvertError::Parse {
                    expected,
                    value: String::from_utf8_lossy(b).into_owned(),
                })?,
            other => other.as_i128().ok_or(ConvertError::Mismatch {
                expected,
                found: other.type_name(),
            })?,
        };

        T::try_from(wide).map_err(|_| ConvertError::OutOfRange {
            expected,
            value: wide.to_string(),
        })
    }

    pub(crate) fn to_float(self, expected: ValueKind) -> Result<f64, ConvertError> {
        match self {
            Self::Null | Self::TypedNull(_) => Err(ConvertError::UnexpectedNull { expected }),
            Self::Text(s) => s.trim().parse::<f64>().map_err(|_| ConvertError::Parse {
                expected,
                value: s,
            }),
            Self::Bytes(b) => {
                let s = String::from_utf8_lossy(&b).into_owned();
                s.trim()
                    .parse::<f64>()
                    .map_err(|_| ConvertError::Parse { expected, value: s })
            }
            other => other.as_f64().ok_or(ConvertError::Mismatch {
                expected,
                found: other.type_name(),
            }),
        }
    }

    pub(crate) fn to_timestamp(self) -> Result<NaiveDateTime, ConvertError> {
        let expected = ValueKind::Timestamp;
        match self {
            Self::Timestamp(ts) => Ok(ts),
            Self::Null | Self::TypedNull(_) => Err(ConvertError::UnexpectedNull { expected }),
            Self::Text(s) => parse_timestamp(&s).ok_or(ConvertError::Parse { expected, value: s }),
            Self::Bytes(b) => {
                let s = String::from_utf8_lossy(&b).into_owned();
                parse_timestamp(&s).ok_or(ConvertError::Parse { expected, value: s })
            }
            other => Err(ConvertError::Mismatch {
                expected,
                found: other.type_name(),
            }),
        }
    }
}

/// Integer text, or decimal text with an all-zero fraction (`SUM()` over DECIMAL gives "12.00").
fn parse_integral(s: &str) -> Option<i128> {
    let s = s.trim();
    if let Ok(v) = s.parse::<i128>() {
        return Some(v);
    }
    let (whole, frac) = s.split_once('.')?;
    if !frac.bytes().all(|b| b == b'0') || matches!(whole, "" | "-" | "+") {
        return None;
    }
    whole.parse::<i128>().ok()
}

/// Parse a timestamp from RFC 3339 or one of the common SQL text layouts.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(ts.naive_utc());
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// RFC 3339 rendering used for timestamps in text output.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.and_utc()
        .to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null | Self::TypedNull(_) => f.write_str("NULL"),
            Self::Bool(v) => write!(f, "{}", v),
            Self::I8(v) => write!(f, "{}", v),
            Self::I16(v) => write!(f, "{}", v),
            Self::I32(v) => write!(f, "{}", v),
            Self::I64(v) => write!(f, "{}", v),
            Self::U8(v) => write!(f, "{}", v),
            Self::U16(v) => write!(f, "{}", v),
            Self::U32(v) => write!(f, "{}", v),
            Self::U64(v) => write!(f, "{}", v),
            Self::F32(v) => write!(f, "{}", v),
            Self::F64(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{:?}", v),
            Self::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Self::Timestamp(v) => f.write_str(&format_timestamp(v)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use base64::{Engine as _, engine::general_purpose::STANDARD};

        match self {
            Self::Null | Self::TypedNull(_) => serializer.serialize_none(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::I8(v) => serializer.serialize_i8(*v),
            Self::I16(v) => serializer.serialize_i16(*v),
            Self::I32(v) => serializer.serialize_i32(*v),
            Self::I64(v) => serializer.serialize_i64(*v),
            Self::U8(v) => serializer.serialize_u8(*v),
            Self::U16(v) => serializer.serialize_u16(*v),
            Self::U32(v) => serializer.serialize_u32(*v),
            Self::U64(v) => serializer.serialize_u64(*v),
            Self::F32(v) => serializer.serialize_f32(*v),
            Self::F64(v) => serializer.serialize_f64(*v),
            Self::Text(v) => serializer.serialize_str(v),
            Self::Bytes(v) => serializer.serialize_str(&STANDARD.encode(v)),
            Self::Timestamp(v) => serializer.serialize_str(&format_timestamp(v)),
        }
    }
}

/// Render an argument list for error context and logs.
pub fn render_args(args: &[Value]) -> String {
    let parts: Vec<String> = args.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_integer_conversion_is_range_checked() {
        assert_eq!(Value::I64(12).to_integer::<i8>(ValueKind::I8), Ok(12));
        assert_eq!(
            Value::I64(300).to_integer::<u8>(ValueKind::U8),
            Err(ConvertError::OutOfRange {
                expected: ValueKind::U8,
                value: "300".to_string()
            })
        );
        assert_eq!(
            Value::U64(u64::MAX).to_integer::<u64>(ValueKind::U64),
            Ok(u64::MAX)
        );
    }

    #[test]
    fn test_integer_from_text() {
        assert_eq!(
            Value::Text(" 42 ".to_string()).to_integer::<i32>(ValueKind::I32),
            Ok(42)
        );
        assert!(matches!(
            Value::Text("abc".to_string()).to_integer::<i32>(ValueKind::I32),
            Err(ConvertError::Parse { .. })
        ));
    }

    #[test]
    fn test_integer_from_integral_decimal_text() {
        assert_eq!(
            Value::Text("12.00".to_string()).to_integer::<i64>(ValueKind::I64),
            Ok(12)
        );
        assert_eq!(
            Value::Bytes(b"-7.0".to_vec()).to_integer::<i32>(ValueKind::I32),
            Ok(-7)
        );
        assert!(matches!(
            Value::Text("12.50".to_string()).to_integer::<i64>(ValueKind::I64),
            Err(ConvertError::Parse { .. })
        ));
        assert!(matches!(
            Value::Text(".0".to_string()).to_integer::<i64>(ValueKind::I64),
            Err(ConvertError::Parse { .. })
        ));
    }

    #[test]
    fn test_null_is_rejected() {
        assert_eq!(
            Value::Null.to_integer::<i64>(ValueKind::I64),
            Err(ConvertError::UnexpectedNull {
                expected: ValueKind::I64
            })
        );
        assert_eq!(
            Value::TypedNull(ValueKind::I64).to_float(ValueKind::F64),
            Err(ConvertError::UnexpectedNull {
                expected: ValueKind::F64
            })
        );
    }

    #[test]
    fn test_float_into_integer_is_mismatch() {
        assert!(matches!(
            Value::F64(1.5).to_integer::<i64>(ValueKind::I64),
            Err(ConvertError::Mismatch { found: "f64", .. })
        ));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 20, 30)
            .unwrap();
        assert_eq!(parse_timestamp("2024-03-01 10:20:30"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T10:20:30Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T10:20:30"), Some(expected));
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_format_timestamp_is_rfc3339() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 20, 30)
            .unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-01T10:20:30Z");
    }

    #[test]
    fn test_serialize_bytes_as_base64() {
        let json = serde_json::to_value(Value::Bytes(b"hello world".to_vec())).unwrap();
        assert_eq!(json, serde_json::json!("aGVsbG8gd29ybGQ="));
        let json = serde_json::to_value(Value::Null).unwrap();
        assert!(json.is_null());
    }

    #[test]
    fn test_render_args() {
        let args = vec![Value::I64(1), Value::Text("a".into()), Value::Null];
        assert_eq!(render_args(&args), "[1, \"a\", NULL]");
    }
}
