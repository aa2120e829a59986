//! The value marshaller (C1): host values ↔ SQL storage classes.
//!
//! SQLite has exactly five storage classes, and we model them as a plain
//! tagged enum rather than reaching for `rusqlite::types::Value` directly —
//! keeping our own type here means the conversion errors required by §4.1
//! (`OutOfRange`, `Encoding`) are ours to define instead of inheriting
//! whatever `rusqlite` happens to do.

use crate::error::{CoreError, CoreResult};
use rusqlite::types::{FromSql, FromSqlError, ToSql, ToSqlOutput, Value as SqlValue, ValueRef};

/// A single SQL value, one of the five SQLite storage classes.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

/// Try to build a `Value` from a wider host integer type, failing with
/// `OutOfRange` the way §4.1 requires for anything outside i64's range.
/// Re-exported at the crate root: a host binding layer whose own integer
/// type is wider than `i64` (Python's arbitrary-precision `int`, for
/// instance) calls this instead of constructing `Value::Integer` with a
/// lossy cast.
pub fn integer_from_i128(v: i128) -> CoreResult<Value> {
    i64::try_from(v)
        .map(Value::Integer)
        .map_err(|_| CoreError::OutOfRange)
}

/// Validate that a byte string intended for a TEXT bind is valid UTF-8,
/// failing with `Encoding` otherwise (§4.1). Re-exported at the crate root
/// for the same reason as `integer_from_i128`, and used internally by the
/// `FromSql` impl below so a non-UTF-8 TEXT column fails the same way on
/// the read path.
pub fn text_from_bytes(bytes: Vec<u8>) -> CoreResult<Value> {
    String::from_utf8(bytes)
        .map(Value::Text)
        .map_err(|_| CoreError::Encoding)
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Owned(SqlValue::Real(*r)),
            Value::Text(s) => ToSqlOutput::Owned(SqlValue::Text(s.clone())),
            Value::Blob(b) => ToSqlOutput::Owned(SqlValue::Blob(b.clone())),
        })
    }
}

impl FromSql for Value {
    fn column_result(raw: ValueRef<'_>) -> Result<Self, FromSqlError> {
        Ok(match raw {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            // Routed through `text_from_bytes` rather than decoded inline,
            // so a TEXT column that isn't valid UTF-8 surfaces as the same
            // `CoreError::Encoding` a caller gets from binding a bad byte
            // string — `From<rusqlite::Error>` unwraps it back out of the
            // `FromSqlConversionFailure` this produces.
            ValueRef::Text(t) => {
                text_from_bytes(t.to_vec()).map_err(|e| FromSqlError::Other(Box::new(e)))?
            }
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_round_trips_in_range() {
        assert_eq!(integer_from_i128(42).unwrap(), Value::Integer(42));
        assert_eq!(
            integer_from_i128(i64::MAX as i128).unwrap(),
            Value::Integer(i64::MAX)
        );
    }

    #[test]
    fn integer_out_of_range_fails() {
        let too_big = i64::MAX as i128 + 1;
        assert!(matches!(
            integer_from_i128(too_big),
            Err(CoreError::OutOfRange)
        ));
    }

    #[test]
    fn text_from_valid_utf8() {
        let v = text_from_bytes(b"hello".to_vec()).unwrap();
        assert_eq!(v, Value::Text("hello".to_string()));
    }

    #[test]
    fn text_from_invalid_utf8_fails() {
        let bad = vec![0xff, 0xfe, 0xfd];
        assert!(matches!(text_from_bytes(bad), Err(CoreError::Encoding)));
    }
}
