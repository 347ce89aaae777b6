//! Semantic field types and the conversions between Rust values and
//! stored values.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value;

use crate::error::DbError;

/// Semantic type of a declared field.
///
/// This is what the schema migrator maps to a column type; it is independent
/// of any particular SQL engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    Text,
    Integer,
    Real,
    Boolean,
    Timestamp,
    Binary,
    /// Fixed-point numeric column. No built-in [`ColumnValue`] produces it;
    /// declare it on a hand-built [`FieldDescriptor`] or implement
    /// [`ColumnValue`] for a decimal type of your own. SQLite stores these
    /// columns with NUMERIC affinity, so values may come back as integers or
    /// reals.
    ///
    /// [`FieldDescriptor`]: crate::descriptor::FieldDescriptor
    Decimal,
    /// A type with no relational mapping. Migrating a type that declares one
    /// fails with [`DbError::UnsupportedFieldType`].
    Other(&'static str),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
            Self::Real => write!(f, "real"),
            Self::Boolean => write!(f, "boolean"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::Binary => write!(f, "binary"),
            Self::Decimal => write!(f, "decimal"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Returned when a stored value cannot be converted into a field's Rust type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueMismatch {
    pub expected: &'static str,
    pub found: &'static str,
}

impl ValueMismatch {
    pub fn new(expected: &'static str, found: &Value) -> Self {
        Self {
            expected,
            found: value_kind(found),
        }
    }

    /// Attaches the field name, producing a [`DbError::FieldValue`].
    pub fn for_field(self, field: &str) -> DbError {
        DbError::FieldValue {
            field: field.to_string(),
            expected: self.expected,
            found: self.found,
        }
    }
}

pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Integer(_) => "integer",
        Value::Real(_) => "real",
        Value::Text(_) => "text",
        Value::Blob(_) => "blob",
    }
}

/// A Rust type that can be stored in a single column.
pub trait ColumnValue: Sized {
    const FIELD_TYPE: FieldType;
    const NULLABLE: bool = false;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, ValueMismatch>;
}

/// Anything that can be bound as a query parameter.
///
/// Blanket-implemented for every [`ColumnValue`], plus string slices and raw
/// [`Value`]s so literals read naturally in filters.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl<T: ColumnValue> IntoValue for T {
    fn into_value(self) -> Value {
        self.to_value()
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl ColumnValue for String {
    const FIELD_TYPE: FieldType = FieldType::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(ValueMismatch::new("text", &other)),
        }
    }
}

impl ColumnValue for i64 {
    const FIELD_TYPE: FieldType = FieldType::Integer;

    fn to_value(&self) -> Value {
        Value::Integer(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        match value {
            Value::Integer(i) => Ok(i),
            other => Err(ValueMismatch::new("integer", &other)),
        }
    }
}

macro_rules! narrow_integer {
    ($($ty:ty),*) => {
        $(
            impl ColumnValue for $ty {
                const FIELD_TYPE: FieldType = FieldType::Integer;

                fn to_value(&self) -> Value {
                    Value::Integer(i64::from(*self))
                }

                fn from_value(value: Value) -> Result<Self, ValueMismatch> {
                    match value {
                        Value::Integer(i) => <$ty>::try_from(i)
                            .map_err(|_| ValueMismatch::new(stringify!($ty), &Value::Integer(i))),
                        other => Err(ValueMismatch::new(stringify!($ty), &other)),
                    }
                }
            }
        )*
    };
}

narrow_integer!(i32, u32);

impl ColumnValue for f64 {
    const FIELD_TYPE: FieldType = FieldType::Real;

    fn to_value(&self) -> Value {
        Value::Real(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        match value {
            Value::Real(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            other => Err(ValueMismatch::new("real", &other)),
        }
    }
}

impl ColumnValue for f32 {
    const FIELD_TYPE: FieldType = FieldType::Real;

    fn to_value(&self) -> Value {
        Value::Real(f64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl ColumnValue for bool {
    const FIELD_TYPE: FieldType = FieldType::Boolean;

    fn to_value(&self) -> Value {
        Value::Integer(i64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        match value {
            Value::Integer(i) => Ok(i != 0),
            other => Err(ValueMismatch::new("boolean", &other)),
        }
    }
}

impl ColumnValue for Vec<u8> {
    const FIELD_TYPE: FieldType = FieldType::Binary;

    fn to_value(&self) -> Value {
        Value::Blob(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        match value {
            Value::Blob(b) => Ok(b),
            other => Err(ValueMismatch::new("blob", &other)),
        }
    }
}

/// Timestamps are stored as RFC 3339 text with fixed microsecond precision,
/// so lexical order matches chronological order.
impl ColumnValue for DateTime<Utc> {
    const FIELD_TYPE: FieldType = FieldType::Timestamp;

    fn to_value(&self) -> Value {
        Value::Text(self.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        match value {
            Value::Text(s) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| ValueMismatch::new("timestamp", &Value::Text(s))),
            Value::Integer(secs) => DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| ValueMismatch::new("timestamp", &Value::Integer(secs))),
            other => Err(ValueMismatch::new("timestamp", &other)),
        }
    }
}

impl<T: ColumnValue> ColumnValue for Option<T> {
    const FIELD_TYPE: FieldType = T::FIELD_TYPE;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
