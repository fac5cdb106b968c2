//! Scalar cell values and column type inference

use std::borrow::Cow;
use std::fmt;

/// A single cell of a [`RecordTable`](super::RecordTable)
///
/// Empty CSV fields are read as [`Value::Null`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
}

/// The type a CSV column is read as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
}

impl ColumnType {
    /// Infer the narrowest type that every non-empty field parses as.
    ///
    /// A column without any non-empty field is `Text`.
    pub fn infer<'a>(fields: impl IntoIterator<Item = &'a str>) -> Self {
        let mut inferred: Option<ColumnType> = None;
        for field in fields.into_iter().filter(|f| !f.is_empty()) {
            let kind = if field.parse::<i64>().is_ok() {
                ColumnType::Integer
            } else if parse_float(field).is_some() {
                ColumnType::Float
            } else {
                return ColumnType::Text;
            };
            inferred = Some(match (inferred, kind) {
                (Some(ColumnType::Float), _) | (_, ColumnType::Float) => ColumnType::Float,
                _ => ColumnType::Integer,
            });
        }
        inferred.unwrap_or(ColumnType::Text)
    }
}

/// NaN spellings are not numbers here; otherwise a text column of names
/// like "Nan" would be read as floats.
fn parse_float(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|f| !f.is_nan())
}

impl Value {
    /// Parse a raw CSV field as the given column type
    ///
    /// Fields that do not parse as the requested numeric type fall back to text.
    pub fn parse(field: &str, column_type: ColumnType) -> Self {
        if field.is_empty() {
            return Value::Null;
        }
        match column_type {
            ColumnType::Integer => field
                .parse()
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::Text(field.to_string())),
            ColumnType::Float => parse_float(field)
                .map(Value::Float)
                .unwrap_or_else(|| Value::Text(field.to_string())),
            ColumnType::Text => Value::Text(field.to_string()),
        }
    }

    /// Render the value as a CSV field
    ///
    /// Floats always keep a decimal point or exponent (`7.0`, `1e21`) so a
    /// written column reads back as `Float`. NaN is written as an empty field.
    pub fn to_field(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed(""),
            Value::Integer(i) => Cow::Owned(i.to_string()),
            Value::Float(f) if f.is_nan() => Cow::Borrowed(""),
            Value::Float(f) => Cow::Owned(format!("{:?}", f)),
            Value::Text(s) => Cow::Borrowed(s),
        }
    }

    /// The column type this value belongs to, `None` for nulls
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(ColumnType::Integer),
            Value::Float(_) => Some(ColumnType::Float),
            Value::Text(_) => Some(ColumnType::Text),
        }
    }

    /// Convert the value to `target`, keeping nulls
    pub(crate) fn coerce(self, target: ColumnType) -> Self {
        match (self, target) {
            (Value::Integer(i), ColumnType::Float) => Value::Float(i as f64),
            (value @ (Value::Integer(_) | Value::Float(_)), ColumnType::Text) => {
                Value::Text(value.to_field().into_owned())
            }
            (value, _) => value,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Text(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other.to_field()),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
