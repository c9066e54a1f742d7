use crate::{AsValue, Error, Result, Value};
use std::fmt::{self, Display};

/// Declared type of a property or of a result field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Integer with an optional display width.
    Integer { width: Option<u16> },
    Float,
    /// String with an optional maximum length.
    String { length: Option<u32> },
    Boolean,
    Blob,
}

impl ValueType {
    pub const fn integer(width: u16) -> Self {
        ValueType::Integer { width: Some(width) }
    }

    pub const fn string(length: u32) -> Self {
        ValueType::String {
            length: Some(length),
        }
    }

    pub const fn text() -> Self {
        ValueType::String { length: None }
    }

    /// Converts `value` into the canonical variant for this type.
    ///
    /// `Null` is preserved as is, textual values are parsed. Values that cannot represent this
    /// type produce an error and are never replaced by a default.
    pub fn coerce(&self, value: Value) -> Result<Value> {
        let coerced = match (self, value) {
            (_, Value::Null) => Value::Null,
            (ValueType::Integer { .. }, value) => Value::Int64(match value {
                Value::Float64(v) if v.fract() == 0.0 => {
                    // `i64::MAX as f64` rounds up to 2^63, already out of range
                    if !(i64::MIN as f64..i64::MAX as f64).contains(&v) {
                        return Err(Error::msg(format!(
                            "The float value `{}` is out of the integer range",
                            v
                        )));
                    }
                    v as i64
                }
                Value::Varchar(v) => i64::parse(v)?,
                value => i64::try_from_value(value)?,
            }),
            (ValueType::Float, value) => Value::Float64(match value {
                Value::Varchar(v) => f64::parse(v)?,
                value => f64::try_from_value(value)?,
            }),
            (ValueType::Boolean, value) => Value::Boolean(match value {
                Value::Varchar(v) => bool::parse(v)?,
                value => bool::try_from_value(value)?,
            }),
            (ValueType::String { .. }, value) => Value::Varchar(match value {
                Value::Varchar(v) | Value::Unknown(v) => v,
                Value::Blob(v) => String::from_utf8(v.into_vec())
                    .map_err(|e| Error::new(e).context("Blob is not a valid UTF-8 string"))?,
                value => value.to_string(),
            }),
            (ValueType::Blob, value) => Value::Blob(match value {
                Value::Blob(v) => v,
                Value::Varchar(v) | Value::Unknown(v) => v.into_bytes().into_boxed_slice(),
                value => {
                    return Err(Error::msg(format!(
                        "Cannot store the {} value `{}` as a blob",
                        value.type_name(),
                        value
                    )));
                }
            }),
        };
        Ok(coerced)
    }

    /// Maps a type declared by the store (`VARCHAR(255)`, `BOOLEAN`, `BIGINT`...) to a
    /// [`ValueType`], following the usual SQL affinity rules.
    pub fn from_declared(declared: &str) -> Option<Self> {
        let declared = declared.to_ascii_uppercase();
        let contains = |patterns: &[&str]| patterns.iter().any(|p| declared.contains(p));
        if contains(&["BOOL"]) {
            Some(ValueType::Boolean)
        } else if contains(&["INT"]) {
            Some(ValueType::Integer { width: None })
        } else if contains(&["CHAR", "CLOB", "TEXT"]) {
            Some(ValueType::String { length: None })
        } else if contains(&["BLOB"]) {
            Some(ValueType::Blob)
        } else if contains(&["REAL", "FLOA", "DOUB"]) {
            Some(ValueType::Float)
        } else {
            None
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Integer { width: None } => f.write_str("integer"),
            ValueType::Integer { width: Some(w) } => write!(f, "integer({})", w),
            ValueType::Float => f.write_str("float"),
            ValueType::String { length: None } => f.write_str("string"),
            ValueType::String { length: Some(l) } => write!(f, "string({})", l),
            ValueType::Boolean => f.write_str("boolean"),
            ValueType::Blob => f.write_str("blob"),
        }
    }
}
