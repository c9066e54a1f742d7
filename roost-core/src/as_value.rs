use crate::{Error, Result, Value, truncate_long};
use atoi::FromRadix10SignedChecked;
use std::any;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// # Conversion contract
/// - `as_value` never fails and never loses information.
/// - `try_from_value` accepts the canonical variant for the type, plus `Value::Unknown` which is
///   handed over to [`AsValue::parse`]. Integers also accept booleans, floats accept integers.
/// - Range checks happen before narrowing integers, the error reports the offending value.
///
/// # Examples
/// ```rust
/// use roost_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert_eq!(v, Value::Int64(42));
/// let n: i32 = AsValue::try_from_value(Value::Unknown("42".into())).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
    /// Parse the full string into `Self`, trailing garbage is an error.
    fn parse(input: impl AsRef<str>) -> Result<Self>
    where
        Self: Sized,
    {
        Err(cannot_parse::<Self>(input.as_ref()))
    }
}

fn cannot_parse<T>(input: &str) -> Error {
    Error::msg(format!(
        "Cannot parse `{}` as {}",
        truncate_long!(input),
        any::type_name::<T>()
    ))
}

fn mismatch<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert the {} value `{}` into {}",
        value.type_name(),
        truncate_long!(value.to_string()),
        any::type_name::<T>()
    ))
}

macro_rules! impl_as_value_integer {
    ($($source:ty),+ $(,)?) => {$(
        impl AsValue for $source {
            fn as_value(self) -> Value {
                Value::Int64(self as i64)
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Int64(v) => <$source>::try_from(v).map_err(|_| {
                        Error::msg(format!(
                            "Value {} is out of range for {}",
                            v,
                            any::type_name::<Self>()
                        ))
                    }),
                    Value::Boolean(v) => Ok(v as $source),
                    Value::Unknown(ref v) => Self::parse(v),
                    _ => Err(mismatch::<Self>(&value)),
                }
            }
            fn parse(input: impl AsRef<str>) -> Result<Self> {
                let input = input.as_ref();
                let trimmed = input.trim();
                if !trimmed.bytes().any(|b| b.is_ascii_digit()) {
                    return Err(cannot_parse::<Self>(input));
                }
                match <$source>::from_radix_10_signed_checked(trimmed.as_bytes()) {
                    (Some(v), used) if used == trimmed.len() => Ok(v),
                    _ => Err(cannot_parse::<Self>(input)),
                }
            }
        }
    )+};
}

impl_as_value_integer!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_as_value_float {
    ($($source:ty),+ $(,)?) => {$(
        impl AsValue for $source {
            fn as_value(self) -> Value {
                Value::Float64(self as f64)
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Float64(v) => Ok(v as $source),
                    Value::Int64(v) => Ok(v as $source),
                    Value::Unknown(ref v) => Self::parse(v),
                    _ => Err(mismatch::<Self>(&value)),
                }
            }
            fn parse(input: impl AsRef<str>) -> Result<Self> {
                let input = input.as_ref();
                fast_float::parse::<$source, _>(input.trim())
                    .map_err(|_| cannot_parse::<Self>(input))
            }
        }
    )+};
}

impl_as_value_float!(f32, f64);

impl AsValue for bool {
    fn as_value(self) -> Value {
        Value::Boolean(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(v) => Ok(v),
            Value::Int64(v) => Ok(v != 0),
            Value::Unknown(ref v) => Self::parse(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        let input = input.as_ref();
        match input.trim().to_ascii_lowercase().as_str() {
            "1" | "t" | "true" | "y" | "yes" | "on" => Ok(true),
            "0" | "f" | "false" | "n" | "no" | "off" => Ok(false),
            _ => Err(cannot_parse::<Self>(input)),
        }
    }
}

impl AsValue for String {
    fn as_value(self) -> Value {
        Value::Varchar(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(v) | Value::Unknown(v) => Ok(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        Ok(input.as_ref().to_owned())
    }
}

impl AsValue for Box<[u8]> {
    fn as_value(self) -> Value {
        Value::Blob(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(v) => Ok(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Vec<u8> {
    fn as_value(self) -> Value {
        Value::Blob(self.into_boxed_slice())
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Box::<[u8]>::try_from_value(value).map(Into::into)
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => Value::Null,
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            value => T::try_from_value(value).map(Some),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        T::parse(input).map(Some)
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl<'a> From<&'a str> for Value {
    fn from(value: &'a str) -> Self {
        Value::Varchar(value.into())
    }
}
