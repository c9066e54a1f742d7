use std::{
    fmt::{self, Display},
    hash::{Hash, Hasher},
    mem,
};

/// Dynamically typed value moved between instances, statements and result rows.
#[derive(Default, Debug, Clone)]
pub enum Value {
    /// Absence of a value. It is also what unresolved futures and missing properties report.
    #[default]
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    Varchar(String),
    Blob(Box<[u8]>),
    /// Textual representation reported by a store that did not declare a type for it.
    Unknown(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn same_type(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(..) => "boolean",
            Value::Int64(..) => "integer",
            Value::Float64(..) => "float",
            Value::Varchar(..) => "string",
            Value::Blob(..) => "blob",
            Value::Unknown(..) => "unknown",
        }
    }

    /// Text content of `Varchar` and `Unknown` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Varchar(v) | Value::Unknown(v) => Some(v),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            // Bitwise so that equality agrees with `Hash`
            (Self::Float64(l), Self::Float64(r)) => l.to_bits() == r.to_bits(),
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Unknown(l), Self::Unknown(r)) => l == r,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(v) => v.hash(state),
            Value::Int64(v) => v.hash(state),
            Value::Float64(v) => v.to_bits().hash(state),
            Value::Varchar(v) | Value::Unknown(v) => v.hash(state),
            Value::Blob(v) => v.hash(state),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Varchar(v) | Value::Unknown(v) => f.write_str(v),
            Value::Blob(v) => write!(f, "x'{}'", hex::encode(v)),
        }
    }
}
