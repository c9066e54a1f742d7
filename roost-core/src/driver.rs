use crate::{ConnectTarget, Result, Row, RowsAffected, SqlWriter, Value, ValueType};
use std::future::Future;

/// Backing store implementation.
///
/// A driver opens sessions and describes its dialect. [`crate::Connection`] owns the session
/// lifecycle on top of it.
pub trait Driver: Send + Sync + 'static {
    type Session: Session;
    type SqlWriter: SqlWriter;

    /// Scheme of the connection URLs served by this driver.
    const NAME: &'static str;

    fn sql_writer(&self) -> &Self::SqlWriter;

    /// Establishes a new session. Failures to reach the store are
    /// [`crate::RoostError::Connection`].
    fn connect(&self, target: &ConnectTarget)
    -> impl Future<Output = Result<Self::Session>> + Send;

    /// Vendor error codes meaning deadlock or serialization failure.
    fn transient_codes(&self) -> &'static [i32] {
        &[]
    }
}

/// An established link to the store.
pub trait Session: Send {
    /// Runs one statement with positional parameters.
    ///
    /// Store errors are reported as [`crate::RoostError::Statement`] carrying the vendor code,
    /// a lost link as [`crate::RoostError::Connection`].
    fn execute(
        &mut self,
        statement: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<RawResultSet>> + Send;

    fn database_exists(&mut self, name: &str) -> impl Future<Output = Result<bool>> + Send;
}

/// Projection metadata of a result field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    /// Type used to represent the values, when the store declares one.
    pub value_type: Option<ValueType>,
    /// Type name as declared by the store.
    pub declared: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, declared: Option<&str>) -> Self {
        Self {
            name: name.into(),
            value_type: declared.and_then(ValueType::from_declared),
            declared: declared.map(str::to_owned),
        }
    }
}

/// Untyped outcome of a statement, as produced by a session.
#[derive(Debug, Default)]
pub struct RawResultSet {
    pub fields: Vec<FieldDescriptor>,
    pub rows: Vec<Row>,
    pub affected: RowsAffected,
}
