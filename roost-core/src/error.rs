use crate::Error;
use thiserror::Error;

/// Failures the runtime distinguishes by kind.
///
/// They travel inside [`crate::Error`] like any other error, usually wrapped in some context.
/// Use [`ErrorExt`] to recover the kind from an `anyhow` error.
#[derive(Debug, Error)]
pub enum RoostError {
    /// Bad static configuration of a domain type, detected while building its schema.
    #[error("Invalid schema definition: {0}")]
    SchemaDefinition(String),
    #[error("No such property `{property}` on `{type_name}`")]
    NoSuchProperty { type_name: String, property: String },
    #[error("No such field `{0}` in the result set")]
    NoSuchField(String),
    /// The link to the backing store is down or unreachable.
    #[error("Connection error: {0}")]
    Connection(String),
    /// Deadlock or serialization failure, the statement can be retried.
    #[error("Transient failure (code {code}): {message}")]
    Deadlock { code: i32, message: String },
    #[error("Statement failed (code {code:?}): {message}")]
    Statement { code: Option<i32>, message: String },
    #[error("Cannot select database `{name}`: {message}")]
    DatabaseSelection { name: String, message: String },
    /// The operation is not valid given the state of the object.
    #[error("{0}")]
    Precursor(String),
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SchemaDefinition,
    NoSuchProperty,
    NoSuchField,
    Connection,
    Deadlock,
    Statement,
    DatabaseSelection,
    Precursor,
    InvariantViolation,
}

impl RoostError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RoostError::SchemaDefinition(..) => ErrorKind::SchemaDefinition,
            RoostError::NoSuchProperty { .. } => ErrorKind::NoSuchProperty,
            RoostError::NoSuchField(..) => ErrorKind::NoSuchField,
            RoostError::Connection(..) => ErrorKind::Connection,
            RoostError::Deadlock { .. } => ErrorKind::Deadlock,
            RoostError::Statement { .. } => ErrorKind::Statement,
            RoostError::DatabaseSelection { .. } => ErrorKind::DatabaseSelection,
            RoostError::Precursor(..) => ErrorKind::Precursor,
            RoostError::InvariantViolation(..) => ErrorKind::InvariantViolation,
        }
    }
}

pub trait ErrorExt {
    /// The typed failure carried by this error, looking through any added context.
    fn roost_error(&self) -> Option<&RoostError>;

    fn kind(&self) -> Option<ErrorKind> {
        self.roost_error().map(RoostError::kind)
    }

    fn is_deadlock(&self) -> bool {
        self.kind() == Some(ErrorKind::Deadlock)
    }

    /// Whether a caller may reasonably run the same operation again.
    fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            Some(ErrorKind::Deadlock) | Some(ErrorKind::Connection)
        )
    }
}

impl ErrorExt for Error {
    fn roost_error(&self) -> Option<&RoostError> {
        self.downcast_ref::<RoostError>()
            .or_else(|| self.chain().find_map(|e| e.downcast_ref::<RoostError>()))
    }
}
