use crate::{Result, RoostError, Value};
use std::sync::{Arc, OnceLock};

/// Placeholder for a property value that is not known yet, like the key generated by the store
/// on the first insert.
///
/// Clones observe the same value. Reading before resolution returns [`Value::Null`].
#[derive(Debug, Clone, Default)]
pub struct PropertyFuture {
    cell: Arc<OnceLock<Value>>,
}

impl PropertyFuture {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn resolved(value: Value) -> Self {
        Self {
            cell: Arc::new(OnceLock::from(value)),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn value(&self) -> Value {
        self.cell.get().cloned().unwrap_or_default()
    }

    /// Settles the future. Resolving twice is an [`RoostError::InvariantViolation`].
    pub fn resolve(&self, value: Value) -> Result<()> {
        self.cell.set(value).map_err(|value| {
            let error = RoostError::InvariantViolation(format!(
                "Future already resolved to `{}`, cannot resolve it again to `{}`",
                self.value(),
                value
            ));
            log::error!("{}", error);
            error.into()
        })
    }
}
