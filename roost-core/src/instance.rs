use crate::{
    AsValue, Context, Executor, Identity, Mapper, PropertyFuture, Result, RoostError, Schema,
    Value,
};
use std::{
    collections::{BTreeMap, HashMap},
    fmt::{self, Debug},
    sync::Arc,
};

/// Property values keyed by name.
pub type Record = BTreeMap<String, Value>;

/// Object of a domain type: a bag of property values that tracks its own changes.
///
/// Raw accessors ([`Instance::get`], [`Instance::set`]) touch the storage directly and never
/// fail. Routed accessors ([`Instance::property`], [`Instance::set_property`]) go through the
/// schema and reject unknown names.
pub struct Instance {
    schema: Arc<Schema>,
    values: Record,
    changed: Vec<String>,
    saved: bool,
    futures: HashMap<String, PropertyFuture>,
}

impl Instance {
    pub(crate) fn blank(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            values: Record::new(),
            changed: Vec::new(),
            saved: false,
            futures: HashMap::new(),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn type_name(&self) -> &'static str {
        self.schema.type_name()
    }

    /// Stored value of `name`, [`Value::Null`] when absent.
    pub fn get(&self, name: &str) -> Value {
        self.values.get(name).cloned().unwrap_or_default()
    }

    pub fn get_as<T: AsValue>(&self, name: &str) -> Result<T> {
        T::try_from_value(self.get(name))
            .with_context(|| format!("While reading `{}` of `{}`", name, self.type_name()))
    }

    /// Whether `name` holds a non null value.
    pub fn has(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(|v| !v.is_null())
    }

    /// Stores `value` and records `name` in the change log.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let name = name.into();
        self.values.insert(name.clone(), value.into());
        self.changed.push(name);
        self
    }

    /// Sets every entry of `record`, in key order.
    pub fn load(&mut self, record: impl IntoIterator<Item = (String, Value)>) -> &mut Self {
        for (name, value) in record {
            self.set(name, value);
        }
        self
    }

    pub fn property(&self, name: &str) -> Result<Value> {
        self.schema.lookup(name)?.call_get(self)
    }

    pub fn set_property(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let schema = self.schema.clone();
        schema.lookup(name)?.call_set(self, value.into())?;
        Ok(self)
    }

    /// Current values of the properties changed since the last clear, one entry per name.
    pub fn changes(&self) -> Record {
        self.changed
            .iter()
            .map(|name| (name.clone(), self.get(name)))
            .collect()
    }

    pub fn is_changed(&self, name: &str) -> bool {
        self.changed.iter().any(|v| v == name)
    }

    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    pub fn clear_changes(&mut self) -> &mut Self {
        self.changed.clear();
        self
    }

    /// Whether the instance is known to exist in the store.
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn mark_saved(&mut self, saved: bool) -> &mut Self {
        self.saved = saved;
        self
    }

    pub fn identity(&self) -> Identity {
        self.schema.identity(self)
    }

    /// Deferred value of `name`.
    ///
    /// Present values give an already resolved future. A null auto increment identity property
    /// gives a pending future, shared by every call until the store assigns the value.
    pub fn future(&mut self, name: &str) -> Result<PropertyFuture> {
        let generated = self.schema.lookup(name)?.is_auto_increment();
        let value = self.get(name);
        if !value.is_null() || !generated {
            return Ok(PropertyFuture::resolved(value));
        }
        Ok(self
            .futures
            .entry(name.to_owned())
            .or_insert_with(PropertyFuture::pending)
            .clone())
    }

    /// Stores a value produced by the store, like a generated key, and settles the pending
    /// future of `name`. It does not touch the change log.
    ///
    /// Fails when `name` already holds a value.
    pub fn resolve(&mut self, name: &str, value: Value) -> Result<()> {
        let current = self.get(name);
        if !current.is_null() {
            let error = RoostError::InvariantViolation(format!(
                "Property `{}` of `{}` already holds `{}`, cannot resolve it to `{}`",
                name,
                self.type_name(),
                current,
                value
            ));
            log::error!("{}", error);
            return Err(error.into());
        }
        self.values.insert(name.to_owned(), value.clone());
        if let Some(future) = self.futures.remove(name) {
            future.resolve(value)?;
        }
        Ok(())
    }

    /// Settles pending futures whose property received a value some other way.
    pub fn settle_futures(&mut self) -> Result<()> {
        let names = self
            .futures
            .keys()
            .filter(|name| self.has(name))
            .cloned()
            .collect::<Vec<_>>();
        for name in names {
            if let Some(future) = self.futures.remove(&name) {
                future.resolve(self.get(&name))?;
            }
        }
        Ok(())
    }

    pub fn values(&self) -> &Record {
        &self.values
    }

    pub fn to_record(&self) -> Record {
        self.values.clone()
    }

    /// Persists the instance, inserting or updating it. The change log is cleared only on
    /// success.
    pub async fn save<E: Executor>(&mut self, executor: &mut E) -> Result<()> {
        let mapper = self.schema.mapper();
        mapper.save(executor, self).await?;
        self.saved = true;
        self.changed.clear();
        Ok(())
    }

    pub async fn delete<E: Executor>(&mut self, executor: &mut E) -> Result<()> {
        let mapper = self.schema.mapper();
        mapper.delete(executor, self).await
    }
}

/// Clones hold the same values and flags but do not share pending futures.
impl Clone for Instance {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            values: self.values.clone(),
            changed: self.changed.clone(),
            saved: self.saved,
            futures: HashMap::new(),
        }
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema) && self.values == other.values
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.type_name())
            .field("values", &self.values)
            .field("changed", &self.changed)
            .field("saved", &self.saved)
            .finish()
    }
}
