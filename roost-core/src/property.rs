use crate::{Instance, Options, Result, RoostError, Value, ValueType};
use std::{
    borrow::Cow,
    fmt::{self, Debug, Display},
    sync::Arc,
};

/// Mediates reads and writes of a property on an instance.
///
/// The default methods forward to the instance own storage. Implement it to expose computed or
/// virtual properties through [`SchemaBuilder::computed`](crate::SchemaBuilder::computed).
pub trait PropertyAccessor: Send + Sync {
    fn call_get(&self, slot: &PropertySlot, instance: &Instance) -> Result<Value> {
        Ok(instance.get(slot.name()))
    }

    fn call_set(&self, slot: &PropertySlot, instance: &mut Instance, value: Value) -> Result<()> {
        instance.set(slot.name().to_owned(), value);
        Ok(())
    }
}

/// Accessor of properties stored in the instance itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct StoredProperty;

impl PropertyAccessor for StoredProperty {}

/// Named and typed attribute of a schema, shared by every instance of the type.
#[derive(Clone)]
pub struct PropertySlot {
    name: Cow<'static, str>,
    value_type: ValueType,
    options: Options,
    accessor: Arc<dyn PropertyAccessor>,
    persisted: bool,
}

impl PropertySlot {
    /// Creates a stored property, parsing the option string.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        value_type: ValueType,
        options: &str,
    ) -> Result<Self> {
        let name = name.into();
        let options = Options::parse(options)?;
        Self::validate(&name, value_type, &options)?;
        Ok(Self {
            name,
            value_type,
            options,
            accessor: Arc::new(StoredProperty),
            persisted: true,
        })
    }

    /// Creates a property that is not persisted, read and written through `accessor`.
    pub fn computed(
        name: impl Into<Cow<'static, str>>,
        value_type: ValueType,
        accessor: impl PropertyAccessor + 'static,
    ) -> Result<Self> {
        let name = name.into();
        let options = Options::default();
        Self::validate(&name, value_type, &options)?;
        Ok(Self {
            name,
            value_type,
            options,
            accessor: Arc::new(accessor),
            persisted: false,
        })
    }

    fn validate(name: &str, value_type: ValueType, options: &Options) -> Result<()> {
        if name.is_empty() {
            return Err(RoostError::SchemaDefinition("Property name cannot be empty".into()).into());
        }
        if options.auto_increment && !matches!(value_type, ValueType::Integer { .. }) {
            return Err(RoostError::SchemaDefinition(format!(
                "Property `{}` is auto_increment but its type is {}",
                name, value_type
            ))
            .into());
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn is_primary(&self) -> bool {
        self.options.primary
    }

    pub fn is_auto_increment(&self) -> bool {
        self.options.auto_increment
    }

    pub fn is_required(&self) -> bool {
        self.options.required
    }

    pub fn call_get(&self, instance: &Instance) -> Result<Value> {
        self.accessor.call_get(self, instance)
    }

    pub fn call_set(&self, instance: &mut Instance, value: Value) -> Result<()> {
        self.accessor.call_set(self, instance, value)
    }
}

impl Debug for PropertySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySlot")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("options", &self.options)
            .field("persisted", &self.persisted)
            .finish()
    }
}

impl Display for PropertySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
