use crate::{
    Context, Executor, Finder, Identity, Instance, Mapper, PropertyAccessor, PropertySlot, Record,
    Result, RoostError, TableMapper, TableRef, Value, ValueType,
};
use std::{
    any::TypeId,
    borrow::Cow,
    collections::HashMap,
    future::Future,
    sync::{Arc, LazyLock, Mutex, PoisonError, RwLock},
};

/// A persistable type of the domain model.
///
/// The schema is built lazily from [`DomainType::define`] the first time it is needed and then
/// shared by every instance of the type.
pub trait DomainType: Sized + 'static {
    /// Name of the type, also the default table name.
    const NAME: &'static str;

    /// Declares the properties of the type. It must not request the schema of `Self`.
    fn define(schema: &mut SchemaBuilder) -> Result<()>;

    /// Runs on every instance created through [`DomainType::build`], before the initial values
    /// are applied. Hydrated instances skip it.
    fn construct(_instance: &mut Instance) -> Result<()> {
        Ok(())
    }

    fn schema() -> Result<Arc<Schema>> {
        schema_of::<Self>()
    }

    /// New unsaved instance, `record` entries count as changes.
    fn build(record: Record) -> Result<Instance> {
        Self::schema()?.instantiate(record)
    }

    /// Instance rebuilt from stored values, without running the construction hook.
    fn hydrate(record: Record, saved: bool) -> Result<Instance> {
        Ok(Self::schema()?.hydrate(record, saved))
    }

    fn finder() -> Finder<Self> {
        Finder::new()
    }

    /// Builds and saves a new instance.
    fn create<E: Executor>(
        executor: &mut E,
        record: Record,
    ) -> impl Future<Output = Result<Instance>> + Send {
        async move {
            let mut instance = Self::build(record)?;
            instance.save(executor).await?;
            Ok(instance)
        }
    }

    /// Saves every record as a new instance, in order. Stops at the first failure.
    fn import<E: Executor>(
        executor: &mut E,
        records: impl IntoIterator<Item = Record>,
    ) -> impl Future<Output = Result<Vec<Instance>>> + Send {
        let records = records.into_iter().collect::<Vec<_>>();
        async move {
            let schema = Self::schema()?;
            let mut result = Vec::with_capacity(records.len());
            for record in records {
                let mut instance = schema.hydrate(record, false);
                instance.save(executor).await?;
                result.push(instance);
            }
            Ok(result)
        }
    }

    fn create_table<E: Executor>(
        executor: &mut E,
        if_not_exists: bool,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            let mapper = Self::schema()?.mapper();
            mapper.create_table(executor, if_not_exists).await
        }
    }

    fn drop_table<E: Executor>(
        executor: &mut E,
        if_exists: bool,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            let mapper = Self::schema()?.mapper();
            mapper.drop_table(executor, if_exists).await
        }
    }
}

/// Collects the declarations of a domain type.
#[derive(Debug)]
pub struct SchemaBuilder {
    type_name: &'static str,
    table: Cow<'static, str>,
    slots: Vec<PropertySlot>,
    identity: Option<Vec<String>>,
}

impl SchemaBuilder {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            table: Cow::Borrowed(type_name),
            slots: Vec::new(),
            identity: None,
        }
    }

    pub fn table(&mut self, name: impl Into<Cow<'static, str>>) -> &mut Self {
        self.table = name.into();
        self
    }

    /// Declares a stored property. `options` follows the grammar of [`crate::Options`].
    pub fn property(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        value_type: ValueType,
        options: &str,
    ) -> Result<&mut Self> {
        let type_name = self.type_name;
        let slot = PropertySlot::new(name, value_type, options)
            .with_context(|| format!("While declaring a property of `{}`", type_name))?;
        self.slot(slot)
    }

    /// Declares a property that is not stored, served by `accessor`.
    pub fn computed(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        value_type: ValueType,
        accessor: impl PropertyAccessor + 'static,
    ) -> Result<&mut Self> {
        let slot = PropertySlot::computed(name, value_type, accessor)?;
        self.slot(slot)
    }

    pub fn slot(&mut self, slot: PropertySlot) -> Result<&mut Self> {
        if self.slots.iter().any(|v| v.name() == slot.name()) {
            return Err(RoostError::SchemaDefinition(format!(
                "Property `{}` is declared twice on `{}`",
                slot.name(),
                self.type_name
            ))
            .into());
        }
        self.slots.push(slot);
        Ok(self)
    }

    /// Overrides the identity rule, which defaults to the primary properties in declaration
    /// order.
    pub fn identity<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identity = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self, constructor: fn(&mut Instance) -> Result<()>) -> Result<Schema> {
        let invalid = |message: String| -> crate::Error {
            let error = RoostError::SchemaDefinition(message);
            log::error!("{}", error);
            error.into()
        };
        if !self.slots.iter().any(PropertySlot::is_persisted) {
            return Err(invalid(format!(
                "`{}` does not declare any stored property",
                self.type_name
            )));
        }
        let index = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, v)| (v.name().to_owned(), i))
            .collect::<HashMap<_, _>>();
        let identity = match &self.identity {
            Some(names) => names
                .iter()
                .map(|name| match index.get(name) {
                    Some(&i) if self.slots[i].is_persisted() => Ok(i),
                    _ => Err(invalid(format!(
                        "Identity of `{}` references `{}` which is not a stored property",
                        self.type_name, name
                    ))),
                })
                .collect::<Result<Vec<_>>>()?,
            None => self
                .slots
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_primary() && v.is_persisted())
                .map(|(i, _)| i)
                .collect(),
        };
        let generated = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_auto_increment())
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        if generated.len() > 1 {
            return Err(invalid(format!(
                "`{}` declares more than one auto_increment property",
                self.type_name
            )));
        }
        if let Some(i) = generated.first()
            && !identity.contains(i)
        {
            return Err(invalid(format!(
                "Auto increment property `{}` of `{}` is not part of its identity",
                self.slots[*i].name(),
                self.type_name
            )));
        }
        Ok(Schema {
            type_name: self.type_name,
            table: TableRef::new(self.table),
            slots: self.slots,
            index,
            identity,
            constructor,
        })
    }
}

/// Property slots and identity rule of a domain type.
#[derive(Debug)]
pub struct Schema {
    type_name: &'static str,
    table: TableRef,
    slots: Vec<PropertySlot>,
    index: HashMap<String, usize>,
    identity: Vec<usize>,
    constructor: fn(&mut Instance) -> Result<()>,
}

impl Schema {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    pub fn slots(&self) -> &[PropertySlot] {
        &self.slots
    }

    pub fn persisted_slots(&self) -> impl Iterator<Item = &PropertySlot> {
        self.slots.iter().filter(|v| v.is_persisted())
    }

    pub fn slot(&self, name: &str) -> Option<&PropertySlot> {
        self.index.get(name).map(|&i| &self.slots[i])
    }

    /// Slot called `name`, or a [`RoostError::NoSuchProperty`].
    pub fn lookup(&self, name: &str) -> Result<&PropertySlot> {
        self.slot(name).ok_or_else(|| {
            RoostError::NoSuchProperty {
                type_name: self.type_name.into(),
                property: name.into(),
            }
            .into()
        })
    }

    /// Slots forming the identity, in rule order.
    pub fn identity_slots(&self) -> impl ExactSizeIterator<Item = &PropertySlot> {
        self.identity.iter().map(|&i| &self.slots[i])
    }

    pub fn auto_increment_slot(&self) -> Option<&PropertySlot> {
        self.slots.iter().find(|v| v.is_auto_increment())
    }

    pub fn identity(&self, instance: &Instance) -> Identity {
        Identity::new(
            self.identity_slots()
                .map(|v| (v.name().to_owned(), instance.get(v.name())))
                .collect(),
        )
    }

    /// New unsaved instance: runs the construction hook, then applies `record` as changes.
    pub fn instantiate(self: &Arc<Self>, record: Record) -> Result<Instance> {
        let mut instance = Instance::blank(self.clone());
        (self.constructor)(&mut instance)
            .with_context(|| format!("While constructing a new `{}`", self.type_name))?;
        instance.load(record);
        Ok(instance)
    }

    /// Instance rebuilt from `record`. A saved instance starts with an empty change log.
    pub fn hydrate(self: &Arc<Self>, record: Record, saved: bool) -> Instance {
        let mut instance = Instance::blank(self.clone());
        instance.load(record);
        if saved {
            instance.mark_saved(true).clear_changes();
        }
        instance
    }

    /// Coerces `value` to the declared type of property `name`. Slots declared `unsigned`
    /// reject negative numbers.
    pub fn coerce(&self, name: &str, value: Value) -> Result<Value> {
        let slot = self.lookup(name)?;
        let value = slot.value_type().coerce(value).with_context(|| {
            format!(
                "While converting property `{}` of `{}`",
                name, self.type_name
            )
        })?;
        let negative = match value {
            Value::Int64(v) => v < 0,
            Value::Float64(v) => v < 0.0,
            _ => false,
        };
        if slot.options().unsigned && negative {
            return Err(RoostError::Precursor(format!(
                "Property `{}` of `{}` is unsigned but holds {}",
                name, self.type_name, value
            ))
            .into());
        }
        Ok(value)
    }

    pub fn mapper(self: &Arc<Self>) -> TableMapper {
        TableMapper::new(self.clone())
    }
}

struct Registry {
    built: RwLock<HashMap<TypeId, Arc<Schema>>>,
    building: Mutex<HashMap<TypeId, Arc<Mutex<()>>>>,
}

static REGISTRY: LazyLock<Registry> = LazyLock::new(|| Registry {
    built: RwLock::default(),
    building: Mutex::default(),
});

impl Registry {
    fn get(&self, id: TypeId) -> Option<Arc<Schema>> {
        self.built
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }
}

/// Schema of `T`, built on first use.
///
/// Concurrent first uses build it once, the others wait and observe the same schema. A failed
/// definition is not cached and is reported to each caller.
pub fn schema_of<T: DomainType>() -> Result<Arc<Schema>> {
    let id = TypeId::of::<T>();
    if let Some(schema) = REGISTRY.get(id) {
        return Ok(schema);
    }
    let lock = REGISTRY
        .building
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(id)
        .or_default()
        .clone();
    let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(schema) = REGISTRY.get(id) {
        return Ok(schema);
    }
    let mut builder = SchemaBuilder::new(T::NAME);
    T::define(&mut builder)
        .and_then(|_| builder.build(T::construct))
        .map(Arc::new)
        .with_context(|| format!("While building the schema of `{}`", T::NAME))
        .inspect(|schema| {
            log::debug!(
                "Built the schema of `{}` with {} properties",
                T::NAME,
                schema.slots().len()
            );
            REGISTRY
                .built
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(id, schema.clone());
        })
}

/// Schema already built for the domain type called `type_name`, if any.
pub fn registered_schema(type_name: &str) -> Option<Arc<Schema>> {
    REGISTRY
        .built
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .values()
        .find(|v| v.type_name() == type_name)
        .cloned()
}
