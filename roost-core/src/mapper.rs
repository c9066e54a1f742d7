use crate::{
    Context, Error, Executor, Instance, Record, Result, RoostError, Schema, TableRef, Value,
};
use std::{future::Future, sync::Arc};

/// Moves instances of one domain type in and out of the store.
pub trait Mapper: Send + Sync {
    /// Inserts an instance never saved, or updates a saved one with an assigned identity.
    fn save<E: Executor>(
        &self,
        executor: &mut E,
        instance: &mut Instance,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Removes the row matching the identity of the instance, which is then marked unsaved.
    fn delete<E: Executor>(
        &self,
        executor: &mut E,
        instance: &mut Instance,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Instances of the rows matching `condition`, a raw WHERE clause using `params`.
    fn find<E: Executor>(
        &self,
        executor: &mut E,
        condition: Option<&str>,
        params: &[Value],
    ) -> impl Future<Output = Result<Vec<Instance>>> + Send;

    /// Saved instance holding `record`, the construction hook does not run.
    fn hydrate(&self, record: Record) -> Instance;
}

/// Mapper storing each instance as one row of the table named by its schema, one column per
/// stored property.
#[derive(Debug, Clone)]
pub struct TableMapper {
    schema: Arc<Schema>,
}

fn precursor(message: String) -> Error {
    let error = RoostError::Precursor(message);
    log::error!("{}", error);
    error.into()
}

fn invariant(message: String) -> Error {
    let error = RoostError::InvariantViolation(message);
    log::error!("{}", error);
    error.into()
}

impl TableMapper {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Table of the schema, inside the database selected on `executor`.
    pub fn table<E: Executor>(&self, executor: &E) -> TableRef {
        self.schema.table().qualified(executor.selected_database())
    }

    /// Inserts the instance as a new row.
    ///
    /// Only changed properties are sent, or every property holding a value when nothing
    /// changed. A key generated by the store is resolved into the instance.
    pub async fn insert<E: Executor>(&self, executor: &mut E, instance: &mut Instance) -> Result<()> {
        let schema = &self.schema;
        let type_name = schema.type_name();
        if let Some(slot) = schema
            .persisted_slots()
            .find(|v| v.is_required() && !v.is_auto_increment() && !instance.has(v.name()))
        {
            return Err(precursor(format!(
                "Cannot insert `{}` without its required property `{}`",
                type_name,
                slot.name()
            )));
        }
        let generated = schema
            .auto_increment_slot()
            .filter(|v| !instance.has(v.name()))
            .map(|v| v.name().to_owned());
        let changed = instance.has_changes();
        let mut columns = Vec::new();
        let mut params = Vec::new();
        for slot in schema.persisted_slots() {
            let name = slot.name();
            let sent = if changed {
                instance.is_changed(name)
            } else {
                instance.has(name)
            };
            if !sent || generated.as_deref() == Some(name) {
                continue;
            }
            columns.push(name);
            params.push(schema.coerce(name, instance.get(name))?);
        }
        let mut statement = String::new();
        executor
            .sql_writer()
            .write_insert(&mut statement, &self.table(executor), &columns);
        let cursor = executor
            .execute(&statement, &params)
            .await
            .with_context(|| format!("While inserting a new `{}`", type_name))?;
        if let Some(name) = generated {
            let Some(id) = cursor.last_insert_id() else {
                return Err(invariant(format!(
                    "The store did not report the key generated for `{}` of `{}`",
                    name, type_name
                )));
            };
            instance.resolve(&name, Value::Int64(id))?;
        }
        instance.settle_futures()?;
        instance.mark_saved(true).clear_changes();
        log::debug!("Inserted `{}` {}", type_name, instance.identity());
        Ok(())
    }

    /// Writes the changed properties of a saved instance. Nothing changed means nothing to do.
    pub async fn update<E: Executor>(&self, executor: &mut E, instance: &mut Instance) -> Result<()> {
        let schema = &self.schema;
        let type_name = schema.type_name();
        let identity = instance.identity();
        if !instance.is_saved() || !identity.is_assigned() {
            return Err(precursor(format!(
                "Cannot update `{}` that was never saved",
                type_name
            )));
        }
        let changes = instance.changes();
        if let Some(slot) = schema.identity_slots().find(|v| changes.contains_key(v.name())) {
            return Err(precursor(format!(
                "Cannot change the identity property `{}` of the saved `{}` {}",
                slot.name(),
                type_name,
                identity
            )));
        }
        let columns = schema
            .persisted_slots()
            .map(|v| v.name())
            .filter(|v| changes.contains_key(*v))
            .collect::<Vec<_>>();
        if columns.is_empty() {
            log::debug!("`{}` {} has nothing to update", type_name, identity);
            instance.clear_changes();
            return Ok(());
        }
        let keys = identity.names().collect::<Vec<_>>();
        let mut params = Vec::with_capacity(columns.len() + keys.len());
        for name in columns.iter().chain(keys.iter()) {
            let value = changes
                .get(*name)
                .cloned()
                .unwrap_or_else(|| instance.get(name));
            params.push(schema.coerce(name, value)?);
        }
        let mut statement = String::new();
        executor.sql_writer().write_update(
            &mut statement,
            &self.table(executor),
            &columns,
            &keys,
        );
        let rows = executor
            .execute(&statement, &params)
            .await
            .with_context(|| format!("While updating `{}` {}", type_name, identity))?
            .rows_affected();
        match rows {
            0 => log::warn!("Update of `{}` {} matched no row", type_name, identity),
            1 => {}
            n => {
                return Err(invariant(format!(
                    "Update of `{}` {} affected {} rows",
                    type_name, identity, n
                )));
            }
        }
        instance.clear_changes();
        Ok(())
    }

    pub async fn create_table<E: Executor>(&self, executor: &mut E, if_not_exists: bool) -> Result<()> {
        let mut statement = String::new();
        executor.sql_writer().write_create_table(
            &mut statement,
            &self.schema,
            &self.table(executor),
            if_not_exists,
        );
        executor
            .execute(&statement, &[])
            .await
            .with_context(|| format!("While creating the table of `{}`", self.schema.type_name()))?;
        Ok(())
    }

    pub async fn drop_table<E: Executor>(&self, executor: &mut E, if_exists: bool) -> Result<()> {
        let mut statement = String::new();
        executor
            .sql_writer()
            .write_drop_table(&mut statement, &self.table(executor), if_exists);
        executor
            .execute(&statement, &[])
            .await
            .with_context(|| format!("While dropping the table of `{}`", self.schema.type_name()))?;
        Ok(())
    }

    /// Instance of a fetched record, values converted to the declared property types.
    fn instance_of(&self, record: Record) -> Result<Instance> {
        let record = record
            .into_iter()
            .map(|(name, value)| match self.schema.slot(&name) {
                Some(..) => {
                    let value = self.schema.coerce(&name, value)?;
                    Ok((name, value))
                }
                None => Ok((name, value)),
            })
            .collect::<Result<Record>>()?;
        Ok(self.schema.hydrate(record, true))
    }
}

impl Mapper for TableMapper {
    fn save<E: Executor>(
        &self,
        executor: &mut E,
        instance: &mut Instance,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            if instance.is_saved() && instance.identity().is_assigned() {
                self.update(executor, instance).await
            } else {
                self.insert(executor, instance).await
            }
        }
    }

    fn delete<E: Executor>(
        &self,
        executor: &mut E,
        instance: &mut Instance,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            let type_name = self.schema.type_name();
            let identity = instance.identity();
            if !instance.is_saved() || !identity.is_assigned() {
                return Err(precursor(format!(
                    "Cannot delete unsaved object `{}`",
                    type_name
                )));
            }
            let keys = identity.names().collect::<Vec<_>>();
            let params = identity
                .parts()
                .iter()
                .map(|(name, value)| self.schema.coerce(name, value.clone()))
                .collect::<Result<Vec<_>>>()?;
            let mut statement = String::new();
            executor
                .sql_writer()
                .write_delete(&mut statement, &self.table(executor), &keys);
            let rows = executor
                .execute(&statement, &params)
                .await
                .with_context(|| format!("While deleting `{}` {}", type_name, identity))?
                .rows_affected();
            match rows {
                1 => {
                    instance.mark_saved(false);
                    log::debug!("Deleted `{}` {}", type_name, identity);
                    Ok(())
                }
                0 => {
                    let error = Error::new(RoostError::Precursor(format!(
                        "No row of `{}` matches {}, nothing was deleted",
                        type_name, identity
                    )));
                    log::info!("{:#}", error);
                    Err(error)
                }
                n => Err(invariant(format!(
                    "Deleting `{}` {} removed {} rows",
                    type_name, identity, n
                ))),
            }
        }
    }

    fn find<E: Executor>(
        &self,
        executor: &mut E,
        condition: Option<&str>,
        params: &[Value],
    ) -> impl Future<Output = Result<Vec<Instance>>> + Send {
        async move {
            let columns = self
                .schema
                .persisted_slots()
                .map(|v| v.name())
                .collect::<Vec<_>>();
            let mut statement = String::new();
            executor.sql_writer().write_select(
                &mut statement,
                &self.table(executor),
                &columns,
                condition,
            );
            let rows = executor
                .fetch(&statement, params)
                .await
                .with_context(|| format!("While finding `{}`", self.schema.type_name()))?;
            rows.into_iter()
                .map(|row| self.instance_of(row.to_record()))
                .collect()
        }
    }

    fn hydrate(&self, record: Record) -> Instance {
        self.schema.hydrate(record, true)
    }
}
