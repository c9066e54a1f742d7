use crate::{
    DomainType, Error, Executor, Instance, Mapper, Result, RoostError, Value, writer::Context,
};
use std::{
    fmt::{self, Debug},
    marker::PhantomData,
};

/// Typed entry point of the queries of a domain type.
pub struct Finder<T: DomainType> {
    _type: PhantomData<fn() -> T>,
}

impl<T: DomainType> Finder<T> {
    pub fn new() -> Self {
        Self { _type: PhantomData }
    }

    /// Every stored instance.
    pub async fn all<E: Executor>(&self, executor: &mut E) -> Result<Vec<Instance>> {
        T::schema()?.mapper().find(executor, None, &[]).await
    }

    /// Instances matching `condition`, a raw WHERE clause with positional placeholders.
    pub async fn where_clause<E: Executor>(
        &self,
        executor: &mut E,
        condition: &str,
        params: &[Value],
    ) -> Result<Vec<Instance>> {
        T::schema()?
            .mapper()
            .find(executor, Some(condition), params)
            .await
    }

    /// First instance matching `condition`.
    pub async fn one<E: Executor>(
        &self,
        executor: &mut E,
        condition: &str,
        params: &[Value],
    ) -> Result<Option<Instance>> {
        Ok(self
            .where_clause(executor, condition, params)
            .await?
            .into_iter()
            .next())
    }

    /// Instance whose identity properties hold `values`, in identity order.
    pub async fn by_identity<E: Executor>(
        &self,
        executor: &mut E,
        values: &[Value],
    ) -> Result<Option<Instance>> {
        let schema = T::schema()?;
        if values.len() != schema.identity_slots().len() {
            let error = Error::msg(format!(
                "`{}` is identified by {} values, {} were given",
                T::NAME,
                schema.identity_slots().len(),
                values.len()
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        let keys = schema
            .identity_slots()
            .map(|v| v.name())
            .collect::<Vec<_>>();
        let mut condition = String::new();
        executor
            .sql_writer()
            .write_key_condition(&mut Context::default(), &mut condition, &keys);
        let mut found = schema
            .mapper()
            .find(executor, Some(&condition), values)
            .await?;
        if found.len() > 1 {
            let error = RoostError::InvariantViolation(format!(
                "{} rows of `{}` share the same identity",
                found.len(),
                T::NAME
            ));
            log::error!("{}", error);
            return Err(error.into());
        }
        Ok(found.pop())
    }
}

impl<T: DomainType> Default for Finder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DomainType> Clone for Finder<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: DomainType> Copy for Finder<T> {}

impl<T: DomainType> Debug for Finder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Finder<{}>", T::NAME)
    }
}
