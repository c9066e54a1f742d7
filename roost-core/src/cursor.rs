use crate::{
    FieldDescriptor, RawResultSet, Result, RoostError, Row, RowLabeled, RowNames, RowsAffected,
    Value,
};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Ties a result to the session that produced it.
///
/// The connection stores the id of its current session in `live`, a cursor is alive while that
/// id is still the one it was created with.
#[derive(Debug, Clone)]
pub struct SessionToken {
    live: Arc<AtomicU64>,
    session: u64,
}

impl SessionToken {
    pub fn new(live: Arc<AtomicU64>, session: u64) -> Self {
        Self { live, session }
    }

    /// Token of a result not bound to any session, it never dies.
    pub fn detached() -> Self {
        Self {
            live: Arc::new(AtomicU64::new(0)),
            session: 0,
        }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire) == self.session
    }
}

/// Field of a result row, by zero based index or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef {
    Index(usize),
    Name(String),
}

impl Default for FieldRef {
    fn default() -> Self {
        FieldRef::Index(0)
    }
}

impl From<usize> for FieldRef {
    fn from(value: usize) -> Self {
        FieldRef::Index(value)
    }
}

impl From<&str> for FieldRef {
    fn from(value: &str) -> Self {
        FieldRef::Name(value.to_owned())
    }
}

impl From<String> for FieldRef {
    fn from(value: String) -> Self {
        FieldRef::Name(value)
    }
}

/// Positioned reader over the rows of an executed statement.
#[derive(Debug)]
pub struct ResultCursor {
    fields: Arc<[FieldDescriptor]>,
    labels: RowNames,
    rows: Vec<Row>,
    position: usize,
    affected: RowsAffected,
    token: SessionToken,
}

impl ResultCursor {
    /// Values of fields with a declared type are converted to it. Values that do not convert,
    /// and values of untyped fields, are kept as returned by the store.
    pub fn new(raw: RawResultSet, token: SessionToken) -> Self {
        let fields: Arc<[FieldDescriptor]> = raw.fields.into();
        let labels: RowNames = fields.iter().map(|v| v.name.clone()).collect();
        let rows = raw
            .rows
            .into_iter()
            .map(|row| {
                row.into_vec()
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| {
                        let Some(value_type) = fields.get(i).and_then(|v| v.value_type) else {
                            return value;
                        };
                        value_type.coerce(value.clone()).unwrap_or_else(|e| {
                            log::debug!(
                                "Keeping the raw value of field `{}`: {:#}",
                                fields[i].name,
                                e
                            );
                            value
                        })
                    })
                    .collect()
            })
            .collect();
        Self {
            fields,
            labels,
            rows,
            position: 0,
            affected: raw.affected,
            token,
        }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn labels(&self) -> &RowNames {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn affected(&self) -> RowsAffected {
        self.affected
    }

    pub fn rows_affected(&self) -> u64 {
        self.affected.rows_affected
    }

    pub fn last_insert_id(&self) -> Option<i64> {
        self.affected.last_affected_id
    }

    /// False once the connection that produced it reconnected or disconnected.
    pub fn is_alive(&self) -> bool {
        self.token.is_alive()
    }

    fn check_alive(&self) -> Result<()> {
        if self.is_alive() {
            return Ok(());
        }
        let error = RoostError::Connection(format!(
            "The result of session {} is no longer readable, its connection was reset",
            self.token.session()
        ));
        log::error!("{}", error);
        Err(error.into())
    }

    fn field_index(&self, field: &FieldRef) -> Result<usize> {
        let index = match field {
            FieldRef::Index(i) => Some(*i).filter(|i| *i < self.fields.len()),
            FieldRef::Name(name) => self.labels.iter().position(|v| v == name),
        };
        index.ok_or_else(|| {
            let error = RoostError::NoSuchField(match field {
                FieldRef::Index(i) => i.to_string(),
                FieldRef::Name(name) => name.clone(),
            });
            log::error!("{}", error);
            error.into()
        })
    }

    /// Row at the current position, then advances. `None` past the last row.
    pub fn row(&mut self) -> Result<Option<RowLabeled>> {
        self.check_alive()?;
        let Some(row) = self.rows.get(self.position) else {
            return Ok(None);
        };
        let row = RowLabeled::new(self.labels.clone(), row.clone());
        self.position += 1;
        Ok(Some(row))
    }

    /// Single field of the current row, then advances like [`ResultCursor::row`].
    pub fn scalar(&mut self, field: impl Into<FieldRef>) -> Result<Option<Value>> {
        self.check_alive()?;
        let index = self.field_index(&field.into())?;
        let Some(row) = self.rows.get(self.position) else {
            return Ok(None);
        };
        let value = row.get(index).cloned().unwrap_or_default();
        self.position += 1;
        Ok(Some(value))
    }

    /// Moves to row `position`. Positions past the end stop at [`ResultCursor::len`].
    pub fn seek(&mut self, position: usize) -> &mut Self {
        self.position = position.min(self.rows.len());
        self
    }

    /// One shot sequence of `field` over the remaining rows, advancing the cursor.
    pub fn column(&mut self, field: impl Into<FieldRef>) -> Result<Column<'_>> {
        self.check_alive()?;
        let index = self.field_index(&field.into())?;
        Ok(Column {
            cursor: self,
            index,
            done: false,
        })
    }

    /// Remaining rows, from the current position.
    pub fn into_rows(self) -> Vec<RowLabeled> {
        let labels = self.labels;
        self.rows
            .into_iter()
            .skip(self.position)
            .map(|v| RowLabeled::new(labels.clone(), v))
            .collect()
    }
}

/// Values of one field across the remaining rows of a [`ResultCursor`].
#[derive(Debug)]
pub struct Column<'a> {
    cursor: &'a mut ResultCursor,
    index: usize,
    done: bool,
}

impl Iterator for Column<'_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Err(e) = self.cursor.check_alive() {
            self.done = true;
            return Some(Err(e));
        }
        let cursor = &mut *self.cursor;
        let Some(row) = cursor.rows.get(cursor.position) else {
            self.done = true;
            return None;
        };
        let value = row.get(self.index).cloned().unwrap_or_default();
        cursor.position += 1;
        Some(Ok(value))
    }
}
