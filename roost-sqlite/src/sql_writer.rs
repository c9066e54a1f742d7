use roost_core::{PropertySlot, SqlWriter, ValueType, writer::Context};
use std::fmt::Write;

/// SQLite dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteSqlWriter {}

impl SqlWriter for SqliteSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn write_column_type(&self, _context: &mut Context, out: &mut String, slot: &PropertySlot) {
        match slot.value_type() {
            // Generated keys must be declared exactly INTEGER to alias the rowid
            ValueType::Integer { .. } => out.push_str("INTEGER"),
            ValueType::Float => out.push_str("REAL"),
            ValueType::String { length } => match slot.options().width.or(length) {
                Some(length) => {
                    let _ = write!(out, "VARCHAR({})", length);
                }
                None => out.push_str("TEXT"),
            },
            ValueType::Boolean => out.push_str("BOOLEAN"),
            ValueType::Blob => out.push_str("BLOB"),
        }
    }

    fn write_column_auto_increment(
        &self,
        _context: &mut Context,
        out: &mut String,
        primary: bool,
    ) {
        // Composite keys cannot be generated by SQLite
        if primary {
            out.push_str(" AUTOINCREMENT");
        }
    }
}
