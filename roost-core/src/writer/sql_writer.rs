use crate::{
    PropertySlot, Schema, TableRef, Value, ValueType, separated_by, writer::Context,
};
use std::fmt::Write;

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}

/// Dialect printer producing the statements issued by the mappers.
///
/// Every statement is written with positional placeholders, values travel separately as
/// parameters. Literal values only appear in column defaults.
pub trait SqlWriter: Send + Sync {
    fn as_dyn(&self) -> &dyn SqlWriter;

    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &str,
        search: char,
        replace: &str,
    ) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote identifiers ("name") doubling inner quotes.
    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(context, out, value, '"', "\"\"");
        out.push('"');
    }

    fn write_table_ref(&self, context: &mut Context, out: &mut String, value: &TableRef) {
        if !value.schema.is_empty() {
            self.write_identifier_quoted(context, out, &value.schema);
            out.push('.');
        }
        self.write_identifier_quoted(context, out, &value.name);
    }

    /// Positional parameter marker.
    fn write_placeholder(&self, context: &mut Context, out: &mut String) {
        context.counter += 1;
        out.push('?');
    }

    /// Column type of a property.
    fn write_column_type(&self, _context: &mut Context, out: &mut String, slot: &PropertySlot) {
        match slot.value_type() {
            ValueType::Integer { .. } => out.push_str("BIGINT"),
            ValueType::Float => out.push_str("DOUBLE"),
            ValueType::String { length } => {
                out.push_str("VARCHAR");
                if let Some(length) = slot.options().width.or(length) {
                    let _ = write!(out, "({})", length);
                }
            }
            ValueType::Boolean => out.push_str("BOOLEAN"),
            ValueType::Blob => out.push_str("BLOB"),
        }
    }

    /// Column constraint making the store generate the key. `primary` tells whether the column
    /// was just declared as the single column primary key.
    fn write_column_auto_increment(
        &self,
        _context: &mut Context,
        out: &mut String,
        _primary: bool,
    ) {
        out.push_str(" GENERATED BY DEFAULT AS IDENTITY");
    }

    /// Literal value, quoted and escaped.
    fn write_value(&self, context: &mut Context, out: &mut String, value: &Value) {
        match value {
            Value::Null => self.write_value_none(context, out),
            Value::Boolean(v) => self.write_value_bool(context, out, *v),
            Value::Int64(v) => write_integer!(out, *v),
            Value::Float64(v) if v.is_finite() => {
                let mut buffer = ryu::Buffer::new();
                out.push_str(buffer.format(*v));
            }
            Value::Float64(v) => self.write_value_string(context, out, &v.to_string()),
            Value::Varchar(v) | Value::Unknown(v) => self.write_value_string(context, out, v),
            Value::Blob(v) => self.write_value_blob(context, out, v),
        }
    }

    fn write_value_none(&self, _context: &mut Context, out: &mut String) {
        out.push_str("NULL");
    }

    fn write_value_bool(&self, _context: &mut Context, out: &mut String, value: bool) {
        out.push_str(["false", "true"][value as usize]);
    }

    /// String literal using single quotes.
    fn write_value_string(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(context, out, value, '\'', "''");
        out.push('\'');
    }

    fn write_value_blob(&self, _context: &mut Context, out: &mut String, value: &[u8]) {
        out.push_str("X'");
        out.push_str(&hex::encode_upper(value));
        out.push('\'');
    }

    /// Emit CREATE TABLE for the stored properties of `schema`.
    fn write_create_table(
        &self,
        out: &mut String,
        schema: &Schema,
        table: &TableRef,
        if_not_exists: bool,
    ) {
        let mut context = Context::default();
        out.reserve(128 + schema.slots().len() * 64);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("CREATE TABLE ");
        if if_not_exists {
            out.push_str("IF NOT EXISTS ");
        }
        self.write_table_ref(&mut context, out, table);
        out.push_str(" (\n");
        let identity = schema.identity_slots();
        let single = identity.len() == 1;
        separated_by(
            out,
            schema.persisted_slots(),
            |out, v| {
                let primary = single && schema.identity_slots().any(|k| k.name() == v.name());
                self.write_create_table_column_fragment(&mut context, out, v, primary);
            },
            ",\n",
        );
        if identity.len() > 1 {
            out.push_str(",\nPRIMARY KEY (");
            separated_by(
                out,
                identity,
                |out, v| self.write_identifier_quoted(&mut context, out, v.name()),
                ", ",
            );
            out.push(')');
        }
        out.push_str("\n);");
    }

    /// Column definition inside CREATE TABLE. `primary` marks the single column key.
    fn write_create_table_column_fragment(
        &self,
        context: &mut Context,
        out: &mut String,
        slot: &PropertySlot,
        primary: bool,
    ) {
        self.write_identifier_quoted(context, out, slot.name());
        out.push(' ');
        self.write_column_type(context, out, slot);
        if slot.is_required() && !primary {
            out.push_str(" NOT NULL");
        }
        if let Some(default) = &slot.options().default {
            out.push_str(" DEFAULT ");
            let value = slot
                .value_type()
                .coerce(Value::Varchar(default.clone()))
                .unwrap_or_else(|e| {
                    log::warn!(
                        "Default of `{}` is written as text: {:#}",
                        slot.name(),
                        e
                    );
                    Value::Varchar(default.clone())
                });
            self.write_value(context, out, &value);
        }
        if primary {
            out.push_str(" PRIMARY KEY");
        }
        if slot.is_auto_increment() {
            self.write_column_auto_increment(context, out, primary);
        }
        if slot.options().unique && !primary {
            out.push_str(" UNIQUE");
        }
    }

    fn write_drop_table(&self, out: &mut String, table: &TableRef, if_exists: bool) {
        out.reserve(24 + table.schema.len() + table.name.len());
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("DROP TABLE ");
        let mut context = Context::default();
        if if_exists {
            out.push_str("IF EXISTS ");
        }
        self.write_table_ref(&mut context, out, table);
        out.push(';');
    }

    /// Emit SELECT. An empty column list selects `*`, `condition` is copied verbatim.
    fn write_select(
        &self,
        out: &mut String,
        table: &TableRef,
        columns: &[&str],
        condition: Option<&str>,
    ) {
        out.reserve(128 + columns.len() * 32);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("SELECT ");
        let mut context = Context::default();
        if columns.is_empty() {
            out.push('*');
        }
        separated_by(
            out,
            columns,
            |out, v| self.write_identifier_quoted(&mut context, out, v),
            ", ",
        );
        out.push_str("\nFROM ");
        self.write_table_ref(&mut context, out, table);
        if let Some(condition) = condition.filter(|v| !v.trim().is_empty()) {
            out.push_str("\nWHERE ");
            out.push_str(condition);
        }
        out.push(';');
    }

    /// Emit a single row INSERT with one placeholder per column.
    fn write_insert(&self, out: &mut String, table: &TableRef, columns: &[&str]) {
        out.reserve(128 + columns.len() * 48);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("INSERT INTO ");
        let mut context = Context::default();
        self.write_table_ref(&mut context, out, table);
        if columns.is_empty() {
            out.push_str(" DEFAULT VALUES;");
            return;
        }
        out.push_str(" (");
        separated_by(
            out,
            columns,
            |out, v| self.write_identifier_quoted(&mut context, out, v),
            ", ",
        );
        out.push_str(")\nVALUES (");
        separated_by(
            out,
            columns,
            |out, _| self.write_placeholder(&mut context, out),
            ", ",
        );
        out.push_str(");");
    }

    /// Emit UPDATE of `columns` for the row matching `keys`. Parameters are the column values
    /// followed by the key values.
    fn write_update(&self, out: &mut String, table: &TableRef, columns: &[&str], keys: &[&str]) {
        out.reserve(128 + (columns.len() + keys.len()) * 48);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("UPDATE ");
        let mut context = Context::default();
        self.write_table_ref(&mut context, out, table);
        out.push_str("\nSET ");
        separated_by(
            out,
            columns,
            |out, v| {
                self.write_identifier_quoted(&mut context, out, v);
                out.push_str(" = ");
                self.write_placeholder(&mut context, out);
            },
            ", ",
        );
        out.push_str("\nWHERE ");
        self.write_key_condition(&mut context, out, keys);
        out.push(';');
    }

    fn write_delete(&self, out: &mut String, table: &TableRef, keys: &[&str]) {
        out.reserve(128 + table.schema.len() + table.name.len());
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("DELETE FROM ");
        let mut context = Context::default();
        self.write_table_ref(&mut context, out, table);
        out.push_str("\nWHERE ");
        self.write_key_condition(&mut context, out, keys);
        out.push(';');
    }

    /// `"a" = ? AND "b" = ?`
    fn write_key_condition(&self, context: &mut Context, out: &mut String, keys: &[&str]) {
        separated_by(
            out,
            keys,
            |out, v| {
                self.write_identifier_quoted(context, out, v);
                out.push_str(" = ");
                self.write_placeholder(context, out);
            },
            " AND ",
        );
    }
}

/// Writer for the common SQL dialect, used by drivers without their own.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;

impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}
