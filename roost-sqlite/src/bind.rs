use crate::error_message_from_ptr;
use libsqlite3_sys::*;
use roost_core::{Error, Result, RoostError, Value};
use std::ffi::{c_char, c_int, c_void};

/// Binds `value` to the 1-based parameter `index`. SQLite copies the data.
pub(crate) fn bind_value(statement: *mut sqlite3_stmt, index: c_int, value: &Value) -> Result<()> {
    let rc = unsafe {
        match value {
            Value::Null => sqlite3_bind_null(statement, index),
            Value::Boolean(v) => sqlite3_bind_int(statement, index, *v as c_int),
            Value::Int64(v) => sqlite3_bind_int64(statement, index, *v),
            Value::Float64(v) => sqlite3_bind_double(statement, index, *v),
            Value::Varchar(v) | Value::Unknown(v) => sqlite3_bind_text(
                statement,
                index,
                v.as_ptr() as *const c_char,
                v.len() as c_int,
                SQLITE_TRANSIENT(),
            ),
            Value::Blob(v) => sqlite3_bind_blob(
                statement,
                index,
                v.as_ptr() as *const c_void,
                v.len() as c_int,
                SQLITE_TRANSIENT(),
            ),
        }
    };
    if rc != SQLITE_OK {
        let message = unsafe {
            error_message_from_ptr(&sqlite3_errmsg(sqlite3_db_handle(statement))).to_string()
        };
        let error = Error::new(RoostError::Statement {
            code: Some(rc),
            message,
        })
        .context(format!("Cannot bind parameter {} to the statement", index));
        log::error!("{:#}", error);
        return Err(error);
    }
    Ok(())
}
