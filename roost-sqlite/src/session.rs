use crate::{
    CBox,
    bind::bind_value,
    error_message_from_ptr,
    extract::{extract_field, extract_value},
};
use libsqlite3_sys::*;
use roost_core::{
    ConnectTarget, Context, Error, RawResultSet, Result, RoostError, Row, RowsAffected, Session,
    Value, truncate_long,
};
use std::{
    ffi::{CString, c_char, c_int},
    ptr,
    sync::atomic::{AtomicPtr, Ordering},
};
use tokio::task::spawn_blocking;

// Not exposed by libsqlite3-sys' pregenerated bundled bindings, but compiled into the bundled library.
unsafe extern "C" {
    fn sqlite3_close_v2(db: *mut sqlite3) -> c_int;
}

/// Open SQLite database handle.
#[derive(Debug)]
pub struct SqliteSession {
    pub(crate) connection: CBox<*mut sqlite3>,
}

impl SqliteSession {
    pub(crate) async fn open(target: &ConnectTarget) -> Result<Self> {
        let busy_timeout = target
            .option("busy_timeout")
            .map(|v| {
                v.parse::<c_int>()
                    .with_context(|| format!("Invalid busy_timeout `{}`", v))
            })
            .transpose()
            .map_err(|e| {
                let e = e.context(RoostError::Connection(format!(
                    "Bad connection target `{}`",
                    target
                )));
                log::error!("{:#}", e);
                e
            })?;
        let location = target.location.clone();
        let uri = CString::new(Self::uri(target)).map_err(|e| {
            let e = Error::new(e).context(RoostError::Connection(format!(
                "The location `{}` contains a nul byte",
                location
            )));
            log::error!("{:#}", e);
            e
        })?;
        let connection = spawn_blocking(move || -> Result<CBox<*mut sqlite3>> {
            let mut connection = CBox::new(ptr::null_mut::<sqlite3>(), |p| unsafe {
                sqlite3_close_v2(p);
            });
            let rc = unsafe {
                sqlite3_open_v2(
                    uri.as_ptr(),
                    &mut *connection,
                    SQLITE_OPEN_URI | SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE,
                    ptr::null(),
                )
            };
            if rc != SQLITE_OK {
                let message = if connection.is_null() {
                    "Out of memory".to_string()
                } else {
                    unsafe { error_message_from_ptr(&sqlite3_errmsg(*connection)).to_string() }
                };
                let error = Error::new(RoostError::Connection(format!(
                    "Cannot open `{}` (code {}): {}",
                    location, rc, message
                )));
                log::error!("{:#}", error);
                return Err(error);
            }
            if let Some(timeout) = busy_timeout {
                unsafe {
                    sqlite3_busy_timeout(*connection, timeout);
                }
            }
            Ok(connection)
        })
        .await??;
        Ok(Self { connection })
    }

    /// SQLite URI filename for the target.
    fn uri(target: &ConnectTarget) -> String {
        let mut uri = String::from("file:");
        for c in target.location.chars() {
            match c {
                '%' => uri.push_str("%25"),
                '?' => uri.push_str("%3f"),
                '#' => uri.push_str("%23"),
                c => uri.push(c),
            }
        }
        let mut separator = '?';
        for (key, value) in target
            .options
            .iter()
            .filter(|(k, _)| k.as_str() != "busy_timeout")
        {
            uri.push(separator);
            uri.push_str(&urlencoding::encode(key));
            uri.push('=');
            uri.push_str(&urlencoding::encode(value));
            separator = '&';
        }
        uri
    }
}

impl Session for SqliteSession {
    async fn execute(&mut self, statement: &str, params: &[Value]) -> Result<RawResultSet> {
        let connection = AtomicPtr::new(*self.connection);
        let sql = statement.to_owned();
        let params = params.to_vec();
        spawn_blocking(move || run(connection.load(Ordering::Relaxed), &sql, &params))
            .await
            .map_err(|e| {
                Error::new(e).context(format!(
                    "While running the statement:\n{}",
                    truncate_long!(statement)
                ))
            })?
    }

    async fn database_exists(&mut self, name: &str) -> Result<bool> {
        let attached = self.execute("PRAGMA database_list", &[]).await?;
        Ok(attached
            .rows
            .iter()
            .any(|row| row.get(1).and_then(Value::as_str) == Some(name)))
    }
}

/// Prepares, binds and steps one statement to completion on the calling thread.
fn run(connection: *mut sqlite3, sql: &str, params: &[Value]) -> Result<RawResultSet> {
    let failure = |rc: c_int| -> Error {
        let message = unsafe { error_message_from_ptr(&sqlite3_errmsg(connection)).to_string() };
        RoostError::Statement {
            code: Some(rc),
            message,
        }
        .into()
    };
    let changes = unsafe { sqlite3_total_changes(connection) };
    let mut statement = CBox::new(ptr::null_mut::<sqlite3_stmt>(), |p| unsafe {
        sqlite3_finalize(p);
    });
    let mut tail: *const c_char = ptr::null();
    let rc = unsafe {
        sqlite3_prepare_v2(
            connection,
            sql.as_ptr() as *const c_char,
            sql.len() as c_int,
            &mut *statement,
            &mut tail,
        )
    };
    if rc != SQLITE_OK {
        return Err(failure(rc));
    }
    if !tail.is_null() {
        let consumed = (tail as usize).saturating_sub(sql.as_ptr() as usize);
        if sql
            .get(consumed..)
            .is_some_and(|rest| !rest.trim().is_empty())
        {
            return Err(RoostError::Statement {
                code: None,
                message: "Cannot run more than one statement at a time".into(),
            }
            .into());
        }
    }
    if statement.is_null() {
        // Only whitespace or comments
        return Ok(RawResultSet::default());
    }
    let expected = unsafe { sqlite3_bind_parameter_count(*statement) } as usize;
    if expected != params.len() {
        return Err(RoostError::Statement {
            code: None,
            message: format!(
                "The statement expects {} parameters but {} were provided",
                expected,
                params.len()
            ),
        }
        .into());
    }
    for (i, value) in params.iter().enumerate() {
        bind_value(*statement, i as c_int + 1, value)?;
    }
    let count = unsafe { sqlite3_column_count(*statement) };
    let fields = (0..count)
        .map(|i| extract_field(*statement, i))
        .collect::<Result<Vec<_>>>()?;
    let mut rows = Vec::new();
    loop {
        match unsafe { sqlite3_step(*statement) } {
            SQLITE_ROW => rows.push(
                (0..count)
                    .map(|i| extract_value(*statement, i))
                    .collect::<Result<Row>>()?,
            ),
            SQLITE_DONE => break,
            rc => return Err(failure(rc)),
        }
    }
    let changes = unsafe { (sqlite3_total_changes(connection) - changes).max(0) as u64 };
    // The rowid is per connection, an insert into another table may repeat the previous value
    let last_id = (changes > 0 && is_insert(sql))
        .then(|| unsafe { sqlite3_last_insert_rowid(connection) });
    Ok(RawResultSet {
        fields,
        rows,
        affected: RowsAffected {
            rows_affected: changes,
            last_affected_id: last_id,
        },
    })
}

/// Whether the statement starts with a keyword that adds rows.
fn is_insert(sql: &str) -> bool {
    let keyword = sql
        .trim_start()
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default();
    keyword.eq_ignore_ascii_case("INSERT") || keyword.eq_ignore_ascii_case("REPLACE")
}
