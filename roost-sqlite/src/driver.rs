use crate::{SqliteSession, sql_writer::SqliteSqlWriter};
use libsqlite3_sys::{SQLITE_BUSY, SQLITE_LOCKED};
use roost_core::{ConnectTarget, Connection, Driver, Result};

/// Serves `sqlite://` urls. The location is a file path or `:memory:`, query parameters are
/// forwarded to SQLite as URI parameters, except `busy_timeout` (milliseconds) which is
/// applied to the handle.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDriver {}

pub type SqliteConnection = Connection<SqliteDriver>;

impl SqliteDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for SqliteDriver {
    type Session = SqliteSession;
    type SqlWriter = SqliteSqlWriter;

    const NAME: &'static str = "sqlite";

    fn sql_writer(&self) -> &SqliteSqlWriter {
        &SqliteSqlWriter {}
    }

    async fn connect(&self, target: &ConnectTarget) -> Result<SqliteSession> {
        SqliteSession::open(target).await
    }

    fn transient_codes(&self) -> &'static [i32] {
        &[SQLITE_BUSY, SQLITE_LOCKED]
    }
}
