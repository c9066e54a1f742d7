use crate::{ResultCursor, Result, RowLabeled, RowsAffected, SqlWriter, Value};
use futures::TryFutureExt;
use std::future::Future;

/// Runs statements on behalf of the mappers.
pub trait Executor: Send {
    fn sql_writer(&self) -> &dyn SqlWriter;

    /// Database qualifying the tables, `None` when nothing was selected.
    fn selected_database(&self) -> Option<&str>;

    fn execute(
        &mut self,
        statement: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<ResultCursor>> + Send;

    /// Execute the statement and return the rows.
    fn fetch(
        &mut self,
        statement: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Vec<RowLabeled>>> + Send {
        self.execute(statement, params)
            .map_ok(ResultCursor::into_rows)
    }

    /// Execute the statement and return the number of rows affected.
    fn affected(
        &mut self,
        statement: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.execute(statement, params).map_ok(|v| v.affected())
    }
}
