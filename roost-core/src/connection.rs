use crate::{
    ConnectTarget, Context, Driver, Error, ErrorExt, ErrorKind, Executor, Result, ResultCursor,
    RoostError, Session, SessionToken, SqlWriter, Value, truncate_long,
};
use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

static SESSION_IDS: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// The last connection attempt failed.
    Failed,
}

/// Stateful link to a store: owns one session at a time, reconnects on demand and classifies
/// store failures.
///
/// Statements run one at a time. Failures are never retried here, transient ones are reported
/// as [`RoostError::Deadlock`] so that the caller can decide.
#[derive(Debug)]
pub struct Connection<D: Driver> {
    driver: D,
    target: ConnectTarget,
    session: Option<D::Session>,
    state: ConnectionState,
    selected: Option<String>,
    transient_codes: Vec<i32>,
    live: Arc<AtomicU64>,
}

impl<D: Driver> Connection<D> {
    /// Disconnected connection to `target`, nothing is attempted yet.
    pub fn new(driver: D, target: ConnectTarget) -> Result<Self> {
        if target.driver != D::NAME {
            let error = RoostError::Connection(format!(
                "Driver `{}` cannot serve `{}`",
                D::NAME,
                target
            ));
            log::error!("{}", error);
            return Err(error.into());
        }
        Ok(Self {
            transient_codes: driver.transient_codes().to_vec(),
            driver,
            selected: target.database.clone(),
            target,
            session: None,
            state: ConnectionState::Disconnected,
            live: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Parses `url` and connects.
    pub async fn open(driver: D, url: &str) -> Result<Self> {
        let mut connection = Self::new(driver, ConnectTarget::parse(url)?)?;
        connection.connect().await?;
        Ok(connection)
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn target(&self) -> &ConnectTarget {
        &self.target
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Process unique id of the current session, it changes on every reconnection.
    pub fn session_id(&self) -> Option<u64> {
        match self.live.load(Ordering::Acquire) {
            0 => None,
            v => Some(v),
        }
    }

    pub fn transient_codes(&self) -> &[i32] {
        &self.transient_codes
    }

    /// Replaces the vendor codes classified as deadlocks.
    pub fn set_transient_codes(&mut self, codes: impl IntoIterator<Item = i32>) -> &mut Self {
        self.transient_codes = codes.into_iter().collect();
        self
    }

    pub fn selected_database(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    fn teardown(&mut self) {
        self.session = None;
        self.live.store(0, Ordering::Release);
    }

    /// Drops the current session. Results read from it are no longer readable.
    pub fn disconnect(&mut self) {
        if self.session.is_some() {
            log::info!("Disconnecting from {}", self.target);
        }
        self.teardown();
        self.state = ConnectionState::Disconnected;
    }

    /// Establishes a new session, dropping the current one if any.
    ///
    /// The selected database, if any, is selected again on the new session.
    pub async fn connect(&mut self) -> Result<()> {
        self.teardown();
        self.state = ConnectionState::Connecting;
        let mut session = match self.driver.connect(&self.target).await {
            Ok(session) => session,
            Err(error) => {
                self.state = ConnectionState::Failed;
                let error = if error.kind() == Some(ErrorKind::Connection) {
                    error
                } else {
                    error.context(RoostError::Connection(format!(
                        "Cannot connect to {}",
                        self.target
                    )))
                };
                log::error!("{:#}", error);
                return Err(error);
            }
        };
        if let Some(name) = &self.selected
            && let Err(error) = Self::check_database(&mut session, name).await
        {
            self.state = ConnectionState::Failed;
            return Err(error);
        }
        let id = SESSION_IDS.fetch_add(1, Ordering::Relaxed);
        self.session = Some(session);
        self.live.store(id, Ordering::Release);
        self.state = ConnectionState::Connected;
        log::info!("Connected to {} (session {})", self.target, id);
        Ok(())
    }

    async fn check_database(session: &mut D::Session, name: &str) -> Result<()> {
        let error = match session.database_exists(name).await {
            Ok(true) => return Ok(()),
            Ok(false) => Error::new(RoostError::DatabaseSelection {
                name: name.to_owned(),
                message: "no such database".into(),
            }),
            Err(error) => error.context(RoostError::DatabaseSelection {
                name: name.to_owned(),
                message: "the store could not tell whether it exists".into(),
            }),
        };
        log::error!("{:#}", error);
        Err(error)
    }

    async fn ensure_connected(&mut self) -> Result<()> {
        if self.session.is_none() {
            log::info!("Reconnecting to {}", self.target);
            self.connect()
                .await
                .context("The connection was lost and could not be reestablished")?;
        }
        Ok(())
    }

    /// Selects the database qualifying the tables of the following statements.
    pub async fn select_database(&mut self, name: &str) -> Result<()> {
        self.ensure_connected().await?;
        let Some(session) = self.session.as_mut() else {
            return Err(RoostError::Connection("Not connected".into()).into());
        };
        Self::check_database(session, name).await?;
        self.selected = Some(name.to_owned());
        Ok(())
    }

    /// Runs `statement`, reconnecting first if the session was lost.
    pub async fn execute(&mut self, statement: &str, params: &[Value]) -> Result<ResultCursor> {
        self.ensure_connected().await?;
        let session_id = self.live.load(Ordering::Acquire);
        let Some(session) = self.session.as_mut() else {
            return Err(RoostError::Connection("Not connected".into()).into());
        };
        log::debug!(
            "Session {} executing: {}",
            session_id,
            truncate_long!(statement)
        );
        let result = session.execute(statement, params).await;
        match result {
            Ok(raw) => Ok(ResultCursor::new(
                raw,
                SessionToken::new(self.live.clone(), session_id),
            )),
            Err(error) => Err(self.classify(error, statement)),
        }
    }

    fn classify(&mut self, error: Error, statement: &str) -> Error {
        let transient = match error.roost_error() {
            Some(RoostError::Statement {
                code: Some(code),
                message,
            }) if self.transient_codes.contains(code) => Some((*code, message.clone())),
            _ => None,
        };
        if let Some((code, message)) = transient {
            let error = error.context(RoostError::Deadlock { code, message });
            log::warn!("{:#}", error);
            return error;
        }
        if error.kind() == Some(ErrorKind::Connection) {
            self.teardown();
            self.state = ConnectionState::Disconnected;
            log::error!("{:#}", error);
            return error;
        }
        let error = error.context(format!(
            "While executing the statement:\n{}",
            truncate_long!(statement)
        ));
        log::error!("{:#}", error);
        error
    }
}

impl<D: Driver> Executor for Connection<D> {
    fn sql_writer(&self) -> &dyn SqlWriter {
        self.driver.sql_writer().as_dyn()
    }

    fn selected_database(&self) -> Option<&str> {
        Connection::selected_database(self)
    }

    fn execute(
        &mut self,
        statement: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<ResultCursor>> + Send {
        Connection::execute(self, statement, params)
    }
}
