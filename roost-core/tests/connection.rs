#[cfg(test)]
mod tests {
    use roost_core::{
        ConnectTarget, Connection, ConnectionState, Driver, Error, ErrorExt, ErrorKind, Executor,
        FieldDescriptor, GenericSqlWriter, RawResultSet, Result, RoostError, Session, Value,
    };
    use std::sync::{Arc, Mutex};

    /// What the next statement does.
    #[derive(Default, Clone)]
    enum Outcome {
        #[default]
        Answer,
        Fail(i32),
        DropLink,
    }

    #[derive(Default)]
    struct Store {
        connects: usize,
        refuse: bool,
        outcome: Outcome,
    }

    #[derive(Default, Clone)]
    struct FakeDriver {
        store: Arc<Mutex<Store>>,
    }

    struct FakeSession {
        store: Arc<Mutex<Store>>,
        number: usize,
    }

    impl FakeDriver {
        fn store(&self) -> std::sync::MutexGuard<'_, Store> {
            self.store.lock().unwrap()
        }
    }

    impl Driver for FakeDriver {
        type Session = FakeSession;
        type SqlWriter = GenericSqlWriter;
        const NAME: &'static str = "fake";

        fn sql_writer(&self) -> &GenericSqlWriter {
            &GenericSqlWriter
        }

        async fn connect(&self, target: &ConnectTarget) -> Result<FakeSession> {
            let mut store = self.store.lock().unwrap();
            if store.refuse {
                return Err(Error::msg(format!("{} refused the connection", target.location)));
            }
            store.connects += 1;
            Ok(FakeSession {
                store: self.store.clone(),
                number: store.connects,
            })
        }

        fn transient_codes(&self) -> &'static [i32] {
            &[40001, 1213]
        }
    }

    impl Session for FakeSession {
        async fn execute(&mut self, _statement: &str, params: &[Value]) -> Result<RawResultSet> {
            let outcome = std::mem::take(&mut self.store.lock().unwrap().outcome);
            match outcome {
                Outcome::Answer => Ok(RawResultSet {
                    fields: vec![
                        FieldDescriptor::new("session", Some("INTEGER")),
                        FieldDescriptor::new("params", Some("INTEGER")),
                    ],
                    rows: vec![
                        [
                            Value::Unknown(self.number.to_string()),
                            Value::Int64(params.len() as i64),
                        ]
                        .into(),
                    ],
                    ..Default::default()
                }),
                Outcome::Fail(code) => Err(RoostError::Statement {
                    code: Some(code),
                    message: format!("failure {}", code),
                }
                .into()),
                Outcome::DropLink => Err(RoostError::Connection("broken pipe".into()).into()),
            }
        }

        async fn database_exists(&mut self, name: &str) -> Result<bool> {
            Ok(name == "main")
        }
    }

    async fn connected(url: &str) -> (FakeDriver, Connection<FakeDriver>) {
        let driver = FakeDriver::default();
        let connection = Connection::open(driver.clone(), url).await.unwrap();
        (driver, connection)
    }

    #[test]
    fn connect_target() {
        let target =
            ConnectTarget::parse("sqlite:///tmp/my%20db.sqlite?database=main&mode=rwc&busy_timeout=500")
                .unwrap();
        assert_eq!(target.driver, "sqlite");
        assert_eq!(target.location, "/tmp/my db.sqlite");
        assert_eq!(target.database.as_deref(), Some("main"));
        assert_eq!(target.option("mode"), Some("rwc"));
        assert_eq!(target.option("busy_timeout"), Some("500"));
        assert_eq!(target.option("database"), None);
        let again = ConnectTarget::parse(&target.to_string()).unwrap();
        assert_eq!(again, target);
        let memory: ConnectTarget = "sqlite://:memory:".parse().unwrap();
        assert_eq!(memory.location, ":memory:");
        assert!(memory.database.is_none());
        assert!(memory.options.is_empty());
        let error = ConnectTarget::parse("/tmp/db.sqlite").unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::Connection));
        assert!(ConnectTarget::parse("://location").is_err());
    }

    #[tokio::test]
    async fn wrong_driver() {
        let error = Connection::new(
            FakeDriver::default(),
            ConnectTarget::parse("sqlite://:memory:").unwrap(),
        )
        .err()
        .unwrap();
        assert_eq!(error.kind(), Some(ErrorKind::Connection));
    }

    #[tokio::test]
    async fn reconnect_changes_session() {
        let (driver, mut connection) = connected("fake://store").await;
        assert_eq!(connection.state(), ConnectionState::Connected);
        let first = connection.session_id().unwrap();
        let mut cursor = connection.execute("SELECT 1", &[]).await.unwrap();
        connection.connect().await.unwrap();
        let second = connection.session_id().unwrap();
        assert_ne!(first, second);
        assert_eq!(driver.store().connects, 2);
        assert!(!cursor.is_alive());
        let error = cursor.row().unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::Connection));
        let mut cursor = connection.execute("SELECT 1", &[]).await.unwrap();
        assert_eq!(cursor.scalar("session").unwrap(), Some(Value::Int64(2)));
    }

    #[tokio::test]
    async fn lazy_reconnect() {
        let (driver, mut connection) = connected("fake://store").await;
        connection.disconnect();
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert_eq!(connection.session_id(), None);
        let mut cursor = connection
            .execute("SELECT ?", &[Value::Int64(1)])
            .await
            .unwrap();
        assert_eq!(connection.state(), ConnectionState::Connected);
        assert_eq!(driver.store().connects, 2);
        assert_eq!(cursor.scalar(1).unwrap(), Some(Value::Int64(1)));

        connection.disconnect();
        driver.store().refuse = true;
        let error = connection.execute("SELECT 1", &[]).await.unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::Connection));
        assert!(error.is_retryable());
        assert_eq!(connection.state(), ConnectionState::Failed);
        driver.store().refuse = false;
        assert!(connection.execute("SELECT 1", &[]).await.is_ok());
    }

    #[tokio::test]
    async fn connect_failure() {
        let driver = FakeDriver::default();
        driver.store().refuse = true;
        let error = Connection::open(driver, "fake://nowhere").await.err().unwrap();
        assert_eq!(error.kind(), Some(ErrorKind::Connection));
        assert!(format!("{:#}", error).contains("nowhere refused the connection"));
    }

    #[tokio::test]
    async fn transient_failures() {
        let (driver, mut connection) = connected("fake://store").await;
        assert_eq!(connection.transient_codes(), [40001, 1213]);
        driver.store().outcome = Outcome::Fail(40001);
        let error = connection.execute("UPDATE x", &[]).await.unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::Deadlock));
        assert!(error.is_deadlock());
        assert!(error.is_retryable());
        assert!(matches!(
            error.roost_error(),
            Some(RoostError::Deadlock { code: 40001, .. })
        ));
        assert_eq!(connection.state(), ConnectionState::Connected);

        driver.store().outcome = Outcome::Fail(19);
        let error = connection.execute("UPDATE x", &[]).await.unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::Statement));
        assert!(!error.is_retryable());

        connection.set_transient_codes([19]);
        driver.store().outcome = Outcome::Fail(19);
        let error = connection.execute("UPDATE x", &[]).await.unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::Deadlock));
    }

    #[tokio::test]
    async fn lost_link() {
        let (driver, mut connection) = connected("fake://store").await;
        let first = connection.session_id();
        driver.store().outcome = Outcome::DropLink;
        let error = connection.execute("SELECT 1", &[]).await.unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::Connection));
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert_eq!(connection.session_id(), None);
        assert!(connection.execute("SELECT 1", &[]).await.is_ok());
        assert_ne!(connection.session_id(), first);
    }

    #[tokio::test]
    async fn database_selection() {
        let (_, mut connection) = connected("fake://store").await;
        assert_eq!(connection.selected_database(), None);
        assert_eq!(Executor::selected_database(&connection), None);
        connection.select_database("main").await.unwrap();
        assert_eq!(connection.selected_database(), Some("main"));
        let error = connection.select_database("nope").await.unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::DatabaseSelection));
        assert_eq!(connection.selected_database(), Some("main"));

        let (driver, mut connection) = connected("fake://store?database=main").await;
        assert_eq!(connection.selected_database(), Some("main"));
        connection.connect().await.unwrap();
        assert_eq!(connection.selected_database(), Some("main"));
        assert_eq!(driver.store().connects, 2);

        let error = Connection::open(FakeDriver::default(), "fake://store?database=nope")
            .await
            .err()
            .unwrap();
        assert_eq!(error.kind(), Some(ErrorKind::DatabaseSelection));
    }
}
