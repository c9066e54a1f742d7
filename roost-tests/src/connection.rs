use crate::silent_logs;
use roost::{Connection, ConnectionState, Driver, ErrorExt, ErrorKind, Value};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn reconnection<D: Driver>(connection: &mut Connection<D>) {
    let _lock = MUTEX.lock().await;

    let mut cursor = connection
        .execute(r#"SELECT 1 AS "one""#, &[])
        .await
        .expect("Failed to run a trivial query");
    assert_eq!(connection.state(), ConnectionState::Connected);
    let first = connection.session_id().expect("No session after a query");
    assert!(cursor.is_alive());

    // Results die with their session
    connection.disconnect();
    assert_eq!(connection.state(), ConnectionState::Disconnected);
    assert_eq!(connection.session_id(), None);
    assert!(!cursor.is_alive());
    silent_logs! {
        let error = cursor
            .scalar("one")
            .expect_err("A result of a closed session must not be readable");
        assert_eq!(error.kind(), Some(ErrorKind::Connection));
    }

    // The next statement reconnects
    let mut cursor = connection
        .execute(r#"SELECT 1 AS "one""#, &[])
        .await
        .expect("Failed to run a query after disconnecting");
    let second = connection.session_id().expect("No session after reconnecting");
    assert_ne!(first, second);
    assert_eq!(
        cursor.scalar("one").expect("Failed to read the result"),
        Some(Value::Int64(1))
    );

    // Explicit reconnection
    connection.connect().await.expect("Failed to reconnect");
    assert!(!cursor.is_alive());
    assert_ne!(connection.session_id(), Some(second));

    #[cfg(not(feature = "disable-database-selection"))]
    if let Some(name) = connection.selected_database().map(str::to_owned) {
        connection
            .select_database(&name)
            .await
            .expect("Failed to select the database again");
        silent_logs! {
            let error = connection
                .select_database("roost_missing_database")
                .await
                .expect_err("A missing database must not be selected");
            assert_eq!(error.kind(), Some(ErrorKind::DatabaseSelection));
        }
        assert_eq!(connection.selected_database(), Some(name.as_str()));
        connection.disconnect();
        connection
            .execute(r#"SELECT 1 AS "one""#, &[])
            .await
            .expect("Failed to reconnect with a selected database");
        assert_eq!(connection.selected_database(), Some(name.as_str()));
    }
}
