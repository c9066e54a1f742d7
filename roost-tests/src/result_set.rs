use crate::silent_logs;
use roost::{
    DomainType, ErrorExt, ErrorKind, Executor, Result, SchemaBuilder, Value, ValueType, record,
};
use std::sync::LazyLock;
use tokio::sync::Mutex;

struct Reading;
impl DomainType for Reading {
    const NAME: &'static str = "roost_reading";
    fn define(schema: &mut SchemaBuilder) -> Result<()> {
        schema
            .property("readingid", ValueType::integer(11), "primary auto_increment")?
            .property("sensor", ValueType::string(64), "required")?
            .property("measure", ValueType::Float, "")?
            .property("valid", ValueType::Boolean, "")?;
        Ok(())
    }
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn result_set<E: Executor>(executor: &mut E) {
    let _lock = MUTEX.lock().await;

    // Setup
    Reading::drop_table(executor, true)
        .await
        .expect("Failed to drop the reading table");
    Reading::create_table(executor, false)
        .await
        .expect("Failed to create the reading table");
    Reading::import(
        executor,
        [
            record! { "sensor" => "alpha", "measure" => 1.5, "valid" => true },
            record! { "sensor" => "bravo", "measure" => -0.25, "valid" => false },
            record! { "sensor" => "charlie", "valid" => true },
        ],
    )
    .await
    .expect("Failed to import the readings");

    // Fields and rows
    let mut cursor = executor
        .execute(
            r#"SELECT "sensor", "measure", "valid" FROM "roost_reading" ORDER BY "readingid""#,
            &[],
        )
        .await
        .expect("Failed to select the readings");
    assert_eq!(cursor.len(), 3);
    assert_eq!(cursor.rows_affected(), 0);
    assert_eq!(&**cursor.labels(), ["sensor", "measure", "valid"]);
    let row = cursor
        .row()
        .expect("Failed to read the first row")
        .expect("No first row");
    assert_eq!(row.get_column("sensor"), Some(&Value::Varchar("alpha".into())));
    assert_eq!(row.get_column("measure"), Some(&Value::Float64(1.5)));
    assert_eq!(row.get_column("valid"), Some(&Value::Boolean(true)));
    assert_eq!(cursor.position(), 1);

    // Scalars
    assert_eq!(
        cursor.scalar("sensor").expect("Failed to read a scalar"),
        Some(Value::Varchar("bravo".into()))
    );
    assert_eq!(
        cursor.scalar(2).expect("Failed to read a scalar"),
        Some(Value::Boolean(true))
    );
    assert_eq!(cursor.scalar(0).expect("Failed to read past the end"), None);
    cursor.seek(1);
    assert_eq!(
        cursor.scalar("measure").expect("Failed to read a scalar"),
        Some(Value::Float64(-0.25))
    );
    silent_logs! {
        let error = cursor
            .scalar("missing")
            .expect_err("Unknown fields must be reported");
        assert_eq!(error.kind(), Some(ErrorKind::NoSuchField));
    }
    assert_eq!(cursor.position(), 2);

    // Column
    cursor.seek(0);
    let sensors = cursor
        .column("sensor")
        .expect("Failed to read the column")
        .collect::<Result<Vec<_>>>()
        .expect("Failed to read the column values");
    assert_eq!(
        sensors,
        [
            Value::Varchar("alpha".into()),
            Value::Varchar("bravo".into()),
            Value::Varchar("charlie".into()),
        ]
    );
    assert_eq!(cursor.row().expect("Failed to read past the end"), None);

    // Aggregates
    let mut cursor = executor
        .execute(
            r#"SELECT COUNT(*) AS "total" FROM "roost_reading" WHERE "valid" = ?"#,
            &[Value::Boolean(true)],
        )
        .await
        .expect("Failed to count the readings");
    assert_eq!(
        cursor.scalar("total").expect("Failed to read the count"),
        Some(Value::Int64(2))
    );

    // Modifications
    let cursor = executor
        .execute(
            r#"UPDATE "roost_reading" SET "valid" = ? WHERE "valid" = ?"#,
            &[Value::Boolean(false), Value::Boolean(true)],
        )
        .await
        .expect("Failed to update the readings");
    assert!(cursor.is_empty());
    assert_eq!(cursor.rows_affected(), 2);
    let cursor = executor
        .execute(
            r#"INSERT INTO "roost_reading" ("sensor") VALUES (?)"#,
            &[Value::from("delta")],
        )
        .await
        .expect("Failed to insert a reading");
    assert_eq!(cursor.rows_affected(), 1);
    let id = cursor.last_insert_id().expect("No generated key reported");
    let found = Reading::finder()
        .by_identity(executor, &[Value::Int64(id)])
        .await
        .expect("Failed to query the inserted reading")
        .expect("The inserted reading was not found");
    assert_eq!(found.get("sensor"), Value::Varchar("delta".into()));
    assert_eq!(found.get("measure"), Value::Null);

    Reading::drop_table(executor, false)
        .await
        .expect("Failed to drop the reading table");
}
