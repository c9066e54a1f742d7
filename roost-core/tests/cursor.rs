#[cfg(test)]
mod tests {
    use roost_core::{
        ErrorExt, ErrorKind, FieldDescriptor, RawResultSet, Result, ResultCursor, RowsAffected,
        SessionToken, Value, ValueType,
    };
    use std::sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    };

    fn posts() -> RawResultSet {
        RawResultSet {
            fields: vec![
                FieldDescriptor::new("postid", Some("INTEGER")),
                FieldDescriptor::new("title", Some("VARCHAR(255)")),
                FieldDescriptor::new("published", Some("BOOLEAN")),
                FieldDescriptor::new("score", None),
            ],
            rows: vec![
                [
                    Value::Int64(1),
                    Value::Varchar("First post".into()),
                    Value::Int64(1),
                    Value::Unknown("1.50".into()),
                ]
                .into(),
                [
                    Value::Unknown("2".into()),
                    Value::Varchar("Second post".into()),
                    Value::Int64(0),
                    Value::Null,
                ]
                .into(),
                [
                    Value::Unknown("three".into()),
                    Value::Varchar("Third post".into()),
                    Value::Null,
                    Value::Int64(7),
                ]
                .into(),
            ],
            affected: RowsAffected::default(),
        }
    }

    #[test]
    fn field_descriptors() {
        let cursor = ResultCursor::new(posts(), SessionToken::detached());
        let fields = cursor.fields();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].name, "postid");
        assert_eq!(fields[0].value_type, Some(ValueType::Integer { width: None }));
        assert_eq!(fields[1].declared.as_deref(), Some("VARCHAR(255)"));
        assert_eq!(fields[3].value_type, None);
        assert_eq!(cursor.len(), 3);
        assert!(!cursor.is_empty());
    }

    #[test]
    fn fields_of_empty_result() {
        let mut raw = posts();
        raw.rows.clear();
        let mut cursor = ResultCursor::new(raw, SessionToken::detached());
        assert!(cursor.is_empty());
        assert_eq!(cursor.fields().len(), 4);
        assert_eq!(cursor.labels()[1], "title");
        assert_eq!(cursor.row().unwrap(), None);
        assert_eq!(cursor.scalar(0).unwrap(), None);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn values_follow_declared_types() {
        let mut cursor = ResultCursor::new(posts(), SessionToken::detached());
        let row = cursor.row().unwrap().unwrap();
        assert_eq!(row.get_column("postid"), Some(&Value::Int64(1)));
        assert_eq!(row.get_column("published"), Some(&Value::Boolean(true)));
        assert_eq!(row.get_column("score"), Some(&Value::Unknown("1.50".into())));
        let row = cursor.row().unwrap().unwrap();
        assert_eq!(row.get_column("postid"), Some(&Value::Int64(2)));
        assert_eq!(row.get_column("published"), Some(&Value::Boolean(false)));
        let row = cursor.row().unwrap().unwrap();
        assert_eq!(row.get_column("postid"), Some(&Value::Unknown("three".into())));
        assert_eq!(row.get_column("published"), Some(&Value::Null));
        assert_eq!(row.get_column("missing"), None);
    }

    #[test]
    fn row_advances_until_the_end() {
        let mut cursor = ResultCursor::new(posts(), SessionToken::detached());
        let mut titles = Vec::new();
        while let Some(row) = cursor.row().unwrap() {
            titles.push(row.to_record()["title"].clone());
        }
        assert_eq!(
            titles,
            [
                Value::Varchar("First post".into()),
                Value::Varchar("Second post".into()),
                Value::Varchar("Third post".into()),
            ]
        );
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.row().unwrap(), None);
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn scalar_and_seek() {
        let mut cursor = ResultCursor::new(posts(), SessionToken::detached());
        assert_eq!(cursor.scalar(0).unwrap(), Some(Value::Int64(1)));
        assert_eq!(cursor.position(), 1);
        assert_eq!(
            cursor.scalar("title").unwrap(),
            Some(Value::Varchar("Second post".into()))
        );
        let error = cursor.scalar("body").unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::NoSuchField));
        let error = cursor.scalar(9).unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::NoSuchField));
        assert_eq!(cursor.position(), 2);
        cursor.seek(0);
        assert_eq!(cursor.scalar(0).unwrap(), Some(Value::Int64(1)));
        cursor.seek(10);
        assert_eq!(cursor.position(), cursor.len());
        assert_eq!(cursor.scalar(0).unwrap(), None);
        assert_eq!(cursor.row().unwrap(), None);
        cursor.seek(2);
        assert_eq!(
            cursor.scalar(String::from("title")).unwrap(),
            Some(Value::Varchar("Third post".into()))
        );
    }

    #[test]
    fn seek_stops_at_the_end() {
        let mut cursor = ResultCursor::new(posts(), SessionToken::detached());
        cursor.seek(usize::MAX);
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.row().unwrap(), None);
        assert_eq!(cursor.position(), 3);
        cursor.seek(3);
        assert_eq!(cursor.position(), 3);
        cursor.seek(2);
        assert_eq!(cursor.position(), 2);
        assert!(cursor.row().unwrap().is_some());
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn column_is_one_shot() {
        let mut cursor = ResultCursor::new(posts(), SessionToken::detached());
        cursor.seek(1);
        let titles = cursor
            .column("title")
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(
            titles,
            [
                Value::Varchar("Second post".into()),
                Value::Varchar("Third post".into()),
            ]
        );
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.column(0).unwrap().count(), 0);
        cursor.seek(0);
        let ids = cursor
            .column(0)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(ids.len(), 3);
        assert!(cursor.column("body").is_err());
    }

    #[test]
    fn into_rows_from_position() {
        let mut cursor = ResultCursor::new(posts(), SessionToken::detached());
        cursor.seek(2);
        let rows = cursor.into_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].names(), ["postid", "title", "published", "score"]);
        assert_eq!(rows[0].values()[1], Value::Varchar("Third post".into()));
    }

    #[test]
    fn modify_outcome() {
        let raw = RawResultSet {
            affected: RowsAffected {
                rows_affected: 1,
                last_affected_id: Some(42),
            },
            ..Default::default()
        };
        let cursor = ResultCursor::new(raw, SessionToken::detached());
        assert!(cursor.is_empty());
        assert!(cursor.fields().is_empty());
        assert_eq!(cursor.rows_affected(), 1);
        assert_eq!(cursor.last_insert_id(), Some(42));
    }

    #[test]
    fn dead_cursor() {
        let live = Arc::new(AtomicU64::new(5));
        let mut cursor = ResultCursor::new(posts(), SessionToken::new(live.clone(), 5));
        assert!(cursor.is_alive());
        assert!(cursor.row().unwrap().is_some());
        let mut column = cursor.column(0).unwrap();
        assert!(column.next().unwrap().is_ok());
        live.store(6, Ordering::Release);
        let error = column.next().unwrap().unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::Connection));
        assert!(column.next().is_none());
        assert!(!cursor.is_alive());
        let error = cursor.row().unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::Connection));
        assert_eq!(cursor.scalar(0).unwrap_err().kind(), Some(ErrorKind::Connection));
        assert!(cursor.column(0).is_err());
    }
}
