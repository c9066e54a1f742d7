use crate::silent_logs;
use roost::{
    DomainType, ErrorExt, ErrorKind, Executor, Result, SchemaBuilder, Value, ValueType, record,
};
use std::sync::LazyLock;
use tokio::sync::Mutex;

struct Post;
impl DomainType for Post {
    const NAME: &'static str = "roost_post";
    fn define(schema: &mut SchemaBuilder) -> Result<()> {
        schema
            .property("postid", ValueType::integer(11), "primary auto_increment")?
            .property("title", ValueType::string(255), "required")?
            .property("subtitle", ValueType::string(255), "")?
            .property("views", ValueType::integer(11), "default=0")?
            .property("published", ValueType::Boolean, "")?;
        Ok(())
    }
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn mapping<E: Executor>(executor: &mut E) {
    let _lock = MUTEX.lock().await;

    // Setup
    Post::drop_table(executor, true)
        .await
        .expect("Failed to drop the post table");
    Post::create_table(executor, false)
        .await
        .expect("Failed to create the post table");

    // Generated keys
    let mut first = Post::build(record! { "title" => "First post" }).expect("Failed to build");
    let mut second = Post::build(record! { "title" => "Second post", "published" => true })
        .expect("Failed to build");
    let future = second.future("postid").expect("No postid property");
    first.save(executor).await.expect("Failed to save the first post");
    assert!(!future.is_resolved());
    second.save(executor).await.expect("Failed to save the second post");
    let first_id = first.get_as::<i64>("postid").expect("The first post has no key");
    let second_id = second.get_as::<i64>("postid").expect("The second post has no key");
    assert_ne!(first_id, second_id);
    assert_eq!(future.value(), Value::Int64(second_id));
    assert!(first.is_saved());
    assert!(!first.has_changes());
    assert_eq!(first.get("title"), Value::Varchar("First post".into()));
    assert_eq!(second.get("title"), Value::Varchar("Second post".into()));

    // Read back
    let mut found = Post::finder()
        .by_identity(executor, &[Value::Int64(first_id)])
        .await
        .expect("Failed to query the first post")
        .expect("The first post was not found");
    assert!(found.is_saved());
    assert!(!found.has_changes());
    assert_eq!(found.get("postid"), Value::Int64(first_id));
    assert_eq!(found.get("title"), Value::Varchar("First post".into()));
    assert_eq!(found.get("subtitle"), Value::Null);
    assert_eq!(found.get("views"), Value::Int64(0));
    assert_eq!(found.get("published"), Value::Null);
    assert_eq!(found.identity(), first.identity());

    // Update
    found.set("subtitle", "Edited").set("views", 12);
    found.save(executor).await.expect("Failed to update the post");
    assert!(!found.has_changes());
    let reloaded = Post::finder()
        .by_identity(executor, &[Value::Int64(first_id)])
        .await
        .expect("Failed to query the updated post")
        .expect("The updated post was not found");
    assert_eq!(reloaded.get("subtitle"), Value::Varchar("Edited".into()));
    assert_eq!(reloaded.get("views"), Value::Int64(12));
    assert_eq!(reloaded.get("title"), Value::Varchar("First post".into()));

    // Queries
    let all = Post::finder()
        .all(executor)
        .await
        .expect("Failed to query all the posts");
    assert_eq!(all.len(), 2);
    let published = Post::finder()
        .where_clause(executor, r#""published" = ?"#, &[Value::Boolean(true)])
        .await
        .expect("Failed to query the published posts");
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].get("postid"), Value::Int64(second_id));
    assert_eq!(published[0].get("published"), Value::Boolean(true));
    let missing = Post::finder()
        .one(executor, r#""title" = ?"#, &[Value::from("Nowhere")])
        .await
        .expect("Failed to query a missing post");
    assert!(missing.is_none());

    // Rejected saves
    silent_logs! {
        let mut untitled = Post::build(record! { "subtitle" => "No title" })
            .expect("Failed to build");
        let error = untitled
            .save(executor)
            .await
            .expect_err("A post without title must not be saved");
        assert_eq!(error.kind(), Some(ErrorKind::Precursor));
        assert!(!untitled.is_saved());

        second.set("postid", second_id + 1000);
        let error = second
            .save(executor)
            .await
            .expect_err("The key of a saved post must not change");
        assert_eq!(error.kind(), Some(ErrorKind::Precursor));
    }

    // Delete
    first.delete(executor).await.expect("Failed to delete the first post");
    assert!(!first.is_saved());
    let gone = Post::finder()
        .by_identity(executor, &[Value::Int64(first_id)])
        .await
        .expect("Failed to query the deleted post");
    assert!(gone.is_none());
    silent_logs! {
        let error = first
            .delete(executor)
            .await
            .expect_err("An unsaved post cannot be deleted");
        assert_eq!(error.kind(), Some(ErrorKind::Precursor));
        let error = found
            .delete(executor)
            .await
            .expect_err("A post that is no longer stored cannot be deleted");
        assert_eq!(error.kind(), Some(ErrorKind::Precursor));
    }

    // Import
    let imported = Post::import(
        executor,
        [
            record! { "title" => "Imported one" },
            record! { "title" => "Imported two", "views" => 7 },
        ],
    )
    .await
    .expect("Failed to import the posts");
    assert_eq!(imported.len(), 2);
    assert!(imported.iter().all(|v| v.is_saved() && v.identity().is_assigned()));
    let created = Post::create(executor, record! { "title" => "Created" })
        .await
        .expect("Failed to create a post");
    assert!(created.is_saved());
    let all = Post::finder()
        .all(executor)
        .await
        .expect("Failed to query all the posts");
    assert_eq!(all.len(), 4);
    let views = all
        .iter()
        .find(|v| v.get("title") == Value::from("Imported two"))
        .map(|v| v.get("views"));
    assert_eq!(views, Some(Value::Int64(7)));

    Post::drop_table(executor, false)
        .await
        .expect("Failed to drop the post table");
}
