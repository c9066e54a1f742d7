#[cfg(test)]
mod tests {
    use roost_core::{
        DomainType, ErrorExt, ErrorKind, Identity, PropertyFuture, Result, SchemaBuilder, Value,
        ValueType, record,
    };
    use std::collections::HashSet;

    struct Post;
    impl DomainType for Post {
        const NAME: &'static str = "post";
        fn define(schema: &mut SchemaBuilder) -> Result<()> {
            schema
                .property("postid", ValueType::integer(11), "primary auto_increment")?
                .property("title", ValueType::string(255), "required")?
                .property("subtitle", ValueType::string(255), "")?;
            Ok(())
        }
    }

    #[test]
    fn set_then_get() {
        let mut post = Post::build(record! {}).unwrap();
        assert_eq!(post.get("title"), Value::Null);
        assert!(!post.has("title"));
        post.set("title", "First post").set("subtitle", Value::Null);
        assert_eq!(post.get("title"), Value::Varchar("First post".into()));
        assert_eq!(post.get_as::<String>("title").unwrap(), "First post");
        assert!(post.has("title"));
        assert!(!post.has("subtitle"));
        assert!(post.get_as::<i64>("title").is_err());
    }

    #[test]
    fn changes_are_deduplicated() {
        let mut post = Post::build(record! { "title" => "a" }).unwrap();
        post.set("title", "b").set("subtitle", "c").set("title", "d");
        let changes = post.changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes["title"], Value::Varchar("d".into()));
        assert_eq!(changes["subtitle"], Value::Varchar("c".into()));
        assert!(post.is_changed("title"));
        assert!(!post.is_changed("postid"));
    }

    #[test]
    fn flags_are_independent() {
        let mut post = Post::build(record! { "title" => "a" }).unwrap();
        assert!(!post.is_saved());
        post.mark_saved(true);
        assert!(post.is_saved());
        assert_eq!(post.changes().len(), 1);
        post.clear_changes();
        assert!(post.changes().is_empty());
        assert!(!post.has_changes());
        assert!(post.is_saved());
        assert_eq!(post.get("title"), Value::Varchar("a".into()));
    }

    #[test]
    fn equality_by_values() {
        let a = Post::build(record! { "title" => "a" }).unwrap();
        let b = Post::hydrate(record! { "title" => "a" }, true).unwrap();
        assert_eq!(a, b);
        let c = Post::build(record! { "title" => "c" }).unwrap();
        assert_ne!(a, c);
        let mut d = a.clone();
        assert_eq!(a, d);
        d.set("subtitle", "x");
        assert_ne!(a, d);
    }

    #[test]
    fn load_records_changes() {
        let mut post = Post::hydrate(record! { "postid" => 1, "title" => "a" }, true).unwrap();
        assert!(post.changes().is_empty());
        post.load(record! { "subtitle" => "b" });
        assert_eq!(post.changes().keys().collect::<Vec<_>>(), ["subtitle"]);
        assert_eq!(
            post.to_record(),
            record! { "postid" => 1, "title" => "a", "subtitle" => "b" }
        );
    }

    #[test]
    fn identity_of_instance() {
        let mut post = Post::build(record! { "title" => "a" }).unwrap();
        let identity = post.identity();
        assert!(!identity.is_assigned());
        assert_eq!(identity.len(), 1);
        assert_eq!(identity.get("postid"), Some(&Value::Null));
        post.set("postid", 3);
        let identity = post.identity();
        assert!(identity.is_assigned());
        assert_eq!(identity.to_string(), "postid=3");
        let other = Identity::new(vec![("postid".into(), Value::Int64(3))]);
        assert_eq!(identity, other);
        let set = [identity, other].into_iter().collect::<HashSet<_>>();
        assert_eq!(set.len(), 1);
        assert!(!Identity::new(vec![]).is_assigned());
    }

    #[test]
    fn future_is_shared() {
        let mut post = Post::build(record! { "title" => "a" }).unwrap();
        let first = post.future("postid").unwrap();
        let second = post.future("postid").unwrap();
        assert!(!first.is_resolved());
        assert_eq!(first.value(), Value::Null);
        post.resolve("postid", Value::Int64(7)).unwrap();
        assert_eq!(first.value(), Value::Int64(7));
        assert_eq!(second.value(), Value::Int64(7));
        assert_eq!(post.get("postid"), Value::Int64(7));
        assert!(!post.is_changed("postid"));
        let error = post.resolve("postid", Value::Int64(8)).unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::InvariantViolation));
        assert_eq!(first.value(), Value::Int64(7));
        let third = post.future("postid").unwrap();
        assert!(third.is_resolved());
        assert_eq!(third.value(), Value::Int64(7));
    }

    #[test]
    fn future_of_known_values() {
        let mut post = Post::build(record! { "title" => "a" }).unwrap();
        let title = post.future("title").unwrap();
        assert!(title.is_resolved());
        assert_eq!(title.value(), Value::Varchar("a".into()));
        let subtitle = post.future("subtitle").unwrap();
        assert!(subtitle.is_resolved());
        assert_eq!(subtitle.value(), Value::Null);
        let error = post.future("body").unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::NoSuchProperty));
    }

    #[test]
    fn future_settled_by_explicit_value() {
        let mut post = Post::build(record! { "title" => "a" }).unwrap();
        let future = post.future("postid").unwrap();
        post.set("postid", 10);
        assert!(!future.is_resolved());
        post.settle_futures().unwrap();
        assert_eq!(future.value(), Value::Int64(10));
    }

    #[test]
    fn clones_do_not_share_futures() {
        let mut post = Post::build(record! { "title" => "a" }).unwrap();
        let future = post.future("postid").unwrap();
        let mut copy = post.clone();
        copy.resolve("postid", Value::Int64(1)).unwrap();
        assert!(!future.is_resolved());
        post.resolve("postid", Value::Int64(2)).unwrap();
        assert_eq!(future.value(), Value::Int64(2));
    }

    #[test]
    fn future_resolves_once() {
        let future = PropertyFuture::pending();
        let clone = future.clone();
        future.resolve(Value::Int64(1)).unwrap();
        assert_eq!(clone.value(), Value::Int64(1));
        let error = clone.resolve(Value::Int64(2)).unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::InvariantViolation));
        assert_eq!(future.value(), Value::Int64(1));
        assert!(PropertyFuture::resolved(Value::Null).is_resolved());
    }
}
