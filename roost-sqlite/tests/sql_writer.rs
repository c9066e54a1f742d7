#[cfg(test)]
mod tests {
    use indoc::indoc;
    use roost_core::{DomainType, Result, SchemaBuilder, SqlWriter, ValueType};
    use roost_sqlite::SqliteSqlWriter;

    struct Post;
    impl DomainType for Post {
        const NAME: &'static str = "post";
        fn define(schema: &mut SchemaBuilder) -> Result<()> {
            schema
                .property("postid", ValueType::integer(11), "primary auto_increment")?
                .property("title", ValueType::string(255), "required")?
                .property("body", ValueType::text(), "")?
                .property("score", ValueType::Float, "default=1")?
                .property("draft", ValueType::Boolean, "default=false")?
                .property("cover", ValueType::Blob, "")?;
            Ok(())
        }
    }

    #[test]
    fn create_table() {
        let schema = Post::schema().expect("Post schema");
        let mut out = String::new();
        SqliteSqlWriter::default().write_create_table(&mut out, &schema, schema.table(), true);
        assert_eq!(
            out,
            indoc! {r#"
                CREATE TABLE IF NOT EXISTS "post" (
                "postid" INTEGER PRIMARY KEY AUTOINCREMENT,
                "title" VARCHAR(255) NOT NULL,
                "body" TEXT,
                "score" REAL DEFAULT 1.0,
                "draft" BOOLEAN DEFAULT false,
                "cover" BLOB
                );
            "#}
            .trim()
        );
    }
}
