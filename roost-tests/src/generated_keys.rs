use roost::{DomainType, Executor, Result, SchemaBuilder, Value, ValueType, record};
use std::sync::LazyLock;
use tokio::sync::Mutex;

struct Author;
impl DomainType for Author {
    const NAME: &'static str = "roost_author";
    fn define(schema: &mut SchemaBuilder) -> Result<()> {
        schema
            .property("authorid", ValueType::integer(11), "primary auto_increment")?
            .property("name", ValueType::string(128), "required")?;
        Ok(())
    }
}

struct Book;
impl DomainType for Book {
    const NAME: &'static str = "roost_book";
    fn define(schema: &mut SchemaBuilder) -> Result<()> {
        schema
            .property("bookid", ValueType::integer(11), "primary auto_increment")?
            .property("title", ValueType::string(255), "required")?;
        Ok(())
    }
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Fresh tables hand out the same first key, each insert must still report it.
pub async fn generated_keys<E: Executor>(executor: &mut E) {
    let _lock = MUTEX.lock().await;

    // Setup
    Author::drop_table(executor, true)
        .await
        .expect("Failed to drop the author table");
    Book::drop_table(executor, true)
        .await
        .expect("Failed to drop the book table");
    Author::create_table(executor, false)
        .await
        .expect("Failed to create the author table");
    Book::create_table(executor, false)
        .await
        .expect("Failed to create the book table");

    let mut author = Author::build(record! { "name" => "Ann" }).expect("Failed to build");
    let mut book = Book::build(record! { "title" => "Tales" }).expect("Failed to build");
    let future = book.future("bookid").expect("No bookid property");
    author
        .save(executor)
        .await
        .expect("Failed to save the first author");
    book.save(executor)
        .await
        .expect("Failed to save the first book");
    assert!(author.is_saved());
    assert!(book.is_saved());
    let author_id = author
        .get_as::<i64>("authorid")
        .expect("The author has no key");
    let book_id = book.get_as::<i64>("bookid").expect("The book has no key");
    assert_eq!(future.value(), Value::Int64(book_id));

    let found = Book::finder()
        .by_identity(executor, &[Value::Int64(book_id)])
        .await
        .expect("Failed to query the book")
        .expect("The book was not found");
    assert_eq!(found.get("title"), Value::Varchar("Tales".into()));
    let found = Author::finder()
        .by_identity(executor, &[Value::Int64(author_id)])
        .await
        .expect("Failed to query the author")
        .expect("The author was not found");
    assert_eq!(found.get("name"), Value::Varchar("Ann".into()));

    // The second book gets a key of its own
    let second = Book::create(executor, record! { "title" => "Poems" })
        .await
        .expect("Failed to create the second book");
    assert_ne!(second.get("bookid"), Value::Int64(book_id));
    assert_ne!(second.get("bookid"), Value::Null);

    Book::drop_table(executor, false)
        .await
        .expect("Failed to drop the book table");
    Author::drop_table(executor, false)
        .await
        .expect("Failed to drop the author table");
}
