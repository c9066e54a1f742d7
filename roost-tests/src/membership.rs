use crate::silent_logs;
use roost::{
    DomainType, ErrorExt, ErrorKind, Executor, Result, SchemaBuilder, Value, ValueType, record,
};
use std::sync::LazyLock;
use tokio::sync::Mutex;

/// Identified by two explicit keys, nothing is generated by the store.
struct Membership;
impl DomainType for Membership {
    const NAME: &'static str = "roost_membership";
    fn define(schema: &mut SchemaBuilder) -> Result<()> {
        schema
            .property("userid", ValueType::integer(11), "primary")?
            .property("groupid", ValueType::integer(11), "primary")?
            .property("role", ValueType::string(32), "required")?
            .identity(["userid", "groupid"]);
        Ok(())
    }
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn membership<E: Executor>(executor: &mut E) {
    let _lock = MUTEX.lock().await;

    // Setup
    Membership::drop_table(executor, true)
        .await
        .expect("Failed to drop the membership table");
    Membership::create_table(executor, false)
        .await
        .expect("Failed to create the membership table");

    let mut memberships = Membership::import(
        executor,
        [
            record! { "userid" => 1, "groupid" => 1, "role" => "owner" },
            record! { "userid" => 1, "groupid" => 2, "role" => "member" },
            record! { "userid" => 2, "groupid" => 1, "role" => "member" },
        ],
    )
    .await
    .expect("Failed to import the memberships");
    assert!(memberships.iter().all(|v| v.is_saved()));

    // Lookup by both keys
    let found = Membership::finder()
        .by_identity(executor, &[Value::Int64(1), Value::Int64(2)])
        .await
        .expect("Failed to query the membership")
        .expect("Membership (1, 2) was not found");
    assert_eq!(found.get("role"), Value::Varchar("member".into()));
    assert_eq!(found.identity(), memberships[1].identity());
    let missing = Membership::finder()
        .by_identity(executor, &[Value::Int64(2), Value::Int64(2)])
        .await
        .expect("Failed to query a missing membership");
    assert!(missing.is_none());

    // Update targets exactly one row
    memberships[1].set("role", "admin");
    memberships[1]
        .save(executor)
        .await
        .expect("Failed to update the membership");
    let of_user = Membership::finder()
        .where_clause(executor, r#""userid" = ?"#, &[Value::Int64(1)])
        .await
        .expect("Failed to query the memberships of the user");
    let mut roles = of_user
        .iter()
        .map(|v| v.get_as::<String>("role").expect("Role is not a string"))
        .collect::<Vec<_>>();
    roles.sort();
    assert_eq!(roles, ["admin", "owner"]);

    // Duplicated keys are rejected by the store
    silent_logs! {
        let mut duplicate = Membership::build(
            record! { "userid" => 2, "groupid" => 1, "role" => "owner" }
        )
        .expect("Failed to build");
        let error = duplicate
            .save(executor)
            .await
            .expect_err("Duplicated keys must be rejected");
        assert_eq!(error.kind(), Some(ErrorKind::Statement));
        assert!(!duplicate.is_saved());
    }

    // Delete
    memberships[2]
        .delete(executor)
        .await
        .expect("Failed to delete the membership");
    let all = Membership::finder()
        .all(executor)
        .await
        .expect("Failed to query all the memberships");
    assert_eq!(all.len(), 2);

    Membership::drop_table(executor, false)
        .await
        .expect("Failed to drop the membership table");
}
