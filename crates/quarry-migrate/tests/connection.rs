//! Live connection tests against SQLite.

use quarry_core::schema::{integer, string, Blueprint};
use quarry_core::{QueryCondition, SqlValue};
use quarry_migrate::{Connection, Driver, Executor, MigrateError};

async fn connection() -> Connection {
    let mut conn = Connection::new("sqlite::memory:").expect("Failed to create connection");
    let query = conn
        .builder()
        .create_table(
            Blueprint::new("users")
                .column(string("name", 100).not_null())
                .column(integer("age")),
        )
        .build();
    conn.execute(query).await.expect("Failed to create table");
    conn
}

async fn name_of(conn: &mut Connection, id: i64) -> Option<String> {
    let query = conn
        .builder()
        .table("users")
        .select(&["name"])
        .where_condition(QueryCondition::equals("id", id))
        .build();
    let result = conn.execute(query).await.expect("Failed to select");
    result
        .first()
        .and_then(|r| r.get_str("name"))
        .map(str::to_string)
}

// =============================================================================
// Schema
// =============================================================================

#[tokio::test]
async fn test_create_table_then_list_columns() {
    let mut conn = connection().await;
    let columns = conn.columns("users").await.unwrap();
    assert_eq!(columns, vec!["id", "name", "age"]);
}

#[tokio::test]
async fn test_if_exists_variants_never_fail() {
    let mut conn = connection().await;
    let blueprint = || Blueprint::new("users").column(string("name", 100));

    let create = conn.builder().create_table_if_not_exists(blueprint()).build();
    conn.execute(create.clone()).await.unwrap();
    conn.execute(create).await.unwrap();

    let drop = conn.builder().table("users").drop_table_if_exists().build();
    conn.execute(drop.clone()).await.unwrap();
    conn.execute(drop).await.unwrap();

    // Plain DROP on a missing table is a driver error.
    let err = conn
        .execute(conn.builder().table("users").drop_table().build())
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::Database { .. }));
}

// =============================================================================
// DML
// =============================================================================

#[tokio::test]
async fn test_insert_reports_id_and_select_decodes_values() {
    let mut conn = connection().await;

    let first = conn
        .builder()
        .table("users")
        .insert([("name", SqlValue::Text("alice".into())), ("age", SqlValue::Int(31))])
        .build();
    let result = conn.execute(first).await.unwrap();
    assert_eq!(result.insert_id, Some(1));
    assert_eq!(result.affected_rows, 1);

    let second = conn
        .builder()
        .table("users")
        .insert([("name", SqlValue::Text("bob".into())), ("age", SqlValue::Null)])
        .build();
    assert_eq!(conn.execute(second).await.unwrap().insert_id, Some(2));

    let result = conn
        .query("SELECT id, name, age FROM users ORDER BY id", &[])
        .await
        .unwrap();
    assert_eq!(result.records.len(), 2);
    assert_eq!(result.records[0].get_i64("age"), Some(31));
    assert_eq!(result.records[1].get("age"), Some(&SqlValue::Null));
    assert_eq!(result.records[1].get_str("name"), Some("bob"));
}

#[tokio::test]
async fn test_named_parameters_are_bound_in_order() {
    let mut conn = connection().await;
    conn.query(
        "INSERT INTO users (name, age) VALUES (:name, :age)",
        &[
            ("age".to_string(), SqlValue::Int(40)),
            ("name".to_string(), SqlValue::Text("carol".into())),
        ],
    )
    .await
    .unwrap();

    let result = conn
        .query(
            "SELECT name FROM users WHERE age = :age",
            &[("age".to_string(), SqlValue::Int(40))],
        )
        .await
        .unwrap();
    assert_eq!(result.first().and_then(|r| r.get_str("name")), Some("carol"));
}

// =============================================================================
// Cache
// =============================================================================

#[tokio::test]
async fn test_update_invalidates_cached_reads() {
    let mut conn = connection().await;
    let insert = conn.builder().table("users").insert([("name", "before")]).build();
    conn.execute(insert).await.unwrap();

    assert_eq!(name_of(&mut conn, 1).await.as_deref(), Some("before"));
    assert_eq!(conn.cache().len(), 1);
    assert_eq!(name_of(&mut conn, 1).await.as_deref(), Some("before"));
    assert_eq!(conn.cache().len(), 1);

    let update = conn
        .builder()
        .table("users")
        .update([("name", "after")])
        .where_condition(QueryCondition::equals("id", 1))
        .build();
    let result = conn.execute(update).await.unwrap();
    assert_eq!(result.affected_rows, 1);
    assert!(conn.cache().is_empty());

    assert_eq!(name_of(&mut conn, 1).await.as_deref(), Some("after"));
}

#[tokio::test]
async fn test_write_without_changes_keeps_cache() {
    let mut conn = connection().await;
    name_of(&mut conn, 1).await;
    assert_eq!(conn.cache().len(), 1);

    let update = conn
        .builder()
        .table("users")
        .update([("name", "nobody")])
        .where_condition(QueryCondition::equals("id", 99))
        .build();
    assert_eq!(conn.execute(update).await.unwrap().affected_rows, 0);
    assert_eq!(conn.cache().len(), 1);
}

#[tokio::test]
async fn test_disabled_cache() {
    let mut conn = connection().await;
    conn.set_cache_enabled(false);
    name_of(&mut conn, 1).await;
    assert!(conn.cache().is_empty());
}

// =============================================================================
// Transactions
// =============================================================================

#[tokio::test]
async fn test_rollback_discards_writes() {
    let mut conn = connection().await;
    conn.begin().await.unwrap();
    assert!(conn.in_transaction());

    let insert = conn.builder().table("users").insert([("name", "ghost")]).build();
    conn.execute(insert).await.unwrap();
    assert_eq!(name_of(&mut conn, 1).await.as_deref(), Some("ghost"));

    conn.rollback().await.unwrap();
    assert!(!conn.in_transaction());
    assert_eq!(name_of(&mut conn, 1).await, None);
}

#[tokio::test]
async fn test_commit_keeps_writes() {
    let mut conn = connection().await;
    conn.begin().await.unwrap();
    let insert = conn.builder().table("users").insert([("name", "kept")]).build();
    conn.execute(insert).await.unwrap();
    conn.commit().await.unwrap();

    assert_eq!(name_of(&mut conn, 1).await.as_deref(), Some("kept"));
}

#[tokio::test]
async fn test_transactions_do_not_nest() {
    let mut conn = connection().await;
    conn.begin().await.unwrap();
    let err = conn.begin().await.unwrap_err();
    assert!(matches!(err, MigrateError::Transaction(_)));
    conn.rollback().await.unwrap();
}

// =============================================================================
// Database switching
// =============================================================================

#[tokio::test]
async fn test_switch_database_reconnects() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}/first.db?mode=rwc", dir.path().display());
    let mut conn = Connection::new(&url).unwrap();
    assert_eq!(conn.driver(), Driver::Sqlite);

    conn.query("CREATE TABLE only_in_first (id INTEGER)", &[])
        .await
        .unwrap();
    assert_eq!(conn.columns("only_in_first").await.unwrap(), vec!["id"]);

    conn.switch_database("second.db").await.unwrap();
    assert!(conn.url().ends_with("/second.db?mode=rwc"));
    assert!(conn.cache().is_empty());
    assert!(conn.columns("only_in_first").await.unwrap().is_empty());
    assert!(dir.path().join("second.db").exists());

    conn.close().await;
}
