//! Integration tests for SELECT/COUNT/INSERT/UPDATE/DELETE rendering across
//! dialects.

use std::sync::Arc;

use quarry_core::{
    ConditionGroup, Direction, MysqlDialect, PostgresDialect, QueryBuilder, QueryCondition,
    SqlValue, SqliteDialect,
};

fn mysql() -> QueryBuilder {
    QueryBuilder::new(Arc::new(MysqlDialect::new()))
}

fn postgres() -> QueryBuilder {
    QueryBuilder::new(Arc::new(PostgresDialect::new()))
}

fn sqlite() -> QueryBuilder {
    QueryBuilder::new(Arc::new(SqliteDialect::new()))
}

// =============================================================================
// SELECT / COUNT
// =============================================================================

#[test]
fn test_select_with_alias_join_and_paging() {
    let query = postgres()
        .table_with("users", "id", Some("u"))
        .select(&["id", "name"])
        .left_join("posts", "id", "user_id", &["title"])
        .where_condition(QueryCondition::equals("active", true))
        .order_by("name", Direction::Desc)
        .limit(5)
        .offset(10)
        .build();

    assert_eq!(
        query.sql(),
        "SELECT u.\"id\", u.\"name\", j0.\"title\" AS \"j0__title\" FROM \"users\" AS u \
         LEFT JOIN \"posts\" AS j0 ON u.\"id\" = j0.\"user_id\" \
         WHERE u.\"active\" = :u_active ORDER BY u.\"name\" DESC LIMIT 5 OFFSET 10"
    );
    assert_eq!(query.param("u_active"), Some(&SqlValue::Bool(true)));
}

#[test]
fn test_select_join_without_alias_qualifies_base_table() {
    let query = sqlite()
        .table("users")
        .select(&[])
        .left_join("posts", "id", "user_id", &["title"])
        .build();

    assert_eq!(
        query.sql(),
        "SELECT \"users\".*, j0.\"title\" AS \"j0__title\" FROM \"users\" \
         LEFT JOIN \"posts\" AS j0 ON \"users\".\"id\" = j0.\"user_id\""
    );
}

#[test]
fn test_count_ignores_order_and_limit() {
    let query = mysql()
        .table("users")
        .count()
        .where_condition(QueryCondition::null("deleted_at"))
        .order_by("id", Direction::Asc)
        .limit(1)
        .build();

    assert_eq!(
        query.sql(),
        "SELECT COUNT(*) AS aggregate FROM `users` WHERE `deleted_at` IS NULL"
    );
}

#[test]
fn test_where_aliased_and_groups() {
    let query = sqlite()
        .table("users")
        .select(&["id"])
        .where_group(
            ConditionGroup::any()
                .with(QueryCondition::equals("role", "admin"))
                .with(QueryCondition::equals("role", "owner")),
        )
        .where_aliased("p", QueryCondition::not_null("title"))
        .build();

    assert_eq!(
        query.sql(),
        "SELECT \"id\" FROM \"users\" WHERE (\"role\" = :role OR \"role\" = :role_1) \
         AND p.\"title\" IS NOT NULL"
    );
}

#[test]
fn test_offset_without_limit_per_dialect() {
    let mysql = mysql().table("t").select(&[]).offset(3).build();
    let postgres = postgres().table("t").select(&[]).offset(3).build();
    let sqlite = sqlite().table("t").select(&[]).offset(3).build();

    assert_eq!(mysql.sql(), "SELECT * FROM `t` LIMIT 18446744073709551615 OFFSET 3");
    assert_eq!(postgres.sql(), "SELECT * FROM \"t\" OFFSET 3");
    assert_eq!(sqlite.sql(), "SELECT * FROM \"t\" LIMIT -1 OFFSET 3");
}

// =============================================================================
// INSERT
// =============================================================================

#[test]
fn test_insert_returning_on_postgres() {
    let query = postgres()
        .table_with("users", "user_id", None)
        .insert([("name", "bob")])
        .build();

    assert_eq!(
        query.sql(),
        "INSERT INTO \"users\" (\"name\") VALUES (:name) RETURNING \"user_id\""
    );
}

#[test]
fn test_insert_without_declared_key_has_no_returning() {
    let query = postgres()
        .table("user_roles")
        .insert([("user_id", 1_i64), ("role_id", 2_i64)])
        .build();

    assert_eq!(
        query.sql(),
        "INSERT INTO \"user_roles\" (\"user_id\", \"role_id\") VALUES (:user_id, :role_id)"
    );
}

#[test]
fn test_empty_insert_per_dialect() {
    let none = Vec::<(String, i64)>::new();
    assert_eq!(
        mysql().table("users").insert(none.clone()).build().sql(),
        "INSERT INTO `users` () VALUES ()"
    );
    assert_eq!(
        sqlite().table("users").insert(none).build().sql(),
        "INSERT INTO \"users\" DEFAULT VALUES"
    );
}

// =============================================================================
// UPDATE / DELETE with LIMIT
// =============================================================================

#[test]
fn test_update_limit_direct_on_mysql() {
    let query = mysql()
        .table("users")
        .update([("active", false)])
        .where_condition(QueryCondition::equals("active", true))
        .order_by("id", Direction::Asc)
        .limit(10)
        .build();

    assert_eq!(
        query.sql(),
        "UPDATE `users` SET `active` = :active WHERE `active` = :active_1 ORDER BY `id` ASC LIMIT 10"
    );
}

#[test]
fn test_update_limit_subquery_on_postgres() {
    let query = postgres()
        .table("users")
        .update([("active", false)])
        .where_condition(QueryCondition::equals("active", true))
        .order_by("id", Direction::Asc)
        .limit(10)
        .build();

    assert_eq!(
        query.sql(),
        "UPDATE \"users\" SET \"active\" = :active WHERE \"id\" IN \
         (SELECT \"id\" FROM \"users\" WHERE \"active\" = :active_1 ORDER BY \"id\" ASC LIMIT 10)"
    );

    let (sql, values) = query.to_positional(|i| format!("${i}"));
    assert!(sql.contains("SET \"active\" = $1"));
    assert!(sql.contains("WHERE \"active\" = $2"));
    assert_eq!(values, vec![SqlValue::Bool(false), SqlValue::Bool(true)]);
}

#[test]
fn test_delete_limit_subquery_on_sqlite() {
    let query = sqlite()
        .table("users")
        .delete()
        .where_condition(QueryCondition::equals("active", true))
        .limit(3)
        .build();

    assert_eq!(
        query.sql(),
        "DELETE FROM \"users\" WHERE \"id\" IN (SELECT \"id\" FROM \"users\" WHERE \"active\" = :active LIMIT 3)"
    );
}

#[test]
fn test_delete_without_limit() {
    let query = mysql()
        .table("sessions")
        .delete()
        .where_condition(QueryCondition::between_dates(
            "expires_at",
            "2020-01-01 00:00:00",
            "2021-01-01 00:00:00",
        ))
        .build();

    assert_eq!(
        query.sql(),
        "DELETE FROM `sessions` WHERE `expires_at` BETWEEN CAST('2020-01-01 00:00:00' AS DATETIME) \
         AND CAST('2021-01-01 00:00:00' AS DATETIME)"
    );
}

// =============================================================================
// Column listing and raw
// =============================================================================

#[test]
fn test_columns_listing() {
    let sqlite = sqlite().table("users").list_columns().build();
    assert_eq!(
        sqlite.sql(),
        "SELECT name AS column_name FROM pragma_table_info('users') ORDER BY cid"
    );

    let mysql = mysql().table("users").list_columns().build();
    assert!(mysql.sql().contains("TABLE_SCHEMA = DATABASE()"));
    assert_eq!(
        mysql.param("table_name"),
        Some(&SqlValue::Text("users".into()))
    );
}

#[test]
fn test_raw_passes_through() {
    let query = sqlite()
        .raw(
            "SELECT * FROM t WHERE a = :a",
            vec![("a".to_string(), SqlValue::Int(1))],
        )
        .build();
    assert_eq!(query.sql(), "SELECT * FROM t WHERE a = :a");
    assert_eq!(query.to_inline_sql(), "SELECT * FROM t WHERE a = 1");
}
