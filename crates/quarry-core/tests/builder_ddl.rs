//! Integration tests for DDL rendering: tables, columns, indexes and foreign
//! keys.

use std::sync::Arc;

use quarry_core::schema::{integer, string, text, Blueprint, ForeignKeyAction, Key};
use quarry_core::{Action, MysqlDialect, PostgresDialect, QueryBuilder, SqliteDialect};

fn mysql() -> QueryBuilder {
    QueryBuilder::new(Arc::new(MysqlDialect::new()))
}

fn postgres() -> QueryBuilder {
    QueryBuilder::new(Arc::new(PostgresDialect::new()))
}

fn sqlite() -> QueryBuilder {
    QueryBuilder::new(Arc::new(SqliteDialect::new()))
}

fn posts() -> Blueprint {
    Blueprint::new("posts")
        .column(string("title", 200).not_null())
        .column(integer("user_id").unsigned())
        .key(Key::index(&["user_id"]))
        .key(Key::unique(&["title"]))
        .key(Key::foreign("user_id", "id", "users").on_delete(ForeignKeyAction::Cascade))
}

// =============================================================================
// CREATE TABLE
// =============================================================================

#[test]
fn test_create_table_mysql() {
    let query = mysql().create_table(posts()).build();
    assert_eq!(query.action(), Some(Action::CreateTable));
    assert_eq!(query.table(), Some("posts"));
    assert_eq!(
        query.sql(),
        "CREATE TABLE `posts` (\n    \
         `id` INT UNSIGNED NOT NULL AUTO_INCREMENT,\n    \
         `title` VARCHAR(200) NOT NULL,\n    \
         `user_id` INT UNSIGNED,\n    \
         PRIMARY KEY (`id`),\n    \
         INDEX `idx_user_id` (`user_id`),\n    \
         CONSTRAINT `uk_title` UNIQUE (`title`),\n    \
         CONSTRAINT `fk_user_id_users_id` FOREIGN KEY (`user_id`) REFERENCES `users` (`id`) ON DELETE CASCADE\n)"
    );
}

#[test]
fn test_create_table_sqlite_moves_indexes_out() {
    let query = sqlite().create_table(posts()).build();
    assert_eq!(
        query.sql(),
        "CREATE TABLE \"posts\" (\n    \
         \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n    \
         \"title\" VARCHAR(200) NOT NULL,\n    \
         \"user_id\" INTEGER,\n    \
         CONSTRAINT \"uk_title\" UNIQUE (\"title\"),\n    \
         CONSTRAINT \"fk_user_id_users_id\" FOREIGN KEY (\"user_id\") REFERENCES \"users\" (\"id\") ON DELETE CASCADE\n);\n\
         CREATE INDEX \"idx_user_id\" ON \"posts\" (\"user_id\")"
    );
}

#[test]
fn test_create_table_if_not_exists_postgres() {
    let query = postgres().create_table_if_not_exists(posts()).build();
    assert_eq!(query.action(), Some(Action::CreateTableIfNotExists));
    assert!(query.sql().starts_with("CREATE TABLE IF NOT EXISTS \"posts\" (\n    \"id\" SERIAL PRIMARY KEY,"));
    assert!(query
        .sql()
        .ends_with(";\nCREATE INDEX IF NOT EXISTS \"idx_user_id\" ON \"posts\" (\"user_id\")"));
}

#[test]
fn test_implicit_primary_key_uses_builder_primary_key() {
    let query = sqlite()
        .table_with("tags", "tag_id", None)
        .create_table(Blueprint::new("tags").column(string("label", 50)))
        .build();
    assert_eq!(
        query.sql(),
        "CREATE TABLE \"tags\" (\n    \"tag_id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n    \"label\" VARCHAR(50)\n)"
    );
}

#[test]
fn test_composite_primary_key_is_table_level() {
    let blueprint = Blueprint::new("post_tag")
        .column(integer("post_id").not_null())
        .column(integer("tag_id").not_null())
        .key(Key::primary(&["post_id", "tag_id"]));
    let query = postgres().create_table(blueprint).build();
    assert_eq!(
        query.sql(),
        "CREATE TABLE \"post_tag\" (\n    \"post_id\" INTEGER NOT NULL,\n    \"tag_id\" INTEGER NOT NULL,\n    PRIMARY KEY (\"post_id\", \"tag_id\")\n)"
    );
}

// =============================================================================
// DROP / ALTER
// =============================================================================

#[test]
fn test_drop_table_variants() {
    assert_eq!(sqlite().table("posts").drop_table().build().sql(), "DROP TABLE \"posts\"");
    assert_eq!(
        mysql().table("posts").drop_table_if_exists().build().sql(),
        "DROP TABLE IF EXISTS `posts`"
    );
}

#[test]
fn test_drop_columns_per_dialect() {
    assert_eq!(
        mysql().table("posts").drop_columns(&["a", "b"]).build().sql(),
        "ALTER TABLE `posts` DROP COLUMN `a`, DROP COLUMN `b`"
    );
    assert_eq!(
        sqlite().table("posts").drop_columns(&["a", "b"]).build().sql(),
        "ALTER TABLE \"posts\" DROP COLUMN \"a\";\nALTER TABLE \"posts\" DROP COLUMN \"b\""
    );
}

#[test]
fn test_add_column() {
    let query = postgres()
        .add_column(Blueprint::new("posts").column(text("body")))
        .build();
    assert_eq!(query.sql(), "ALTER TABLE \"posts\" ADD COLUMN \"body\" TEXT");
}

#[test]
fn test_truncate_per_dialect() {
    assert_eq!(mysql().table("posts").truncate_table().build().sql(), "TRUNCATE TABLE `posts`");
    assert_eq!(
        postgres().table("posts").truncate_table().build().sql(),
        "TRUNCATE TABLE \"posts\" RESTART IDENTITY"
    );
    assert_eq!(sqlite().table("posts").truncate_table().build().sql(), "DELETE FROM \"posts\"");
}

// =============================================================================
// Indexes and foreign keys
// =============================================================================

#[test]
fn test_create_and_drop_index() {
    assert_eq!(
        postgres().table("users").create_index(Key::unique(&["email"])).build().sql(),
        "CREATE UNIQUE INDEX \"uk_email\" ON \"users\" (\"email\")"
    );
    assert_eq!(
        mysql().table("posts").drop_index("idx_user_id").build().sql(),
        "DROP INDEX `idx_user_id` ON `posts`"
    );
    assert_eq!(
        sqlite().table("posts").drop_index("idx_user_id").build().sql(),
        "DROP INDEX \"idx_user_id\""
    );
}

#[test]
fn test_foreign_keys() {
    let key = Key::foreign("user_id", "id", "users");

    assert_eq!(
        postgres().table("posts").add_foreign_key(key.clone()).build().sql(),
        "ALTER TABLE \"posts\" ADD CONSTRAINT \"fk_user_id_users_id\" FOREIGN KEY (\"user_id\") REFERENCES \"users\" (\"id\")"
    );
    assert_eq!(
        mysql().table("posts").drop_foreign_key("fk_user_id_users_id").build().sql(),
        "ALTER TABLE `posts` DROP FOREIGN KEY `fk_user_id_users_id`"
    );
    assert_eq!(
        postgres().table("posts").drop_foreign_key("fk_user_id_users_id").build().sql(),
        "ALTER TABLE \"posts\" DROP CONSTRAINT \"fk_user_id_users_id\""
    );
}

#[test]
fn test_sqlite_foreign_key_changes_are_no_ops() {
    let key = Key::foreign("user_id", "id", "users");
    assert!(sqlite().table("posts").add_foreign_key(key.clone()).build().is_empty());
    assert!(sqlite().table("posts").create_index(key).build().is_empty());
    assert!(sqlite().table("posts").drop_foreign_key("fk").build().is_empty());
}
