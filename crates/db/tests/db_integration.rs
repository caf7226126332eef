//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `quad_test`)
//!   `TEST_DB_PASSWORD` (default: `quad_test`)
//!   `TEST_DB_NAME` (default: `quad_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::Utc;
use quad_common::{AppError, IdGenerator};
use quad_db::entities::{account, post, post_report, post_vote};
use quad_db::repositories::{
    AccountRepository, PostReportRepository, PostRepository, PostVoteRepository,
};
use quad_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::{Set, SqlxPostgresConnector};

fn account_model(id_gen: &IdGenerator, email: &str, username: &str) -> account::ActiveModel {
    account::ActiveModel {
        id: Set(id_gen.generate()),
        email: Set(email.to_string()),
        email_lower: Set(email.to_lowercase()),
        username: Set(username.to_string()),
        display_name: Set(None),
        password_hash: Set("$argon2id$test".to_string()),
        token: Set(id_gen.generate_token()),
        pseudonym: Set(None),
        role: Set(account::AccountRole::Member),
        reported_count: Set(0),
        is_banned: Set(false),
        ban_expires_at: Set(None),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
}

fn post_model(id_gen: &IdGenerator, pseudonym: &str) -> post::ActiveModel {
    post::ActiveModel {
        id: Set(id_gen.generate()),
        author_pseudonym: Set(pseudonym.to_string()),
        display_alias: Set("Anonymous Fox".to_string()),
        is_anonymous: Set(true),
        title: Set(Some("Integration test".to_string())),
        text: Set("Body".to_string()),
        reply_id: Set(None),
        up_votes: Set(0),
        down_votes: Set(0),
        report_count: Set(0),
        flagged: Set(false),
        hidden: Set(false),
        hidden_by_moderator: Set(false),
        replies_count: Set(0),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_migrations_apply_cleanly() {
    let db = TestDatabase::create_unique().await.expect("Failed to create db");

    let result = quad_db::migrate(db.connection()).await;
    assert!(result.is_ok(), "Migrations failed: {:?}", result.err());

    db.drop_database().await.expect("Failed to drop db");
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_vote_unique_index_rejects_second_vote() {
    let db = TestDatabase::create_unique().await.expect("Failed to create db");
    quad_db::migrate(db.connection()).await.expect("Migrations failed");

    // `DatabaseConnection` is not `Clone` while the `mock` feature is on,
    // so duplicate the handle by re-wrapping the shared sqlx pool.
    let conn = Arc::new(SqlxPostgresConnector::from_sqlx_postgres_pool(
        db.conn.get_postgres_connection_pool().clone(),
    ));
    let id_gen = IdGenerator::new();

    let posts = PostRepository::new(conn.clone());
    let votes = PostVoteRepository::new(conn.clone());

    let post = posts.create(post_model(&id_gen, "feedfacefeedfacefeedfacefeedface")).await.unwrap();

    let first = post_vote::ActiveModel {
        id: Set(id_gen.generate()),
        post_id: Set(post.id.clone()),
        voter_pseudonym: Set("aaaa".to_string()),
        value: Set(post_vote::VoteValue::Up),
        created_at: Set(Utc::now().into()),
    };
    votes.create(first).await.unwrap();

    let second = post_vote::ActiveModel {
        id: Set(id_gen.generate()),
        post_id: Set(post.id.clone()),
        voter_pseudonym: Set("aaaa".to_string()),
        value: Set(post_vote::VoteValue::Down),
        created_at: Set(Utc::now().into()),
    };
    let result = votes.create(second).await;

    assert!(matches!(result, Err(AppError::Conflict(_))));

    db.drop_database().await.expect("Failed to drop db");
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_report_unique_index_rejects_duplicate() {
    let db = TestDatabase::create_unique().await.expect("Failed to create db");
    quad_db::migrate(db.connection()).await.expect("Migrations failed");

    // `DatabaseConnection` is not `Clone` while the `mock` feature is on,
    // so duplicate the handle by re-wrapping the shared sqlx pool.
    let conn = Arc::new(SqlxPostgresConnector::from_sqlx_postgres_pool(
        db.conn.get_postgres_connection_pool().clone(),
    ));
    let id_gen = IdGenerator::new();

    let posts = PostRepository::new(conn.clone());
    let reports = PostReportRepository::new(conn.clone());

    let post = posts.create(post_model(&id_gen, "feedfacefeedfacefeedfacefeedface")).await.unwrap();

    let first = post_report::ActiveModel {
        id: Set(id_gen.generate()),
        post_id: Set(post.id.clone()),
        reporter_pseudonym: Set("bbbb".to_string()),
        created_at: Set(Utc::now().into()),
    };
    reports.create(first).await.unwrap();

    let duplicate = post_report::ActiveModel {
        id: Set(id_gen.generate()),
        post_id: Set(post.id.clone()),
        reporter_pseudonym: Set("bbbb".to_string()),
        created_at: Set(Utc::now().into()),
    };
    let result = reports.create(duplicate).await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert_eq!(reports.count_by_post(&post.id).await.unwrap(), 1);

    db.drop_database().await.expect("Failed to drop db");
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_set_pseudonym_if_absent_is_one_shot() {
    let db = TestDatabase::create_unique().await.expect("Failed to create db");
    quad_db::migrate(db.connection()).await.expect("Migrations failed");

    // `DatabaseConnection` is not `Clone` while the `mock` feature is on,
    // so duplicate the handle by re-wrapping the shared sqlx pool.
    let conn = Arc::new(SqlxPostgresConnector::from_sqlx_postgres_pool(
        db.conn.get_postgres_connection_pool().clone(),
    ));
    let id_gen = IdGenerator::new();

    let accounts = AccountRepository::new(conn.clone());
    let created = accounts
        .create(account_model(&id_gen, "itest@college.edu", "itest"))
        .await
        .unwrap();

    let first = accounts
        .set_pseudonym_if_absent(&created.id, "cafebabecafebabecafebabecafebabe")
        .await
        .unwrap();
    let second = accounts
        .set_pseudonym_if_absent(&created.id, "feedfacefeedfacefeedfacefeedface")
        .await
        .unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 0);

    let stored = accounts.get_by_id(&created.id).await.unwrap();
    assert_eq!(
        stored.pseudonym.as_deref(),
        Some("cafebabecafebabecafebabecafebabe")
    );

    db.drop_database().await.expect("Failed to drop db");
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_ban_propagation_bulk_updates() {
    let db = TestDatabase::create_unique().await.expect("Failed to create db");
    quad_db::migrate(db.connection()).await.expect("Migrations failed");

    // `DatabaseConnection` is not `Clone` while the `mock` feature is on,
    // so duplicate the handle by re-wrapping the shared sqlx pool.
    let conn = Arc::new(SqlxPostgresConnector::from_sqlx_postgres_pool(
        db.conn.get_postgres_connection_pool().clone(),
    ));
    let id_gen = IdGenerator::new();
    let posts = PostRepository::new(conn.clone());

    let pseudonym = "cafebabecafebabecafebabecafebabe";
    for _ in 0..3 {
        posts.create(post_model(&id_gen, pseudonym)).await.unwrap();
    }
    let moderated = posts.create(post_model(&id_gen, pseudonym)).await.unwrap();
    posts.hide_by_moderator(&moderated.id).await.unwrap();

    // Ban hides the three visible posts; the moderated one is already hidden.
    let hidden = posts.hide_all_by_pseudonym(pseudonym).await.unwrap();
    assert_eq!(hidden, 3);

    // Lift restores only the ban-hidden posts.
    let restored = posts.unhide_all_by_pseudonym(pseudonym).await.unwrap();
    assert_eq!(restored, 3);

    let still_hidden = posts.get_by_id(&moderated.id).await.unwrap();
    assert!(still_hidden.hidden);
    assert!(still_hidden.hidden_by_moderator);

    db.drop_database().await.expect("Failed to drop db");
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}

#[test]
fn test_database_url_format() {
    let config = TestDbConfig {
        host: "testhost".to_string(),
        port: 5432,
        username: "testuser".to_string(),
        password: "testpass".to_string(),
        database: "testdb".to_string(),
    };

    let url = config.database_url();
    assert!(url.starts_with("postgres://"));
    assert!(url.contains("testhost"));
    assert!(url.contains("5432"));
    assert!(url.contains("testuser"));
    assert!(url.contains("testdb"));
}
