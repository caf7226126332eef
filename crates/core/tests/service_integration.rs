//! Service-level integration tests.
//!
//! These tests drive the real services against a running `PostgreSQL`
//! instance, covering the full anonymous write path: publish, report
//! until auto-flagged, vote toggling, ban propagation, and a staff
//! identity resolution with its audit record.
//!
//! Run with: `cargo test --test service_integration -- --ignored`
//! (connection settings come from the same `TEST_DB_*` variables the
//! `quad-db` integration tests use).

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::Utc;
use quad_common::config::{AnonymityConfig, DatabaseConfig, ServerConfig};
use quad_common::pseudonym::derive_pseudonym;
use quad_common::{ALIAS_POOL, AppError, Config, IdGenerator};
use quad_core::{
    AccountService, BanPropagator, CreateAccountInput, CreateBanInput, CreatePostInput,
    IdentityService, ModerationService, PostService, PseudonymService, ReportService, VoteService,
};
use quad_db::entities::{account, post_vote::VoteValue};
use quad_db::repositories::{
    AccountRepository, IdentityAuditRepository, ModerationRepository, PostReportRepository,
    PostRepository, PostVoteRepository,
};
use quad_db::test_utils::TestDatabase;
use sea_orm::{DatabaseConnection, Set, SqlxPostgresConnector};

const SECRET: &str = "service-integration-secret";

fn test_config(database_url: &str) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            url: "http://localhost:3000".to_string(),
        },
        database: DatabaseConfig {
            url: database_url.to_string(),
            max_connections: 5,
            min_connections: 1,
        },
        anonymity: AnonymityConfig {
            server_secret: SECRET.to_string(),
            ban_sweep_interval_secs: 300,
        },
    }
}

struct Services {
    accounts: AccountRepository,
    posts: PostRepository,
    account_service: AccountService,
    post_service: PostService,
    vote_service: VoteService,
    report_service: ReportService,
    moderation_service: ModerationService,
    identity_service: IdentityService,
}

fn build_services(conn: &Arc<DatabaseConnection>, database_url: &str) -> Services {
    let account_repo = AccountRepository::new(Arc::clone(conn));
    let post_repo = PostRepository::new(Arc::clone(conn));
    let vote_repo = PostVoteRepository::new(Arc::clone(conn));
    let report_repo = PostReportRepository::new(Arc::clone(conn));
    let moderation_repo = ModerationRepository::new(Arc::clone(conn));
    let audit_repo = IdentityAuditRepository::new(Arc::clone(conn));

    let config = test_config(database_url);
    let pseudonym_service = PseudonymService::new(account_repo.clone(), &config);
    let ban_propagator = BanPropagator::new(
        post_repo.clone(),
        account_repo.clone(),
        moderation_repo.clone(),
    );

    Services {
        accounts: account_repo.clone(),
        posts: post_repo.clone(),
        account_service: AccountService::new(account_repo.clone()),
        post_service: PostService::new(
            post_repo.clone(),
            account_repo.clone(),
            pseudonym_service.clone(),
        ),
        vote_service: VoteService::new(vote_repo, post_repo.clone()),
        report_service: ReportService::new(
            report_repo.clone(),
            post_repo.clone(),
            account_repo.clone(),
        ),
        moderation_service: ModerationService::new(
            moderation_repo,
            account_repo.clone(),
            post_repo.clone(),
            report_repo,
            ban_propagator,
        ),
        identity_service: IdentityService::new(
            account_repo,
            post_repo,
            audit_repo,
            pseudonym_service,
        ),
    }
}

fn staff_model(id_gen: &IdGenerator, username: &str) -> account::ActiveModel {
    account::ActiveModel {
        id: Set(id_gen.generate()),
        email: Set(format!("{username}@college.edu")),
        email_lower: Set(format!("{username}@college.edu")),
        username: Set(username.to_string()),
        display_name: Set(None),
        password_hash: Set("$argon2id$test".to_string()),
        token: Set(id_gen.generate_token()),
        pseudonym: Set(None),
        role: Set(account::AccountRole::Moderator),
        reported_count: Set(0),
        is_banned: Set(false),
        ban_expires_at: Set(None),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
}

async fn register(services: &Services, email: &str, username: &str) -> account::Model {
    services
        .account_service
        .register(CreateAccountInput {
            email: email.to_string(),
            username: username.to_string(),
            password: "correct-horse-battery".to_string(),
            display_name: None,
        })
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_publish_report_flag_and_resolve_flow() {
    let db = TestDatabase::create_unique().await.expect("Failed to create db");
    quad_db::migrate(db.connection()).await.expect("Migrations failed");

    // `DatabaseConnection` is not `Clone` while the `mock` feature is on,
    // so duplicate the handle by re-wrapping the shared sqlx pool.
    let conn = Arc::new(SqlxPostgresConnector::from_sqlx_postgres_pool(
        db.conn.get_postgres_connection_pool().clone(),
    ));
    let services = build_services(&conn, &db.config.database_url());
    let id_gen = IdGenerator::new();

    let author = register(&services, "amara@college.edu", "amara").await;

    let post = services
        .post_service
        .create(
            &author.id,
            CreatePostInput {
                title: Some("Lost keycard near the library".to_string()),
                text: "Anyone seen a blue lanyard?".to_string(),
                anonymous: true,
                reply_id: None,
            },
        )
        .await
        .unwrap();

    // The stored pseudonym is the derivation, and the alias is drawn
    // from the fixed pool
    let expected = derive_pseudonym(&author.id, &author.email, SECRET).unwrap();
    assert_eq!(post.author_pseudonym, expected);
    assert!(ALIAS_POOL.contains(&post.display_alias.as_str()));

    // Three distinct reporters cross the flag threshold
    let reporters = [
        "0123456789abcdef0123456789abcdef",
        "fedcba9876543210fedcba9876543210",
        "00ff00ff00ff00ff00ff00ff00ff00ff",
    ];

    let first = services.report_service.file(&post.id, reporters[0]).await.unwrap();
    assert!(!first.flagged);
    assert_eq!(first.report_count, 1);

    let second = services.report_service.file(&post.id, reporters[1]).await.unwrap();
    assert!(!second.flagged);
    assert_eq!(second.report_count, 2);

    let third = services.report_service.file(&post.id, reporters[2]).await.unwrap();
    assert!(third.flagged);
    assert_eq!(third.report_count, 3);

    let credited = services.accounts.get_by_id(&author.id).await.unwrap();
    assert_eq!(credited.reported_count, 1);

    // A fourth report counts but never credits the author again
    let fourth = services
        .report_service
        .file(&post.id, "abadcafeabadcafeabadcafeabadcafe")
        .await
        .unwrap();
    assert!(fourth.flagged);
    assert_eq!(fourth.report_count, 4);
    assert!(!fourth.already_reported);

    let unchanged = services.accounts.get_by_id(&author.id).await.unwrap();
    assert_eq!(unchanged.reported_count, 1);

    // A repeat by an earlier reporter changes nothing
    let duplicate = services.report_service.file(&post.id, reporters[0]).await.unwrap();
    assert!(duplicate.already_reported);
    assert_eq!(duplicate.report_count, 4);

    // Only staff can connect the pseudonym back to the author
    let denied = services
        .identity_service
        .resolve_post_author(&author.id, &post.id)
        .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let moderator = services.accounts.create(staff_model(&id_gen, "mod")).await.unwrap();
    let resolved = services
        .identity_service
        .resolve_post_author(&moderator.id, &post.id)
        .await
        .unwrap();
    assert_eq!(resolved.account_id, author.id);
    assert_eq!(resolved.email, author.email);
    assert_eq!(resolved.pseudonym, expected);
    assert!(resolved.hash_verified);

    // The reveal left an audit record
    let trail = services
        .identity_service
        .audit_trail(&moderator.id, None, 10, 0)
        .await
        .unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].actor_id, moderator.id);
    assert_eq!(trail[0].post_id, post.id);
    assert_eq!(trail[0].resolved_account_id, author.id);

    db.drop_database().await.expect("Failed to drop db");
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_vote_toggle_law_on_live_ledger() {
    let db = TestDatabase::create_unique().await.expect("Failed to create db");
    quad_db::migrate(db.connection()).await.expect("Migrations failed");

    // `DatabaseConnection` is not `Clone` while the `mock` feature is on,
    // so duplicate the handle by re-wrapping the shared sqlx pool.
    let conn = Arc::new(SqlxPostgresConnector::from_sqlx_postgres_pool(
        db.conn.get_postgres_connection_pool().clone(),
    ));
    let services = build_services(&conn, &db.config.database_url());

    let author = register(&services, "casper@college.edu", "casper").await;
    let post = services
        .post_service
        .create(
            &author.id,
            CreatePostInput {
                title: Some("Best study spot?".to_string()),
                text: "Third floor of the library, fight me".to_string(),
                anonymous: true,
                reply_id: None,
            },
        )
        .await
        .unwrap();

    let voter = "0123456789abcdef0123456789abcdef";

    let up = services.vote_service.cast(&post.id, voter, VoteValue::Up).await.unwrap();
    assert_eq!((up.up_votes, up.down_votes), (1, 0));
    assert_eq!(up.effective, Some(VoteValue::Up));

    // Repeating the same value retracts
    let retracted = services.vote_service.cast(&post.id, voter, VoteValue::Up).await.unwrap();
    assert_eq!((retracted.up_votes, retracted.down_votes), (0, 0));
    assert_eq!(retracted.effective, None);

    // A different value switches
    services.vote_service.cast(&post.id, voter, VoteValue::Up).await.unwrap();
    let switched = services
        .vote_service
        .cast(&post.id, voter, VoteValue::Down)
        .await
        .unwrap();
    assert_eq!((switched.up_votes, switched.down_votes), (0, 1));
    assert_eq!(switched.effective, Some(VoteValue::Down));

    // A second pseudonym holds its own entry
    let other = "fedcba9876543210fedcba9876543210";
    let tally = services.vote_service.cast(&post.id, other, VoteValue::Down).await.unwrap();
    assert_eq!((tally.up_votes, tally.down_votes), (0, 2));

    let mine = services.vote_service.vote_of(&post.id, voter).await.unwrap();
    assert_eq!(mine.unwrap().value, VoteValue::Down);

    db.drop_database().await.expect("Failed to drop db");
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_ban_hides_history_and_unban_restores_it() {
    let db = TestDatabase::create_unique().await.expect("Failed to create db");
    quad_db::migrate(db.connection()).await.expect("Migrations failed");

    // `DatabaseConnection` is not `Clone` while the `mock` feature is on,
    // so duplicate the handle by re-wrapping the shared sqlx pool.
    let conn = Arc::new(SqlxPostgresConnector::from_sqlx_postgres_pool(
        db.conn.get_postgres_connection_pool().clone(),
    ));
    let services = build_services(&conn, &db.config.database_url());
    let id_gen = IdGenerator::new();

    let author = register(&services, "quinn@college.edu", "quinn").await;
    let mut post_ids = Vec::new();
    for i in 0..3 {
        let post = services
            .post_service
            .create(
                &author.id,
                CreatePostInput {
                    title: Some(format!("Post {i}")),
                    text: "Some opinion".to_string(),
                    anonymous: true,
                    reply_id: None,
                },
            )
            .await
            .unwrap();
        post_ids.push(post.id);
    }

    let moderator = services.accounts.create(staff_model(&id_gen, "mod")).await.unwrap();

    let ban = services
        .moderation_service
        .ban_account(
            &moderator.id,
            CreateBanInput {
                account_id: author.id.clone(),
                reason: "Repeated harassment".to_string(),
                duration: None,
            },
        )
        .await
        .unwrap();
    assert!(ban.expires_at.is_none());
    assert!(ban.lifted_at.is_none());

    for id in &post_ids {
        let hidden = services.posts.get_by_id(id).await.unwrap();
        assert!(hidden.hidden);
        assert!(!hidden.hidden_by_moderator);
    }
    let banned = services.accounts.get_by_id(&author.id).await.unwrap();
    assert!(banned.is_banned);

    // A banned author cannot publish
    let rejected = services
        .post_service
        .create(
            &author.id,
            CreatePostInput {
                title: None,
                text: "Still here".to_string(),
                anonymous: true,
                reply_id: None,
            },
        )
        .await;
    assert!(matches!(rejected, Err(AppError::Forbidden(_))));

    services
        .moderation_service
        .unban_account(&moderator.id, &author.id)
        .await
        .unwrap();

    for id in &post_ids {
        let restored = services.posts.get_by_id(id).await.unwrap();
        assert!(!restored.hidden);
    }
    let active = services.accounts.get_by_id(&author.id).await.unwrap();
    assert!(!active.is_banned);

    let history = services
        .moderation_service
        .ban_history(&moderator.id, &author.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].lifted_at.is_some());
    assert_eq!(history[0].lifted_by.as_deref(), Some(moderator.id.as_str()));

    db.drop_database().await.expect("Failed to drop db");
}
