//! Quad server entry point.

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};
use quad_api::{middleware::AppState, router as api_router};
use quad_common::Config;
use quad_core::{
    AccountService, BanPropagator, IdentityService, JobService, JobWorkerContext,
    ModerationService, PollService, PostService, PseudonymService, ReportService, VoteService,
};
use quad_db::repositories::{
    AccountRepository, IdentityAuditRepository, ModerationRepository, PollRepository,
    PollVoteRepository, PostReportRepository, PostRepository, PostVoteRepository,
};
use sea_orm::{ConnectOptions, Database};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quad=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting quad server...");

    // Load configuration; a missing server secret is fatal because every
    // pseudonym depends on it
    let config = Config::load()?;
    config.validate()?;

    // Connect to database
    let mut db_opts = ConnectOptions::new(&config.database.url);
    db_opts
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections);

    let db = Database::connect(db_opts).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    quad_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let account_repo = AccountRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let vote_repo = PostVoteRepository::new(Arc::clone(&db));
    let report_repo = PostReportRepository::new(Arc::clone(&db));
    let poll_repo = PollRepository::new(Arc::clone(&db));
    let poll_vote_repo = PollVoteRepository::new(Arc::clone(&db));
    let moderation_repo = ModerationRepository::new(Arc::clone(&db));
    let audit_repo = IdentityAuditRepository::new(Arc::clone(&db));

    // Initialize services
    let pseudonym_service = PseudonymService::new(account_repo.clone(), &config);
    let account_service = AccountService::new(account_repo.clone());
    let post_service = PostService::new(
        post_repo.clone(),
        account_repo.clone(),
        pseudonym_service.clone(),
    );
    let vote_service = VoteService::new(vote_repo, post_repo.clone());
    let report_service = ReportService::new(
        report_repo.clone(),
        post_repo.clone(),
        account_repo.clone(),
    );
    let poll_service = PollService::new(
        poll_repo,
        poll_vote_repo,
        post_repo.clone(),
        account_repo.clone(),
    );
    let ban_propagator = BanPropagator::new(
        post_repo.clone(),
        account_repo.clone(),
        moderation_repo.clone(),
    );
    let moderation_service = ModerationService::new(
        moderation_repo,
        account_repo.clone(),
        post_repo.clone(),
        report_repo,
        ban_propagator.clone(),
    );
    let identity_service = IdentityService::new(
        account_repo,
        post_repo,
        audit_repo,
        pseudonym_service.clone(),
    );

    // Start the background job worker
    let job_service = JobService::new();
    let job_sender = job_service.sender();
    job_service.start(JobWorkerContext {
        ban_propagator: Some(ban_propagator),
    });

    // Periodically enqueue a ban sweep so expired bans lift on time.
    // The first tick fires immediately and heals anything missed while
    // the server was down.
    let sweep_interval = config.anonymity.ban_sweep_interval_secs;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(sweep_interval));
        loop {
            ticker.tick().await;
            if let Err(e) = job_sender.ban_sweep().await {
                tracing::warn!(error = e, "Failed to enqueue ban sweep");
            }
        }
    });

    // Create app state
    let state = AppState {
        account_service,
        pseudonym_service,
        post_service,
        vote_service,
        report_service,
        poll_service,
        moderation_service,
        identity_service,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            quad_api::middleware::auth_middleware,
        ))
        .layer(middleware::from_fn(
            quad_api::middleware::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
