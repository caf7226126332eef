//! API endpoint handlers.

mod accounts;
mod auth;
mod metrics;
mod moderation;
mod polls;
mod posts;
mod reports;
mod votes;

use axum::Router;

use crate::middleware::AppState;

/// Build the API router with all endpoint groups.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/accounts", accounts::router())
        .nest("/posts", posts::router())
        .nest("/votes", votes::router())
        .nest("/reports", reports::router())
        .nest("/polls", polls::router())
        .nest("/moderation", moderation::router())
        .nest("/metrics", metrics::router())
}
