//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use quad_common::{Timer, get_metrics};
use quad_core::{
    AccountService, IdentityService, ModerationService, PollService, PostService,
    PseudonymService, ReportService, VoteService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub pseudonym_service: PseudonymService,
    pub post_service: PostService,
    pub vote_service: VoteService,
    pub report_service: ReportService,
    pub poll_service: PollService,
    pub moderation_service: ModerationService,
    pub identity_service: IdentityService,
}

/// Authentication middleware.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // Try to extract token from header
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        // Authenticate account by token
        match state.account_service.authenticate_by_token(token).await {
            Ok(account) => {
                req.extensions_mut().insert(account);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Bearer token did not authenticate");
            }
        }
    }

    next.run(req).await
}

/// Request metrics middleware.
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let metrics = get_metrics();
    metrics.start_request();
    let timer = Timer::start();

    let response = next.run(req).await;

    metrics.record_http_request(response.status().as_u16(), timer.elapsed());
    metrics.end_request();

    response
}
