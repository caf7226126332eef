//! Vote endpoints.

use axum::{Json, Router, extract::State, routing::post};
use quad_common::AppResult;
use quad_core::VoteOutcome;
use quad_db::entities::post_vote::VoteValue;
use serde::Deserialize;

use crate::{extractors::AuthAccount, middleware::AppState, response::ApiResponse};

/// Cast vote request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    pub post_id: String,
    pub value: VoteValue,
}

/// Cast, switch, or retract a vote on a post.
///
/// Sending the same value twice retracts the vote; sending the other
/// value switches it.
async fn cast(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
    Json(req): Json<CastVoteRequest>,
) -> AppResult<ApiResponse<VoteOutcome>> {
    // Voting is a write, so the pseudonym is derived on first use.
    let pseudonym = state.pseudonym_service.ensure_pseudonym(&account).await?;
    let outcome = state
        .vote_service
        .cast(&req.post_id, &pseudonym, req.value)
        .await?;
    Ok(ApiResponse::ok(outcome))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/cast", post(cast))
}
