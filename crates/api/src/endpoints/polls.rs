//! Poll endpoints.

use axum::{Json, Router, extract::State, routing::post};
use quad_common::{AppError, AppResult};
use quad_core::CreatePollInput;
use quad_db::entities::poll;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthAccount, MaybeAuthAccount},
    middleware::AppState,
    response::ApiResponse,
};

/// Poll response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub post_id: String,
    pub choices: Vec<PollChoiceResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    pub voters_count: i32,
    pub is_expired: bool,
}

/// Poll choice response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollChoiceResponse {
    pub text: String,
    pub votes: i32,
    pub is_voted: bool,
}

/// Create poll request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    pub post_id: String,
    pub choices: Vec<String>,
    /// Seconds until the poll closes; omit for no expiry.
    pub expires_in: Option<i64>,
}

/// Show poll request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowPollRequest {
    pub post_id: String,
}

/// Poll vote request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotePollRequest {
    pub post_id: String,
    pub choice: i32,
}

/// Build a response from a poll row plus the viewer's ballot.
fn poll_response(
    poll: &poll::Model,
    my_choice: Option<i32>,
    is_expired: bool,
) -> AppResult<PollResponse> {
    let choices: Vec<String> = serde_json::from_value(poll.choices.clone())
        .map_err(|e| AppError::Internal(format!("Invalid poll choices: {e}")))?;
    let votes: Vec<i32> = serde_json::from_value(poll.votes.clone())
        .map_err(|e| AppError::Internal(format!("Invalid poll votes: {e}")))?;

    let choices = choices
        .into_iter()
        .enumerate()
        .map(|(i, text)| PollChoiceResponse {
            text,
            votes: votes.get(i).copied().unwrap_or(0),
            is_voted: my_choice == Some(i as i32),
        })
        .collect();

    Ok(PollResponse {
        post_id: poll.post_id.clone(),
        choices,
        expires_at: poll.expires_at.map(|e| e.to_rfc3339()),
        voters_count: poll.voters_count,
        is_expired,
    })
}

/// Attach a poll to one of the caller's posts.
async fn create(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
    Json(req): Json<CreatePollRequest>,
) -> AppResult<ApiResponse<PollResponse>> {
    let poll = state
        .poll_service
        .create(
            &account.id,
            &req.post_id,
            CreatePollInput {
                choices: req.choices,
                expires_in: req.expires_in,
            },
        )
        .await?;
    poll_response(&poll, None, false).map(ApiResponse::ok)
}

/// Get poll details with the viewer's ballot marked.
async fn show(
    MaybeAuthAccount(account): MaybeAuthAccount,
    State(state): State<AppState>,
    Json(req): Json<ShowPollRequest>,
) -> AppResult<ApiResponse<PollResponse>> {
    let viewer = account.as_ref().and_then(|a| a.pseudonym.as_deref());
    let status = state.poll_service.status(&req.post_id, viewer).await?;
    poll_response(&status.poll, status.my_choice, status.is_expired).map(ApiResponse::ok)
}

/// Cast a ballot in a poll.
async fn vote(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
    Json(req): Json<VotePollRequest>,
) -> AppResult<ApiResponse<PollResponse>> {
    let pseudonym = state.pseudonym_service.ensure_pseudonym(&account).await?;
    let poll = state
        .poll_service
        .vote(&req.post_id, &pseudonym, req.choice)
        .await?;
    let is_expired = poll
        .expires_at
        .as_ref()
        .is_some_and(|exp| *exp < chrono::Utc::now());
    poll_response(&poll, Some(req.choice), is_expired).map(ApiResponse::ok)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/show", post(show))
        .route("/vote", post(vote))
}
