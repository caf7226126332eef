//! Post endpoints for the anonymous board.

use axum::{Json, Router, extract::State, routing::post};
use quad_common::AppResult;
use quad_core::{CreatePostInput, vote::is_trending};
use quad_db::entities::{post, post_vote::VoteValue};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthAccount, MaybeAuthAccount},
    middleware::AppState,
    response::ApiResponse,
};

/// Post response.
///
/// This is the public shape. The author appears only as the per-post
/// display alias; pseudonyms and moderation counters never leave the
/// server.
#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    /// Anonymous handle shown in place of any author identifier.
    pub display_alias: String,
    pub is_anonymous: bool,
    pub title: Option<String>,
    pub text: String,
    pub reply_id: Option<String>,
    pub up_votes: i32,
    pub down_votes: i32,
    pub replies_count: i32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub trending: bool,
}

impl From<post::Model> for PostResponse {
    fn from(post: post::Model) -> Self {
        let trending = is_trending(post.up_votes);
        Self {
            id: post.id,
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.map(|dt| dt.to_rfc3339()),
            display_alias: post.display_alias,
            is_anonymous: post.is_anonymous,
            title: post.title,
            text: post.text,
            reply_id: post.reply_id,
            up_votes: post.up_votes,
            down_votes: post.down_votes,
            replies_count: post.replies_count,
            trending,
        }
    }
}

/// Create post request.
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(flatten)]
    pub input: CreatePostInput,
}

/// Show post request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowPostRequest {
    pub post_id: String,
}

/// Post together with the viewer's own relationship to it.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    /// The viewer's current vote, if any.
    pub my_vote: Option<VoteValue>,
    /// Whether the viewer has already reported this post.
    pub reported: bool,
}

/// Board request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRequest {
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
}

/// Replies request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepliesRequest {
    pub post_id: String,
}

const fn default_limit() -> u64 {
    10
}

const fn max_limit() -> u64 {
    100
}

fn is_staff_viewer(account: Option<&quad_db::entities::account::Model>) -> bool {
    account.is_some_and(|a| a.role.is_staff())
}

/// Create a new post.
async fn create(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
    Json(req): Json<CreatePostRequest>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.create(&account.id, req.input).await?;
    Ok(ApiResponse::ok(post.into()))
}

/// Get a post by ID, with the viewer's vote and report state.
async fn show(
    MaybeAuthAccount(account): MaybeAuthAccount,
    State(state): State<AppState>,
    Json(req): Json<ShowPostRequest>,
) -> AppResult<ApiResponse<PostDetailResponse>> {
    let include_hidden = is_staff_viewer(account.as_ref());
    let post = state.post_service.get(&req.post_id, include_hidden).await?;

    // Viewer state is read through the cached pseudonym. Reading a
    // post never derives one.
    let (my_vote, reported) = match account.as_ref().and_then(|a| a.pseudonym.as_deref()) {
        Some(pseudonym) => {
            let vote = state.vote_service.vote_of(&post.id, pseudonym).await?;
            let reported = state
                .report_service
                .has_reported(&post.id, pseudonym)
                .await?;
            (vote.map(|v| v.value), reported)
        }
        None => (None, false),
    };

    Ok(ApiResponse::ok(PostDetailResponse {
        post: post.into(),
        my_vote,
        reported,
    }))
}

/// Get the board, newest first.
async fn board(
    MaybeAuthAccount(account): MaybeAuthAccount,
    State(state): State<AppState>,
    Json(req): Json<BoardRequest>,
) -> AppResult<ApiResponse<Vec<PostResponse>>> {
    let limit = req.limit.min(max_limit());
    let include_hidden = is_staff_viewer(account.as_ref());
    let posts = state
        .post_service
        .board(limit, req.until_id.as_deref(), include_hidden)
        .await?;
    Ok(ApiResponse::ok(posts.into_iter().map(Into::into).collect()))
}

/// Get comments under a post, oldest first.
async fn replies(
    MaybeAuthAccount(account): MaybeAuthAccount,
    State(state): State<AppState>,
    Json(req): Json<RepliesRequest>,
) -> AppResult<ApiResponse<Vec<PostResponse>>> {
    let include_hidden = is_staff_viewer(account.as_ref());
    let posts = state
        .post_service
        .replies(&req.post_id, include_hidden)
        .await?;
    Ok(ApiResponse::ok(posts.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/show", post(show))
        .route("/board", post(board))
        .route("/replies", post(replies))
}
