//! Moderation endpoints.
//!
//! Every route here requires a staff account. The services enforce the
//! role check; handlers only pass the caller's id through.

use axum::{Json, Router, extract::State, routing::post};
use quad_common::AppResult;
use quad_core::{CreateBanInput, ResolvedIdentity};
use quad_db::entities::{account_ban, identity_audit, post, post_report};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthAccount, middleware::AppState, response::ApiResponse};

/// Post as staff sees it in the review queue.
///
/// Unlike the public shape this includes the author pseudonym and the
/// moderation counters. It still never includes an account id; going
/// from pseudonym to account takes an audited resolve call.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationPostResponse {
    pub id: String,
    pub created_at: String,
    pub author_pseudonym: String,
    pub display_alias: String,
    pub is_anonymous: bool,
    pub title: Option<String>,
    pub text: String,
    pub reply_id: Option<String>,
    pub up_votes: i32,
    pub down_votes: i32,
    pub report_count: i32,
    pub flagged: bool,
    pub hidden: bool,
    pub hidden_by_moderator: bool,
}

impl From<post::Model> for ModerationPostResponse {
    fn from(post: post::Model) -> Self {
        Self {
            id: post.id,
            created_at: post.created_at.to_rfc3339(),
            author_pseudonym: post.author_pseudonym,
            display_alias: post.display_alias,
            is_anonymous: post.is_anonymous,
            title: post.title,
            text: post.text,
            reply_id: post.reply_id,
            up_votes: post.up_votes,
            down_votes: post.down_votes,
            report_count: post.report_count,
            flagged: post.flagged,
            hidden: post.hidden,
            hidden_by_moderator: post.hidden_by_moderator,
        }
    }
}

/// Ban response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BanResponse {
    pub id: String,
    pub account_id: String,
    pub moderator_id: String,
    pub reason: String,
    pub created_at: String,
    pub expires_at: Option<String>,
    pub lifted_at: Option<String>,
    pub lifted_by: Option<String>,
}

impl From<account_ban::Model> for BanResponse {
    fn from(ban: account_ban::Model) -> Self {
        Self {
            id: ban.id,
            account_id: ban.account_id,
            moderator_id: ban.moderator_id,
            reason: ban.reason,
            created_at: ban.created_at.to_rfc3339(),
            expires_at: ban.expires_at.map(|t| t.to_rfc3339()),
            lifted_at: ban.lifted_at.map(|t| t.to_rfc3339()),
            lifted_by: ban.lifted_by,
        }
    }
}

/// Report row response. Reporters appear only as pseudonyms.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRowResponse {
    pub id: String,
    pub post_id: String,
    pub reporter_pseudonym: String,
    pub created_at: String,
}

impl From<post_report::Model> for ReportRowResponse {
    fn from(report: post_report::Model) -> Self {
        Self {
            id: report.id,
            post_id: report.post_id,
            reporter_pseudonym: report.reporter_pseudonym,
            created_at: report.created_at.to_rfc3339(),
        }
    }
}

/// Audit trail row response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    pub id: String,
    pub actor_id: String,
    pub post_id: String,
    pub pseudonym: String,
    pub resolved_account_id: String,
    pub created_at: String,
}

impl From<identity_audit::Model> for AuditResponse {
    fn from(entry: identity_audit::Model) -> Self {
        Self {
            id: entry.id,
            actor_id: entry.actor_id,
            post_id: entry.post_id,
            pseudonym: entry.pseudonym,
            resolved_account_id: entry.resolved_account_id,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// Acknowledgement for verb endpoints.
#[derive(Serialize)]
pub struct ActionResponse {
    pub ok: bool,
}

/// Review queue request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedPostsRequest {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// Request naming a single post.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostActionRequest {
    pub post_id: String,
}

/// Reports for a post request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostReportsRequest {
    pub post_id: String,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

/// Ban account request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BanAccountRequest {
    pub account_id: String,
    pub reason: String,
    /// Duration in seconds, null for permanent.
    pub duration: Option<i64>,
}

/// Unban account request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnbanAccountRequest {
    pub account_id: String,
}

/// Ban history request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BanHistoryRequest {
    pub account_id: String,
}

/// Active bans request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveBansRequest {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// Identity resolution request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveIdentityRequest {
    pub post_id: String,
}

/// Audit trail request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTrailRequest {
    /// Restrict to resolutions performed by this staff account.
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    10
}

const fn max_limit() -> u64 {
    100
}

// ========== Post Moderation ==========

/// Get the review queue of flagged posts.
async fn flagged(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
    Json(req): Json<FlaggedPostsRequest>,
) -> AppResult<ApiResponse<Vec<ModerationPostResponse>>> {
    let posts = state
        .moderation_service
        .flagged_posts(&account.id, req.limit.min(max_limit()), req.offset)
        .await?;
    Ok(ApiResponse::ok(posts.into_iter().map(Into::into).collect()))
}

/// Hide a post from public surfaces.
async fn hide(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
    Json(req): Json<PostActionRequest>,
) -> AppResult<ApiResponse<ActionResponse>> {
    state
        .moderation_service
        .hide_post(&account.id, &req.post_id)
        .await?;
    Ok(ApiResponse::ok(ActionResponse { ok: true }))
}

/// Restore a hidden post, unless its author is banned.
async fn unhide(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
    Json(req): Json<PostActionRequest>,
) -> AppResult<ApiResponse<ActionResponse>> {
    state
        .moderation_service
        .unhide_post(&account.id, &req.post_id)
        .await?;
    Ok(ApiResponse::ok(ActionResponse { ok: true }))
}

/// Clear a post's flag after review.
async fn unflag(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
    Json(req): Json<PostActionRequest>,
) -> AppResult<ApiResponse<ActionResponse>> {
    state
        .moderation_service
        .unflag_post(&account.id, &req.post_id)
        .await?;
    Ok(ApiResponse::ok(ActionResponse { ok: true }))
}

/// List the reports filed against a post.
async fn reports(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
    Json(req): Json<PostReportsRequest>,
) -> AppResult<ApiResponse<Vec<ReportRowResponse>>> {
    let reports = state
        .moderation_service
        .reports_for_post(&account.id, &req.post_id, req.limit.min(max_limit()))
        .await?;
    Ok(ApiResponse::ok(
        reports.into_iter().map(Into::into).collect(),
    ))
}

// ========== Account Bans ==========

/// Ban an account.
async fn ban(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
    Json(req): Json<BanAccountRequest>,
) -> AppResult<ApiResponse<BanResponse>> {
    let ban = state
        .moderation_service
        .ban_account(
            &account.id,
            CreateBanInput {
                account_id: req.account_id,
                reason: req.reason,
                duration: req.duration,
            },
        )
        .await?;
    Ok(ApiResponse::ok(ban.into()))
}

/// Lift an account's ban.
async fn unban(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
    Json(req): Json<UnbanAccountRequest>,
) -> AppResult<ApiResponse<ActionResponse>> {
    state
        .moderation_service
        .unban_account(&account.id, &req.account_id)
        .await?;
    Ok(ApiResponse::ok(ActionResponse { ok: true }))
}

/// List currently active bans.
async fn bans(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
    Json(req): Json<ActiveBansRequest>,
) -> AppResult<ApiResponse<Vec<BanResponse>>> {
    let bans = state
        .moderation_service
        .active_bans(&account.id, req.limit.min(max_limit()), req.offset)
        .await?;
    Ok(ApiResponse::ok(bans.into_iter().map(Into::into).collect()))
}

/// Full ban history for one account.
async fn ban_history(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
    Json(req): Json<BanHistoryRequest>,
) -> AppResult<ApiResponse<Vec<BanResponse>>> {
    let bans = state
        .moderation_service
        .ban_history(&account.id, &req.account_id)
        .await?;
    Ok(ApiResponse::ok(bans.into_iter().map(Into::into).collect()))
}

// ========== Identity Resolution ==========

/// Resolve the account behind a post's pseudonym.
///
/// Verified and audited; the resolution is recorded before the
/// identity is returned.
async fn resolve(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
    Json(req): Json<ResolveIdentityRequest>,
) -> AppResult<ApiResponse<ResolvedIdentity>> {
    let identity = state
        .identity_service
        .resolve_post_author(&account.id, &req.post_id)
        .await?;
    Ok(ApiResponse::ok(identity))
}

/// Read the de-anonymization audit trail.
async fn audit(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
    Json(req): Json<AuditTrailRequest>,
) -> AppResult<ApiResponse<Vec<AuditResponse>>> {
    let entries = state
        .identity_service
        .audit_trail(
            &account.id,
            req.actor_id.as_deref(),
            req.limit.min(max_limit()),
            req.offset,
        )
        .await?;
    Ok(ApiResponse::ok(
        entries.into_iter().map(Into::into).collect(),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        // Post moderation
        .route("/flagged", post(flagged))
        .route("/hide", post(hide))
        .route("/unhide", post(unhide))
        .route("/unflag", post(unflag))
        .route("/reports", post(reports))
        // Account bans
        .route("/ban", post(ban))
        .route("/unban", post(unban))
        .route("/bans", post(bans))
        .route("/ban-history", post(ban_history))
        // Identity resolution
        .route("/resolve", post(resolve))
        .route("/audit", post(audit))
}
