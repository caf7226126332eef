//! Account profile endpoints.

use axum::{Json, Router, extract::State, routing::post};
use quad_common::AppResult;
use quad_core::UpdateAccountInput;
use quad_db::entities::account::{self, AccountRole};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthAccount, middleware::AppState, response::ApiResponse};

/// Account as its owner sees it.
///
/// The pseudonym is never included; an account cannot read its own
/// derived identity through the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub display_name: Option<String>,
    pub role: AccountRole,
    pub reported_count: i32,
    pub is_banned: bool,
    pub created_at: String,
}

impl From<account::Model> for AccountResponse {
    fn from(account: account::Model) -> Self {
        Self {
            id: account.id,
            email: account.email,
            username: account.username,
            display_name: account.display_name,
            role: account.role,
            reported_count: account.reported_count,
            is_banned: account.is_banned,
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// Profile update request.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    #[serde(flatten)]
    pub input: UpdateAccountInput,
}

/// Get the authenticated account.
async fn me(AuthAccount(account): AuthAccount) -> AppResult<ApiResponse<AccountResponse>> {
    Ok(ApiResponse::ok(account.into()))
}

/// Update profile fields.
async fn update(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
    Json(req): Json<UpdateRequest>,
) -> AppResult<ApiResponse<AccountResponse>> {
    let updated = state.account_service.update(&account.id, req.input).await?;
    Ok(ApiResponse::ok(updated.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", post(me))
        .route("/update", post(update))
}
