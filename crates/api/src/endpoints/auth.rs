//! Signup, signin and session token endpoints.

use axum::{Json, Router, extract::State, routing::post};
use quad_common::AppResult;
use quad_core::CreateAccountInput;
use quad_db::entities::account;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthAccount, middleware::AppState, response::ApiResponse};

/// Signup request.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(flatten)]
    pub input: CreateAccountInput,
}

/// Signin request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Credentials returned after signup or signin.
///
/// The pseudonym is deliberately absent; no API surface ever links
/// it to the account it belongs to.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    pub username: String,
    pub token: String,
}

impl From<account::Model> for SessionResponse {
    fn from(account: account::Model) -> Self {
        Self {
            id: account.id,
            username: account.username,
            token: account.token,
        }
    }
}

/// Signout response.
#[derive(Debug, Serialize)]
pub struct SignoutResponse {
    pub ok: bool,
}

/// Token regeneration response.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Register a new account.
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let account = state.account_service.register(req.input).await?;
    Ok(ApiResponse::ok(account.into()))
}

/// Sign in with email and password.
async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let account = state
        .account_service
        .authenticate(&req.email, &req.password)
        .await?;
    Ok(ApiResponse::ok(account.into()))
}

/// Sign out by rotating the token, which invalidates every session
/// that holds the old one.
async fn signout(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<SignoutResponse>> {
    state.account_service.regenerate_token(&account.id).await?;
    Ok(ApiResponse::ok(SignoutResponse { ok: true }))
}

/// Issue a fresh token.
async fn regenerate_token(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<TokenResponse>> {
    let token = state.account_service.regenerate_token(&account.id).await?;
    Ok(ApiResponse::ok(TokenResponse { token }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
        .route("/regenerate-token", post(regenerate_token))
}
