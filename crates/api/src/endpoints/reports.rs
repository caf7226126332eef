//! Report endpoints.

use axum::{Json, Router, extract::State, routing::post};
use quad_common::AppResult;
use quad_core::ReportOutcome;
use serde::Deserialize;

use crate::{extractors::AuthAccount, middleware::AppState, response::ApiResponse};

/// File report request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReportRequest {
    pub post_id: String,
}

/// File a report against a post.
///
/// Reporting the same post twice is a no-op; the response carries the
/// current count either way.
async fn file(
    AuthAccount(account): AuthAccount,
    State(state): State<AppState>,
    Json(req): Json<FileReportRequest>,
) -> AppResult<ApiResponse<ReportOutcome>> {
    let pseudonym = state.pseudonym_service.ensure_pseudonym(&account).await?;
    let outcome = state.report_service.file(&req.post_id, &pseudonym).await?;
    Ok(ApiResponse::ok(outcome))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/file", post(file))
}
