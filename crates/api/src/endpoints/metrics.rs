//! Metrics and health endpoints.
//!
//! Provides endpoints for:
//! - Prometheus metrics export
//! - Health and readiness checks
//! - JSON counters for dashboards

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use quad_common::metrics::{MetricsSnapshot, get_metrics};
use serde::Serialize;

use crate::middleware::AppState;

/// JSON metrics response.
#[derive(Serialize)]
pub struct MetricsResponse {
    pub http: HttpMetrics,
    pub database: DatabaseMetrics,
    pub content: ContentMetrics,
    pub moderation: ModerationMetrics,
    pub jobs: JobMetrics,
}

#[derive(Serialize)]
pub struct HttpMetrics {
    pub requests_total: u64,
    pub requests_active: u64,
    pub requests_2xx: u64,
    pub requests_4xx: u64,
    pub requests_5xx: u64,
    pub latency_avg_us: u64,
}

#[derive(Serialize)]
pub struct DatabaseMetrics {
    pub errors_total: u64,
}

#[derive(Serialize)]
pub struct ContentMetrics {
    pub accounts_registered: u64,
    pub posts_created: u64,
    pub votes_cast: u64,
    pub reports_filed: u64,
    pub posts_flagged: u64,
}

#[derive(Serialize)]
pub struct ModerationMetrics {
    pub bans_applied: u64,
    pub bans_lifted: u64,
    pub identities_resolved: u64,
    pub integrity_failures: u64,
}

#[derive(Serialize)]
pub struct JobMetrics {
    pub jobs_enqueued: u64,
    pub jobs_completed: u64,
    pub jobs_failed: u64,
}

impl From<MetricsSnapshot> for MetricsResponse {
    fn from(s: MetricsSnapshot) -> Self {
        Self {
            http: HttpMetrics {
                requests_total: s.http_requests_total,
                requests_active: s.http_requests_active,
                requests_2xx: s.http_requests_2xx,
                requests_4xx: s.http_requests_4xx,
                requests_5xx: s.http_requests_5xx,
                latency_avg_us: s.http_request_latency_avg_us,
            },
            database: DatabaseMetrics {
                errors_total: s.db_errors_total,
            },
            content: ContentMetrics {
                accounts_registered: s.accounts_registered,
                posts_created: s.posts_created,
                votes_cast: s.votes_cast,
                reports_filed: s.reports_filed,
                posts_flagged: s.posts_flagged,
            },
            moderation: ModerationMetrics {
                bans_applied: s.bans_applied,
                bans_lifted: s.bans_lifted,
                identities_resolved: s.identities_resolved,
                integrity_failures: s.integrity_failures,
            },
            jobs: JobMetrics {
                jobs_enqueued: s.jobs_enqueued,
                jobs_completed: s.jobs_completed,
                jobs_failed: s.jobs_failed,
            },
        }
    }
}

/// Get metrics in JSON format.
async fn get_metrics_json() -> Json<MetricsResponse> {
    let snapshot = get_metrics().snapshot();
    Json(MetricsResponse::from(snapshot))
}

/// Get metrics in Prometheus text format.
async fn get_metrics_prometheus() -> Response {
    let prometheus_output = get_metrics().to_prometheus();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        prometheus_output,
    )
        .into_response()
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Simple health check (liveness probe).
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub database: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    pub latency_ms: Option<u64>,
}

/// Readiness check (readiness probe).
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let start = std::time::Instant::now();

    // Database connectivity is probed through a cheap board read
    let db_check = match state.post_service.board(1, None, true).await {
        Ok(_) => CheckResult {
            status: "ok".to_string(),
            latency_ms: Some(start.elapsed().as_millis() as u64),
        },
        Err(e) => CheckResult {
            status: format!("error: {e}"),
            latency_ms: None,
        },
    };

    let ready = db_check.status == "ok";
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready,
            checks: ReadinessChecks { database: db_check },
        }),
    )
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_metrics_json))
        .route("/prometheus", get(get_metrics_prometheus))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
}
