//! Health check handlers

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub checks: ReadyChecks,
}

#[derive(Debug, Serialize)]
pub struct ReadyChecks {
    pub database: CheckResult,
    pub cache: CheckResult,
}

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub status: &'static str,
    pub latency_ms: u64,
}

impl CheckResult {
    fn from_outcome(ok: bool, start: Instant) -> Self {
        Self {
            status: if ok { "ok" } else { "error" },
            latency_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// GET /health - Liveness probe (fast, no dependencies)
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "auth-api",
    })
}

/// GET /ready - Readiness probe (checks DB and cache connectivity)
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadyResponse>, (StatusCode, Json<ReadyResponse>)> {
    let start = Instant::now();
    let db_result = sqlx::query("SELECT 1").fetch_one(&*state.pool).await;
    if let Err(e) = &db_result {
        tracing::warn!(error = %e, "Database readiness check failed");
    }
    let database = CheckResult::from_outcome(db_result.is_ok(), start);

    let start = Instant::now();
    let cache_result = state.cache.ping().await;
    if let Err(e) = &cache_result {
        tracing::warn!(error = %e, "Cache readiness check failed");
    }
    let cache = CheckResult::from_outcome(cache_result.is_ok(), start);

    let ready = database.is_ok() && cache.is_ok();
    let body = ReadyResponse {
        status: if ready { "ready" } else { "unavailable" },
        service: "auth-api",
        checks: ReadyChecks { database, cache },
    };

    if ready {
        Ok(Json(body))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(body)))
    }
}
