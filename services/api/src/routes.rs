use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use ticket_audit::audit::{AuditConfig, AuditEngine, TicketBatch, VerdictTable};
use ticket_audit::error::AppError;

#[derive(Debug, Deserialize)]
pub(crate) struct AuditRequest {
    pub(crate) tickets: Vec<Map<String, Value>>,
    #[serde(default)]
    pub(crate) config: Option<AuditConfig>,
}

pub(crate) fn audit_routes() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/audit", post(audit_endpoint))
}

pub(crate) async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn audit_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<AuditRequest>,
) -> Result<Json<VerdictTable>, AppError> {
    let AuditRequest { tickets, config } = payload;

    let config = match config {
        Some(config) => {
            config.validate()?;
            config
        }
        None => state.audit.config.clone(),
    };

    let batch = TicketBatch::from_json_rows(tickets);
    let engine = AuditEngine::new(config, state.audit.reference());
    Ok(Json(engine.run(&batch)))
}
