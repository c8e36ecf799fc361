//! HTTP handlers for checkout-service.

pub mod callbacks;
pub mod invoices;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

use crate::startup::AppState;

pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "checkout-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Ready once checkout ids can be issued.
pub async fn readiness_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    if !state.rapyd_configured {
        return Err(AppError::ServiceUnavailable);
    }

    Ok((StatusCode::OK, Json(json!({ "status": "ready" }))))
}

/// Prometheus text exposition of the service's counters.
pub async fn metrics_endpoint(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| AppError::InternalError(e.into()))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        body,
    ))
}

pub async fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("No such route"))
}
