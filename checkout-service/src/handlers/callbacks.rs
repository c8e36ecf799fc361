//! Payment status callbacks.

use axum::{extract::State, http::StatusCode, Extension, Json};
use service_core::error::AppError;
use service_core::middleware::RequestId;

use crate::{
    models::{ListItemOutcome, StatusUpdate},
    startup::AppState,
};

/// Record the outcome of a checkout on its invoice list item.
pub async fn payment_status(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(payload): Json<StatusUpdate>,
) -> Result<(StatusCode, Json<ListItemOutcome>), AppError> {
    tracing::info!(
        item_id = %payload.item_id,
        status = %payload.status,
        "Payment status callback received"
    );

    let outcome = state.sharepoint.update_list_item(&payload).await?;

    tracing::info!(
        request_id = %request_id.0,
        success = outcome.is_success(),
        message = %outcome.message(),
        "Payment status outcome"
    );

    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };

    Ok((status, Json(outcome)))
}
