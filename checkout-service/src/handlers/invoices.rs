//! Invoice list handlers.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde_json::Value;
use service_core::error::AppError;
use service_core::middleware::RequestId;

use crate::{
    models::{InvoiceDetails, ListItemOutcome},
    startup::AppState,
};

/// Return the raw contents of the invoice list.
pub async fn list_invoices(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let items = state.sharepoint.get_all_lists().await?;
    Ok(Json(items))
}

/// Record a new invoice with a fresh Rapyd checkout.
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(payload): Json<InvoiceDetails>,
) -> Result<(StatusCode, Json<ListItemOutcome>), AppError> {
    tracing::info!(
        title = ?payload.title,
        customer = ?payload.customer,
        cost = %payload.cost,
        "Creating invoice list item"
    );

    let outcome = state.sharepoint.create_list_item(&payload).await?;

    tracing::info!(
        request_id = %request_id.0,
        success = outcome.is_success(),
        message = %outcome.message(),
        "Invoice list item outcome"
    );

    let status = if outcome.is_success() {
        StatusCode::CREATED
    } else {
        StatusCode::BAD_GATEWAY
    };

    Ok((status, Json(outcome)))
}
