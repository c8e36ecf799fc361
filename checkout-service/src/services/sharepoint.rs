//! SharePoint invoice list operations.
//!
//! Reads the invoice list, records new invoices together with a Rapyd
//! checkout id, and writes payment status callbacks back to list items.

use crate::config::SharePointConfig;
use crate::models::outcome::failure_detail;
use crate::models::{
    InvoiceDetails, InvoiceFields, ListItemOutcome, NewListItem, PaymentStatus, StatusFields,
    StatusUpdate,
};
use crate::services::graph::{GraphClient, GraphError, GraphRequest};
use crate::services::invoice_number::InvoiceNumberGenerator;
use crate::services::metrics::CheckoutMetrics;
use crate::services::rapyd::{CheckoutError, CheckoutProvider};
use serde_json::Value;
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

#[derive(Debug, Error)]
pub enum SharePointError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("No checkout id was issued for invoice {invoice_number}")]
    MissingCheckoutId { invoice_number: String },

    #[error("Checkout provider error: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Graph request failed: {0}")]
    Graph(#[from] GraphError),
}

impl From<SharePointError> for AppError {
    fn from(err: SharePointError) -> Self {
        match err {
            SharePointError::Validation(errors) => AppError::ValidationError(errors),
            SharePointError::Checkout(CheckoutError::InvalidAmount(_)) => {
                AppError::BadRequest(anyhow::Error::new(err))
            }
            SharePointError::Checkout(CheckoutError::NotConfigured) => {
                AppError::ServiceUnavailable
            }
            other => {
                tracing::error!(error = %other, "Upstream call failed");
                AppError::BadGateway(other.to_string())
            }
        }
    }
}

#[derive(Clone)]
pub struct SharePointClient {
    config: SharePointConfig,
    graph_base_url: String,
    graph: Arc<dyn GraphClient>,
    checkout: Arc<dyn CheckoutProvider>,
    invoice_numbers: Arc<dyn InvoiceNumberGenerator>,
    metrics: CheckoutMetrics,
}

impl SharePointClient {
    pub fn new(
        config: SharePointConfig,
        graph_base_url: impl Into<String>,
        graph: Arc<dyn GraphClient>,
        checkout: Arc<dyn CheckoutProvider>,
        invoice_numbers: Arc<dyn InvoiceNumberGenerator>,
        metrics: CheckoutMetrics,
    ) -> Self {
        Self {
            config,
            graph_base_url: graph_base_url.into().trim_end_matches('/').to_string(),
            graph,
            checkout,
            invoice_numbers,
            metrics,
        }
    }

    fn items_url(&self) -> String {
        format!(
            "{}/sites/{}/lists/{}/items",
            self.graph_base_url, self.config.site_id, self.config.list_id
        )
    }

    fn item_fields_url(&self, item_id: &str) -> String {
        format!("{}/{}/fields", self.items_url(), item_id)
    }

    /// Fetch every item of the invoice list.
    pub async fn get_all_lists(&self) -> Result<Value, SharePointError> {
        let result = self.graph.send(GraphRequest::get(self.items_url())).await?;

        tracing::info!(result = %result, "Fetched SharePoint invoice list");

        Ok(result)
    }

    /// Record a new invoice, obtaining its checkout id first.
    ///
    /// Nothing is written to the list unless Rapyd issues a checkout id.
    pub async fn create_list_item(
        &self,
        invoice_details: &InvoiceDetails,
    ) -> Result<ListItemOutcome, SharePointError> {
        let details = invoice_details.normalized();
        details.validate()?;

        let invoice_number = self.invoice_numbers.generate().trim().to_string();

        let checkout_id = self
            .checkout
            .generate_checkout_id(&details.cost, &invoice_number)
            .await
            .inspect_err(|_| self.metrics.checkout_errored())?
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                tracing::error!(invoice_number = %invoice_number, "No checkout id issued");
                self.metrics.checkout_declined();
                SharePointError::MissingCheckoutId {
                    invoice_number: invoice_number.clone(),
                }
            })?;
        self.metrics.checkout_issued();

        let payload = NewListItem {
            fields: InvoiceFields {
                title: details.title,
                customer: details.customer,
                cost: details.cost,
                due_by: details.due_by,
                invoice_number,
                checkout_id,
            },
        };
        let result = self
            .graph
            .send(GraphRequest::post(self.items_url(), &payload)?)
            .await
            .inspect_err(|_| self.metrics.list_item("create", false))?;

        let item_id = response_id(&result);
        self.metrics.list_item("create", item_id.is_some());

        match item_id {
            Some(item_id) => {
                tracing::info!(
                    item_id = %item_id,
                    invoice_number = %payload.fields.invoice_number,
                    "Successfully created the item"
                );
                Ok(ListItemOutcome::Created { item_id })
            }
            None => {
                tracing::info!(result = %result, "Error while creating the list item");
                Ok(ListItemOutcome::CreateFailed {
                    detail: failure_detail(&result),
                })
            }
        }
    }

    /// Write a payment callback's outcome to the list item's `Status` column.
    pub async fn update_list_item(
        &self,
        update: &StatusUpdate,
    ) -> Result<ListItemOutcome, SharePointError> {
        let update = update.normalized();
        update.validate()?;

        let item_status = PaymentStatus::from_callback(&update.status);
        let payload = StatusFields {
            status: item_status.as_list_value(),
        };

        tracing::info!(item_id = %update.item_id, status = payload.status, "Payload to update");

        let result = self
            .graph
            .send(GraphRequest::patch(
                self.item_fields_url(&update.item_id),
                &payload,
            )?)
            .await
            .inspect_err(|_| self.metrics.list_item("update", false))?;

        tracing::info!(result = %result, "Graph update response");

        let updated = response_id(&result).is_some();
        self.metrics.list_item("update", updated);

        if updated {
            tracing::info!(item_id = %update.item_id, "Successfully updated the item");
            Ok(ListItemOutcome::Updated {
                item_id: update.item_id,
            })
        } else {
            tracing::info!(
                item_id = %update.item_id,
                result = %result,
                "Error while updating the list item"
            );
            Ok(ListItemOutcome::UpdateFailed {
                detail: failure_detail(&result),
                item_id: update.item_id,
            })
        }
    }
}

fn response_id(result: &Value) -> Option<String> {
    result
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
