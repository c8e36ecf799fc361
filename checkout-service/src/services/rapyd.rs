//! Rapyd checkout client.
//!
//! Creates hosted checkout pages for invoices. Every request is signed with
//! Rapyd's salted HMAC scheme:
//! `base64(hex(HMAC-SHA256(method + path + salt + timestamp + access_key + secret_key + body, secret_key)))`

use crate::config::RapydConfig;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::{distributions::Alphanumeric, Rng};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use service_core::utils::signature::hmac_sha256_hex;
use thiserror::Error;
use uuid::Uuid;

const CHECKOUT_PATH: &str = "/v1/checkout";
const SALT_LENGTH: usize = 12;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Rapyd credentials not configured")]
    NotConfigured,

    #[error("Invalid checkout amount: {0:?}")]
    InvalidAmount(String),

    #[error("Failed to sign request: {0}")]
    Signature(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response from Rapyd: {0}")]
    InvalidResponse(String),
}

/// Issues checkout identifiers for invoices.
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// Returns the checkout id for an invoice, or `None` if the provider
    /// declined to create one.
    async fn generate_checkout_id(
        &self,
        cost: &str,
        invoice_number: &str,
    ) -> Result<Option<String>, CheckoutError>;
}

/// Request to create a Rapyd hosted checkout page.
#[derive(Debug, Serialize)]
pub struct CreateCheckoutRequest {
    pub amount: f64,
    pub country: String,
    pub currency: String,
    pub merchant_reference_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete_checkout_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_checkout_url: Option<String>,
}

/// Envelope every Rapyd response is wrapped in.
#[derive(Debug, Deserialize)]
pub struct RapydResponse<T> {
    pub status: RapydStatus,
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct RapydStatus {
    #[serde(default)]
    pub error_code: String,
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub operation_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutPage {
    pub id: String,
    pub redirect_url: Option<String>,
    pub status: Option<String>,
}

/// Headers Rapyd expects on a signed request.
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    pub salt: String,
    pub timestamp: i64,
    pub signature: String,
}

#[derive(Clone)]
pub struct RapydClient {
    client: Client,
    config: RapydConfig,
}

impl RapydClient {
    pub fn new(config: RapydConfig) -> Result<Self, CheckoutError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    /// Check if Rapyd is configured (credentials are set).
    pub fn is_configured(&self) -> bool {
        !self.config.access_key.expose_secret().is_empty()
            && !self.config.secret_key.expose_secret().is_empty()
    }

    /// Computes the signature for one request. `body` must be the exact
    /// bytes sent on the wire, or empty for bodiless requests.
    pub fn sign(
        &self,
        method: &str,
        path: &str,
        salt: &str,
        timestamp: i64,
        body: &str,
    ) -> Result<String, CheckoutError> {
        let secret_key = self.config.secret_key.expose_secret();
        let to_sign = format!(
            "{}{}{}{}{}{}{}",
            method.to_lowercase(),
            path,
            salt,
            timestamp,
            self.config.access_key.expose_secret(),
            secret_key,
            body
        );

        let digest = hmac_sha256_hex(secret_key, &to_sign)
            .map_err(|e| CheckoutError::Signature(e.to_string()))?;

        Ok(STANDARD.encode(digest))
    }

    fn signed_headers(&self, method: &str, path: &str, body: &str) -> Result<SignedHeaders, CheckoutError> {
        let salt: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SALT_LENGTH)
            .map(char::from)
            .collect();
        let timestamp = chrono::Utc::now().timestamp();
        let signature = self.sign(method, path, &salt, timestamp, body)?;

        Ok(SignedHeaders {
            salt,
            timestamp,
            signature,
        })
    }

    /// Create a hosted checkout page for an invoice.
    pub async fn create_checkout(
        &self,
        amount: f64,
        invoice_number: &str,
    ) -> Result<RapydResponse<CheckoutPage>, CheckoutError> {
        if !self.is_configured() {
            return Err(CheckoutError::NotConfigured);
        }

        let request = CreateCheckoutRequest {
            amount,
            country: self.config.country.clone(),
            currency: self.config.currency.clone(),
            merchant_reference_id: invoice_number.to_string(),
            complete_checkout_url: self.config.complete_checkout_url.clone(),
            cancel_checkout_url: self.config.cancel_checkout_url.clone(),
        };

        // Signed bytes and sent bytes must match exactly.
        let body = serde_json::to_string(&request)
            .map_err(|e| CheckoutError::InvalidResponse(e.to_string()))?;
        let headers = self.signed_headers("post", CHECKOUT_PATH, &body)?;

        let url = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            CHECKOUT_PATH
        );

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("access_key", self.config.access_key.expose_secret().as_str())
            .header("salt", &headers.salt)
            .header("timestamp", headers.timestamp.to_string())
            .header("signature", &headers.signature)
            .header("idempotency", Uuid::new_v4().to_string())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, body = %body, "Rapyd create_checkout response");

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(status = %status, "Unreadable Rapyd response");
            CheckoutError::InvalidResponse(e.to_string())
        })
    }
}

/// Parses a list cost into the amount Rapyd charges.
pub fn parse_amount(cost: &str) -> Result<f64, CheckoutError> {
    cost.trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount > 0.0)
        .ok_or_else(|| CheckoutError::InvalidAmount(cost.to_string()))
}

#[async_trait]
impl CheckoutProvider for RapydClient {
    async fn generate_checkout_id(
        &self,
        cost: &str,
        invoice_number: &str,
    ) -> Result<Option<String>, CheckoutError> {
        let amount = parse_amount(cost)?;
        let response = self.create_checkout(amount, invoice_number).await?;

        if !response.status.status.eq_ignore_ascii_case("SUCCESS") {
            tracing::error!(
                invoice_number = %invoice_number,
                error_code = %response.status.error_code,
                message = %response.status.message,
                operation_id = %response.status.operation_id,
                "Rapyd checkout creation failed"
            );
            return Ok(None);
        }

        let checkout_id = response.data.map(|page| page.id);
        tracing::info!(
            invoice_number = %invoice_number,
            checkout_id = ?checkout_id,
            "Rapyd checkout created"
        );

        Ok(checkout_id)
    }
}
