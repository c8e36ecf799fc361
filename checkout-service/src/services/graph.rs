//! Microsoft Graph client.
//!
//! Authenticates as the app registration with the OAuth2 client-credentials
//! grant and forwards JSON requests to Graph. Responses are returned as raw
//! JSON whatever their HTTP status; callers inspect the body themselves.

use crate::config::GraphConfig;
use async_trait::async_trait;
use reqwest::{Client, Method};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

/// Tokens are refreshed this long before Graph would reject them.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token acquisition failed: {0}")]
    Auth(String),

    #[error("Invalid response from Graph: {0}")]
    InvalidResponse(String),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A single call against the Graph API.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

impl GraphRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: &impl Serialize) -> Result<Self, GraphError> {
        Ok(Self {
            method: Method::POST,
            url: url.into(),
            body: Some(serde_json::to_value(body)?),
        })
    }

    pub fn patch(url: impl Into<String>, body: &impl Serialize) -> Result<Self, GraphError> {
        Ok(Self {
            method: Method::PATCH,
            url: url.into(),
            body: Some(serde_json::to_value(body)?),
        })
    }
}

#[async_trait]
pub trait GraphClient: Send + Sync {
    /// Sends an authenticated request and returns the decoded JSON body.
    async fn send(&self, request: GraphRequest) -> Result<Value, GraphError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

/// reqwest-backed Graph client with an app-only token cache.
#[derive(Clone)]
pub struct HttpGraphClient {
    client: Client,
    config: GraphConfig,
    token: Arc<RwLock<Option<CachedToken>>>,
}

impl HttpGraphClient {
    pub fn new(config: GraphConfig) -> Result<Self, GraphError> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            config,
            token: Arc::new(RwLock::new(None)),
        })
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.config.authority_url.trim_end_matches('/'),
            self.config.tenant_id
        )
    }

    /// Returns a cached token, fetching a new one when it is missing or stale.
    async fn access_token(&self) -> Result<String, GraphError> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.is_fresh() {
                return Ok(token.access_token.clone());
            }
        }

        let mut guard = self.token.write().await;
        if let Some(token) = guard.as_ref() {
            if token.is_fresh() {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.request_token().await?;
        let access_token = token.access_token.clone();
        *guard = Some(token);

        Ok(access_token)
    }

    async fn request_token(&self) -> Result<CachedToken, GraphError> {
        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret().as_str()),
            ("scope", self.config.scope.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let response = self.client.post(self.token_url()).form(&form).send().await?;

        let status = response.status();
        let body = response.text().await?;

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            GraphError::Auth(format!("unreadable token response ({status}): {e}"))
        })?;

        match token.access_token {
            Some(access_token) if status.is_success() && !access_token.is_empty() => {
                let expires_in = Duration::from_secs(token.expires_in.unwrap_or(3599));
                tracing::debug!(
                    expires_in_secs = expires_in.as_secs(),
                    "Acquired Graph access token"
                );
                Ok(CachedToken {
                    access_token,
                    expires_at: Instant::now() + expires_in,
                })
            }
            _ => {
                let reason = token
                    .error_description
                    .or(token.error)
                    .unwrap_or_else(|| format!("token endpoint returned {status}"));
                tracing::error!(status = %status, reason = %reason, "Graph token request failed");
                Err(GraphError::Auth(reason))
            }
        }
    }
}

#[async_trait]
impl GraphClient for HttpGraphClient {
    async fn send(&self, request: GraphRequest) -> Result<Value, GraphError> {
        let token = self.access_token().await?;

        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .bearer_auth(token);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = %status,
            "Graph response received"
        );

        if body.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(status = %status, body = %body, "Graph returned a non-JSON body");
            GraphError::InvalidResponse(e.to_string())
        })
    }
}
