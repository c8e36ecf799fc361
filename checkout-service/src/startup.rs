//! Application startup and lifecycle management.
//!
//! Wires the Graph client, the Rapyd client and the invoice number generator
//! into a `SharePointClient` and serves the HTTP API around it.

use crate::config::Config;
use crate::handlers;
use crate::services::{
    CheckoutMetrics, DatedInvoiceNumbers, HttpGraphClient, RapydClient, SharePointClient,
};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{make_request_span, request_id_middleware};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub sharepoint: SharePointClient,
    pub metrics: CheckoutMetrics,
    pub rapyd_configured: bool,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let graph = HttpGraphClient::new(config.graph.clone()).map_err(|e| {
            tracing::error!("Failed to build Graph client: {}", e);
            AppError::ConfigError(e.into())
        })?;

        let rapyd = RapydClient::new(config.rapyd.clone()).map_err(|e| {
            tracing::error!("Failed to build Rapyd client: {}", e);
            AppError::ConfigError(e.into())
        })?;
        let rapyd_configured = rapyd.is_configured();
        if rapyd_configured {
            tracing::info!("Rapyd client initialized");
        } else {
            tracing::warn!("Rapyd credentials not configured - invoices cannot be created");
        }

        let metrics = CheckoutMetrics::new().map_err(|e| {
            tracing::error!("Failed to register metrics: {}", e);
            AppError::InternalError(e.into())
        })?;

        let sharepoint = SharePointClient::new(
            config.sharepoint.clone(),
            config.graph.base_url.clone(),
            Arc::new(graph),
            Arc::new(rapyd),
            Arc::new(DatedInvoiceNumbers::new(config.invoice.number_prefix.clone())),
            metrics.clone(),
        );

        Ok(Self {
            sharepoint,
            metrics,
            rapyd_configured,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route(
            "/invoices",
            get(handlers::invoices::list_invoices).post(handlers::invoices::create_invoice),
        )
        .route("/callbacks/payment", post(handlers::callbacks::payment_status))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application and bind its listener. Port 0 picks a free port.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let address = format!("{}:{}", config.server.host, config.server.port);
        let state = AppState::from_config(&config)?;

        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router: router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), AppError> {
        tracing::info!("Listening on port {}", self.port);
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }
}
