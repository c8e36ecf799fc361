//! service-core: Shared infrastructure for the checkout services.
pub mod error;
pub mod middleware;
pub mod observability;
pub mod utils;

pub use axum;
pub use tracing;
