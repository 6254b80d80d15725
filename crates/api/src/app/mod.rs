//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: ledger wiring over the configured document store
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use pantry_infra::PantryConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router around already-wired services.
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router().layer(Extension(services)))
        .layer(ServiceBuilder::new())
}

/// Wire services from configuration, then build the router (used by `main.rs`).
pub async fn build_app_from_config(config: &PantryConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config).await?;
    Ok(build_app(Arc::new(services)))
}
