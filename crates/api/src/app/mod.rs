//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: in-memory stores, event bus and the activity projection
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use stockflow_infra::{Clock, SystemClock};

use crate::config::ApiConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: ApiConfig) -> Router {
    build_app_with_clock(config, Arc::new(SystemClock))
}

/// Same router, with an injected clock for date-sensitive callers.
pub fn build_app_with_clock(config: ApiConfig, clock: Arc<dyn Clock>) -> Router {
    let services = Arc::new(services::build_services(&config, clock));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
