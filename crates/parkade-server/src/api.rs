//! HTTP API routes and handlers.
//!
//! Handlers are organized by domain:
//! - `health` - Service health checks
//! - `lot` - Lot-wide occupancy
//! - `spots` - Spot inventory
//! - `sessions` - Park, unpark and ticket lookups
//! - `error` - API error types
//! - `openapi` - OpenAPI specification generation

use axum::routing::get;
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub mod error;
pub mod health;
pub mod lot;
pub mod openapi;
pub mod sessions;
pub mod spots;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use openapi::get_openapi_json;

/// Creates the combined API router with all endpoints.
///
/// # Route Structure
///
/// ```text
/// /health                 - Health check
/// /api
/// ├── /lot                - Occupancy report
/// ├── /spots              - List, add and remove spots
/// ├── /sessions           - Park, unpark, open ticket, history
/// └── /openapi.json       - OpenAPI specification
/// ```
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest(
            "/api",
            Router::new()
                .route("/lot", get(lot::get_lot))
                .route("/openapi.json", get(openapi::get_openapi_spec))
                .nest("/spots", spots::router())
                .nest("/sessions", sessions::router()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
