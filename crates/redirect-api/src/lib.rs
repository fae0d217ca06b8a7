//! redirect-api — HTTP surface of the foundry redirect registry.
//!
//! # API Routes
//!
//! | Method | Path | Query | Description |
//! |---|---|---|---|
//! | GET | `/` | `foundry_id` | Address registered for a foundry |
//! | POST | `/` | `foundry_id`, `external_address`, `internal_address` | Register or update a foundry |
//! | GET | `/api/customize` | `public_id` | Check whether a custom alias is available |
//! | POST | `/api/customize` | `public_id`, `foundry_id` | Set a custom alias |
//! | GET | `/{public_id}` | | 301 to the external address |
//! | GET | `/{public_id}/local` | | 301 to the local address |
//!
//! Every route also answers `OPTIONS`, and every response carries the CORS
//! headers from [`cors`].

pub mod cors;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::get;
use redirect_registry::Registry;

pub use error::ApiError;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<Registry>,
}

/// Build the complete route table.
pub fn build_router(registry: Arc<Registry>) -> Router {
    let state = ApiState { registry };

    Router::new()
        .route(
            "/",
            get(handlers::address_summary)
                .post(handlers::register)
                .options(handlers::preflight),
        )
        .route(
            "/api/customize",
            get(handlers::check_alias)
                .post(handlers::customize_alias)
                .options(handlers::preflight),
        )
        .route(
            "/{public_id}",
            get(handlers::redirect_external).options(handlers::preflight),
        )
        .route(
            "/{public_id}/local",
            get(handlers::redirect_local).options(handlers::preflight),
        )
        .fallback(handlers::unknown_resource)
        .layer(middleware::map_response(cors::apply_cors_headers))
        .with_state(state)
}
