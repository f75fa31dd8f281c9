//! HTTP transport for the filter engine.

mod handlers;
mod server;

use axum::{
    routing::{delete, get, post},
    Router,
};

pub use handlers::{ErrorResponse, HealthResponse, NewRule, SharedEngine};
pub use server::HttpServer;

/// Build the router for the given engine.
pub fn router(engine: SharedEngine) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/filter", post(handlers::filter_handler))
        .route(
            "/rules",
            get(handlers::list_rules_handler).post(handlers::add_rule_handler),
        )
        .route("/rules/{id}", delete(handlers::remove_rule_handler))
        .with_state(engine)
}
