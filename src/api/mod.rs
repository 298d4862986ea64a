//! API handlers for the visitor log REST endpoints

pub mod health;
pub mod openapi;
pub mod visitors;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Visitors
        .route("/visitors", get(visitors::list_visitors))
        .route("/visitors", post(visitors::register_visitor))
        .route("/visitors/stream", get(visitors::stream_visitors))
        .route("/visitors/:id", get(visitors::get_visitor))
        .route("/visitors/:id/details", put(visitors::update_details))
        .route("/visitors/:id/check-in", post(visitors::check_in))
        .route("/visitors/:id/check-out", post(visitors::check_out))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
