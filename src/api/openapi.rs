//! OpenAPI documentation

use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::api::{health, visitors};
use crate::models::{
    enums::VisitorStatus,
    visitor::{AdditionalDetails, CreatedVisitor, NewVisitor, Visitor},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Visitor Log API",
        version = "0.1.0",
        description = "Front desk visitor registration and live visitor log"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Visitors
        visitors::list_visitors,
        visitors::stream_visitors,
        visitors::register_visitor,
        visitors::get_visitor,
        visitors::update_details,
        visitors::check_in,
        visitors::check_out,
    ),
    components(
        schemas(
            Visitor,
            VisitorStatus,
            AdditionalDetails,
            NewVisitor,
            CreatedVisitor,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "visitors", description = "Visitor registration and live log")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new().route("/api-docs/openapi.json", get(openapi_json))
}
