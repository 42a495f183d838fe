//! Persona API - HTTP server
//!
//! Exposes the persona chat endpoint and a liveness probe.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI document for the service
#[derive(OpenApi)]
#[openapi(
    paths(handlers::health::root, handlers::chat::chat_handler),
    components(schemas(
        handlers::chat::ChatRequest,
        handlers::chat::ChatResponse,
        handlers::health::StatusResponse,
        error::ApiError
    )),
    tags(
        (name = "chat", description = "Persona chat"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors_enabled = state.config.server.cors_enabled;

    let router = routes::api_routes()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_enabled {
        router.layer(routes::cors_layer())
    } else {
        router
    }
}
