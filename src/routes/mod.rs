pub mod api;

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::docs::ApiDoc;
use crate::websocket::handler::websocket_handler;
use crate::AppState;

pub use api::create_api_routes;

/// Full application router: query API, websocket transport and Swagger UI
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    Router::new()
        // Mount API routes
        .nest("/api", create_api_routes())
        .route("/ws", get(websocket_handler))
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        // Add tracing layer
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match config.allowed_origins() {
        None => base.allow_origin(Any),
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("Ignoring invalid CORS origin '{}'", o);
                        None
                    }
                })
                .collect();
            base.allow_origin(origins)
        }
    }
}
