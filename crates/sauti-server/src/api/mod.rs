//! API routes and handlers

mod catalog;
mod engine;
mod health;
mod tts;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Resident engine management
        .route("/engine/status", get(engine::get_status))
        .route("/engine/offload", post(engine::offload))
        // TTS generation
        .route("/tts/custom-voice", post(tts::custom_voice))
        .route("/tts/voice-design", post(tts::voice_design))
        .route("/tts/voice-clone", post(tts::voice_clone))
        // Catalog
        .route("/speakers", get(catalog::list_speakers))
        .route("/languages", get(catalog::list_languages));

    Router::new()
        .nest("/api/v1", api_routes)
        // Serve static files for UI
        .fallback_service(
            tower_http::services::ServeDir::new("ui/dist")
                .fallback(tower_http::services::ServeFile::new("ui/dist/index.html")),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
