use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::db::UserStore;
use crate::middleware::{propagate_request_id, span_for_request};
use crate::services::media::MediaStore;
use crate::services::recommendations::RecommendationService;

pub mod profile;
pub mod recommendations;
pub mod users;

/// Shared handler dependencies.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub media: Arc<MediaStore>,
    pub recommendations: Arc<RecommendationService>,
}

/// Creates the application router with all routes and layers.
///
/// Stored media is served under `/media` from the media root, which keeps
/// generated image URLs resolvable by the reverse-image-search provider.
pub fn create_router(state: AppState) -> Router {
    let media_root = state.media.root().to_path_buf();

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .nest_service("/media", ServeDir::new(media_root))
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(axum::middleware::from_fn(propagate_request_id))
                .layer(TraceLayer::new_for_http().make_span_with(span_for_request)),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(users::create))
        .route("/profile/analyze", post(profile::analyze))
        .route(
            "/recommendations",
            post(recommendations::generate)
                .get(recommendations::cached)
                .delete(recommendations::invalidate),
        )
        .route("/search/advanced", post(recommendations::advanced_search))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
