use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{RecommendationPage, SearchFilters},
    routes::AppState,
};

fn default_page() -> i64 {
    1
}

fn default_location() -> String {
    "Not provided".to_string()
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub user_id: Uuid,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_page")]
    pub page: i64,
}

#[derive(Debug, Deserialize)]
pub struct AdvancedSearchRequest {
    pub user_id: Uuid,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default)]
    pub filters: SearchFilters,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub user_id: Uuid,
    #[serde(default = "default_page")]
    pub page: i64,
}

#[derive(Debug, Deserialize)]
pub struct InvalidateQuery {
    pub user_id: Uuid,
}

/// Handler for recommendation generation
pub async fn generate(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<GenerateRequest>,
) -> AppResult<Json<RecommendationPage>> {
    tracing::info!(
        request_id = %request_id,
        user_id = %request.user_id,
        page = request.page,
        "Processing recommendation request"
    );

    let page = state
        .recommendations
        .recommend(request.user_id, &request.location, None, request.page)
        .await?;

    Ok(Json(page))
}

/// Handler for filtered recommendation generation
///
/// An absent or empty filter object degrades to the unfiltered pipeline,
/// including its cache namespace.
pub async fn advanced_search(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<AdvancedSearchRequest>,
) -> AppResult<Json<RecommendationPage>> {
    tracing::info!(
        request_id = %request_id,
        user_id = %request.user_id,
        filters = request.filters.len(),
        page = request.page,
        "Processing filtered recommendation request"
    );

    let filters = (!request.filters.is_empty()).then_some(&request.filters);

    let page = state
        .recommendations
        .recommend(request.user_id, &request.location, filters, request.page)
        .await?;

    Ok(Json(page))
}

/// Handler for cached page reads. Never triggers generation.
pub async fn cached(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<RecommendationPage>> {
    let page = state
        .recommendations
        .cached_page(params.user_id, params.page)
        .await?;

    Ok(Json(page))
}

/// Handler for cache invalidation
pub async fn invalidate(
    State(state): State<AppState>,
    Query(params): Query<InvalidateQuery>,
) -> AppResult<Json<Value>> {
    let invalidated = state.recommendations.invalidate_user(params.user_id).await?;

    Ok(Json(json!({ "invalidated": invalidated })))
}
