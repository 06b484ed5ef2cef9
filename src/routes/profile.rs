use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    routes::AppState,
    services::profile::{analyze_profile_picture, ProfilePictureAnalysis},
};

#[derive(Debug, Deserialize)]
pub struct AnalyzeProfileRequest {
    pub user_id: Uuid,
}

/// Handler for profile picture analysis
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeProfileRequest>,
) -> AppResult<Json<ProfilePictureAnalysis>> {
    let profile = state
        .users
        .get(request.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let picture = profile.profile_picture.ok_or_else(|| {
        AppError::InvalidInput("Profile picture not found for this user".to_string())
    })?;

    let analysis = analyze_profile_picture(&state.media, &picture).await?;

    Ok(Json(analysis))
}
