use axum::{extract::State, http::StatusCode, Json};
use base64::engine::general_purpose;
use base64::Engine as _;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{NewUserProfile, UserProfile},
    routes::AppState,
    services::media::PROFILE_PICS_DIR,
};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(flatten)]
    pub profile: NewUserProfile,
    /// Base64-encoded image payload stored as the profile picture
    #[serde(default)]
    pub profile_picture: Option<String>,
}

/// Handler for user profile creation
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    let mut profile = request.profile.into_profile();

    if let Some(encoded) = request.profile_picture {
        let bytes = general_purpose::STANDARD.decode(encoded.as_bytes()).map_err(|_| {
            AppError::InvalidInput("Profile picture must be valid base64".to_string())
        })?;

        let relative_path = format!("{}/{}.jpg", PROFILE_PICS_DIR, profile.id);
        state.media.save(&relative_path, &bytes).await?;
        profile.profile_picture = Some(relative_path);
    }

    state.users.insert(&profile).await?;

    tracing::info!(user_id = %profile.id, "User profile created");

    Ok((StatusCode::CREATED, Json(profile)))
}
