use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::services::media::MediaStore;

const LOAD_FAILURE: &str = "Could not load image";

/// Result of the lightweight profile picture analysis.
#[derive(Debug, Clone, Serialize)]
pub struct ProfilePictureAnalysis {
    pub dominant_color_rgb: [u8; 3],
    pub message: String,
}

/// Computes the dominant color of a stored profile picture.
///
/// "Dominant" is the per-channel mean over all pixels. Any read or decode
/// failure collapses into a single load error so callers do not leak
/// filesystem details.
pub async fn analyze_profile_picture(
    media: &MediaStore,
    relative_path: &str,
) -> AppResult<ProfilePictureAnalysis> {
    let bytes = media
        .read(relative_path)
        .await
        .map_err(|_| AppError::Internal(LOAD_FAILURE.to_string()))?;

    let dominant_color_rgb = tokio::task::spawn_blocking(move || mean_rgb(&bytes))
        .await
        .map_err(|e| AppError::Internal(format!("image analysis task panicked: {e}")))??;

    tracing::info!(
        path = relative_path,
        r = dominant_color_rgb[0],
        g = dominant_color_rgb[1],
        b = dominant_color_rgb[2],
        "Profile picture analyzed"
    );

    Ok(ProfilePictureAnalysis {
        dominant_color_rgb,
        message: "Basic image analysis performed. More advanced AI analysis will be integrated later."
            .to_string(),
    })
}

fn mean_rgb(bytes: &[u8]) -> AppResult<[u8; 3]> {
    let img = image::load_from_memory(bytes)
        .map_err(|_| AppError::Internal(LOAD_FAILURE.to_string()))?;
    let rgb = img.to_rgb8();

    let pixel_count = (rgb.width() as u64) * (rgb.height() as u64);
    if pixel_count == 0 {
        return Err(AppError::Internal(LOAD_FAILURE.to_string()));
    }

    let mut sums = [0u64; 3];
    for pixel in rgb.pixels() {
        sums[0] += pixel.0[0] as u64;
        sums[1] += pixel.0[1] as u64;
        sums[2] += pixel.0[2] as u64;
    }

    Ok([
        (sums[0] / pixel_count) as u8,
        (sums[1] / pixel_count) as u8,
        (sums[2] / pixel_count) as u8,
    ])
}
