use std::io::Cursor;
use std::sync::Arc;

use base64::engine::general_purpose;
use base64::Engine;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use reqwest::Client as HttpClient;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::media::{MediaStore, GENERATED_IMAGES_DIR};
use crate::services::providers::{GeneratedImage, ImageGenerator};

const PLACEHOLDER_DIMENSION: u32 = 512;
const PLACEHOLDER_GRAY: u8 = 200;
const PLACEHOLDER_JPEG_QUALITY: u8 = 85;

/// Turns clothing prompts into locally hosted images
///
/// Wraps the image generation model and downgrades every failure to a
/// neutral placeholder, so a prompt always ends up with a usable image URL.
/// The stored file's public URL is what the reverse image search receives.
pub struct ImageService {
    generator: Arc<dyn ImageGenerator>,
    media: Arc<MediaStore>,
    http_client: HttpClient,
}

impl ImageService {
    pub fn new(generator: Arc<dyn ImageGenerator>, media: Arc<MediaStore>) -> Self {
        Self {
            generator,
            media,
            http_client: HttpClient::new(),
        }
    }

    /// Produces a hosted image for the prompt and returns its public URL.
    ///
    /// Generation problems (model down, unconfigured credentials, undecodable
    /// payload) fall back to the placeholder. Only a failure to store the
    /// final bytes surfaces as an error.
    pub async fn produce_image_url(&self, prompt: &str) -> AppResult<String> {
        let relative_path = format!("{}/{}", GENERATED_IMAGES_DIR, image_filename(prompt));

        let bytes = match self.fetch_generated_bytes(prompt).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "Image generation failed, using placeholder");
                placeholder_jpeg().await?
            }
        };

        self.media.save(&relative_path, &bytes).await?;
        let url = self.media.public_url(&relative_path);

        tracing::info!(url = %url, bytes = bytes.len(), "Image stored");

        Ok(url)
    }

    /// Resolves the model's output into raw image bytes.
    async fn fetch_generated_bytes(&self, prompt: &str) -> AppResult<Vec<u8>> {
        match self.generator.generate_image(prompt).await? {
            GeneratedImage::Base64(encoded) => general_purpose::STANDARD
                .decode(encoded.as_bytes())
                .map_err(|e| AppError::upstream(format!("Invalid base64 image payload: {}", e))),
            GeneratedImage::Url(url) => {
                let response = self.http_client.get(&url).send().await?;
                if !response.status().is_success() {
                    return Err(AppError::upstream(format!(
                        "Image download returned status {}",
                        response.status()
                    )));
                }
                Ok(response.bytes().await?.to_vec())
            }
        }
    }
}

/// Filename derived from the prompt digest plus a short random suffix so
/// repeated prompts never overwrite each other.
fn image_filename(prompt: &str) -> String {
    let digest = hex::encode(Sha256::digest(prompt.as_bytes()));
    let suffix = Uuid::new_v4().simple().to_string();
    format!("generated_image_{}_{}.jpg", &digest[..16], &suffix[..6])
}

/// Flat gray square standing in for a generated image.
///
/// Encoding is CPU work, so it runs on the blocking pool.
async fn placeholder_jpeg() -> AppResult<Vec<u8>> {
    tokio::task::spawn_blocking(|| {
        let gray = Rgb([PLACEHOLDER_GRAY, PLACEHOLDER_GRAY, PLACEHOLDER_GRAY]);
        let image = RgbImage::from_pixel(PLACEHOLDER_DIMENSION, PLACEHOLDER_DIMENSION, gray);

        let mut buf = Vec::new();
        let mut cursor = Cursor::new(&mut buf);
        DynamicImage::ImageRgb8(image)
            .write_to(&mut cursor, ImageOutputFormat::Jpeg(PLACEHOLDER_JPEG_QUALITY))
            .map_err(|e| AppError::Internal(format!("Failed to encode placeholder: {}", e)))?;

        Ok(buf)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Placeholder task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockImageGenerator;
    use image::GenericImageView;

    fn store_in(dir: &tempfile::TempDir) -> Arc<MediaStore> {
        Arc::new(MediaStore::new(dir.path(), "http://localhost:3000"))
    }

    #[test]
    fn test_image_filename_shape() {
        let name = image_filename("a beige chino on a light gray studio background");

        assert!(name.starts_with("generated_image_"));
        assert!(name.ends_with(".jpg"));
        // 16 hex digest chars and a 6 char suffix.
        let stem = name.trim_start_matches("generated_image_").trim_end_matches(".jpg");
        let (digest, suffix) = stem.split_once('_').unwrap();
        assert_eq!(digest.len(), 16);
        assert_eq!(suffix.len(), 6);
    }

    #[test]
    fn test_image_filename_unique_per_call() {
        let first = image_filename("same prompt");
        let second = image_filename("same prompt");

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_placeholder_is_a_gray_square() {
        let bytes = placeholder_jpeg().await.unwrap();
        let image = image::load_from_memory(&bytes).unwrap();

        assert_eq!(image.dimensions(), (512, 512));
        let pixel = image.to_rgb8().get_pixel(256, 256).0;
        // JPEG compression wobbles a little around the flat fill.
        for channel in pixel {
            assert!((195..=205).contains(&channel));
        }
    }

    #[tokio::test]
    async fn test_inline_image_is_stored_and_served() {
        let dir = tempfile::tempdir().unwrap();
        let jpeg = placeholder_jpeg().await.unwrap();
        let encoded = general_purpose::STANDARD.encode(&jpeg);

        let mut generator = MockImageGenerator::new();
        generator
            .expect_generate_image()
            .returning(move |_| Ok(GeneratedImage::Base64(encoded.clone())));

        let service = ImageService::new(Arc::new(generator), store_in(&dir));
        let url = service.produce_image_url("linen overshirt").await.unwrap();

        assert!(url.starts_with("http://localhost:3000/media/generated_images/"));

        let relative = url.trim_start_matches("http://localhost:3000/media/");
        let stored = service.media.read(relative).await.unwrap();
        assert_eq!(stored, jpeg);
    }

    #[tokio::test]
    async fn test_generation_failure_falls_back_to_placeholder() {
        let dir = tempfile::tempdir().unwrap();

        let mut generator = MockImageGenerator::new();
        generator
            .expect_generate_image()
            .returning(|_| Err(AppError::upstream("model host unreachable")));

        let service = ImageService::new(Arc::new(generator), store_in(&dir));
        let url = service.produce_image_url("wool coat").await.unwrap();

        let relative = url.trim_start_matches("http://localhost:3000/media/");
        let stored = service.media.read(relative).await.unwrap();
        let image = image::load_from_memory(&stored).unwrap();
        assert_eq!(image.dimensions(), (512, 512));
    }

    #[tokio::test]
    async fn test_undecodable_base64_falls_back_to_placeholder() {
        let dir = tempfile::tempdir().unwrap();

        let mut generator = MockImageGenerator::new();
        generator
            .expect_generate_image()
            .returning(|_| Ok(GeneratedImage::Base64("!!not base64!!".to_string())));

        let service = ImageService::new(Arc::new(generator), store_in(&dir));
        let url = service.produce_image_url("denim jacket").await.unwrap();

        let relative = url.trim_start_matches("http://localhost:3000/media/");
        let stored = service.media.read(relative).await.unwrap();
        assert!(image::load_from_memory(&stored).is_ok());
    }
}
