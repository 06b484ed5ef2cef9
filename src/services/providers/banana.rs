/// Banana.dev image generation provider
///
/// Turns a clothing prompt into a product image. Banana deployments vary in
/// their output schema, so the parser accepts both the inline-base64 and the
/// hosted-URL shapes under either of the field spellings in the wild.
///
/// API Flow:
/// POST /v4/ with the model key and prompt. Output records land under
/// "modelOutputs" (array or object) or the legacy "output" key.
use crate::{
    error::{AppError, AppResult},
    services::providers::{GeneratedImage, ImageGenerator},
};
use reqwest::Client as HttpClient;
use serde_json::json;

#[derive(Clone)]
pub struct BananaProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    model_key: Option<String>,
    api_url: String,
}

impl BananaProvider {
    pub fn new(api_key: Option<String>, model_key: Option<String>, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            model_key,
            api_url,
        }
    }
}

/// Finds the first image in a Banana response, preferring inline bytes.
fn extract_image(payload: &serde_json::Value) -> Option<GeneratedImage> {
    let outputs = payload
        .get("modelOutputs")
        .or_else(|| payload.get("output"))?;

    let record = match outputs {
        serde_json::Value::Array(items) => items.first()?,
        record @ serde_json::Value::Object(_) => record,
        _ => return None,
    };

    let base64 = record
        .get("image_base64")
        .or_else(|| record.get("base64"))
        .and_then(|v| v.as_str());
    if let Some(encoded) = base64 {
        return Some(GeneratedImage::Base64(encoded.to_string()));
    }

    record
        .get("image_url")
        .or_else(|| record.get("url"))
        .and_then(|v| v.as_str())
        .map(|url| GeneratedImage::Url(url.to_string()))
}

#[async_trait::async_trait]
impl ImageGenerator for BananaProvider {
    async fn generate_image(&self, prompt: &str) -> AppResult<GeneratedImage> {
        let (api_key, model_key) = match (&self.api_key, &self.model_key) {
            (Some(api_key), Some(model_key)) => (api_key, model_key),
            _ => {
                return Err(AppError::upstream(
                    "Banana API credentials are not configured",
                ))
            }
        };

        let url = format!("{}/v4/", self.api_url);
        let body = json!({
            "apikey": api_key,
            "modelKey": model_key,
            "modelInputs": { "prompt": prompt },
            "startOnly": false,
        });

        let response = self.http_client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(format!(
                "Banana API returned status {}: {}",
                status, body
            )));
        }

        let payload: serde_json::Value = response.json().await?;

        match extract_image(&payload) {
            Some(image) => {
                tracing::info!(
                    inline = matches!(image, GeneratedImage::Base64(_)),
                    provider = "banana",
                    "Image generation completed"
                );
                Ok(image)
            }
            None => Err(AppError::Upstream {
                message: "Banana response carried no usable image".to_string(),
                raw_response: Some(payload.to_string()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_image_array_with_base64() {
        let payload = json!({
            "modelOutputs": [{ "image_base64": "aGVsbG8=" }]
        });

        assert_eq!(
            extract_image(&payload),
            Some(GeneratedImage::Base64("aGVsbG8=".to_string()))
        );
    }

    #[test]
    fn test_extract_image_object_with_url() {
        let payload = json!({
            "modelOutputs": { "image_url": "https://cdn.example.com/img.jpg" }
        });

        assert_eq!(
            extract_image(&payload),
            Some(GeneratedImage::Url(
                "https://cdn.example.com/img.jpg".to_string()
            ))
        );
    }

    #[test]
    fn test_extract_image_alternate_field_names() {
        let payload = json!({
            "output": [{ "base64": "Zm9v" }]
        });
        assert_eq!(
            extract_image(&payload),
            Some(GeneratedImage::Base64("Zm9v".to_string()))
        );

        let payload = json!({
            "output": { "url": "https://cdn.example.com/alt.jpg" }
        });
        assert_eq!(
            extract_image(&payload),
            Some(GeneratedImage::Url("https://cdn.example.com/alt.jpg".to_string()))
        );
    }

    #[test]
    fn test_extract_image_prefers_inline_bytes() {
        let payload = json!({
            "modelOutputs": [{
                "image_base64": "aW5saW5l",
                "image_url": "https://cdn.example.com/also.jpg"
            }]
        });

        assert_eq!(
            extract_image(&payload),
            Some(GeneratedImage::Base64("aW5saW5l".to_string()))
        );
    }

    #[test]
    fn test_extract_image_empty_response() {
        assert_eq!(extract_image(&json!({})), None);
        assert_eq!(extract_image(&json!({ "modelOutputs": [] })), None);
        assert_eq!(extract_image(&json!({ "modelOutputs": [{}] })), None);
    }

    #[tokio::test]
    async fn test_missing_credentials_is_an_error() {
        let provider = BananaProvider::new(None, None, "http://unused.local".to_string());
        let result = provider.generate_image("a beige chino").await;

        assert!(result.is_err());
    }
}
