/// SerpApi Google Lens provider
///
/// Reverse image search: given the public URL of a generated clothing image,
/// returns visually similar products with shopping metadata.
///
/// API Flow:
/// GET /search?engine=google_lens&url={image_url}&api_key={key}&hl={hl}&gl={gl}
/// Products come back under "shopping_results"; its absence means the engine
/// found nothing for this image, which is a normal outcome.
use crate::{
    error::{AppError, AppResult},
    models::ShoppingCandidate,
    services::providers::ProductSearcher,
};
use reqwest::Client as HttpClient;

#[derive(Clone)]
pub struct SerpApiProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    hl: String,
    gl: String,
}

impl SerpApiProvider {
    pub fn new(api_key: String, api_url: String, hl: String, gl: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            hl,
            gl,
        }
    }
}

fn parse_shopping_results(payload: &serde_json::Value) -> Vec<ShoppingCandidate> {
    payload
        .get("shopping_results")
        .and_then(|results| results.as_array())
        .map(|items| items.iter().map(ShoppingCandidate::from_search_entry).collect())
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl ProductSearcher for SerpApiProvider {
    async fn search_by_image(&self, image_url: &str) -> AppResult<Vec<ShoppingCandidate>> {
        let url = format!("{}/search", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("engine", "google_lens"),
                ("url", image_url),
                ("api_key", self.api_key.as_str()),
                ("hl", self.hl.as_str()),
                ("gl", self.gl.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(format!(
                "SerpApi returned status {}: {}",
                status, body
            )));
        }

        let payload: serde_json::Value = response.json().await?;
        let candidates = parse_shopping_results(&payload);

        tracing::info!(
            image_url = %image_url,
            results = candidates.len(),
            provider = "serpapi",
            "Reverse image search completed"
        );

        Ok(candidates)
    }
}
