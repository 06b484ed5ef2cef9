/// Google Gemini text generation provider
///
/// Drives both pipeline stages that need a language model: profile analysis
/// (producing styling prompts) and post formatting (turning shopping results
/// into feed-ready posts).
///
/// API Flow:
/// POST /models/{model}:generateContent?key={api_key} with the prompt as a
/// single user content part. The reply text is the concatenation of the text
/// parts of the first candidate.
use crate::{
    error::{AppError, AppResult},
    services::providers::TextGenerator,
};
use reqwest::Client as HttpClient;
use serde_json::json;

#[derive(Clone)]
pub struct GeminiProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            model,
        }
    }
}

/// Pulls the text parts out of the first candidate, concatenated in order.
///
/// Returns `None` when the response has no candidates or only non-text parts,
/// which the model emits for safety blocks and empty generations.
fn extract_candidate_text(payload: &serde_json::Value) -> Option<String> {
    let parts = payload
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait::async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_url, self.model, self.api_key
        );

        let body = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        });

        let response = self.http_client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(format!(
                "Gemini API returned status {}: {}",
                status, body
            )));
        }

        let payload: serde_json::Value = response.json().await?;

        match extract_candidate_text(&payload) {
            Some(text) => {
                tracing::info!(
                    prompt_chars = prompt.len(),
                    reply_chars = text.len(),
                    provider = "gemini",
                    "Text generation completed"
                );
                Ok(text)
            }
            None => Err(AppError::Upstream {
                message: "Gemini response contained no candidate text".to_string(),
                raw_response: Some(payload.to_string()),
            }),
        }
    }
}
