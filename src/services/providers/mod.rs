/// External AI and search provider abstraction
///
/// This module provides a pluggable architecture for the three upstream
/// services the recommendation pipeline depends on: a text generation model
/// (Gemini), an image generation model (Banana.dev), and a visual product
/// search engine (SerpApi Google Lens). Each is behind its own trait so the
/// pipeline can be exercised against mocks.
use crate::{error::AppResult, models::ShoppingCandidate};

pub mod banana;
pub mod gemini;
pub mod serpapi;

pub use banana::BananaProvider;
pub use gemini::GeminiProvider;
pub use serpapi::SerpApiProvider;

/// Trait for text generation models
///
/// One call per prompt. Callers are responsible for prompt construction and
/// for parsing whatever structure they asked the model to produce.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Runs a single prompt through the model and returns its raw text reply.
    async fn generate(&self, prompt: &str) -> AppResult<String>;
}

/// Image bytes as returned by an image generation model
///
/// Hosts differ in whether they inline the image or upload it somewhere
/// and hand back a link, so both shapes are first-class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedImage {
    /// Base64-encoded image bytes inlined in the response.
    Base64(String),
    /// Remote URL where the host stored the image.
    Url(String),
}

/// Trait for image generation models
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generates one image for the prompt.
    ///
    /// Returns an error when the host is unreachable, misconfigured, or its
    /// response carries no usable image. Callers decide how to degrade.
    async fn generate_image(&self, prompt: &str) -> AppResult<GeneratedImage>;
}

/// Trait for reverse image product search
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ProductSearcher: Send + Sync {
    /// Finds visually similar shopping products for a publicly reachable image URL.
    ///
    /// An empty result list means the engine found nothing, not that the
    /// call failed.
    async fn search_by_image(&self, image_url: &str) -> AppResult<Vec<ShoppingCandidate>>;
}
