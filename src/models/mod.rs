use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod user;

pub use user::{NewUserProfile, UserProfile};

/// Filter mapping supplied by the advanced-search variant.
///
/// A `BTreeMap` keeps the keys sorted, so two semantically identical filter
/// sets always serialize to the same canonical JSON regardless of the order
/// the client sent them in. The cache-key digest relies on this.
pub type SearchFilters = BTreeMap<String, serde_json::Value>;

/// Renders filters as one `key: value` line fragment per entry, the form
/// embedded into model instructions.
pub fn describe_filters(filters: &SearchFilters) -> String {
    filters
        .iter()
        .map(|(k, v)| format!("{}: {}", k, scalar_to_string(v)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// String value without JSON quoting; other scalars via their JSON form.
fn scalar_to_string(value: &serde_json::Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

/// Parsed output of the analysis call: a narrative plus the image prompts.
///
/// The model is instructed to return exactly 3 prompts; a deviating response
/// is taken as-is, with missing fields defaulting to empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    #[serde(default)]
    pub analysis: String,
    #[serde(default)]
    pub prompts: Vec<String>,
}

/// One product entry from the reverse-image-search provider.
///
/// Every field is taken verbatim when present and null otherwise.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ShoppingCandidate {
    pub title: Option<String>,
    pub link: Option<String>,
    pub source: Option<String>,
    pub price: Option<String>,
    pub thumbnail: Option<String>,
    pub tag: Option<String>,
}

impl ShoppingCandidate {
    /// Extracts a candidate from one `shopping_results` entry, tolerating
    /// absent or non-string fields.
    pub fn from_search_entry(entry: &serde_json::Value) -> Self {
        let field = |name: &str| {
            entry
                .get(name)
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        };

        Self {
            title: field("title"),
            link: field("link"),
            source: field("source"),
            price: field("price"),
            thumbnail: field("thumbnail"),
            tag: field("tag"),
        }
    }
}

/// A formatted social-style recommendation for one product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationPost {
    pub text: String,
    #[serde(default)]
    pub product_link: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// One element of a page's recommendation list.
///
/// Untagged so each variant serializes as a plain object: a post, a
/// formatting diagnostic that preserves the raw candidates, or a no-results
/// marker for a prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RecommendationEntry {
    Post(RecommendationPost),
    FormatFailure {
        error: String,
        raw_results: Vec<ShoppingCandidate>,
    },
    NoResults {
        message: String,
        prompt: String,
    },
}

impl RecommendationEntry {
    /// Diagnostic entry emitted when post formatting fails, carrying the
    /// candidates that could not be formatted.
    pub fn format_failure(raw_results: Vec<ShoppingCandidate>) -> Self {
        RecommendationEntry::FormatFailure {
            error: "Failed to format posts".to_string(),
            raw_results,
        }
    }

    /// Marker entry for a prompt whose image produced no shopping results.
    pub fn no_results(prompt: &str) -> Self {
        RecommendationEntry::NoResults {
            message: "No shopping results found for this image.".to_string(),
            prompt: prompt.to_string(),
        }
    }
}

/// One cached, immutable page of recommendations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationPage {
    pub user_analysis: String,
    pub recommendations: Vec<RecommendationEntry>,
    pub current_page: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
}

impl RecommendationPage {
    /// Explicit empty page returned when the requested page number falls
    /// outside the computed range. Not an error.
    pub fn empty(user_analysis: String, requested_page: i64, total_pages: i64) -> Self {
        Self {
            user_analysis,
            recommendations: Vec::new(),
            current_page: requested_page,
            total_pages,
            has_next_page: false,
        }
    }
}
