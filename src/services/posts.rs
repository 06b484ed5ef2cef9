use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::{RecommendationPost, SearchFilters, ShoppingCandidate};
use crate::services::providers::TextGenerator;
use crate::services::{strip_code_fences, RESULTS_PER_PAGE};

/// Runs the post formatting stage for one prompt's shopping candidates.
///
/// Errors cover both a failed model call and an unparseable reply; the
/// orchestrator converts either into a diagnostic entry that preserves the
/// raw candidates instead of aborting the run.
pub async fn format_posts(
    generator: &dyn TextGenerator,
    user_analysis: &str,
    candidates: &[ShoppingCandidate],
    filters: Option<&SearchFilters>,
) -> AppResult<Vec<RecommendationPost>> {
    let prompt = build_format_prompt(user_analysis, candidates, filters);
    let reply = generator.generate(&prompt).await?;
    let posts = parse_posts_reply(&reply)?;

    tracing::info!(
        candidates = candidates.len(),
        posts = posts.len(),
        "Shopping results formatted"
    );

    Ok(posts)
}

/// Builds the formatting instruction around the analysis and the products.
pub fn build_format_prompt(
    user_analysis: &str,
    candidates: &[ShoppingCandidate],
    filters: Option<&SearchFilters>,
) -> String {
    let products_json = serde_json::to_string(candidates).unwrap_or_default();

    let filters_line = match filters {
        Some(filters) => format!(
            "And the search filters they chose: {}\n",
            serde_json::to_string(filters).unwrap_or_default()
        ),
        None => String::new(),
    };

    let traits_clause = match filters {
        Some(_) => {
            "referencing their personal traits (such as skin tone, body type, preferred style) \
             and the filters they chose"
        }
        None => "referencing their personal traits (such as skin tone, body type, preferred style)",
    };

    format!(
        r#"Based on the following user analysis: {analysis}
{filters_line}Here is a list of shopping products that were found: {products}

Write {count} engaging Instagram-style posts. For each post:
- Pick one product from the list.
- Write a short, persuasive caption explaining why this product suits the user, {traits_clause}.
- The post must include the product's original link (link) and its thumbnail image (thumbnail).
- The output must be JSON.

**Expected output (JSON):**
{{
    "posts": [
        {{
            "text": "We found this for you! A sleek blue shirt from store X. Its slim cut flatters an athletic build, and the color works with your skin tone. Perfect for a summer look.",
            "product_link": "https://example.com/product1",
            "image_url": "https://example.com/thumb1.jpg"
        }}
    ]
}}"#,
        analysis = user_analysis,
        filters_line = filters_line,
        products = products_json,
        count = RESULTS_PER_PAGE,
        traits_clause = traits_clause,
    )
}

#[derive(Deserialize)]
struct PostsEnvelope {
    #[serde(default)]
    posts: Vec<RecommendationPost>,
}

/// Fence-strips and parses the model's JSON reply into posts.
///
/// A reply that is valid JSON but lacks the "posts" key yields an empty
/// list rather than an error.
pub fn parse_posts_reply(reply: &str) -> AppResult<Vec<RecommendationPost>> {
    let cleaned = strip_code_fences(reply);
    let envelope: PostsEnvelope = serde_json::from_str(&cleaned).map_err(|_| AppError::Upstream {
        message: "Failed to format posts".to_string(),
        raw_response: Some(cleaned),
    })?;

    Ok(envelope.posts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockTextGenerator;
    use serde_json::json;

    fn sample_candidates() -> Vec<ShoppingCandidate> {
        vec![ShoppingCandidate {
            title: Some("Slim Fit Oxford Shirt".to_string()),
            link: Some("https://shop.example.com/oxford".to_string()),
            source: Some("Example Shop".to_string()),
            price: Some("$49.99".to_string()),
            thumbnail: Some("https://shop.example.com/oxford_thumb.jpg".to_string()),
            tag: None,
        }]
    }

    #[test]
    fn test_format_prompt_embeds_analysis_and_products() {
        let prompt = build_format_prompt("prefers warm tones", &sample_candidates(), None);

        assert!(prompt.contains("prefers warm tones"));
        assert!(prompt.contains("Slim Fit Oxford Shirt"));
        assert!(prompt.contains("Write 5 engaging Instagram-style posts"));
        assert!(!prompt.contains("filters they chose:"));
    }

    #[test]
    fn test_format_prompt_embeds_filters_when_present() {
        let mut filters = SearchFilters::new();
        filters.insert("color".to_string(), json!("navy"));

        let prompt = build_format_prompt("analysis", &sample_candidates(), Some(&filters));

        assert!(prompt.contains("search filters they chose: {\"color\":\"navy\"}"));
    }

    #[test]
    fn test_parse_posts_reply_fenced() {
        let reply = r#"```json
{"posts": [{"text": "great shirt", "product_link": "https://x", "image_url": "https://y"}]}
```"#;

        let posts = parse_posts_reply(reply).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].text, "great shirt");
    }

    #[test]
    fn test_parse_posts_reply_missing_key_is_empty() {
        let posts = parse_posts_reply("{\"unrelated\": true}").unwrap();
        assert!(posts.is_empty());
    }

    #[test]
    fn test_parse_posts_reply_invalid_json_is_an_error() {
        let err = parse_posts_reply("sorry, I cannot do that").unwrap_err();

        match err {
            AppError::Upstream { message, .. } => assert_eq!(message, "Failed to format posts"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_format_posts_happy_path() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().returning(|_| {
            Ok(r#"{"posts": [{"text": "pick this"}, {"text": "or this"}]}"#.to_string())
        });

        let posts = format_posts(&generator, "analysis", &sample_candidates(), None)
            .await
            .unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[1].text, "or this");
    }
}
