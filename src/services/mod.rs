pub mod analysis;
pub mod images;
pub mod media;
pub mod posts;
pub mod profile;
pub mod providers;
pub mod recommendations;

/// Recommendation entries per cached page.
pub const RESULTS_PER_PAGE: usize = 5;

/// Clothing prompts requested from the analysis model per run.
pub const PROMPT_COUNT: usize = 3;

/// Strips markdown code fences from a model reply.
///
/// Models routinely wrap JSON in ```json fences even when asked for bare
/// JSON. Fence markers are removed wherever they appear and the remainder
/// is trimmed.
pub fn strip_code_fences(reply: &str) -> String {
    reply.replace("```json", "").replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences_fenced_json() {
        let reply = "```json\n{\"analysis\": \"ok\"}\n```";
        assert_eq!(strip_code_fences(reply), "{\"analysis\": \"ok\"}");
    }

    #[test]
    fn test_strip_code_fences_bare_fences() {
        let reply = "```\n{\"posts\": []}\n```";
        assert_eq!(strip_code_fences(reply), "{\"posts\": []}");
    }

    #[test]
    fn test_strip_code_fences_untouched_reply() {
        let reply = "{\"prompts\": []}";
        assert_eq!(strip_code_fences(reply), reply);
    }

    #[test]
    fn test_strip_code_fences_interior_fence() {
        // Fences are stripped wherever they appear, not only at the edges.
        let reply = "prefix ```json{\"a\":1}``` suffix";
        assert_eq!(strip_code_fences(reply), "prefix {\"a\":1} suffix");
    }
}
