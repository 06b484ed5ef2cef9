use crate::error::{AppError, AppResult};
use crate::models::{describe_filters, AnalysisResult, SearchFilters, UserProfile};
use crate::services::providers::TextGenerator;
use crate::services::{strip_code_fences, PROMPT_COUNT};

/// Runs the profile analysis stage: one model call that produces the user
/// narrative and the clothing prompts driving the rest of the pipeline.
///
/// A failed call or an unparseable reply is terminal for the request; there
/// is nothing downstream stages could do without prompts.
pub async fn generate_analysis(
    generator: &dyn TextGenerator,
    profile: &UserProfile,
    location: &str,
    filters: Option<&SearchFilters>,
) -> AppResult<AnalysisResult> {
    let prompt = build_analysis_prompt(profile, location, filters);
    let reply = generator.generate(&prompt).await?;
    let result = parse_analysis_reply(&reply)?;

    tracing::info!(
        user_id = %profile.id,
        prompts = result.prompts.len(),
        filtered = filters.is_some(),
        "User analysis generated"
    );

    Ok(result)
}

/// Builds the analysis instruction around the user's attributes.
///
/// When filters are present they are embedded as requirements, which is the
/// only difference between the basic and the filtered variant.
pub fn build_analysis_prompt(
    profile: &UserProfile,
    location: &str,
    filters: Option<&SearchFilters>,
) -> String {
    let mut profile_lines = vec![
        format!("- Height: {} cm", optional_number(profile.height)),
        format!("- Weight: {} kg", optional_number(profile.weight)),
        format!("- Skin tone: {}", optional_text(&profile.skin_color)),
        format!("- Location: {}", location),
    ];
    push_if_present(&mut profile_lines, "Age", &profile.age.map(|a| a.to_string()));
    push_if_present(&mut profile_lines, "Gender", &profile.gender);
    push_if_present(&mut profile_lines, "Body type", &profile.body_type);
    push_if_present(&mut profile_lines, "Style preference", &profile.style_preference);
    push_if_present(&mut profile_lines, "Budget", &profile.budget);

    let filters_section = match filters {
        Some(filters) => format!(
            "\n**Requested search filters:**\n{}\n",
            describe_filters(filters)
        ),
        None => String::new(),
    };

    let styling_task = match filters {
        Some(_) => format!(
            "2. Combine the requested search filters with the user analysis to choose {} \
             fashion directions that satisfy both, as varied as the filters allow.",
            PROMPT_COUNT
        ),
        None => format!(
            "2. Taking the location into account (it can affect weather and culture), \
             suggest {} different fashion styles that could suit this user \
             (for example: classic, modern, sporty, bohemian).",
            PROMPT_COUNT
        ),
    };

    format!(
        r#"Comprehensive user analysis for fashion recommendations:

**User profile:**
{profile}
{filters}
**Task:**
1. Based on the profile, analyze the user's body type (slim, average, athletic, full) and the color theory suiting their skin tone.
{styling_task}
3. For each direction, write one precise, detailed text prompt for generating an image of a single clothing item (no model wearing it) representing that direction. Each prompt must be directly usable by an image generation model.

**Image prompt requirements:**
- Describe only the clothing item (for example: "shirt", "trousers", "dress").
- The background must be simple and neutral (for example: "light gray studio background").
- The image must be photorealistic.
- Specify exact colors and fabric types.
- Produce {count} different prompts for {count} different clothing items.

**Expected output (JSON):**
{{
    "analysis": "The user has an average build and above-average height. Warm colors such as beige and olive suit their skin tone. Their location suggests light summer clothing.",
    "prompts": [
        "A photorealistic image of beige men's chino trousers, straight cut, made of lightweight cotton, shown on a light gray studio background.",
        "A photorealistic image of a white polo shirt, slim fit, made of pique fabric, shown on a light gray studio background.",
        "A photorealistic image of an olive bomber jacket, made of nylon, shown on a light gray studio background."
    ]
}}"#,
        profile = profile_lines.join("\n"),
        filters = filters_section,
        styling_task = styling_task,
        count = PROMPT_COUNT,
    )
}

/// Fence-strips and parses the model's JSON reply.
pub fn parse_analysis_reply(reply: &str) -> AppResult<AnalysisResult> {
    let cleaned = strip_code_fences(reply);
    serde_json::from_str(&cleaned).map_err(|_| AppError::Upstream {
        message: "Failed to parse AI model response.".to_string(),
        raw_response: Some(cleaned),
    })
}

fn optional_number(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "not specified".to_string(),
    }
}

fn optional_text(value: &Option<String>) -> String {
    match value {
        Some(v) => v.clone(),
        None => "not specified".to_string(),
    }
}

fn push_if_present(lines: &mut Vec<String>, label: &str, value: &Option<String>) {
    if let Some(value) = value {
        lines.push(format!("- {}: {}", label, value));
    }
}
