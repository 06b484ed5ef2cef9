use std::sync::Arc;

use uuid::Uuid;

use crate::db::{PageKey, RecommendationCache, UserStore};
use crate::error::{AppError, AppResult};
use crate::models::{RecommendationEntry, RecommendationPage, SearchFilters};
use crate::services::analysis::generate_analysis;
use crate::services::images::ImageService;
use crate::services::posts::format_posts;
use crate::services::providers::{ProductSearcher, TextGenerator};
use crate::services::RESULTS_PER_PAGE;

const CACHE_MISS_MESSAGE: &str =
    "No cached recommendations found. Please trigger generation via POST request.";

/// Runs the full recommendation pipeline and serves its cached pages.
///
/// One generation pass produces every page for the user up front; reads
/// and invalidation only ever touch the cache.
pub struct RecommendationService {
    users: Arc<dyn UserStore>,
    cache: Arc<dyn RecommendationCache>,
    text: Arc<dyn TextGenerator>,
    images: ImageService,
    search: Arc<dyn ProductSearcher>,
}

impl RecommendationService {
    pub fn new(
        users: Arc<dyn UserStore>,
        cache: Arc<dyn RecommendationCache>,
        text: Arc<dyn TextGenerator>,
        images: ImageService,
        search: Arc<dyn ProductSearcher>,
    ) -> Self {
        Self {
            users,
            cache,
            text,
            images,
            search,
        }
    }

    /// Generates recommendations for a user and returns the requested page.
    ///
    /// Passing filters switches the run to the filtered cache namespace and
    /// threads the filters through both text-generation stages. A requested
    /// page outside the computed range yields an explicit empty page, not an
    /// error.
    pub async fn recommend(
        &self,
        user_id: Uuid,
        location: &str,
        filters: Option<&SearchFilters>,
        page: i64,
    ) -> AppResult<RecommendationPage> {
        // 1. Resolve the user
        let profile = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        // 2. Serve from cache when this page was already generated
        let key = PageKey::for_request(filters, page);
        if let Some(cached) = self.cache.get(user_id, &key).await? {
            tracing::info!(user_id = %user_id, page, "Returning cached recommendation page");
            return Ok(cached);
        }

        tracing::info!(
            user_id = %user_id,
            page,
            filtered = filters.is_some(),
            "Starting recommendation generation"
        );

        // 3. Profile analysis and image prompts
        let analysis = generate_analysis(self.text.as_ref(), &profile, location, filters).await?;

        // 4. Image, search and formatting stages, one prompt at a time.
        // The upstream providers rate limit per key, so prompts run
        // sequentially.
        let mut recommendations = Vec::new();
        for prompt in &analysis.prompts {
            let entries = self
                .entries_for_prompt(&analysis.analysis, prompt, filters)
                .await;
            recommendations.extend(entries);
        }

        tracing::info!(
            total = recommendations.len(),
            "Recommendation entries assembled"
        );

        // 5. Chunk into pages and cache every one of them
        let total_pages = recommendations.len().div_ceil(RESULTS_PER_PAGE) as i64;
        let mut pages = Vec::new();

        for (index, chunk) in recommendations.chunks(RESULTS_PER_PAGE).enumerate() {
            let current_page = index as i64 + 1;
            let page = RecommendationPage {
                user_analysis: analysis.analysis.clone(),
                recommendations: chunk.to_vec(),
                current_page,
                total_pages,
                has_next_page: current_page < total_pages,
            };

            self.cache
                .set(user_id, &key.with_page(current_page), &page)
                .await?;
            pages.push(page);
        }

        tracing::info!(
            user_id = %user_id,
            pages = pages.len(),
            "Recommendation pages cached"
        );

        // 6. Hand back the page that was asked for
        if page >= 1 && page <= total_pages {
            Ok(pages[(page - 1) as usize].clone())
        } else {
            Ok(RecommendationPage::empty(analysis.analysis, page, total_pages))
        }
    }

    /// Serves a previously generated page straight from the cache.
    ///
    /// Never triggers generation; a miss is reported as not found so the
    /// caller knows to POST first.
    pub async fn cached_page(&self, user_id: Uuid, page: i64) -> AppResult<RecommendationPage> {
        match self.cache.get(user_id, &PageKey::basic(page)).await? {
            Some(cached) => Ok(cached),
            None => Err(AppError::NotFound(CACHE_MISS_MESSAGE.to_string())),
        }
    }

    /// Drops every cached page for the user, returning how many were removed.
    pub async fn invalidate_user(&self, user_id: Uuid) -> AppResult<u64> {
        let invalidated = self.cache.invalidate_user(user_id).await?;

        tracing::info!(user_id = %user_id, invalidated, "Cached recommendations invalidated");

        Ok(invalidated)
    }

    /// Produces the entries one prompt contributes to the result list.
    ///
    /// Downstream stage failures degrade into diagnostic entries so a single
    /// bad prompt cannot sink the whole run.
    async fn entries_for_prompt(
        &self,
        user_analysis: &str,
        prompt: &str,
        filters: Option<&SearchFilters>,
    ) -> Vec<RecommendationEntry> {
        let image_url = match self.images.produce_image_url(prompt).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "Image pipeline failed for prompt");
                return vec![RecommendationEntry::no_results(prompt)];
            }
        };

        let candidates = match self.search.search_by_image(&image_url).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(error = %e, "Reverse image search failed");
                Vec::new()
            }
        };

        if candidates.is_empty() {
            return vec![RecommendationEntry::no_results(prompt)];
        }

        match format_posts(self.text.as_ref(), user_analysis, &candidates, filters).await {
            Ok(posts) => posts.into_iter().map(RecommendationEntry::Post).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Post formatting failed, keeping raw candidates");
                vec![RecommendationEntry::format_failure(candidates)]
            }
        }
    }
}
