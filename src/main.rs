use std::sync::Arc;

use stylist_api::config::Config;
use stylist_api::db::{self, PgUserStore, RecommendationCache, RedisCache, UserStore};
use stylist_api::routes::{create_router, AppState};
use stylist_api::services::images::ImageService;
use stylist_api::services::media::MediaStore;
use stylist_api::services::providers::{
    BananaProvider, GeminiProvider, ImageGenerator, ProductSearcher, SerpApiProvider,
    TextGenerator,
};
use stylist_api::services::recommendations::RecommendationService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Storage backends
    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    let redis_client = db::create_redis_client(&config.redis_url)?;

    let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool));
    let cache: Arc<dyn RecommendationCache> =
        Arc::new(RedisCache::new(redis_client, config.cache_ttl_seconds));
    let media = Arc::new(MediaStore::new(
        config.media_root.as_str(),
        config.public_base_url.as_str(),
    ));

    // Upstream providers
    let text: Arc<dyn TextGenerator> = Arc::new(GeminiProvider::new(
        config.gemini_api_key,
        config.gemini_api_url,
        config.gemini_model,
    ));
    let generator: Arc<dyn ImageGenerator> = Arc::new(BananaProvider::new(
        config.banana_api_key,
        config.banana_model_key,
        config.banana_api_url,
    ));
    let search: Arc<dyn ProductSearcher> = Arc::new(SerpApiProvider::new(
        config.serpapi_api_key,
        config.serpapi_api_url,
        config.search_hl,
        config.search_gl,
    ));

    let images = ImageService::new(generator, media.clone());
    let recommendations = Arc::new(RecommendationService::new(
        users.clone(),
        cache,
        text,
        images,
        search,
    ));

    let state = AppState {
        users,
        media,
        recommendations,
    };
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "stylist-api listening");
    axum::serve(listener, app).await?;

    Ok(())
}
