use async_trait::async_trait;
use redis::AsyncCommands;
use redis::Client;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Display;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::error::AppResult;
use crate::models::{RecommendationPage, SearchFilters};

/// Creates a Redis client for caching
///
/// Establishes a connection to Redis for fast data caching.
/// Uses connection pooling via the connection-manager feature.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Deterministic fingerprint of a filter set.
///
/// Filters are serialized through a sorted map, so two logically equal
/// filter sets hash identically regardless of insertion order.
pub fn hash_filters(filters: &SearchFilters) -> String {
    let canonical = serde_json::to_string(filters).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Identifies one page within a user's cached recommendation set.
///
/// Basic pages are keyed by page number alone. Filtered pages carry the
/// filter fingerprint so differently-filtered runs never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageKey {
    Basic { page: i64 },
    Filtered { filters_hash: String, page: i64 },
}

impl PageKey {
    pub fn basic(page: i64) -> Self {
        PageKey::Basic { page }
    }

    pub fn filtered(filters: &SearchFilters, page: i64) -> Self {
        PageKey::Filtered {
            filters_hash: hash_filters(filters),
            page,
        }
    }

    /// Picks the keyspace from the presence of filters.
    pub fn for_request(filters: Option<&SearchFilters>, page: i64) -> Self {
        match filters {
            Some(filters) => Self::filtered(filters, page),
            None => Self::basic(page),
        }
    }

    /// Same keyspace, different page number.
    pub fn with_page(&self, page: i64) -> Self {
        match self {
            PageKey::Basic { .. } => PageKey::Basic { page },
            PageKey::Filtered { filters_hash, .. } => PageKey::Filtered {
                filters_hash: filters_hash.clone(),
                page,
            },
        }
    }

    pub fn page(&self) -> i64 {
        match self {
            PageKey::Basic { page } | PageKey::Filtered { page, .. } => *page,
        }
    }
}

impl Display for PageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageKey::Basic { page } => write!(f, "{}", page),
            PageKey::Filtered { filters_hash, page } => {
                write!(f, "advanced_search_{}_{}", filters_hash, page)
            }
        }
    }
}

fn full_key(user_id: Uuid, key: &PageKey) -> String {
    format!("rec:{}_{}", user_id, key)
}

fn user_prefix(user_id: Uuid) -> String {
    format!("rec:{}_", user_id)
}

/// Storage for assembled recommendation pages.
///
/// Every key is namespaced under its user, so one call can drop a user's
/// entire cached result set when their profile or filters change.
#[async_trait]
pub trait RecommendationCache: Send + Sync {
    /// Retrieves a cached page, or `None` on a miss.
    async fn get(&self, user_id: Uuid, key: &PageKey) -> AppResult<Option<RecommendationPage>>;

    /// Stores a page under the user's namespace with the backend's TTL.
    async fn set(&self, user_id: Uuid, key: &PageKey, page: &RecommendationPage) -> AppResult<()>;

    /// Removes every cached page for the user, returning how many were dropped.
    async fn invalidate_user(&self, user_id: Uuid) -> AppResult<u64>;
}

/// Redis-backed page cache
///
/// Pages are stored as JSON strings under `rec:{user_id}_{page_key}` with
/// a fixed expiry, so stale recommendations age out even if invalidation
/// is never requested.
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
    ttl_seconds: u64,
}

impl RedisCache {
    pub fn new(client: Client, ttl_seconds: u64) -> Self {
        Self {
            client,
            ttl_seconds,
        }
    }
}

#[async_trait]
impl RecommendationCache for RedisCache {
    async fn get(&self, user_id: Uuid, key: &PageKey) -> AppResult<Option<RecommendationPage>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(full_key(user_id, key)).await?;

        match cached {
            Some(json) => {
                let page = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(page))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, user_id: Uuid, key: &PageKey, page: &RecommendationPage) -> AppResult<()> {
        let json = serde_json::to_string(page)
            .map_err(|e| AppError::Internal(format!("Cache serialization error: {}", e)))?;

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn
            .set_ex(full_key(user_id, key), json, self.ttl_seconds)
            .await?;
        Ok(())
    }

    async fn invalidate_user(&self, user_id: Uuid) -> AppResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let pattern = format!("{}*", user_prefix(user_id));

        // The scan iterator borrows the connection, so collect before deleting.
        let mut keys: Vec<String> = Vec::new();
        {
            let mut iter: redis::AsyncIter<String> = conn.scan_match(&pattern).await?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }

        if keys.is_empty() {
            return Ok(0);
        }

        let deleted: u64 = conn.del(keys).await?;
        Ok(deleted)
    }
}

struct MemoryEntry {
    json: String,
    expires_at: Option<Instant>,
}

/// In-process page cache
///
/// Entries are held as serialized JSON so reads behave exactly like a
/// Redis round trip. Useful for tests and for running without Redis.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, MemoryEntry>>,
    ttl: Option<Duration>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }
}

#[async_trait]
impl RecommendationCache for MemoryCache {
    async fn get(&self, user_id: Uuid, key: &PageKey) -> AppResult<Option<RecommendationPage>> {
        let entries = self.entries.read().await;
        let entry = match entries.get(&full_key(user_id, key)) {
            Some(entry) => entry,
            None => return Ok(None),
        };

        // An expired entry is a miss, matching Redis expiry semantics.
        if let Some(expires_at) = entry.expires_at {
            if expires_at <= Instant::now() {
                return Ok(None);
            }
        }

        let page = serde_json::from_str(&entry.json)
            .map_err(|e| AppError::Internal(format!("Cache deserialization error: {}", e)))?;
        Ok(Some(page))
    }

    async fn set(&self, user_id: Uuid, key: &PageKey, page: &RecommendationPage) -> AppResult<()> {
        let json = serde_json::to_string(page)
            .map_err(|e| AppError::Internal(format!("Cache serialization error: {}", e)))?;

        let entry = MemoryEntry {
            json,
            expires_at: self.ttl.map(|ttl| Instant::now() + ttl),
        };

        let mut entries = self.entries.write().await;
        entries.insert(full_key(user_id, key), entry);
        Ok(())
    }

    async fn invalidate_user(&self, user_id: Uuid) -> AppResult<u64> {
        let prefix = user_prefix(user_id);
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(&prefix));
        Ok((before - entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecommendationEntry;
    use serde_json::json;

    fn sample_filters() -> SearchFilters {
        let mut filters = SearchFilters::new();
        filters.insert("color".to_string(), json!("navy"));
        filters.insert("max_price".to_string(), json!(120));
        filters
    }

    fn sample_page() -> RecommendationPage {
        RecommendationPage {
            user_analysis: "Prefers minimal silhouettes in neutral tones".to_string(),
            recommendations: vec![RecommendationEntry::no_results("linen overshirt")],
            current_page: 1,
            total_pages: 2,
            has_next_page: true,
        }
    }

    #[test]
    fn test_page_key_display_basic() {
        let key = PageKey::basic(3);
        assert_eq!(format!("{}", key), "3");
    }

    #[test]
    fn test_page_key_display_filtered() {
        let filters = sample_filters();
        let key = PageKey::filtered(&filters, 2);
        let rendered = format!("{}", key);

        assert!(rendered.starts_with("advanced_search_"));
        assert!(rendered.ends_with("_2"));
        // 64 hex chars plus the surrounding literal segments.
        assert_eq!(rendered.len(), "advanced_search_".len() + 64 + "_2".len());
    }

    #[test]
    fn test_filters_hash_ignores_insertion_order() {
        let mut a = SearchFilters::new();
        a.insert("color".to_string(), json!("navy"));
        a.insert("max_price".to_string(), json!(120));

        let mut b = SearchFilters::new();
        b.insert("max_price".to_string(), json!(120));
        b.insert("color".to_string(), json!("navy"));

        assert_eq!(hash_filters(&a), hash_filters(&b));
    }

    #[test]
    fn test_filters_hash_differs_for_different_filters() {
        let mut a = SearchFilters::new();
        a.insert("color".to_string(), json!("navy"));

        let mut b = SearchFilters::new();
        b.insert("color".to_string(), json!("olive"));

        assert_ne!(hash_filters(&a), hash_filters(&b));
    }

    #[test]
    fn test_for_request_picks_keyspace() {
        let filters = sample_filters();

        assert_eq!(PageKey::for_request(None, 1), PageKey::basic(1));
        assert_eq!(
            PageKey::for_request(Some(&filters), 1),
            PageKey::filtered(&filters, 1)
        );
    }

    #[test]
    fn test_with_page_keeps_keyspace() {
        let filters = sample_filters();
        let key = PageKey::filtered(&filters, 1);
        let moved = key.with_page(4);

        assert_eq!(moved.page(), 4);
        assert_eq!(moved, PageKey::filtered(&filters, 4));

        let basic = PageKey::basic(1).with_page(9);
        assert_eq!(basic, PageKey::basic(9));
    }

    #[test]
    fn test_full_key_namespaces_by_user() {
        let user_id = Uuid::nil();
        let key = PageKey::basic(1);

        assert_eq!(
            full_key(user_id, &key),
            "rec:00000000-0000-0000-0000-000000000000_1"
        );
    }

    #[tokio::test]
    async fn test_memory_cache_round_trip() {
        let cache = MemoryCache::new();
        let user_id = Uuid::new_v4();
        let key = PageKey::basic(1);
        let page = sample_page();

        cache.set(user_id, &key, &page).await.unwrap();
        let retrieved = cache.get(user_id, &key).await.unwrap();

        assert_eq!(retrieved, Some(page));
    }

    #[tokio::test]
    async fn test_memory_cache_miss() {
        let cache = MemoryCache::new();
        let retrieved = cache.get(Uuid::new_v4(), &PageKey::basic(1)).await.unwrap();

        assert_eq!(retrieved, None);
    }

    #[tokio::test]
    async fn test_memory_cache_invalidate_user_leaves_other_users() {
        let cache = MemoryCache::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let page = sample_page();

        cache.set(first, &PageKey::basic(1), &page).await.unwrap();
        cache.set(first, &PageKey::basic(2), &page).await.unwrap();
        cache.set(second, &PageKey::basic(1), &page).await.unwrap();

        let dropped = cache.invalidate_user(first).await.unwrap();
        assert_eq!(dropped, 2);

        assert_eq!(cache.get(first, &PageKey::basic(1)).await.unwrap(), None);
        assert!(cache.get(second, &PageKey::basic(1)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_memory_cache_expired_entry_is_miss() {
        let cache = MemoryCache::with_ttl(Duration::ZERO);
        let user_id = Uuid::new_v4();
        let key = PageKey::basic(1);

        cache.set(user_id, &key, &sample_page()).await.unwrap();
        let retrieved = cache.get(user_id, &key).await.unwrap();

        assert_eq!(retrieved, None);
    }
}
