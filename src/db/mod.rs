pub mod cache;
pub mod postgres;
pub mod users;

pub use cache::{create_redis_client, MemoryCache, PageKey, RecommendationCache, RedisCache};
pub use postgres::{create_pool, run_migrations};
pub use users::{MemoryUserStore, PgUserStore, UserStore};
