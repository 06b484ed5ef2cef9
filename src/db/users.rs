use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::UserProfile;

/// Persistence for user profiles.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, profile: &UserProfile) -> AppResult<()>;
    async fn get(&self, user_id: Uuid) -> AppResult<Option<UserProfile>>;
}

/// PostgreSQL-backed user store.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, profile: &UserProfile) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_profiles
                (id, username, email, height, weight, skin_color, age, gender,
                 body_type, style_preference, budget, profile_picture, phone, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(profile.id)
        .bind(&profile.username)
        .bind(&profile.email)
        .bind(profile.height)
        .bind(profile.weight)
        .bind(&profile.skin_color)
        .bind(profile.age)
        .bind(&profile.gender)
        .bind(&profile.body_type)
        .bind(&profile.style_preference)
        .bind(&profile.budget)
        .bind(&profile.profile_picture)
        .bind(&profile.phone)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, username, email, height, weight, skin_color, age, gender,
                   body_type, style_preference, budget, profile_picture, phone, created_at
            FROM user_profiles
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }
}

/// In-process user store for tests and local runs without PostgreSQL.
#[derive(Default)]
pub struct MemoryUserStore {
    profiles: RwLock<HashMap<Uuid, UserProfile>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, profile: &UserProfile) -> AppResult<()> {
        let mut profiles = self.profiles.write().await;
        profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(&user_id).cloned())
    }
}
