use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::favorites::models::{Favorite, FavoriteKey};

/// Storage for favorites, indexed by (user, org, file)
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    async fn find(&self, key: FavoriteKey<'_>) -> Result<Option<Favorite>>;

    /// Insert unless the key already exists. Returns whether a row was added.
    async fn insert(&self, key: FavoriteKey<'_>) -> Result<bool>;

    /// Returns whether a row was removed
    async fn delete(&self, key: FavoriteKey<'_>) -> Result<bool>;

    async fn list_for_user_in_org(&self, user_id: Uuid, org_id: &str) -> Result<Vec<Favorite>>;
}

pub struct PgFavoriteRepository {
    pool: PgPool,
}

impl PgFavoriteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoriteRepository for PgFavoriteRepository {
    async fn find(&self, key: FavoriteKey<'_>) -> Result<Option<Favorite>> {
        let favorite = sqlx::query_as::<_, Favorite>(
            r#"
            SELECT id, file_id, org_id, user_id, created_at
            FROM favorites
            WHERE user_id = $1 AND org_id = $2 AND file_id = $3
            "#,
        )
        .bind(key.user_id)
        .bind(key.org_id)
        .bind(key.file_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(favorite)
    }

    async fn insert(&self, key: FavoriteKey<'_>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO favorites (user_id, org_id, file_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, org_id, file_id) DO NOTHING
            "#,
        )
        .bind(key.user_id)
        .bind(key.org_id)
        .bind(key.file_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, key: FavoriteKey<'_>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM favorites
            WHERE user_id = $1 AND org_id = $2 AND file_id = $3
            "#,
        )
        .bind(key.user_id)
        .bind(key.org_id)
        .bind(key.file_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_user_in_org(&self, user_id: Uuid, org_id: &str) -> Result<Vec<Favorite>> {
        let favorites = sqlx::query_as::<_, Favorite>(
            r#"
            SELECT id, file_id, org_id, user_id, created_at
            FROM favorites
            WHERE user_id = $1 AND org_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(favorites)
    }
}
