use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::files::models::{File, NewFile};

/// Storage for file records, indexed by org id and by the soft-delete flag
#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn insert(&self, new_file: NewFile) -> Result<File>;

    async fn get(&self, id: Uuid) -> Result<Option<File>>;

    async fn list_by_org(&self, org_id: &str) -> Result<Vec<File>>;

    async fn list_marked_as_deleted(&self) -> Result<Vec<File>>;

    /// Flip the soft-delete flag only if it currently holds the opposite value.
    ///
    /// Returns the updated record, or `None` when the file is missing or already in
    /// the requested state.
    async fn set_marked_as_deleted(&self, id: Uuid, marked: bool) -> Result<Option<File>>;

    /// Remove the record only while it is soft-deleted. Returns whether a row was removed.
    async fn delete_if_marked(&self, id: Uuid) -> Result<bool>;
}

pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn insert(&self, new_file: NewFile) -> Result<File> {
        let file = sqlx::query_as::<_, File>(
            r#"
            INSERT INTO files (name, file_type, org_id, user_id, blob_ref)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, file_type, org_id, user_id, blob_ref, marked_as_deleted, created_at
            "#,
        )
        .bind(&new_file.name)
        .bind(new_file.file_type)
        .bind(&new_file.org_id)
        .bind(new_file.user_id)
        .bind(&new_file.blob_ref)
        .fetch_one(&self.pool)
        .await?;

        Ok(file)
    }

    async fn get(&self, id: Uuid) -> Result<Option<File>> {
        let file = sqlx::query_as::<_, File>(
            r#"
            SELECT id, name, file_type, org_id, user_id, blob_ref, marked_as_deleted, created_at
            FROM files
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    async fn list_by_org(&self, org_id: &str) -> Result<Vec<File>> {
        let files = sqlx::query_as::<_, File>(
            r#"
            SELECT id, name, file_type, org_id, user_id, blob_ref, marked_as_deleted, created_at
            FROM files
            WHERE org_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }

    async fn list_marked_as_deleted(&self) -> Result<Vec<File>> {
        let files = sqlx::query_as::<_, File>(
            r#"
            SELECT id, name, file_type, org_id, user_id, blob_ref, marked_as_deleted, created_at
            FROM files
            WHERE marked_as_deleted = TRUE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }

    async fn set_marked_as_deleted(&self, id: Uuid, marked: bool) -> Result<Option<File>> {
        let file = sqlx::query_as::<_, File>(
            r#"
            UPDATE files
            SET marked_as_deleted = $2
            WHERE id = $1 AND marked_as_deleted = NOT $2
            RETURNING id, name, file_type, org_id, user_id, blob_ref, marked_as_deleted, created_at
            "#,
        )
        .bind(id)
        .bind(marked)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    async fn delete_if_marked(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM files
            WHERE id = $1 AND marked_as_deleted = TRUE
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
