use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::users::models::{
    Membership, MembershipRelation, NewUser, OrgRole, User, UserRow,
};

/// Storage for users and their organization memberships
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_token(&self, token_identifier: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Insert the user, or return the existing record for the same token
    async fn create_if_absent(&self, new_user: NewUser) -> Result<User>;

    /// Overwrite the provided profile fields; `None` keeps the stored value
    async fn update_profile(
        &self,
        token_identifier: &str,
        name: Option<String>,
        image: Option<String>,
    ) -> Result<Option<User>>;

    /// Set the user's role in `org_id` and return the resulting membership snapshot
    async fn upsert_membership(
        &self,
        user_id: Uuid,
        org_id: &str,
        role: OrgRole,
    ) -> Result<MembershipRelation>;

    /// Drop the user's membership in `org_id` and return the resulting snapshot
    async fn remove_membership(&self, user_id: Uuid, org_id: &str) -> Result<MembershipRelation>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn memberships(&self, user_id: Uuid) -> Result<MembershipRelation> {
        let rows = sqlx::query_as::<_, Membership>(
            r#"
            SELECT org_id, role
            FROM memberships
            WHERE user_id = $1
            ORDER BY org_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(MembershipRelation::new(rows))
    }

    /// Current snapshot, read after taking a row lock on the user so membership
    /// writes for the same user apply one at a time
    async fn locked_memberships(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> Result<MembershipRelation> {
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .execute(&mut **tx)
            .await?;

        let rows = sqlx::query_as::<_, Membership>(
            r#"
            SELECT org_id, role
            FROM memberships
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(MembershipRelation::new(rows))
    }

    async fn hydrate(&self, row: Option<UserRow>) -> Result<Option<User>> {
        match row {
            Some(row) => {
                let memberships = self.memberships(row.id).await?;
                Ok(Some(User::from_row(row, memberships)))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_token(&self, token_identifier: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT * FROM users
            WHERE token_identifier = $1
            "#,
        )
        .bind(token_identifier)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate(row).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT * FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate(row).await
    }

    async fn create_if_absent(&self, new_user: NewUser) -> Result<User> {
        // The no-op update makes RETURNING yield the existing row on conflict
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (token_identifier, name, image)
            VALUES ($1, $2, $3)
            ON CONFLICT (token_identifier)
            DO UPDATE SET token_identifier = EXCLUDED.token_identifier
            RETURNING *
            "#,
        )
        .bind(&new_user.token_identifier)
        .bind(&new_user.name)
        .bind(&new_user.image)
        .fetch_one(&self.pool)
        .await?;

        let memberships = self.memberships(row.id).await?;
        Ok(User::from_row(row, memberships))
    }

    async fn update_profile(
        &self,
        token_identifier: &str,
        name: Option<String>,
        image: Option<String>,
    ) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                image = COALESCE($3, image),
                updated_at = NOW()
            WHERE token_identifier = $1
            RETURNING *
            "#,
        )
        .bind(token_identifier)
        .bind(name)
        .bind(image)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate(row).await
    }

    async fn upsert_membership(
        &self,
        user_id: Uuid,
        org_id: &str,
        role: OrgRole,
    ) -> Result<MembershipRelation> {
        let mut tx = self.pool.begin().await?;
        let current = Self::locked_memberships(&mut tx, user_id).await?;

        sqlx::query(
            r#"
            INSERT INTO memberships (user_id, org_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, org_id) DO UPDATE SET role = EXCLUDED.role
            "#,
        )
        .bind(user_id)
        .bind(org_id)
        .bind(role)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(current.with_membership(org_id, role))
    }

    async fn remove_membership(&self, user_id: Uuid, org_id: &str) -> Result<MembershipRelation> {
        let mut tx = self.pool.begin().await?;
        let current = Self::locked_memberships(&mut tx, user_id).await?;

        sqlx::query(
            r#"
            DELETE FROM memberships
            WHERE user_id = $1 AND org_id = $2
            "#,
        )
        .bind(user_id)
        .bind(org_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(current.without_org(org_id))
    }
}
