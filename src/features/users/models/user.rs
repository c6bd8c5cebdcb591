use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::MembershipRelation;

/// Database row for users
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub token_identifier: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    #[allow(dead_code)]
    pub updated_at: DateTime<Utc>,
}

/// User record together with its membership snapshot
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub token_identifier: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub memberships: MembershipRelation,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn from_row(row: UserRow, memberships: MembershipRelation) -> Self {
        Self {
            id: row.id,
            token_identifier: row.token_identifier,
            name: row.name,
            image: row.image,
            memberships,
            created_at: row.created_at,
        }
    }
}

/// Data for creating a user from the provisioning hook
#[derive(Debug, Clone)]
pub struct NewUser {
    pub token_identifier: String,
    pub name: Option<String>,
    pub image: Option<String>,
}
