use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for favorites: a user starred a file within an org
#[derive(Debug, Clone, FromRow)]
pub struct Favorite {
    pub id: Uuid,
    pub file_id: Uuid,
    pub org_id: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Identity of a favorite; at most one record exists per key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FavoriteKey<'a> {
    pub user_id: Uuid,
    pub org_id: &'a str,
    pub file_id: Uuid,
}
