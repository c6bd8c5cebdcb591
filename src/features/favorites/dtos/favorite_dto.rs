use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::favorites::models::Favorite;

/// Response DTO for a favorite
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FavoriteResponseDto {
    pub id: Uuid,
    pub file_id: Uuid,
    pub org_id: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Favorite> for FavoriteResponseDto {
    fn from(favorite: Favorite) -> Self {
        Self {
            id: favorite.id,
            file_id: favorite.file_id,
            org_id: favorite.org_id,
            user_id: favorite.user_id,
            created_at: favorite.created_at,
        }
    }
}

/// Favorite state after a toggle
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToggleFavoriteResponseDto {
    pub file_id: Uuid,
    pub favorited: bool,
}
