use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::MaybeAuthenticated;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::favorites::dtos::{FavoriteResponseDto, ToggleFavoriteResponseDto};
use crate::features::favorites::services::FavoriteService;
use crate::shared::types::{ApiResponse, Meta};

/// Toggle a favorite on a file
#[utoipa::path(
    post,
    path = "/api/files/{file_id}/favorite",
    tag = "favorites",
    params(
        ("file_id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "Favorite toggled", body = ApiResponse<ToggleFavoriteResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "No access to this file")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn toggle_favorite(
    user: AuthenticatedUser,
    State(service): State<Arc<FavoriteService>>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ToggleFavoriteResponseDto>>> {
    let toggled = service
        .toggle_favorite(Some(&user.token_identifier), file_id)
        .await?;

    Ok(Json(ApiResponse::success(Some(toggled), None, None)))
}

/// List the caller's favorites in an organization
///
/// `data` is null when the caller has no access to the organization.
#[utoipa::path(
    get,
    path = "/api/orgs/{org_id}/favorites",
    tag = "favorites",
    params(
        ("org_id" = String, Path, description = "Organization id or personal workspace id")
    ),
    responses(
        (status = 200, description = "Caller's favorites", body = ApiResponse<Vec<FavoriteResponseDto>>)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_favorites(
    caller: MaybeAuthenticated,
    State(service): State<Arc<FavoriteService>>,
    Path(org_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<FavoriteResponseDto>>>> {
    let favorites = service
        .list_favorites(caller.token_identifier(), &org_id)
        .await?;
    let meta = favorites.as_ref().map(|f| Meta::total(f.len()));

    Ok(Json(ApiResponse::success(favorites, None, meta)))
}
