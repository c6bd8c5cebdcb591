use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::users::dtos::{UserProfileDto, UserResponseDto};
use crate::features::users::services::UserService;
use crate::shared::types::ApiResponse;

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Account retrieved successfully", body = ApiResponse<UserResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No account provisioned for this identity")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let me = service.get_me(Some(&user.token_identifier)).await?;
    Ok(Json(ApiResponse::success(Some(me), None, None)))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/profile",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<UserProfileDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_user_profile(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserProfileDto>>> {
    let profile = service
        .get_user_profile(Some(&user.token_identifier), user_id)
        .await?;
    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}
