use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::users::dtos::{
    AddMembershipDto, CreateUserDto, MembershipsResponseDto, RemoveMembershipDto,
    UpdateUserDto, UserResponseDto,
};
use crate::features::users::services::UserService;
use crate::shared::types::ApiResponse;

/// Identity provider hook: user created
#[utoipa::path(
    post,
    path = "/internal/users",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User provisioned (or already present)", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid provisioning credentials")
    ),
    tag = "provisioning",
    security(
        ("basic_auth" = [])
    )
)]
pub async fn create_user(
    State(service): State<Arc<UserService>>,
    AppJson(dto): AppJson<CreateUserDto>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = service.create_user(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(user), None, None)),
    ))
}

/// Identity provider hook: user profile changed
#[utoipa::path(
    put,
    path = "/internal/users",
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid provisioning credentials"),
        (status = 404, description = "User not found")
    ),
    tag = "provisioning",
    security(
        ("basic_auth" = [])
    )
)]
pub async fn update_user(
    State(service): State<Arc<UserService>>,
    AppJson(dto): AppJson<UpdateUserDto>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = service.update_user(dto).await?;
    Ok(Json(ApiResponse::success(Some(user), None, None)))
}

/// Identity provider hook: membership created or role changed
#[utoipa::path(
    post,
    path = "/internal/memberships",
    request_body = AddMembershipDto,
    responses(
        (status = 200, description = "Membership set", body = ApiResponse<MembershipsResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid provisioning credentials"),
        (status = 404, description = "User not found")
    ),
    tag = "provisioning",
    security(
        ("basic_auth" = [])
    )
)]
pub async fn add_membership(
    State(service): State<Arc<UserService>>,
    AppJson(dto): AppJson<AddMembershipDto>,
) -> Result<Json<ApiResponse<MembershipsResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let snapshot = service.add_org_to_user(dto).await?;
    Ok(Json(ApiResponse::success(Some(snapshot), None, None)))
}

/// Identity provider hook: membership deleted
#[utoipa::path(
    delete,
    path = "/internal/memberships",
    request_body = RemoveMembershipDto,
    responses(
        (status = 200, description = "Membership removed", body = ApiResponse<MembershipsResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid provisioning credentials"),
        (status = 404, description = "User not found")
    ),
    tag = "provisioning",
    security(
        ("basic_auth" = [])
    )
)]
pub async fn remove_membership(
    State(service): State<Arc<UserService>>,
    AppJson(dto): AppJson<RemoveMembershipDto>,
) -> Result<Json<ApiResponse<MembershipsResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let snapshot = service.remove_org_from_user(dto).await?;
    Ok(Json(ApiResponse::success(Some(snapshot), None, None)))
}

#[cfg(test)]
mod tests {
    use crate::features::users::{provisioning_routes, UserService};
    use crate::shared::test_helpers::InMemoryStore;
    use axum::http::{header, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use base64::prelude::*;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn server(store: &Arc<InMemoryStore>) -> TestServer {
        let service = Arc::new(UserService::new(store.clone()));
        let router = provisioning_routes(service, Arc::new("hook:secret".to_string()));
        TestServer::new(router).unwrap()
    }

    fn basic(credentials: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Basic {}", BASE64_STANDARD.encode(credentials))).unwrap()
    }

    #[tokio::test]
    async fn test_hooks_require_credentials() {
        let store = InMemoryStore::new();
        let server = server(&store);

        server
            .post("/internal/users")
            .json(&json!({ "token_identifier": "issuer|u1" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        server
            .post("/internal/users")
            .add_header(header::AUTHORIZATION, basic("hook:wrong"))
            .json(&json!({ "token_identifier": "issuer|u1" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_user_then_add_membership() {
        let store = InMemoryStore::new();
        let server = server(&store);

        server
            .post("/internal/users")
            .add_header(header::AUTHORIZATION, basic("hook:secret"))
            .json(&json!({ "token_identifier": "issuer|u1", "name": "Ada" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post("/internal/memberships")
            .add_header(header::AUTHORIZATION, basic("hook:secret"))
            .json(&json!({
                "token_identifier": "issuer|u1",
                "org_id": "org1",
                "role": "admin"
            }))
            .await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["data"]["memberships"][0]["org_id"], "org1");
        assert_eq!(body["data"]["memberships"][0]["role"], "admin");
    }
}
