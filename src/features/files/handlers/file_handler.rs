use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, MaybeAuthenticated};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::{
    CreateFileDto, FileResponseDto, FileStateResponseDto, ListFilesQuery, UploadUrlResponseDto,
};
use crate::features::files::services::{FileQueryService, FileService};
use crate::shared::types::{ApiResponse, Meta};

/// Get a presigned upload URL
///
/// The client PUTs the file bytes to `upload_url`, then registers the file with
/// `blob_ref`.
#[utoipa::path(
    post,
    path = "/api/files/upload-url",
    tag = "files",
    responses(
        (status = 200, description = "Upload URL issued", body = ApiResponse<UploadUrlResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 502, description = "Blob storage unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn generate_upload_url(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
) -> Result<Json<ApiResponse<UploadUrlResponseDto>>> {
    let target = service
        .generate_upload_url(Some(&user.token_identifier))
        .await?;

    Ok(Json(ApiResponse::success(Some(target), None, None)))
}

/// Register an uploaded file
#[utoipa::path(
    post,
    path = "/api/files",
    tag = "files",
    request_body = CreateFileDto,
    responses(
        (status = 201, description = "File created", body = ApiResponse<FileResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "No access to the organization")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    AppJson(dto): AppJson<CreateFileDto>,
) -> Result<(StatusCode, Json<ApiResponse<FileResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let file = service
        .create_file(Some(&user.token_identifier), dto)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(file),
            Some("File created successfully".to_string()),
            None,
        )),
    ))
}

/// List an organization's files
///
/// Callers without access receive an empty list.
#[utoipa::path(
    get,
    path = "/api/orgs/{org_id}/files",
    tag = "files",
    params(
        ("org_id" = String, Path, description = "Organization id or personal workspace id"),
        ListFilesQuery
    ),
    responses(
        (status = 200, description = "Visible files", body = ApiResponse<Vec<FileResponseDto>>)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    caller: MaybeAuthenticated,
    State(service): State<Arc<FileQueryService>>,
    Path(org_id): Path<String>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<ApiResponse<Vec<FileResponseDto>>>> {
    let files = service
        .list_files(caller.token_identifier(), &org_id, &query)
        .await?;
    let total = files.len();

    Ok(Json(ApiResponse::success(
        Some(files),
        None,
        Some(Meta::total(total)),
    )))
}

/// Move a file to the trash
///
/// Allowed for admins of the file's organization and for the file's owner.
#[utoipa::path(
    delete,
    path = "/api/files/{file_id}",
    tag = "files",
    params(
        ("file_id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File moved to trash", body = ApiResponse<FileStateResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "No access to this file"),
        (status = 409, description = "File is already in the trash")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileStateResponseDto>>> {
    let state = service
        .delete_file(Some(&user.token_identifier), file_id)
        .await?;

    Ok(Json(ApiResponse::success(
        Some(state),
        Some("File moved to trash".to_string()),
        None,
    )))
}

/// Restore a file from the trash
#[utoipa::path(
    post,
    path = "/api/files/{file_id}/restore",
    tag = "files",
    params(
        ("file_id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File restored", body = ApiResponse<FileStateResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "No access to this file"),
        (status = 409, description = "File is not in the trash")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn restore_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileStateResponseDto>>> {
    let state = service
        .restore_file(Some(&user.token_identifier), file_id)
        .await?;

    Ok(Json(ApiResponse::success(
        Some(state),
        Some("File restored".to_string()),
        None,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::access::{AccessGuard, IdentityResolver};
    use crate::features::files::models::FileType;
    use crate::features::files::routes;
    use crate::features::users::models::OrgRole;
    use crate::shared::test_helpers::{with_user_auth, InMemoryBlobStore, InMemoryStore};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    fn server(
        store: &Arc<InMemoryStore>,
        blobs: &Arc<InMemoryBlobStore>,
        token: Option<&str>,
    ) -> TestServer {
        let guard = Arc::new(AccessGuard::new(
            IdentityResolver::new(store.clone()),
            store.clone(),
        ));
        let file_service = Arc::new(FileService::new(
            guard.clone(),
            store.clone(),
            blobs.clone(),
        ));
        let query_service = Arc::new(FileQueryService::new(
            guard,
            store.clone(),
            store.clone(),
            blobs.clone(),
        ));

        let router = routes(file_service, query_service);
        let router = match token {
            Some(token) => with_user_auth(router, token),
            None => router,
        };

        TestServer::new(router).unwrap()
    }

    #[tokio::test]
    async fn test_personal_scope_lifecycle_over_http() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        store.provision_user("issuer|u1").await;
        let server = server(&store, &blobs, Some("issuer|u1"));

        let upload = server.post("/api/files/upload-url").await;
        upload.assert_status_ok();
        let blob_ref = upload.json::<Value>()["data"]["blob_ref"]
            .as_str()
            .unwrap()
            .to_string();

        let created = server
            .post("/api/files")
            .json(&json!({
                "name": "F1.pdf",
                "blob_ref": blob_ref,
                "org_id": "u1",
                "type": "pdf"
            }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let file_id = created.json::<Value>()["data"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let listed = server.get("/api/orgs/u1/files").await;
        listed.assert_status_ok();
        let body = listed.json::<Value>();
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["data"][0]["type"], "pdf");

        server
            .delete(&format!("/api/files/{}", file_id))
            .await
            .assert_status_ok();

        let again = server.delete(&format!("/api/files/{}", file_id)).await;
        again.assert_status(StatusCode::CONFLICT);

        let trash = server
            .get("/api/orgs/u1/files")
            .add_query_param("trash", "true")
            .await;
        assert_eq!(trash.json::<Value>()["data"][0]["id"], file_id.as_str());
    }

    #[tokio::test]
    async fn test_anonymous_listing_is_empty_and_mutation_is_unauthorized() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        let owner = store.provision_user("issuer|u1").await;
        let file = store.seed_file(&owner, "u1", "a.txt", FileType::Txt).await;
        let server = server(&store, &blobs, None);

        let listed = server.get("/api/orgs/u1/files").await;
        listed.assert_status_ok();
        assert_eq!(listed.json::<Value>()["data"], json!([]));

        server
            .delete(&format!("/api/files/{}", file.id))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .post("/api/files/upload-url")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_member_delete_is_forbidden() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        let owner = store
            .provision_member("issuer|owner", "org1", OrgRole::Member)
            .await;
        store
            .provision_member("issuer|other", "org1", OrgRole::Member)
            .await;
        let file = store.seed_file(&owner, "org1", "a.txt", FileType::Txt).await;
        let server = server(&store, &blobs, Some("issuer|other"));

        server
            .delete(&format!("/api/files/{}", file.id))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_create_file_validation_error() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        store.provision_user("issuer|u1").await;
        let server = server(&store, &blobs, Some("issuer|u1"));

        let response = server
            .post("/api/files")
            .json(&json!({
                "name": "",
                "blob_ref": "uploads/x",
                "org_id": "u1",
                "type": "txt"
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["success"], false);
    }
}
