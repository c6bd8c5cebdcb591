use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::access::{AccessError, AccessGuard};
use crate::features::files::dtos::{
    CreateFileDto, FileResponseDto, FileStateResponseDto, UploadUrlResponseDto,
};
use crate::features::files::models::{transition, LifecycleEvent, NewFile};
use crate::features::files::repositories::FileRepository;
use crate::modules::storage::BlobStore;

/// Mutations on file records: upload registration, soft delete and restore
pub struct FileService {
    guard: Arc<AccessGuard>,
    files: Arc<dyn FileRepository>,
    blob_store: Arc<dyn BlobStore>,
}

impl FileService {
    pub fn new(
        guard: Arc<AccessGuard>,
        files: Arc<dyn FileRepository>,
        blob_store: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            guard,
            files,
            blob_store,
        }
    }

    /// Presigned upload target. Needs a caller identity but no org membership.
    pub async fn generate_upload_url(&self, token: Option<&str>) -> Result<UploadUrlResponseDto> {
        if token.is_none() {
            return Err(AccessError::Unauthenticated.into());
        }

        let target = self.blob_store.generate_upload_url().await?;
        debug!("Issued upload URL for blob '{}'", target.blob_ref);

        Ok(target.into())
    }

    /// Register an uploaded blob as a file owned by the caller
    pub async fn create_file(
        &self,
        token: Option<&str>,
        dto: CreateFileDto,
    ) -> Result<FileResponseDto> {
        let file_type = dto.resolve_file_type().ok_or_else(|| {
            AppError::Validation(
                "Either type or a supported content_type is required".to_string(),
            )
        })?;

        let access = self.guard.check_org_access(token, &dto.org_id).await?;

        let file = self
            .files
            .insert(NewFile {
                name: dto.name,
                file_type,
                org_id: dto.org_id,
                user_id: access.user.id,
                blob_ref: dto.blob_ref,
            })
            .await?;

        info!(
            "File created: id={}, org={}, type={}, user={}, scope={:?}",
            file.id, file.org_id, file.file_type, file.user_id, access.membership
        );

        let url = match self.blob_store.get_url(&file.blob_ref).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Could not resolve URL for new file {}: {}", file.id, e);
                None
            }
        };

        Ok(FileResponseDto::from_file(file, url, false))
    }

    /// Move an active file to the trash (admin or owner only)
    pub async fn delete_file(
        &self,
        token: Option<&str>,
        file_id: Uuid,
    ) -> Result<FileStateResponseDto> {
        self.apply(token, file_id, LifecycleEvent::Delete).await
    }

    /// Bring a file back from the trash (admin or owner only)
    pub async fn restore_file(
        &self,
        token: Option<&str>,
        file_id: Uuid,
    ) -> Result<FileStateResponseDto> {
        self.apply(token, file_id, LifecycleEvent::Restore).await
    }

    async fn apply(
        &self,
        token: Option<&str>,
        file_id: Uuid,
        event: LifecycleEvent,
    ) -> Result<FileStateResponseDto> {
        let access = self.guard.check_file_privilege(token, file_id).await?;

        transition(access.file.state(), event)?;

        let marked = matches!(event, LifecycleEvent::Delete);

        match self.files.set_marked_as_deleted(file_id, marked).await? {
            Some(file) => {
                info!(
                    "File {:?} applied: id={}, org={}, by user={}",
                    event, file.id, file.org_id, access.user.id
                );
                Ok(FileStateResponseDto::from(&file))
            }
            None => Err(self.lost_race(file_id, event).await),
        }
    }

    /// The conditional update matched nothing: the file changed under us
    async fn lost_race(&self, file_id: Uuid, event: LifecycleEvent) -> AppError {
        match self.files.get(file_id).await {
            Ok(None) => AccessError::NoAccess.into(),
            Ok(Some(current)) => match transition(current.state(), event) {
                Err(e) => e.into(),
                Ok(_) => AppError::Conflict("File was modified concurrently".to_string()),
            },
            Err(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::access::IdentityResolver;
    use crate::features::files::models::FileType;
    use crate::features::users::models::OrgRole;
    use crate::shared::test_helpers::{InMemoryBlobStore, InMemoryStore};

    fn service(store: &Arc<InMemoryStore>, blobs: &Arc<InMemoryBlobStore>) -> FileService {
        let guard = Arc::new(AccessGuard::new(
            IdentityResolver::new(store.clone()),
            store.clone(),
        ));
        FileService::new(guard, store.clone(), blobs.clone())
    }

    fn create_dto(org_id: &str, name: &str) -> CreateFileDto {
        CreateFileDto {
            name: name.to_string(),
            blob_ref: "uploads/blob-1".to_string(),
            org_id: org_id.to_string(),
            file_type: Some(FileType::Pdf),
            content_type: None,
        }
    }

    #[tokio::test]
    async fn test_upload_url_requires_identity_only() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        let service = service(&store, &blobs);

        let denied = service.generate_upload_url(None).await;
        assert!(matches!(denied, Err(AppError::Unauthorized(_))));

        // No provisioned user record is needed
        let target = service.generate_upload_url(Some("issuer|new")).await.unwrap();
        assert!(target.blob_ref.starts_with("uploads/"));
    }

    #[tokio::test]
    async fn test_create_file_requires_org_membership() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        store
            .provision_member("issuer|u1", "org1", OrgRole::Member)
            .await;
        let service = service(&store, &blobs);

        let denied = service
            .create_file(Some("issuer|u1"), create_dto("org2", "x.pdf"))
            .await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        let unauthenticated = service.create_file(None, create_dto("org1", "x.pdf")).await;
        assert!(matches!(unauthenticated, Err(AppError::Unauthorized(_))));

        let created = service
            .create_file(Some("issuer|u1"), create_dto("org1", "x.pdf"))
            .await
            .unwrap();
        assert_eq!(created.org_id, "org1");
        assert!(!created.marked_as_deleted);
    }

    #[tokio::test]
    async fn test_create_file_classifies_content_type() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        store.provision_user("issuer|u1").await;
        let service = service(&store, &blobs);

        let mut dto = create_dto("u1", "photo.jpg");
        dto.file_type = None;
        dto.content_type = Some("image/jpeg".to_string());
        let created = service.create_file(Some("issuer|u1"), dto).await.unwrap();
        assert_eq!(created.file_type, FileType::Image);

        let mut unknown = create_dto("u1", "archive.zip");
        unknown.file_type = None;
        unknown.content_type = Some("application/zip".to_string());
        let rejected = service.create_file(Some("issuer|u1"), unknown).await;
        assert!(matches!(rejected, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_file_in_personal_scope() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        let user = store.provision_user("issuer|u1").await;
        let service = service(&store, &blobs);

        let created = service
            .create_file(Some("issuer|u1"), create_dto("u1", "mine.pdf"))
            .await
            .unwrap();
        assert_eq!(created.user_id, user.id);
    }

    #[tokio::test]
    async fn test_member_cannot_delete_or_restore_others_file() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        let owner = store
            .provision_member("issuer|owner", "org1", OrgRole::Member)
            .await;
        store
            .provision_member("issuer|other", "org1", OrgRole::Member)
            .await;
        let file = store.seed_file(&owner, "org1", "a.pdf", FileType::Pdf).await;
        let service = service(&store, &blobs);

        let delete = service.delete_file(Some("issuer|other"), file.id).await;
        assert!(matches!(delete, Err(AppError::Forbidden(_))));

        service
            .delete_file(Some("issuer|owner"), file.id)
            .await
            .unwrap();

        let restore = service.restore_file(Some("issuer|other"), file.id).await;
        assert!(matches!(restore, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_admin_deletes_and_owner_restores() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        store
            .provision_member("issuer|admin", "org1", OrgRole::Admin)
            .await;
        let member = store
            .provision_member("issuer|member", "org1", OrgRole::Member)
            .await;
        let service = service(&store, &blobs);

        let f2 = service
            .create_file(Some(&member.token_identifier), create_dto("org1", "f2.pdf"))
            .await
            .unwrap();

        let deleted = service
            .delete_file(Some("issuer|admin"), f2.id)
            .await
            .unwrap();
        assert!(deleted.marked_as_deleted);

        let restored = service
            .restore_file(Some("issuer|member"), f2.id)
            .await
            .unwrap();
        assert!(!restored.marked_as_deleted);
    }

    #[tokio::test]
    async fn test_double_delete_and_restore_of_active_conflict() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        let owner = store.provision_user("issuer|u1").await;
        let file = store.seed_file(&owner, "u1", "a.txt", FileType::Txt).await;
        let service = service(&store, &blobs);

        let restore_active = service.restore_file(Some("issuer|u1"), file.id).await;
        assert!(matches!(restore_active, Err(AppError::Conflict(_))));

        service.delete_file(Some("issuer|u1"), file.id).await.unwrap();

        let again = service.delete_file(Some("issuer|u1"), file.id).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_concurrent_deletes_have_one_winner() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        let owner = store.provision_user("issuer|u1").await;
        let file = store.seed_file(&owner, "u1", "a.txt", FileType::Txt).await;
        let service = service(&store, &blobs);

        let (first, second) = tokio::join!(
            service.delete_file(Some("issuer|u1"), file.id),
            service.delete_file(Some("issuer|u1"), file.id),
        );

        let outcomes = [first, second];
        let winners = outcomes.iter().filter(|r| r.is_ok()).count();
        let conflicts = outcomes
            .iter()
            .filter(|r| matches!(r, Err(AppError::Conflict(_))))
            .count();
        assert_eq!(winners, 1);
        assert_eq!(conflicts, 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_no_access() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        store.provision_user("issuer|u1").await;
        let service = service(&store, &blobs);

        let result = service.delete_file(Some("issuer|u1"), Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
