use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::access::AccessGuard;
use crate::features::favorites::dtos::{FavoriteResponseDto, ToggleFavoriteResponseDto};
use crate::features::favorites::models::FavoriteKey;
use crate::features::favorites::repositories::FavoriteRepository;

pub struct FavoriteService {
    guard: Arc<AccessGuard>,
    favorites: Arc<dyn FavoriteRepository>,
}

impl FavoriteService {
    pub fn new(guard: Arc<AccessGuard>, favorites: Arc<dyn FavoriteRepository>) -> Self {
        Self { guard, favorites }
    }

    /// Star or unstar a file for the caller. Any member of the file's org may do this.
    ///
    /// Check-then-act without a lock: two concurrent toggles from the same caller can
    /// both observe the same state. The unique index still keeps one favorite per key.
    pub async fn toggle_favorite(
        &self,
        token: Option<&str>,
        file_id: Uuid,
    ) -> Result<ToggleFavoriteResponseDto> {
        let access = self.guard.check_file_access(token, file_id).await?;

        let key = FavoriteKey {
            user_id: access.user.id,
            org_id: &access.file.org_id,
            file_id: access.file.id,
        };

        let favorited = match self.favorites.find(key).await? {
            Some(_) => {
                self.favorites.delete(key).await?;
                false
            }
            None => {
                if !self.favorites.insert(key).await? {
                    debug!("Favorite for file {} already present", file_id);
                }
                true
            }
        };

        info!(
            "Favorite toggled: file={}, user={}, favorited={}",
            file_id, access.user.id, favorited
        );

        Ok(ToggleFavoriteResponseDto { file_id, favorited })
    }

    /// The caller's favorites in the org, or `None` when the caller has no access
    pub async fn list_favorites(
        &self,
        token: Option<&str>,
        org_id: &str,
    ) -> Result<Option<Vec<FavoriteResponseDto>>> {
        let access = match self.guard.check_org_access(token, org_id).await {
            Ok(access) => access,
            Err(e) if e.is_denial() => {
                debug!("Favorites for org '{}' denied: {}", org_id, e);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let favorites = self
            .favorites
            .list_for_user_in_org(access.user.id, org_id)
            .await?;

        Ok(Some(favorites.into_iter().map(Into::into).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;
    use crate::features::access::IdentityResolver;
    use crate::features::files::models::FileType;
    use crate::features::users::models::OrgRole;
    use crate::shared::test_helpers::InMemoryStore;

    fn service(store: &Arc<InMemoryStore>) -> FavoriteService {
        let guard = Arc::new(AccessGuard::new(
            IdentityResolver::new(store.clone()),
            store.clone(),
        ));
        FavoriteService::new(guard, store.clone())
    }

    #[tokio::test]
    async fn test_toggle_twice_returns_to_original_state() {
        let store = InMemoryStore::new();
        let user = store.provision_user("issuer|u1").await;
        let file = store.seed_file(&user, "u1", "a.pdf", FileType::Pdf).await;
        let service = service(&store);

        let before = service.list_favorites(Some("issuer|u1"), "u1").await.unwrap();
        assert_eq!(before.map(|f| f.len()), Some(0));

        let first = service
            .toggle_favorite(Some("issuer|u1"), file.id)
            .await
            .unwrap();
        assert!(first.favorited);

        let second = service
            .toggle_favorite(Some("issuer|u1"), file.id)
            .await
            .unwrap();
        assert!(!second.favorited);

        let after = service.list_favorites(Some("issuer|u1"), "u1").await.unwrap();
        assert_eq!(after.map(|f| f.len()), Some(0));
    }

    #[tokio::test]
    async fn test_plain_member_can_favorite_others_file() {
        let store = InMemoryStore::new();
        let owner = store
            .provision_member("issuer|owner", "org1", OrgRole::Member)
            .await;
        store
            .provision_member("issuer|other", "org1", OrgRole::Member)
            .await;
        let file = store.seed_file(&owner, "org1", "a.pdf", FileType::Pdf).await;
        let service = service(&store);

        let toggled = service
            .toggle_favorite(Some("issuer|other"), file.id)
            .await
            .unwrap();
        assert!(toggled.favorited);

        let favorites = service
            .list_favorites(Some("issuer|other"), "org1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].org_id, "org1");
    }

    #[tokio::test]
    async fn test_toggle_without_access_fails() {
        let store = InMemoryStore::new();
        let owner = store
            .provision_member("issuer|owner", "org1", OrgRole::Member)
            .await;
        store.provision_user("issuer|outsider").await;
        let file = store.seed_file(&owner, "org1", "a.pdf", FileType::Pdf).await;
        let service = service(&store);

        let outsider = service.toggle_favorite(Some("issuer|outsider"), file.id).await;
        assert!(matches!(outsider, Err(AppError::Forbidden(_))));

        let anonymous = service.toggle_favorite(None, file.id).await;
        assert!(matches!(anonymous, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_list_favorites_without_access_is_none() {
        let store = InMemoryStore::new();
        store.provision_user("issuer|u1").await;
        let service = service(&store);

        assert!(service
            .list_favorites(Some("issuer|u1"), "org9")
            .await
            .unwrap()
            .is_none());
        assert!(service.list_favorites(None, "u1").await.unwrap().is_none());
    }

    /// Known race: both toggles read "absent" before either writes, so both insert.
    /// The unique key keeps a single favorite and the file ends up favorited.
    #[tokio::test]
    async fn test_concurrent_toggles_from_absent_both_favorite() {
        let store = InMemoryStore::new();
        let user = store.provision_user("issuer|u1").await;
        let file = store.seed_file(&user, "u1", "a.pdf", FileType::Pdf).await;
        let service = service(&store);

        // Hold both writers until each has read the current state
        store.gate_favorite_writes(2).await;
        let (first, second) = tokio::join!(
            service.toggle_favorite(Some("issuer|u1"), file.id),
            service.toggle_favorite(Some("issuer|u1"), file.id),
        );

        assert!(first.unwrap().favorited);
        assert!(second.unwrap().favorited);

        let favorites = service
            .list_favorites(Some("issuer|u1"), "u1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(favorites.len(), 1);
    }
}
