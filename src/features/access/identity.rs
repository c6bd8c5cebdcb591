use std::sync::Arc;

use super::AccessError;
use crate::features::users::models::User;
use crate::features::users::repositories::UserRepository;

/// Maps a caller's identity token to the internal user record.
///
/// Lookup only. Users are created by the provisioning hook, never here.
pub struct IdentityResolver {
    users: Arc<dyn UserRepository>,
}

impl IdentityResolver {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn resolve(&self, token_identifier: Option<&str>) -> Result<User, AccessError> {
        let token = token_identifier.ok_or(AccessError::Unauthenticated)?;

        match self.users.find_by_token(token).await? {
            Some(user) => Ok(user),
            None => {
                tracing::debug!("No user provisioned for token '{}'", token);
                Err(AccessError::NoAccess)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::InMemoryStore;

    #[tokio::test]
    async fn test_missing_token_is_unauthenticated() {
        let store = InMemoryStore::new();
        let resolver = IdentityResolver::new(store.clone());

        let result = resolver.resolve(None).await;
        assert!(matches!(result, Err(AccessError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_unprovisioned_token_is_no_access() {
        let store = InMemoryStore::new();
        let resolver = IdentityResolver::new(store.clone());

        let result = resolver.resolve(Some("issuer|ghost")).await;
        assert!(matches!(result, Err(AccessError::NoAccess)));
    }

    #[tokio::test]
    async fn test_resolves_provisioned_user() {
        let store = InMemoryStore::new();
        let user = store.provision_user("issuer|u1").await;
        let resolver = IdentityResolver::new(store.clone());

        let resolved = resolver.resolve(Some("issuer|u1")).await.unwrap();
        assert_eq!(resolved.id, user.id);
    }
}
