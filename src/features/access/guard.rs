use std::sync::Arc;
use uuid::Uuid;

use super::identity::IdentityResolver;
use super::membership::{check_membership, MembershipResult};
use super::AccessError;
use crate::features::files::models::File;
use crate::features::files::repositories::FileRepository;
use crate::features::users::models::{OrgRole, User};

/// Caller authorized within an organization
#[derive(Debug, Clone)]
pub struct OrgAccess {
    pub user: User,
    pub membership: MembershipResult,
}

/// Caller authorized on a specific file
#[derive(Debug, Clone)]
pub struct FileAccess {
    pub user: User,
    pub file: File,
    pub membership: MembershipResult,
}

impl FileAccess {
    pub fn is_owner(&self) -> bool {
        self.file.user_id == self.user.id
    }

    /// Admins of the file's org and the file's owner may change its lifecycle state
    pub fn can_change_lifecycle(&self) -> bool {
        match self.membership.role() {
            Some(OrgRole::Admin) => true,
            Some(OrgRole::Member) | None => self.is_owner(),
        }
    }
}

/// Entry point for every authorization decision on orgs and files
pub struct AccessGuard {
    resolver: IdentityResolver,
    files: Arc<dyn FileRepository>,
}

impl AccessGuard {
    pub fn new(resolver: IdentityResolver, files: Arc<dyn FileRepository>) -> Self {
        Self { resolver, files }
    }

    pub async fn check_org_access(
        &self,
        token: Option<&str>,
        org_id: &str,
    ) -> Result<OrgAccess, AccessError> {
        let user = self.resolver.resolve(token).await?;

        let membership = check_membership(&user, org_id);
        if !membership.has_access() {
            return Err(AccessError::NoAccess);
        }

        Ok(OrgAccess { user, membership })
    }

    /// Missing files and foreign files both yield `NoAccess`
    pub async fn check_file_access(
        &self,
        token: Option<&str>,
        file_id: Uuid,
    ) -> Result<FileAccess, AccessError> {
        let user = self.resolver.resolve(token).await?;

        let file = self
            .files
            .get(file_id)
            .await?
            .ok_or(AccessError::NoAccess)?;

        let membership = check_membership(&user, &file.org_id);
        if !membership.has_access() {
            return Err(AccessError::NoAccess);
        }

        Ok(FileAccess {
            user,
            file,
            membership,
        })
    }

    /// File access plus the admin-or-owner requirement, evaluated on every call
    pub async fn check_file_privilege(
        &self,
        token: Option<&str>,
        file_id: Uuid,
    ) -> Result<FileAccess, AccessError> {
        let access = self.check_file_access(token, file_id).await?;

        if !access.can_change_lifecycle() {
            tracing::debug!(
                "User {} lacks privilege on file {} in org {}",
                access.user.id,
                access.file.id,
                access.file.org_id
            );
            return Err(AccessError::NoAccess);
        }

        Ok(access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::files::models::FileType;
    use crate::shared::test_helpers::InMemoryStore;

    fn guard(store: &Arc<InMemoryStore>) -> AccessGuard {
        AccessGuard::new(IdentityResolver::new(store.clone()), store.clone())
    }

    #[tokio::test]
    async fn test_org_access_denied_without_membership_or_personal_scope() {
        let store = InMemoryStore::new();
        store
            .provision_member("issuer|u1", "org1", OrgRole::Member)
            .await;

        let result = guard(&store)
            .check_org_access(Some("issuer|u1"), "org2")
            .await;
        assert!(matches!(result, Err(AccessError::NoAccess)));
    }

    #[tokio::test]
    async fn test_missing_file_and_foreign_file_look_the_same() {
        let store = InMemoryStore::new();
        let outsider = store.provision_user("issuer|outsider").await;
        let owner = store
            .provision_member("issuer|owner", "org1", OrgRole::Member)
            .await;
        let file = store.seed_file(&owner, "org1", "plan.pdf", FileType::Pdf).await;
        let guard = guard(&store);

        let missing = guard
            .check_file_access(Some(&outsider.token_identifier), Uuid::new_v4())
            .await;
        let foreign = guard
            .check_file_access(Some(&outsider.token_identifier), file.id)
            .await;

        assert!(matches!(missing, Err(AccessError::NoAccess)));
        assert!(matches!(foreign, Err(AccessError::NoAccess)));
    }

    #[tokio::test]
    async fn test_member_cannot_change_lifecycle_of_others_file() {
        let store = InMemoryStore::new();
        let owner = store
            .provision_member("issuer|owner", "org1", OrgRole::Member)
            .await;
        let other = store
            .provision_member("issuer|other", "org1", OrgRole::Member)
            .await;
        let file = store.seed_file(&owner, "org1", "a.txt", FileType::Txt).await;
        let guard = guard(&store);

        let plain = guard
            .check_file_access(Some(&other.token_identifier), file.id)
            .await;
        assert!(plain.is_ok());

        let privileged = guard
            .check_file_privilege(Some(&other.token_identifier), file.id)
            .await;
        assert!(matches!(privileged, Err(AccessError::NoAccess)));
    }

    #[tokio::test]
    async fn test_admin_and_owner_hold_privilege() {
        let store = InMemoryStore::new();
        let owner = store
            .provision_member("issuer|owner", "org1", OrgRole::Member)
            .await;
        let admin = store
            .provision_member("issuer|admin", "org1", OrgRole::Admin)
            .await;
        let file = store.seed_file(&owner, "org1", "a.csv", FileType::Csv).await;
        let guard = guard(&store);

        assert!(guard
            .check_file_privilege(Some(&owner.token_identifier), file.id)
            .await
            .is_ok());
        assert!(guard
            .check_file_privilege(Some(&admin.token_identifier), file.id)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_privilege_is_rechecked_after_demotion() {
        let store = InMemoryStore::new();
        let owner = store
            .provision_member("issuer|owner", "org1", OrgRole::Member)
            .await;
        let admin = store
            .provision_member("issuer|admin", "org1", OrgRole::Admin)
            .await;
        let file = store.seed_file(&owner, "org1", "a.csv", FileType::Csv).await;
        let guard = guard(&store);

        assert!(guard
            .check_file_privilege(Some(&admin.token_identifier), file.id)
            .await
            .is_ok());

        store
            .set_role(&admin.token_identifier, "org1", OrgRole::Member)
            .await;

        let result = guard
            .check_file_privilege(Some(&admin.token_identifier), file.id)
            .await;
        assert!(matches!(result, Err(AccessError::NoAccess)));
    }

    #[tokio::test]
    async fn test_personal_scope_owner_has_privilege() {
        let store = InMemoryStore::new();
        let user = store.provision_user("issuer|u1").await;
        let file = store.seed_file(&user, "u1", "me.png", FileType::Image).await;

        let access = guard(&store)
            .check_file_privilege(Some("issuer|u1"), file.id)
            .await
            .unwrap();
        assert_eq!(access.membership, MembershipResult::PersonalScope);
    }

    #[tokio::test]
    async fn test_org_access_carries_the_membership_it_was_granted_by() {
        let store = InMemoryStore::new();
        store
            .provision_member("issuer|admin", "org1", OrgRole::Admin)
            .await;
        let guard = guard(&store);

        let member = guard
            .check_org_access(Some("issuer|admin"), "org1")
            .await
            .unwrap();
        assert_eq!(member.membership, MembershipResult::Member(OrgRole::Admin));

        let personal = guard
            .check_org_access(Some("issuer|admin"), "admin")
            .await
            .unwrap();
        assert_eq!(personal.membership, MembershipResult::PersonalScope);
    }

}
