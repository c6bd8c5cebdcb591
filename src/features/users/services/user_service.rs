use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::access::IdentityResolver;
use crate::features::users::dtos::{
    AddMembershipDto, CreateUserDto, MembershipsResponseDto, RemoveMembershipDto,
    UpdateUserDto, UserProfileDto, UserResponseDto,
};
use crate::features::users::models::{NewUser, User};
use crate::features::users::repositories::UserRepository;

/// Account reads for callers and the identity provider's provisioning hooks
pub struct UserService {
    users: Arc<dyn UserRepository>,
    resolver: IdentityResolver,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        let resolver = IdentityResolver::new(users.clone());
        Self { users, resolver }
    }

    /// Provision a user for a new identity; returns the existing record on repeat
    pub async fn create_user(&self, dto: CreateUserDto) -> Result<UserResponseDto> {
        let user = self
            .users
            .create_if_absent(NewUser {
                token_identifier: dto.token_identifier,
                name: dto.name,
                image: dto.image,
            })
            .await?;

        info!("User provisioned: id={}", user.id);

        Ok(user.into())
    }

    pub async fn update_user(&self, dto: UpdateUserDto) -> Result<UserResponseDto> {
        let user = self
            .users
            .update_profile(&dto.token_identifier, dto.name, dto.image)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        info!("User profile updated: id={}", user.id);

        Ok(user.into())
    }

    /// Grant or change a membership; returns the resulting snapshot
    pub async fn add_org_to_user(&self, dto: AddMembershipDto) -> Result<MembershipsResponseDto> {
        let user = self.provisioned(&dto.token_identifier).await?;

        let relation = self
            .users
            .upsert_membership(user.id, &dto.org_id, dto.role)
            .await?;

        info!(
            "Membership set: user={}, org={}, role={}",
            user.id, dto.org_id, dto.role
        );

        Ok(MembershipsResponseDto::new(user.id, &relation))
    }

    pub async fn remove_org_from_user(
        &self,
        dto: RemoveMembershipDto,
    ) -> Result<MembershipsResponseDto> {
        let user = self.provisioned(&dto.token_identifier).await?;

        let relation = self.users.remove_membership(user.id, &dto.org_id).await?;

        info!("Membership removed: user={}, org={}", user.id, dto.org_id);

        Ok(MembershipsResponseDto::new(user.id, &relation))
    }

    /// The caller's own account with memberships
    pub async fn get_me(&self, token: Option<&str>) -> Result<UserResponseDto> {
        let user = self.resolver.resolve(token).await?;
        Ok(user.into())
    }

    /// Name and avatar of any user, e.g. a file's uploader
    pub async fn get_user_profile(
        &self,
        token: Option<&str>,
        user_id: Uuid,
    ) -> Result<UserProfileDto> {
        self.resolver.resolve(token).await?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user.into())
    }

    async fn provisioned(&self, token_identifier: &str) -> Result<User> {
        self.users
            .find_by_token(token_identifier)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
