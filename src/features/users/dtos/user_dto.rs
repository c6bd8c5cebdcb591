use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::users::models::{Membership, MembershipRelation, OrgRole, User};
use crate::shared::constants::MAX_ORG_ID_LENGTH;
use crate::shared::validation::ORG_ID_REGEX;

/// Provisioning request: a new identity appeared at the identity provider
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(min = 1, max = 512, message = "Token identifier must be 1-512 characters"))]
    pub token_identifier: String,

    #[validate(length(max = 128, message = "Name must not exceed 128 characters"))]
    pub name: Option<String>,

    #[validate(url(message = "Image must be a valid URL"))]
    pub image: Option<String>,
}

/// Provisioning request: profile fields changed at the identity provider
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(length(min = 1, max = 512, message = "Token identifier must be 1-512 characters"))]
    pub token_identifier: String,

    #[validate(length(max = 128, message = "Name must not exceed 128 characters"))]
    pub name: Option<String>,

    #[validate(url(message = "Image must be a valid URL"))]
    pub image: Option<String>,
}

/// Provisioning request: user joined an organization or changed role
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddMembershipDto {
    #[validate(length(min = 1, max = 512, message = "Token identifier must be 1-512 characters"))]
    pub token_identifier: String,

    #[validate(
        length(min = 1, max = MAX_ORG_ID_LENGTH, message = "Organization id must be 1-128 characters"),
        regex(path = *ORG_ID_REGEX, message = "Invalid organization id")
    )]
    pub org_id: String,

    pub role: OrgRole,
}

/// Provisioning request: user left an organization
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RemoveMembershipDto {
    #[validate(length(min = 1, max = 512, message = "Token identifier must be 1-512 characters"))]
    pub token_identifier: String,

    #[validate(length(min = 1, max = MAX_ORG_ID_LENGTH, message = "Organization id must be 1-128 characters"))]
    pub org_id: String,
}

/// Full account view for the caller
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponseDto {
    pub id: Uuid,
    pub token_identifier: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub memberships: Vec<Membership>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponseDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            token_identifier: user.token_identifier,
            name: user.name,
            image: user.image,
            memberships: user.memberships.iter().cloned().collect(),
            created_at: user.created_at,
        }
    }
}

/// Public profile of a file owner
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfileDto {
    pub name: Option<String>,
    pub image: Option<String>,
}

impl From<User> for UserProfileDto {
    fn from(user: User) -> Self {
        Self {
            name: user.name,
            image: user.image,
        }
    }
}

/// Membership snapshot after a provisioning change
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MembershipsResponseDto {
    pub user_id: Uuid,
    pub memberships: Vec<Membership>,
}

impl MembershipsResponseDto {
    pub fn new(user_id: Uuid, relation: &MembershipRelation) -> Self {
        Self {
            user_id,
            memberships: relation.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_membership_dto_validation() {
        let dto = AddMembershipDto {
            token_identifier: "issuer|u1".to_string(),
            org_id: "org_2abc".to_string(),
            role: OrgRole::Admin,
        };
        assert!(dto.validate().is_ok());

        let bad = AddMembershipDto {
            org_id: "org 2".to_string(),
            ..dto
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_create_user_dto_rejects_empty_token() {
        let dto = CreateUserDto {
            token_identifier: String::new(),
            name: None,
            image: None,
        };
        assert!(dto.validate().is_err());
    }
}
