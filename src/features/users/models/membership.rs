use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;

/// Role of a user within an organization, matching the `org_role` database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "org_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    Admin,
    Member,
}

impl std::fmt::Display for OrgRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrgRole::Admin => write!(f, "admin"),
            OrgRole::Member => write!(f, "member"),
        }
    }
}

/// One (org, role) entry of a user's memberships
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Membership {
    pub org_id: String,
    pub role: OrgRole,
}

/// Immutable snapshot of a user's organization memberships.
///
/// Adding or removing an org yields a new snapshot; at most one entry exists per org.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MembershipRelation(Vec<Membership>);

impl MembershipRelation {
    pub fn new(memberships: impl IntoIterator<Item = Membership>) -> Self {
        memberships
            .into_iter()
            .fold(Self::default(), |relation, m| {
                relation.with_membership(m.org_id, m.role)
            })
    }

    /// Snapshot with `org_id` set to `role`, replacing any previous role
    pub fn with_membership(&self, org_id: impl Into<String>, role: OrgRole) -> Self {
        let org_id = org_id.into();
        let mut entries: Vec<Membership> = self
            .0
            .iter()
            .filter(|m| m.org_id != org_id)
            .cloned()
            .collect();
        entries.push(Membership { org_id, role });
        entries.sort_by(|a, b| a.org_id.cmp(&b.org_id));
        Self(entries)
    }

    /// Snapshot without any entry for `org_id`
    pub fn without_org(&self, org_id: &str) -> Self {
        Self(
            self.0
                .iter()
                .filter(|m| m.org_id != org_id)
                .cloned()
                .collect(),
        )
    }

    pub fn role_in(&self, org_id: &str) -> Option<OrgRole> {
        self.0.iter().find(|m| m.org_id == org_id).map(|m| m.role)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Membership> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_membership_replaces_role_and_keeps_original() {
        let original = MembershipRelation::default().with_membership("org1", OrgRole::Member);
        let promoted = original.with_membership("org1", OrgRole::Admin);

        assert_eq!(original.role_in("org1"), Some(OrgRole::Member));
        assert_eq!(promoted.role_in("org1"), Some(OrgRole::Admin));
        assert_eq!(promoted.iter().count(), 1);
    }

    #[test]
    fn test_without_org_removes_only_that_org() {
        let relation = MembershipRelation::new([
            Membership {
                org_id: "org1".to_string(),
                role: OrgRole::Admin,
            },
            Membership {
                org_id: "org2".to_string(),
                role: OrgRole::Member,
            },
        ]);

        let trimmed = relation.without_org("org1");
        assert_eq!(trimmed.role_in("org1"), None);
        assert_eq!(trimmed.role_in("org2"), Some(OrgRole::Member));
        assert_eq!(relation.role_in("org1"), Some(OrgRole::Admin));
    }

    #[test]
    fn test_new_collapses_duplicate_orgs() {
        let relation = MembershipRelation::new([
            Membership {
                org_id: "org1".to_string(),
                role: OrgRole::Member,
            },
            Membership {
                org_id: "org1".to_string(),
                role: OrgRole::Admin,
            },
        ]);

        assert_eq!(relation.iter().count(), 1);
        assert_eq!(relation.role_in("org1"), Some(OrgRole::Admin));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&OrgRole::Admin).unwrap();
        assert_eq!(json, "\"admin\"");
    }
}
