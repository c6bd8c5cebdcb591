mod membership;
mod user;

pub use membership::{Membership, MembershipRelation, OrgRole};
pub use user::{NewUser, User, UserRow};
