use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Caller identity extracted from a validated bearer token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Subject claim issued by the identity provider
    pub sub: String,
    /// Issuer that signed the token
    pub issuer: String,
    /// Opaque identity token used to look up the internal user record
    pub token_identifier: String,
}

impl AuthenticatedUser {
    pub fn new(issuer: impl Into<String>, sub: impl Into<String>) -> Self {
        let issuer = issuer.into();
        let sub = sub.into();
        let token_identifier = token_identifier(&issuer, &sub);

        Self {
            sub,
            issuer,
            token_identifier,
        }
    }
}

/// Builds the `{issuer}|{subject}` identity token.
///
/// The subject is embedded verbatim, so a personal workspace keyed by the subject id
/// is a substring of the token.
pub fn token_identifier(issuer: &str, sub: &str) -> String {
    format!("{}|{}", issuer.trim_end_matches('/'), sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_identifier_embeds_subject() {
        let user = AuthenticatedUser::new("https://auth.example.com/", "user_2abc");
        assert_eq!(user.token_identifier, "https://auth.example.com|user_2abc");
        assert!(user.token_identifier.contains(&user.sub));
    }
}
