use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating organization ids.
    /// Identity-provider ids are ASCII alphanumerics with `_` or `-` separators.
    /// - Valid: "org_2abcXYZ", "user_2abc", "team-42"
    /// - Invalid: "", "org 1", "org|1", "../org"
    pub static ref ORG_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();

    /// Regex for validating blob references handed out by the upload endpoint.
    /// - Valid: "uploads/0190b7c4-8f2e-7a55-b1d2-3c4d5e6f7a8b"
    /// - Invalid: "", "/etc/passwd", "uploads/../x", "uploads/a b"
    pub static ref BLOB_REF_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9_-]+(?:/[A-Za-z0-9_-][A-Za-z0-9_.-]*)*$").unwrap();
}
