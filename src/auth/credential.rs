//! Credential shapes presented for authentication

use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::{ExposeSecret, Secret};
use std::fmt;

static BEARER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^bearer (?P<token>[a-z0-9\-._~+/]+=*)$").expect("valid bearer pattern")
});

/// Discriminant used for provider capability checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    UsernamePassword,
    Bearer,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialKind::UsernamePassword => f.write_str("username_password"),
            CredentialKind::Bearer => f.write_str("bearer"),
        }
    }
}

/// Username and secret pair
#[derive(Debug, Clone)]
pub struct UsernamePasswordCredential {
    username: String,
    secret: Secret<String>,
}

impl UsernamePasswordCredential {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: Secret::new(secret.into()),
        }
    }

    /// Build from submitted form fields; missing fields become empty strings
    pub fn from_form(username: Option<&str>, secret: Option<&str>) -> Self {
        Self::new(
            username.map(str::trim).unwrap_or_default(),
            secret.map(str::trim).unwrap_or_default(),
        )
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn secret(&self) -> &str {
        self.secret.expose_secret()
    }
}

/// Opaque bearer token
#[derive(Clone)]
pub struct BearerCredential {
    token: String,
}

impl BearerCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerCredential")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Proof of identity presented by a caller
#[derive(Debug, Clone)]
pub enum Credential {
    UsernamePassword(UsernamePasswordCredential),
    Bearer(BearerCredential),
}

impl Credential {
    pub fn username_password(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Credential::UsernamePassword(UsernamePasswordCredential::new(username, secret))
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Credential::Bearer(BearerCredential::new(token))
    }

    pub fn kind(&self) -> CredentialKind {
        match self {
            Credential::UsernamePassword(_) => CredentialKind::UsernamePassword,
            Credential::Bearer(_) => CredentialKind::Bearer,
        }
    }

    /// Extract a bearer credential from an `Authorization` header value
    ///
    /// Anything that is not `Bearer <token>` yields `None`; a bad header is
    /// "no credential", not an error.
    pub fn from_authorization_header(value: Option<&str>) -> Option<Self> {
        let value = value?;
        let captures = BEARER_PATTERN.captures(value)?;
        captures
            .name("token")
            .map(|token| Credential::bearer(token.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extracted_token(header: &str) -> Option<String> {
        match Credential::from_authorization_header(Some(header)) {
            Some(Credential::Bearer(bearer)) => Some(bearer.token().to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extracted_token("Bearer abc.def-ghi_jkl~"), Some("abc.def-ghi_jkl~".to_string()));
        assert_eq!(extracted_token("bearer a+b/c=="), Some("a+b/c==".to_string()));
        assert_eq!(extracted_token("BEARER token"), Some("token".to_string()));
    }

    #[test]
    fn test_extract_rejects_other_shapes() {
        assert!(extracted_token("Basic dXNlcjpwYXNz").is_none());
        assert!(extracted_token("Bearer").is_none());
        assert!(extracted_token("Bearer ").is_none());
        assert!(extracted_token("Bearer two tokens").is_none());
        assert!(extracted_token("Bearer a=b").is_none());
        assert!(Credential::from_authorization_header(None).is_none());
    }

    #[test]
    fn test_form_fields_are_trimmed() {
        let credential = UsernamePasswordCredential::from_form(Some("  u1 "), None);
        assert_eq!(credential.username(), "u1");
        assert_eq!(credential.secret(), "");
    }

    #[test]
    fn test_debug_does_not_leak_secrets() {
        let credential = Credential::username_password("u1", "p1-secret");
        let bearer = Credential::bearer("opaque-token");

        assert!(!format!("{:?}", credential).contains("p1-secret"));
        assert!(!format!("{:?}", bearer).contains("opaque-token"));
        assert_eq!(credential.kind(), CredentialKind::UsernamePassword);
        assert_eq!(bearer.kind(), CredentialKind::Bearer);
    }
}
