//! Authentication and token error types
//!
//! `AuthError` is the internal taxonomy. Callers outside the core only ever
//! observe `InvalidCredentials` for a rejected credential; the specific kind
//! is kept for logs and metrics and dropped by [`AuthError::conceal`].

use thiserror::Error;

/// Internal authentication failure kinds
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Nothing was presented to authenticate
    #[error("no credential presented")]
    NoCredential,

    /// The credential variant is not handled by the provider
    #[error("credential type not supported")]
    UnsupportedCredential,

    /// Unknown user, wrong secret, or every candidate provider failed
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Envelope could not be parsed, decrypted or verified
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Envelope is authentic but `exp` is not in the future
    #[error("token expired")]
    ExpiredToken,

    #[error("account is disabled")]
    AccountDisabled,

    #[error("account is locked")]
    AccountLocked,

    /// Provider did not finish within its time budget
    #[error("provider timed out")]
    Timeout,

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Collapse any failure to the generic outcome exposed to callers
    pub fn conceal(self) -> Self {
        AuthError::InvalidCredentials
    }

    /// Static label used as a log field and metrics tag
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::NoCredential => "no_credential",
            AuthError::UnsupportedCredential => "unsupported_credential",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MalformedToken(_) => "malformed_token",
            AuthError::ExpiredToken => "expired_token",
            AuthError::AccountDisabled => "account_disabled",
            AuthError::AccountLocked => "account_locked",
            AuthError::Timeout => "timeout",
            AuthError::Internal(_) => "internal",
        }
    }
}

/// Token codec and issuance errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("unsupported token header: alg={alg}, enc={enc}")]
    UnsupportedHeader { alg: String, enc: String },

    #[error("authentication tag mismatch")]
    TagMismatch,

    #[error("decryption failed")]
    Decryption,

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("invalid claims: {0}")]
    InvalidClaims(String),

    #[error("claim name '{0}' is reserved")]
    ReservedClaim(String),

    #[error("required field '{0}' is missing")]
    MissingField(&'static str),

    #[error("principal is not authenticated")]
    UnauthenticatedPrincipal,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        AuthError::MalformedToken(e.to_string())
    }
}
