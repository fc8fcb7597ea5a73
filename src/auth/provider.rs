//! Provider capability shared by every authentication strategy

use super::{
    credential::{Credential, CredentialKind},
    error::AuthError,
    principal::Principal,
};
use async_trait::async_trait;

/// A unit of authentication logic
///
/// `attempt` returns the specific failure kind so the dispatcher can log it;
/// `authenticate` is the public boundary and only ever reports
/// `InvalidCredentials`.
#[async_trait]
pub trait AuthenticationProvider: Send + Sync {
    /// Name used in logs and metrics
    fn name(&self) -> &'static str;

    /// Whether this provider can evaluate the credential variant
    fn supports(&self, kind: CredentialKind) -> bool;

    async fn attempt(&self, credential: &Credential) -> Result<Principal, AuthError>;

    async fn authenticate(&self, credential: &Credential) -> Result<Principal, AuthError> {
        match self.attempt(credential).await {
            Ok(principal) if principal.is_authenticated() => {
                record_outcome(self.name(), "success");
                Ok(principal)
            }
            Ok(_) => {
                record_outcome(self.name(), "unauthenticated");
                Err(AuthError::InvalidCredentials)
            }
            Err(e) => {
                tracing::debug!(provider = self.name(), reason = e.kind(), "Authentication rejected");
                record_outcome(self.name(), e.kind());
                Err(e.conceal())
            }
        }
    }
}

pub(crate) fn record_outcome(provider: &'static str, outcome: &'static str) {
    metrics::counter!("auth_attempts_total", "provider" => provider, "outcome" => outcome).increment(1);
}
