//! Bearer token authentication

use super::{
    clock::Clock,
    credential::{Credential, CredentialKind},
    error::AuthError,
    principal::Principal,
    provider::AuthenticationProvider,
    secret::SecretSource,
    token::{TokenCodec, ROLES_CLAIM},
};
use crate::concurrency::BlockingPool;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::sync::Arc;

/// Decrypts a bearer token and turns its claims into a principal
pub struct BearerTokenAuthenticationProvider {
    secrets: Arc<dyn SecretSource>,
    clock: Arc<dyn Clock>,
    pool: BlockingPool,
}

impl BearerTokenAuthenticationProvider {
    pub fn new(secrets: Arc<dyn SecretSource>, clock: Arc<dyn Clock>, pool: BlockingPool) -> Self {
        Self {
            secrets,
            clock,
            pool,
        }
    }
}

#[async_trait]
impl AuthenticationProvider for BearerTokenAuthenticationProvider {
    fn name(&self) -> &'static str {
        "bearer_token"
    }

    fn supports(&self, kind: CredentialKind) -> bool {
        kind == CredentialKind::Bearer
    }

    async fn attempt(&self, credential: &Credential) -> Result<Principal, AuthError> {
        let Credential::Bearer(bearer) = credential else {
            return Err(AuthError::UnsupportedCredential);
        };

        let secret = self.secrets.current();
        let token = bearer.token().to_string();

        let claims = self
            .pool
            .run(move || TokenCodec::from_secret(secret.expose_secret()).decrypt(&token))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))??;

        if claims.is_expired_at(self.clock.now()) {
            return Err(AuthError::ExpiredToken);
        }

        let roles = claims.string_list_claim(ROLES_CLAIM)?.unwrap_or_default();
        Ok(Principal::authenticated(claims.subject(), roles))
    }
}
