//! Authentication dispatcher
//!
//! Routes a credential to every registered provider that supports its kind.
//! Candidates run concurrently, each bounded by the provider timeout. The
//! result is the earliest-registered candidate that succeeds: a later
//! provider's success is only accepted once every provider registered before
//! it has failed.

use super::{
    credential::Credential,
    error::AuthError,
    principal::Principal,
    provider::{record_outcome, AuthenticationProvider},
};
use futures::stream::{FuturesUnordered, StreamExt};
use std::{sync::Arc, time::Duration};

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

/// Ordered provider chain
pub struct AuthenticationDispatcher {
    providers: Vec<Arc<dyn AuthenticationProvider>>,
    provider_timeout: Duration,
}

pub struct AuthenticationDispatcherBuilder {
    providers: Vec<Arc<dyn AuthenticationProvider>>,
    provider_timeout: Duration,
}

impl AuthenticationDispatcherBuilder {
    /// Register a provider; registration order decides precedence
    pub fn provider(mut self, provider: Arc<dyn AuthenticationProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn build(self) -> AuthenticationDispatcher {
        AuthenticationDispatcher {
            providers: self.providers,
            provider_timeout: self.provider_timeout,
        }
    }
}

/// Outcome slot for one candidate
enum Slot {
    Pending,
    Failed,
    Succeeded(Principal),
}

impl AuthenticationDispatcher {
    pub fn builder() -> AuthenticationDispatcherBuilder {
        AuthenticationDispatcherBuilder {
            providers: Vec::new(),
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    pub fn providers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.providers.iter().map(|p| p.name())
    }

    /// Authenticate a credential against the chain
    ///
    /// - `Ok(Some(principal))`: a supporting provider accepted the credential
    /// - `Ok(None)`: no registered provider supports the credential kind
    /// - `Err(InvalidCredentials)`: no credential, or every candidate failed
    pub async fn authenticate(
        &self,
        credential: Option<&Credential>,
    ) -> Result<Option<Principal>, AuthError> {
        let Some(credential) = credential else {
            tracing::debug!("No credential presented");
            return Err(AuthError::InvalidCredentials);
        };

        let kind = credential.kind();
        let candidates: Vec<_> = self
            .providers
            .iter()
            .filter(|p| p.supports(kind))
            .cloned()
            .collect();

        if candidates.is_empty() {
            tracing::debug!(credential = %kind, "No provider supports credential");
            return Ok(None);
        }

        let mut pending: FuturesUnordered<_> = candidates
            .iter()
            .enumerate()
            .map(|(index, provider)| {
                let provider = provider.clone();
                let timeout = self.provider_timeout;
                async move {
                    let outcome = match tokio::time::timeout(timeout, provider.attempt(credential)).await {
                        Ok(result) => result,
                        Err(_) => Err(AuthError::Timeout),
                    };
                    (index, provider.name(), outcome)
                }
            })
            .collect();

        let mut slots: Vec<Slot> = candidates.iter().map(|_| Slot::Pending).collect();
        let mut next = 0;

        while let Some((index, name, outcome)) = pending.next().await {
            slots[index] = match outcome {
                Ok(principal) if principal.is_authenticated() => {
                    record_outcome(name, "success");
                    Slot::Succeeded(principal)
                }
                Ok(_) => {
                    tracing::debug!(provider = name, "Provider returned unauthenticated principal");
                    record_outcome(name, "unauthenticated");
                    Slot::Failed
                }
                Err(e) => {
                    tracing::debug!(provider = name, reason = e.kind(), "Provider rejected credential");
                    record_outcome(name, e.kind());
                    Slot::Failed
                }
            };

            while next < slots.len() {
                match std::mem::replace(&mut slots[next], Slot::Failed) {
                    Slot::Failed => next += 1,
                    Slot::Succeeded(principal) => {
                        tracing::info!(
                            provider = candidates[next].name(),
                            subject = principal.subject(),
                            "Authenticated"
                        );
                        return Ok(Some(principal));
                    }
                    Slot::Pending => {
                        slots[next] = Slot::Pending;
                        break;
                    }
                }
            }
        }

        tracing::info!(credential = %kind, "Authentication failed");
        Err(AuthError::InvalidCredentials)
    }
}
