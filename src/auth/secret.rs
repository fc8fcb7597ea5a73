//! Passphrase source for token encryption keys

use secrecy::{ExposeSecret, Secret};

/// Passphrase used when no secret is configured
pub const DEFAULT_SECRET: &str = "secret";

/// Supplies the passphrase keys are derived from
///
/// Read on every call so a rotated value takes effect without restarting
/// the providers that hold the source.
pub trait SecretSource: Send + Sync {
    fn current(&self) -> Secret<String>;
}

/// Secret taken from configuration, falling back to [`DEFAULT_SECRET`]
#[derive(Clone)]
pub struct ConfiguredSecretSource {
    secret: Option<Secret<String>>,
}

impl ConfiguredSecretSource {
    pub fn new(secret: Option<Secret<String>>) -> Self {
        let secret = secret.filter(|s| !s.expose_secret().is_empty());
        if secret.is_none() {
            tracing::warn!("No token secret configured, falling back to the built-in default");
        }
        Self { secret }
    }

    pub fn is_default(&self) -> bool {
        self.secret.is_none()
    }
}

impl SecretSource for ConfiguredSecretSource {
    fn current(&self) -> Secret<String> {
        match &self.secret {
            Some(secret) => secret.clone(),
            None => Secret::new(DEFAULT_SECRET.to_string()),
        }
    }
}
