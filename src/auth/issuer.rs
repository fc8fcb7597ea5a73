//! Access/refresh token issuance

use super::{
    clock::Clock,
    error::TokenError,
    principal::Principal,
    secret::SecretSource,
    token::{ClaimsSet, TokenCodec, ROLES_CLAIM},
};
use crate::concurrency::BlockingPool;
use chrono::{DateTime, Duration, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const TOKEN_TYPE: &str = "Bearer";
pub const DEFAULT_ISSUER: &str = "users";

/// Token pair returned by a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAccessToken")]
pub struct AccessToken {
    #[serde(rename = "access_token")]
    access_token: String,
    #[serde(rename = "type")]
    token_type: String,
    #[serde(rename = "expirationTime")]
    expires_at_millis: i64,
    #[serde(rename = "refresh_token")]
    refresh_token: String,
    scope: String,
}

#[derive(Deserialize)]
struct RawAccessToken {
    access_token: Option<String>,
    #[serde(rename = "type")]
    token_type: Option<String>,
    #[serde(rename = "expirationTime")]
    expires_at_millis: Option<i64>,
    refresh_token: Option<String>,
    scope: Option<String>,
}

impl TryFrom<RawAccessToken> for AccessToken {
    type Error = TokenError;

    fn try_from(raw: RawAccessToken) -> Result<Self, Self::Error> {
        AccessToken::new(
            raw.access_token.unwrap_or_default(),
            raw.token_type.unwrap_or_default(),
            raw.expires_at_millis
                .ok_or(TokenError::MissingField("expirationTime"))?,
            raw.refresh_token.unwrap_or_default(),
            raw.scope.unwrap_or_default(),
        )
    }
}

impl AccessToken {
    /// Fails on any empty required field; `scope` may be empty
    pub fn new(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        expires_at_millis: i64,
        refresh_token: impl Into<String>,
        scope: impl Into<String>,
    ) -> Result<Self, TokenError> {
        let access_token = access_token.into();
        let token_type = token_type.into();
        let refresh_token = refresh_token.into();

        if access_token.is_empty() {
            return Err(TokenError::MissingField("access_token"));
        }
        if token_type.is_empty() {
            return Err(TokenError::MissingField("type"));
        }
        if refresh_token.is_empty() {
            return Err(TokenError::MissingField("refresh_token"));
        }

        Ok(Self {
            access_token,
            token_type,
            expires_at_millis,
            refresh_token,
            scope: scope.into(),
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn expires_at_millis(&self) -> i64 {
        self.expires_at_millis
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}

/// Issuer settings
#[derive(Debug, Clone)]
pub struct IssuerSettings {
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl Default for IssuerSettings {
    fn default() -> Self {
        Self {
            issuer: DEFAULT_ISSUER.to_string(),
            access_ttl: Duration::hours(1),
            refresh_ttl: Duration::hours(24),
        }
    }
}

pub struct AccessTokenIssuer {
    secrets: Arc<dyn SecretSource>,
    clock: Arc<dyn Clock>,
    pool: BlockingPool,
    settings: IssuerSettings,
}

impl AccessTokenIssuer {
    pub fn new(secrets: Arc<dyn SecretSource>, clock: Arc<dyn Clock>, pool: BlockingPool) -> Self {
        Self {
            secrets,
            clock,
            pool,
            settings: IssuerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: IssuerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &IssuerSettings {
        &self.settings
    }

    /// Issue at the clock's current instant
    pub async fn issue_now(&self, principal: &Principal) -> Result<AccessToken, TokenError> {
        self.issue(principal, self.clock.now()).await
    }

    /// Mint an access token carrying the principal's roles and a role-free refresh token
    pub async fn issue(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<AccessToken, TokenError> {
        if !principal.is_authenticated() {
            return Err(TokenError::UnauthenticatedPrincipal);
        }

        let roles: Vec<String> = principal.roles().iter().cloned().collect();
        let access = self
            .claims(principal, now, self.settings.access_ttl)
            .claim(ROLES_CLAIM, roles)
            .build()?;
        let refresh = self
            .claims(principal, now, self.settings.refresh_ttl)
            .claim(ROLES_CLAIM, Vec::<String>::new())
            .build()?;

        // claims are whole seconds; the response keeps the caller's millisecond precision
        let expires_at_millis = (now + self.settings.access_ttl).timestamp_millis();
        let secret = self.secrets.current();

        let (access_token, refresh_token) = self
            .pool
            .run(move || {
                let codec = TokenCodec::from_secret(secret.expose_secret());
                Ok::<_, TokenError>((codec.encrypt(&access)?, codec.encrypt(&refresh)?))
            })
            .await
            .map_err(|e| TokenError::Encryption(e.to_string()))??;

        metrics::counter!("tokens_issued_total").increment(1);
        tracing::debug!(subject = principal.subject(), "Issued token pair");

        AccessToken::new(access_token, TOKEN_TYPE, expires_at_millis, refresh_token, "")
    }

    fn claims(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> super::token::ClaimsBuilder {
        ClaimsSet::builder()
            .subject(principal.subject())
            .issuer(self.settings.issuer.clone())
            .issued_at(now)
            .expires_at(now + ttl)
    }
}
