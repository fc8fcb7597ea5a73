//! Username/secret authentication against a user directory

use super::{
    credential::{Credential, CredentialKind},
    directory::{AccountStatus, PasswordVerifier, UserDirectory, UserRecord},
    error::AuthError,
    principal::Principal,
    provider::AuthenticationProvider,
};
use crate::concurrency::BlockingPool;
use async_trait::async_trait;
use std::sync::Arc;

/// Hook run against the directory record around principal construction
pub type AccountCheck = Arc<dyn Fn(&UserRecord) -> Result<(), AuthError> + Send + Sync>;

fn no_check() -> AccountCheck {
    Arc::new(|_: &UserRecord| Ok(()))
}

/// Reject disabled and locked accounts
pub fn account_status_check() -> AccountCheck {
    Arc::new(|user: &UserRecord| match user.status {
        AccountStatus::Enabled => Ok(()),
        AccountStatus::Disabled => Err(AuthError::AccountDisabled),
        AccountStatus::Locked => Err(AuthError::AccountLocked),
    })
}

pub struct UsernamePasswordAuthenticationProvider {
    directory: Arc<dyn UserDirectory>,
    verifier: Arc<dyn PasswordVerifier>,
    pool: BlockingPool,
    pre_authentication_check: AccountCheck,
    post_authentication_check: AccountCheck,
}

impl UsernamePasswordAuthenticationProvider {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        verifier: Arc<dyn PasswordVerifier>,
        pool: BlockingPool,
    ) -> Self {
        Self {
            directory,
            verifier,
            pool,
            pre_authentication_check: no_check(),
            post_authentication_check: no_check(),
        }
    }

    /// Runs after the secret matched and before the principal is built
    pub fn with_pre_authentication_check(mut self, check: AccountCheck) -> Self {
        self.pre_authentication_check = check;
        self
    }

    /// Runs after the principal is built
    pub fn with_post_authentication_check(mut self, check: AccountCheck) -> Self {
        self.post_authentication_check = check;
        self
    }

    async fn secret_matches(&self, plain: &str, hash: &str) -> Result<bool, AuthError> {
        let verifier = self.verifier.clone();
        let plain = plain.to_string();
        let hash = hash.to_string();

        self.pool
            .run(move || verifier.matches(&plain, &hash))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))
    }
}

#[async_trait]
impl AuthenticationProvider for UsernamePasswordAuthenticationProvider {
    fn name(&self) -> &'static str {
        "username_password"
    }

    fn supports(&self, kind: CredentialKind) -> bool {
        kind == CredentialKind::UsernamePassword
    }

    async fn attempt(&self, credential: &Credential) -> Result<Principal, AuthError> {
        let Credential::UsernamePassword(credential) = credential else {
            return Err(AuthError::UnsupportedCredential);
        };

        // Unknown user and wrong secret are reported identically
        let user = self
            .directory
            .find_by_username(credential.username())
            .await
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.secret_matches(credential.secret(), &user.secret_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        (self.pre_authentication_check)(&user)?;
        let principal = Principal::authenticated(user.username.clone(), user.roles.iter().cloned());
        (self.post_authentication_check)(&user)?;

        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StaticDirectory(HashMap<String, UserRecord>);

    #[async_trait]
    impl UserDirectory for StaticDirectory {
        async fn find_by_username(&self, username: &str) -> Option<UserRecord> {
            self.0.get(username).cloned()
        }
    }

    /// Stores the secret itself as the "hash"
    struct PlainVerifier;

    impl PasswordVerifier for PlainVerifier {
        fn matches(&self, plain: &str, hash: &str) -> bool {
            plain == hash
        }
    }

    fn provider_with(records: Vec<UserRecord>) -> UsernamePasswordAuthenticationProvider {
        let directory = StaticDirectory(
            records
                .into_iter()
                .map(|r| (r.username.clone(), r))
                .collect(),
        );
        UsernamePasswordAuthenticationProvider::new(
            Arc::new(directory),
            Arc::new(PlainVerifier),
            BlockingPool::new(2),
        )
    }

    #[tokio::test]
    async fn test_matching_secret_authenticates() {
        let provider = provider_with(vec![UserRecord::new("u1", "p1", ["ROLE_USER"])]);

        let principal = provider
            .authenticate(&Credential::username_password("u1", "p1"))
            .await
            .unwrap();

        assert_eq!(principal.subject(), "u1");
        assert!(principal.has_role("ROLE_USER"));
        assert!(principal.is_authenticated());
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_secret_look_the_same() {
        let provider = provider_with(vec![UserRecord::new("u1", "p1", ["ROLE_USER"])]);

        let wrong_secret = provider
            .authenticate(&Credential::username_password("u1", "wrong"))
            .await;
        let unknown_user = provider
            .authenticate(&Credential::username_password("nobody", "p1"))
            .await;

        assert_eq!(wrong_secret, Err(AuthError::InvalidCredentials));
        assert_eq!(unknown_user, Err(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_bearer_credential_rejected() {
        let provider = provider_with(vec![]);

        assert!(!provider.supports(CredentialKind::Bearer));
        assert_eq!(
            provider.attempt(&Credential::bearer("token")).await,
            Err(AuthError::UnsupportedCredential)
        );
    }

    #[tokio::test]
    async fn test_default_checks_ignore_account_status() {
        let provider = provider_with(vec![
            UserRecord::new("u1", "p1", ["ROLE_USER"]).with_status(AccountStatus::Locked)
        ]);

        assert!(provider
            .authenticate(&Credential::username_password("u1", "p1"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_account_status_check_rejects_locked_and_disabled() {
        let provider = provider_with(vec![
            UserRecord::new("locked", "p1", ["ROLE_USER"]).with_status(AccountStatus::Locked),
            UserRecord::new("disabled", "p1", ["ROLE_USER"]).with_status(AccountStatus::Disabled),
        ])
        .with_pre_authentication_check(account_status_check());

        assert_eq!(
            provider.attempt(&Credential::username_password("locked", "p1")).await,
            Err(AuthError::AccountLocked)
        );
        assert_eq!(
            provider
                .authenticate(&Credential::username_password("disabled", "p1"))
                .await,
            Err(AuthError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn test_post_check_failure_rejects() {
        let provider = provider_with(vec![UserRecord::new("u1", "p1", ["ROLE_USER"])])
            .with_post_authentication_check(Arc::new(|_: &UserRecord| Err(AuthError::AccountDisabled)));

        assert_eq!(
            provider.attempt(&Credential::username_password("u1", "p1")).await,
            Err(AuthError::AccountDisabled)
        );
    }
}
