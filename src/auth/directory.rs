//! Collaborators consumed by the username/password provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Account state stored with a user record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Enabled,
    Disabled,
    Locked,
}

/// Stored user as seen by authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub secret_hash: String,
    pub roles: BTreeSet<String>,
    pub email: Option<String>,
    pub status: AccountStatus,
}

impl UserRecord {
    pub fn new<I, S>(username: impl Into<String>, secret_hash: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            username: username.into(),
            secret_hash: secret_hash.into(),
            roles: roles.into_iter().map(Into::into).collect(),
            email: None,
            status: AccountStatus::Enabled,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }
}

/// Lookup of user records by username
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Option<UserRecord>;
}

/// Checks a plain secret against a stored hash
pub trait PasswordVerifier: Send + Sync {
    fn matches(&self, plain: &str, hash: &str) -> bool;
}
