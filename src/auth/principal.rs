//! Authenticated principal

use serde::Serialize;
use std::collections::BTreeSet;

/// Result of authentication: a subject plus the roles it was granted
///
/// Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    subject: String,
    roles: BTreeSet<String>,
    authenticated: bool,
}

impl Principal {
    /// Principal that passed a provider's checks
    pub fn authenticated<I, S>(subject: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subject: subject.into(),
            roles: roles.into_iter().map(Into::into).collect(),
            authenticated: true,
        }
    }

    /// Identity that has not been verified; never accepted as a success
    pub fn unauthenticated(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            roles: BTreeSet::new(),
            authenticated: false,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}
