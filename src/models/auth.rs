//! Authentication-related models

use crate::auth::{Credential, UsernamePasswordCredential};
use serde::{Deserialize, Serialize};

/// Form-encoded login request
///
/// Missing fields are accepted here and become empty strings, so that a
/// partial form is rejected by authentication rather than by extraction.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginForm {
    pub fn into_credential(self) -> Credential {
        Credential::UsernamePassword(UsernamePasswordCredential::from_form(
            self.username.as_deref(),
            self.password.as_deref(),
        ))
    }
}

/// Identity of the caller of a bearer-protected endpoint
#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub username: String,
    pub roles: Vec<String>,
}
