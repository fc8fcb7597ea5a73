//! User domain models

use crate::auth::{AccountStatus, UserRecord};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register user request
#[derive(Debug, Deserialize, Validate)]
pub struct RegistrationRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,

    #[validate(length(min = 6, max = 128))]
    pub password: String,

    #[validate(email)]
    pub email: String,
}

/// User response DTO (never carries the secret hash)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub username: String,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub status: AccountStatus,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            username: user.username,
            email: user.email,
            roles: user.roles.into_iter().collect(),
            status: user.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, password: &str, email: &str) -> RegistrationRequest {
        RegistrationRequest {
            username: username.to_string(),
            password: password.to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request("alice", "secret1", "alice@example.com")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_short_username_and_password_rejected() {
        let errors = request("al", "12345", "al@example.com").validate().unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_bad_email_rejected() {
        for email in ["not-an-email", ""] {
            let errors = request("alice", "secret1", email).validate().unwrap_err();
            assert!(errors.field_errors().contains_key("email"), "email: {:?}", email);
        }
    }

    #[test]
    fn test_email_is_required() {
        let result = serde_json::from_str::<RegistrationRequest>(
            r#"{"username":"alice","password":"secret1"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_response_hides_hash() {
        let record = UserRecord::new("alice", "$argon2id$hash", ["ROLE_USER"]);
        let json = serde_json::to_value(UserResponse::from(record)).unwrap();

        assert_eq!(json["username"], "alice");
        assert_eq!(json["status"], "enabled");
        assert!(json.get("secret_hash").is_none());
    }
}
