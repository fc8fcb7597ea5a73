//! Authentication and authorization module

pub mod bearer;
pub mod clock;
pub mod credential;
pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod issuer;
pub mod middleware;
pub mod password;
pub mod principal;
pub mod provider;
pub mod role;
pub mod secret;
pub mod token;
pub mod username_password;

pub use bearer::BearerTokenAuthenticationProvider;
pub use clock::{Clock, FixedClock, SystemClock};
pub use credential::{BearerCredential, Credential, CredentialKind, UsernamePasswordCredential};
pub use directory::{AccountStatus, PasswordVerifier, UserDirectory, UserRecord};
pub use dispatcher::AuthenticationDispatcher;
pub use error::{AuthError, TokenError};
pub use issuer::{AccessToken, AccessTokenIssuer, IssuerSettings};
pub use middleware::{bearer_auth_middleware, AuthContext};
pub use password::PasswordHasher;
pub use principal::Principal;
pub use provider::AuthenticationProvider;
pub use role::Role;
pub use secret::{ConfiguredSecretSource, SecretSource, DEFAULT_SECRET};
pub use token::{ClaimsSet, TokenCodec};
pub use username_password::{account_status_check, UsernamePasswordAuthenticationProvider};
