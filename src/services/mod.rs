//! Business logic services layer

pub mod roles_provider;
pub mod user_service;

pub use roles_provider::{ConfiguredRolesProvider, RolesProvider};
pub use user_service::UserService;
