//! 用户服务：注册与查询

use crate::{
    auth::{PasswordHasher, Role, UserRecord},
    concurrency::BlockingPool,
    error::AppError,
    models::user::RegistrationRequest,
    repository::InMemoryUserRepository,
    services::RolesProvider,
};
use std::sync::Arc;
use validator::Validate;

pub struct UserService {
    repo: Arc<InMemoryUserRepository>,
    hasher: PasswordHasher,
    pool: BlockingPool,
    roles: Arc<dyn RolesProvider>,
    password_min_length: u64,
}

impl UserService {
    pub fn new(
        repo: Arc<InMemoryUserRepository>,
        hasher: PasswordHasher,
        pool: BlockingPool,
        roles: Arc<dyn RolesProvider>,
    ) -> Self {
        Self {
            repo,
            hasher,
            pool,
            roles,
            password_min_length: 6,
        }
    }

    pub fn with_password_min_length(mut self, min: u64) -> Self {
        self.password_min_length = min;
        self
    }

    /// 注册用户
    ///
    /// 密码哈希在阻塞线程池中计算；新用户获得默认角色
    pub async fn register(&self, req: RegistrationRequest) -> Result<UserRecord, AppError> {
        req.validate()?;

        if (req.password.chars().count() as u64) < self.password_min_length {
            return Err(AppError::BadRequest(format!(
                "Password must be at least {} characters",
                self.password_min_length
            )));
        }

        let hasher = self.hasher.clone();
        let password = req.password;
        let secret_hash = self
            .pool
            .run(move || hasher.hash(&password))
            .await?
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let roles: Vec<String> = self
            .roles
            .default_roles()
            .iter()
            .map(Role::serialize)
            .collect();

        let record = UserRecord::new(req.username, secret_hash, roles).with_email(req.email);
        let user = self.repo.create(record).await?;

        tracing::info!(username = %user.username, roles = ?user.roles, "User registered");

        Ok(user)
    }

    /// 根据用户名查询用户
    pub async fn find(&self, username: &str) -> Result<UserRecord, AppError> {
        self.repo
            .find_by_username(username)
            .await
            .ok_or(AppError::NotFound)
    }
}
