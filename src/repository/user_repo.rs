//! 内存用户存储

use crate::{
    auth::{UserDirectory, UserRecord},
    error::AppError,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// 用户名和邮箱各自唯一
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 根据用户名查找用户
    pub async fn find_by_username(&self, username: &str) -> Option<UserRecord> {
        self.users.read().await.get(username).cloned()
    }

    /// 根据邮箱查找用户（忽略大小写）
    pub async fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        self.users
            .read()
            .await
            .values()
            .find(|u| {
                u.email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .cloned()
    }

    /// 创建用户
    pub async fn create(&self, user: UserRecord) -> Result<UserRecord, AppError> {
        // 检查与插入在同一把写锁内完成
        let mut users = self.users.write().await;

        if users.contains_key(&user.username) {
            return Err(AppError::Conflict(format!(
                "Username '{}' already exists",
                user.username
            )));
        }

        if let Some(email) = user.email.as_deref() {
            let taken = users.values().any(|u| {
                u.email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            });
            if taken {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }
        }

        users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Option<UserRecord> {
        InMemoryUserRepository::find_by_username(self, username).await
    }
}
