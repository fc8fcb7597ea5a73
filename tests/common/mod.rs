//! 测试公共模块
//! 提供测试配置、应用状态与测试用户

#![allow(dead_code)]

use auth_gateway::{
    auth::{AccountStatus, Clock, FixedClock, PasswordHasher, SystemClock, UserRecord},
    config::{AppConfig, LoggingConfig, SecurityConfig, ServerConfig},
    middleware::AppState,
    repository::InMemoryUserRepository,
};
use axum::{body::Body, http::Response};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use secrecy::Secret;
use std::sync::Arc;

pub const TEST_SECRET: &str = "test-token-secret";

/// 创建测试配置
pub fn create_test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(), // 使用随机端口
            graceful_shutdown_timeout_secs: 5,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            token_secret: Some(Secret::new(TEST_SECRET.to_string())),
            issuer: "users".to_string(),
            access_token_ttl_secs: 3600,
            refresh_token_ttl_secs: 86400,
            default_roles: vec!["ROLE_USER".to_string()],
            provider_timeout_ms: 5000,
            kdf_max_concurrency: 4,
            password_min_length: 6,
            enforce_account_status: true,
        },
    }
}

/// 低成本哈希参数，避免测试过慢
pub fn test_hasher() -> PasswordHasher {
    PasswordHasher::with_cost(1024, 1, 1).expect("valid test hashing parameters")
}

/// 测试应用：状态与底层存储
pub struct TestApp {
    pub state: Arc<AppState>,
    pub repo: Arc<InMemoryUserRepository>,
}

/// 创建测试应用状态（系统时钟）
pub fn create_test_app() -> TestApp {
    create_test_app_with_clock(Arc::new(SystemClock))
}

/// 创建使用固定时钟的测试应用状态
pub fn create_test_app_at(now: DateTime<Utc>) -> TestApp {
    create_test_app_with_clock(Arc::new(FixedClock(now)))
}

fn create_test_app_with_clock(clock: Arc<dyn Clock>) -> TestApp {
    let repo = Arc::new(InMemoryUserRepository::new());
    let state = AppState::with_components(create_test_config(), repo.clone(), test_hasher(), clock);

    TestApp {
        state: Arc::new(state),
        repo,
    }
}

/// 创建测试用户
pub async fn create_test_user(
    repo: &InMemoryUserRepository,
    username: &str,
    password: &str,
    roles: &[&str],
    status: AccountStatus,
) {
    let hash = test_hasher().hash(password).expect("hashing succeeds");
    repo.create(UserRecord::new(username, hash, roles.iter().copied()).with_status(status))
        .await
        .expect("Failed to create test user");
}

/// 读取 JSON 响应体
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
