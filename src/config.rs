//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use crate::auth::{IssuerSettings, Role};
use config::{Config, ConfigError, Environment};
use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:3000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// 令牌加密口令（未设置时回退到内置常量）
    pub token_secret: Option<Secret<String>>,
    /// 令牌签发者
    pub issuer: String,
    /// 访问令牌过期时间（秒）
    pub access_token_ttl_secs: u64,
    /// 刷新令牌过期时间（秒）
    pub refresh_token_ttl_secs: u64,
    /// 新注册用户的默认角色
    pub default_roles: Vec<String>,
    /// 单个认证提供者超时（毫秒）
    pub provider_timeout_ms: u64,
    /// 密钥派生/密码哈希最大并发数
    pub kdf_max_concurrency: usize,
    /// 密码最小长度
    pub password_min_length: u64,
    /// 登录时拒绝禁用/锁定账户
    pub enforce_account_status: bool,
}

impl SecurityConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn issuer_settings(&self) -> IssuerSettings {
        IssuerSettings {
            issuer: self.issuer.clone(),
            access_ttl: chrono::Duration::seconds(self.access_token_ttl_secs as i64),
            refresh_ttl: chrono::Duration::seconds(self.refresh_token_ttl_secs as i64),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("server.addr", "0.0.0.0:3000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.issuer", "users")?
            .set_default("security.access_token_ttl_secs", 3600)?
            .set_default("security.refresh_token_ttl_secs", 86400)?
            .set_default("security.default_roles", vec!["ROLE_USER"])?
            .set_default("security.provider_timeout_ms", 5000)?
            .set_default("security.kdf_max_concurrency", 8)?
            .set_default("security.password_min_length", 6)?
            .set_default("security.enforce_account_status", true)?;

        // 从环境变量加载配置（前缀为 AUTH_）
        settings = settings.add_source(
            Environment::with_prefix("AUTH")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("security.default_roles")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    fn validate(&self) -> Result<(), ConfigError> {
        // 验证端口范围
        if let Some(port_str) = self.server.addr.split(':').next_back() {
            if let Ok(port) = port_str.parse::<u16>() {
                if port < 1024 {
                    return Err(ConfigError::Message("Server port should be >= 1024".to_string()));
                }
            }
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        // 验证令牌过期时间
        if self.security.access_token_ttl_secs == 0 || self.security.refresh_token_ttl_secs == 0 {
            return Err(ConfigError::Message("token TTLs must be greater than 0".to_string()));
        }

        if self.security.access_token_ttl_secs >= self.security.refresh_token_ttl_secs {
            return Err(ConfigError::Message(
                "access_token_ttl_secs must be less than refresh_token_ttl_secs".to_string(),
            ));
        }

        if self.security.provider_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "provider_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.security.kdf_max_concurrency == 0 {
            return Err(ConfigError::Message(
                "kdf_max_concurrency must be at least 1".to_string(),
            ));
        }

        // 验证默认角色
        for raw in &self.security.default_roles {
            // 空白或字面量 UNKNOWN 无法作为角色授予
            if Role::deserialize(Some(raw.trim())).serialize() == Role::UNKNOWN.serialize() {
                return Err(ConfigError::Message(format!("Invalid default role: '{}'", raw)));
            }
        }

        Ok(())
    }
}
