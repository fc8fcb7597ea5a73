//! 应用状态与 HTTP 中间件

use crate::{
    auth::{
        account_status_check, AccessTokenIssuer, AuthenticationDispatcher,
        BearerTokenAuthenticationProvider, Clock, ConfiguredSecretSource, PasswordHasher,
        SecretSource, SystemClock, UsernamePasswordAuthenticationProvider,
    },
    concurrency::BlockingPool,
    config::AppConfig,
    repository::InMemoryUserRepository,
    services::{ConfiguredRolesProvider, UserService},
};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// 应用状态
///
/// 服务用 Arc 包装，请求之间共享
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub dispatcher: Arc<AuthenticationDispatcher>,
    pub bearer_provider: Arc<BearerTokenAuthenticationProvider>,
    pub issuer: Arc<AccessTokenIssuer>,
    pub user_service: Arc<UserService>,
}

impl AppState {
    /// 按配置装配认证链与服务
    ///
    /// 提供者注册顺序：用户名/密码在前，bearer 在后
    pub fn from_config(config: AppConfig) -> Self {
        Self::with_components(
            config,
            Arc::new(InMemoryUserRepository::new()),
            PasswordHasher::new(),
            Arc::new(SystemClock),
        )
    }

    /// 可替换存储、哈希参数与时钟的装配入口
    pub fn with_components(
        config: AppConfig,
        repo: Arc<InMemoryUserRepository>,
        hasher: PasswordHasher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let security = &config.security;
        let pool = BlockingPool::new(security.kdf_max_concurrency);
        let secrets: Arc<dyn SecretSource> =
            Arc::new(ConfiguredSecretSource::new(security.token_secret.clone()));

        let mut login_provider = UsernamePasswordAuthenticationProvider::new(
            repo.clone(),
            Arc::new(hasher.clone()),
            pool.clone(),
        );
        if security.enforce_account_status {
            login_provider = login_provider.with_pre_authentication_check(account_status_check());
        }

        let bearer_provider = Arc::new(BearerTokenAuthenticationProvider::new(
            secrets.clone(),
            clock.clone(),
            pool.clone(),
        ));

        let dispatcher = AuthenticationDispatcher::builder()
            .provider_timeout(security.provider_timeout())
            .provider(Arc::new(login_provider))
            .provider(bearer_provider.clone())
            .build();

        let issuer = AccessTokenIssuer::new(secrets, clock, pool.clone())
            .with_settings(security.issuer_settings());

        let user_service = UserService::new(
            repo,
            hasher,
            pool,
            Arc::new(ConfiguredRolesProvider::new(&security.default_roles)),
        )
        .with_password_min_length(security.password_min_length);

        Self {
            dispatcher: Arc::new(dispatcher),
            bearer_provider,
            issuer: Arc::new(issuer),
            user_service: Arc::new(user_service),
            config,
        }
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let uri = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();

        // 指标标签使用静态字符串
        let status = response.status().as_u16();
        let method_name = match method.as_str() {
            "GET" => "GET",
            "POST" => "POST",
            "PUT" => "PUT",
            "DELETE" => "DELETE",
            "PATCH" => "PATCH",
            _ => "UNKNOWN",
        };
        let status_code = match status {
            200 => "200",
            201 => "201",
            204 => "204",
            400 => "400",
            401 => "401",
            403 => "403",
            404 => "404",
            409 => "409",
            500 => "500",
            _ => "other",
        };

        metrics::counter!("http_requests_total", "method" => method_name, "status" => status_code)
            .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed.as_millis(),
            "Request completed"
        );

        // 在响应头中回传 trace_id/request_id
        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
