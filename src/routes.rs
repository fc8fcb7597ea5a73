//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{auth::middleware::bearer_auth_middleware, handlers, middleware::AppState};

/// 请求体上限
const MAX_BODY_BYTES: usize = 64 * 1024;

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new().route("/health", get(handlers::health::health_check));

    // 登录与注册（无需认证）
    let auth_routes = Router::new()
        .route("/api/v1/authenticate", post(handlers::auth::authenticate))
        .route("/api/v1/users", post(handlers::user::register));

    // 需要 bearer 令牌的路由
    let authenticated_routes = Router::new()
        .route("/api/v1/users/me", get(handlers::auth::current_user))
        .route("/api/v1/admin/status", get(handlers::admin::status))
        .layer(axum::middleware::from_fn_with_state(
            state.bearer_provider.clone(),
            bearer_auth_middleware,
        ));

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(authenticated_routes)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
