//! 认证相关的 HTTP 处理器

use crate::{
    auth::{AccessToken, AuthContext},
    error::AppError,
    middleware::AppState,
    models::auth::{CurrentUserResponse, LoginForm},
};
use axum::{extract::State, Form, Json};
use std::sync::Arc;

/// 登录
///
/// 表单凭证经分发器认证；没有提供者处理该凭证同样视为认证失败
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<Json<AccessToken>, AppError> {
    let credential = form.into_credential();

    let principal = state
        .dispatcher
        .authenticate(Some(&credential))
        .await?
        .ok_or(AppError::Unauthorized)?;

    let token = state.issuer.issue_now(&principal).await?;

    tracing::info!(subject = principal.subject(), "Login succeeded");

    Ok(Json(token))
}

/// 当前用户信息
pub async fn current_user(auth_context: AuthContext) -> Json<CurrentUserResponse> {
    let principal = auth_context.principal;

    Json(CurrentUserResponse {
        username: principal.subject().to_string(),
        roles: principal.roles().iter().cloned().collect(),
    })
}
