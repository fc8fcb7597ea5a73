//! 用户管理的 HTTP 处理器

use crate::{
    error::AppError,
    middleware::AppState,
    models::user::{RegistrationRequest, UserResponse},
};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

/// 注册用户
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegistrationRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = state.user_service.register(req).await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}
