//! 管理端点

use crate::{auth::AuthContext, auth::Role, error::AppError, middleware::AppState};
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct AdminStatusResponse {
    pub subject: String,
    pub providers: Vec<&'static str>,
    pub issuer: String,
}

/// 管理员状态，需要 ROLE_ADMIN
///
/// 刷新令牌不带角色，因此无法通过此检查
pub async fn status(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<Json<AdminStatusResponse>, AppError> {
    auth_context.require_role(Role::ADMIN.name())?;

    Ok(Json(AdminStatusResponse {
        subject: auth_context.principal.subject().to_string(),
        providers: state.dispatcher.providers().collect(),
        issuer: state.issuer.settings().issuer.clone(),
    }))
}
