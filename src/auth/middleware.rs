//! Bearer 认证中间件

use crate::{
    auth::{AuthenticationProvider, BearerTokenAuthenticationProvider, Credential, Principal},
    error::AppError,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// 认证上下文（附加到请求扩展）
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: Principal,
}

impl AuthContext {
    /// 要求调用方持有指定角色，否则 403
    pub fn require_role(&self, role: &str) -> Result<(), AppError> {
        if self.principal.has_role(role) {
            Ok(())
        } else {
            tracing::warn!(
                subject = self.principal.subject(),
                required = role,
                "Missing required role"
            );
            Err(AppError::Forbidden)
        }
    }
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// 从 Authorization 头提取 bearer 凭证
pub fn extract_credential(headers: &HeaderMap) -> Option<Credential> {
    Credential::from_authorization_header(
        headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
    )
}

/// Bearer 认证中间件 - 必须认证
///
/// 独立走 bearer 提供者，不经过分发器
pub async fn bearer_auth_middleware(
    State(provider): State<Arc<BearerTokenAuthenticationProvider>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credential = extract_credential(req.headers()).ok_or_else(|| {
        tracing::debug!("No bearer credential on request");
        AppError::Unauthorized
    })?;

    let principal = provider.authenticate(&credential).await?;

    req.extensions_mut().insert(AuthContext { principal });

    Ok(next.run(req).await)
}
