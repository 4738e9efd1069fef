//! [`CurrentUser`] 提取器
//!
//! 经过 `require_auth` 的请求直接读取扩展中的身份；
//! 其余路由在这里完成同样的 Bearer 校验。

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::AppError;
use crate::auth::middleware::authenticate;
use crate::auth::{CurrentUser, JwtService};
use crate::core::ServerState;
use crate::security_log;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &ServerState) -> Result<Self, AppError> {
        if let Some(user) = parts.extensions.get::<CurrentUser>().cloned() {
            return Ok(user);
        }

        let path = parts.uri.path().to_string();
        let Some(header) = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        else {
            security_log!("WARN", "auth_missing", uri = path);
            return Err(AppError::not_authenticated());
        };
        let token = JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Expected a Bearer token"))?;

        let user = authenticate(state, token, &path)?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
