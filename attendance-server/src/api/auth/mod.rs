//! 登录与当前用户
//!
//! `/api/auth/login` 在 `require_auth` 的公开路径白名单中，`/api/auth/me` 需要令牌。

mod handler;

use axum::Router;
use axum::routing::{get, post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/auth/login", post(handler::login))
        .route("/api/auth/me", get(handler::me))
}
