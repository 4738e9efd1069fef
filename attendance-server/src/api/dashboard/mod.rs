//! Dashboard API Module
//!
//! | 路径 | 方法 | 说明 | 权限 |
//! |------|------|------|------|
//! | /api/admin/dashboard | GET | 全量快照 + 建议 | admin |
//! | /api/dashboard/ws?token= | GET | 事件通道 (WebSocket) | admin (query 令牌) |

mod handler;
pub mod ws;

use axum::{Router, middleware, routing::get};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    let snapshot_routes = Router::new()
        .route("/api/admin/dashboard", get(handler::snapshot))
        .layer(middleware::from_fn(require_admin));

    // 事件通道自行校验 query 令牌，不挂 require_admin
    let channel_routes = Router::new().route("/api/dashboard/ws", get(ws::channel));

    snapshot_routes.merge(channel_routes)
}
