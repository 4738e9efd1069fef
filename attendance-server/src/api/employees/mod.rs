//! Employee API Module
//!
//! | 路径 | 方法 | 说明 | 权限 |
//! |------|------|------|------|
//! | /api/employees | POST | 注册员工 | admin |
//! | /api/employees/{id} | PATCH | 修改单个字段 | admin |
//! | /api/employees/{id}/skills | POST | 添加技能 | admin |
//! | /api/employees/profile | GET | 本人记录 | 登录 |
//! | /api/employees/clock-in | POST | 上班打卡 | 登录 |
//! | /api/employees/clock-out | POST | 下班打卡 | 登录 |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::auth::require_admin;
use crate::core::ServerState;

/// Employee router
pub fn router() -> Router<ServerState> {
    // 本人操作：登录即可
    let self_routes = Router::new()
        .route("/api/employees/profile", get(handler::profile))
        .route("/api/employees/clock-in", post(handler::clock_in))
        .route("/api/employees/clock-out", post(handler::clock_out));

    // 管理路由：仅管理员可用
    let manage_routes = Router::new()
        .route("/api/employees", post(handler::create))
        .route("/api/employees/{id}", patch(handler::edit_field))
        .route("/api/employees/{id}/skills", post(handler::add_skill))
        .layer(middleware::from_fn(require_admin));

    self_routes.merge(manage_routes)
}
