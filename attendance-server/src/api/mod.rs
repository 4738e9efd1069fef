//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 登录与当前用户
//! - [`employees`] - 员工注册、字段修改、打卡
//! - [`dashboard`] - 管理员看板快照与事件通道

pub mod auth;
pub mod dashboard;
pub mod employees;
pub mod health;

use axum::Router;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(employees::router())
        .merge(dashboard::router())
}
