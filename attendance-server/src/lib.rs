//! Attendance Server - 考勤看板后端
//!
//! # 架构概述
//!
//! 本 crate 提供考勤看板的 HTTP/WebSocket 服务：
//!
//! - **会话注册表** (`session`): 已连接管理员事件通道的进程级表，负责广播
//! - **事件通道** (`api::ws`): 基于 WebSocket 的推送通道，令牌通过 query 传递
//! - **认证** (`auth`): JWT + Argon2 认证体系
//! - **员工存储** (`db`): 内存中的员工与账号仓库
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! attendance-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 认证、中间件
//! ├── session/       # 会话注册表
//! ├── db/            # 员工/账号仓库
//! ├── services/      # 看板快照、建议
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志、校验
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod services;
pub mod session;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use session::{SessionId, SessionRegistry};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ErrorBody, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 加载 .env 并初始化日志
///
/// 返回的 guard 必须在 main 中持有，否则文件日志会丢失
pub fn setup_environment() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    // .env 不存在时静默跳过
    let _ = dotenvy::dotenv();

    let level = std::env::var("LOG_LEVEL").ok();
    let json = std::env::var("LOG_JSON")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);
    let log_dir = std::env::var("LOG_DIR").ok();

    init_logger_with_file(level.as_deref(), json, log_dir.as_deref())
}

pub fn print_banner() {
    println!(
        r#"
   ___  __  __                 __
  / _ |/ /_/ /____ ___  ___/ /__ ____  _______
 / __ / __/ __/ -_) _ \/ _  / _ `/ _ \/ __/ -_)
/_/ |_\__/\__/\__/_//_/\_,_/\_,_/_//_/\__/\__/
    "#
    );
}
