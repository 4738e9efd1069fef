use std::time::Duration;

use crate::auth::JwtConfig;

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 9988 | HTTP/WebSocket 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | SEED_DEFAULT_USERS | true | 启动时创建默认账号 |
/// | SESSION_QUEUE_CAPACITY | 64 | 每个会话的待发送事件上限 |
/// | WS_PING_INTERVAL_SECS | 30 | 事件通道 ping 间隔 |
/// | LOGIN_FAILURE_DELAY_MS | 500 | 登录固定延迟 (防时序攻击) |
/// | JWT_SECRET / JWT_EXPIRATION_MINUTES / JWT_ISSUER / JWT_AUDIENCE | - | 见 [`JwtConfig`] |
///
/// # 示例
///
/// ```ignore
/// HTTP_PORT=8080 SEED_DEFAULT_USERS=false cargo run -p attendance-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 是否创建默认 admin/employee 账号
    pub seed_default_users: bool,
    /// 每个会话的事件队列容量，满了即视为投递失败
    pub session_queue_capacity: usize,
    /// 事件通道 ping 间隔
    pub ws_ping_interval: Duration,
    /// 登录固定延迟
    pub login_delay: Duration,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        Self {
            http_port: env_or("HTTP_PORT", 9988),
            jwt: JwtConfig::from_env(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            seed_default_users: env_or("SEED_DEFAULT_USERS", true),
            session_queue_capacity: env_or("SESSION_QUEUE_CAPACITY", 64),
            ws_ping_interval: Duration::from_secs(env_or("WS_PING_INTERVAL_SECS", 30)),
            login_delay: Duration::from_millis(env_or("LOGIN_FAILURE_DELAY_MS", 500)),
        }
    }

    /// 测试配置：固定密钥、随机端口、无登录延迟
    pub fn for_tests(jwt_secret: impl Into<String>) -> Self {
        Self {
            http_port: 0,
            jwt: JwtConfig::with_secret(jwt_secret),
            environment: "test".into(),
            seed_default_users: true,
            session_queue_capacity: 64,
            ws_ping_interval: Duration::from_secs(30),
            login_delay: Duration::ZERO,
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
