use std::sync::Arc;

use shared::message::DashboardEvent;
use tokio_util::sync::CancellationToken;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::{AccountRepository, EmployeeRepository, MemoryDb, seed};
use crate::session::{BroadcastReport, SessionRegistry};
use crate::utils::AppResult;

/// 服务器状态 - 持有所有服务的共享引用
///
/// ServerState 是整个服务器的核心数据结构，持有所有服务的引用。
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 组件说明
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 服务器配置 (不可变) |
/// | db | MemoryDb | 员工与账号表 |
/// | sessions | SessionRegistry | 已连接管理员会话 |
/// | jwt_service | `Arc<JwtService>` | JWT 认证服务 |
/// | shutdown | CancellationToken | 关闭信号，事件通道任务据此退出 |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 内存数据库
    pub db: MemoryDb,
    /// 会话注册表
    pub sessions: SessionRegistry,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
    /// 关闭信号
    pub shutdown: CancellationToken,
}

impl ServerState {
    /// 创建空状态 (不创建默认账号)
    pub fn new(config: Config) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        Self {
            config,
            db: MemoryDb::new(),
            sessions: SessionRegistry::new(),
            jwt_service,
            shutdown: CancellationToken::new(),
        }
    }

    /// 初始化服务器状态
    ///
    /// `SEED_DEFAULT_USERS` 开启时写入默认 admin/employee 账号
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        let state = Self::new(config.clone());

        if config.seed_default_users {
            let created = seed::seed_default_users(&state.db).await?;
            if created > 0 {
                tracing::info!(created, "Default users seeded");
            }
        }

        tracing::info!(
            employees = state.employees().count(),
            environment = %config.environment,
            "Server state initialized"
        );
        Ok(state)
    }

    pub fn employees(&self) -> EmployeeRepository {
        EmployeeRepository::new(self.db.clone())
    }

    pub fn accounts(&self) -> AccountRepository {
        AccountRepository::new(self.db.clone())
    }

    /// 广播事件到所有已连接会话
    ///
    /// 调用方在存储写入成功后调用，不等待任何会话
    pub fn broadcast(&self, event: DashboardEvent) -> BroadcastReport {
        let report = self.sessions.broadcast(&event);
        if !report.dropped.is_empty() {
            tracing::info!(
                event = event.name(),
                dropped = report.dropped.len(),
                "Dropped unreachable sessions during broadcast"
            );
        }
        report
    }
}
