//! Session Registry - 已连接管理员会话表
//!
//! # 架构
//!
//! ```text
//!  handler (create/edit/clock-in)
//!          │ broadcast(event)
//!          ▼
//! ┌────────────────────────────┐
//! │      SessionRegistry       │  Mutex<HashMap<SessionId, Entry>>
//! └──┬──────────┬──────────┬───┘
//!    │ try_send │ try_send │ try_send
//!    ▼          ▼          ▼
//!  mpsc       mpsc       mpsc      每个会话一个有界队列
//!    │          │          │
//!  ws task    ws task    ws task   各自独立写 socket
//! ```
//!
//! 注册、注销、广播在成员表上互斥；向各会话的投递互不阻塞。
//! 投递失败（队列已关闭或已满）的会话在同一次广播中被移除，
//! 其连接任务随后看到队列关闭并断开，客户端重连后全量刷新。

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use shared::message::DashboardEvent;
use shared::models::{EmployeeId, Role};
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

/// 会话 ID，每次通道打开时生成
pub type SessionId = Uuid;

/// 建立通道时认证的身份
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub employee_id: EmployeeId,
    pub email: String,
    pub role: Role,
}

#[derive(Debug)]
struct SessionEntry {
    identity: SessionIdentity,
    tx: mpsc::Sender<DashboardEvent>,
}

/// 一次广播的结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// 成功入队的会话数
    pub delivered: usize,
    /// 投递失败并已注销的会话
    pub dropped: Vec<SessionId>,
}

/// 会话注册表 (Clone 共享同一张表)
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<SessionId, SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册会话
    ///
    /// 同一 `id` 重复注册为空操作，返回 `false`
    pub fn register(
        &self,
        id: SessionId,
        identity: SessionIdentity,
        tx: mpsc::Sender<DashboardEvent>,
    ) -> bool {
        let mut sessions = self.sessions.lock();
        if sessions.contains_key(&id) {
            tracing::debug!(session_id = %id, "Session already registered");
            return false;
        }
        tracing::info!(
            session_id = %id,
            employee_id = identity.employee_id,
            total = sessions.len() + 1,
            "Session registered"
        );
        sessions.insert(id, SessionEntry { identity, tx });
        true
    }

    /// 注销会话，已移除的会话再次注销是安全的
    pub fn unregister(&self, id: &SessionId) -> bool {
        let removed = self.sessions.lock().remove(id);
        match removed {
            Some(entry) => {
                tracing::info!(
                    session_id = %id,
                    employee_id = entry.identity.employee_id,
                    "Session unregistered"
                );
                true
            }
            None => false,
        }
    }

    /// 向所有已注册会话广播事件 (fire-and-forget)
    pub fn broadcast(&self, event: &DashboardEvent) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut sessions = self.sessions.lock();

        for (id, entry) in sessions.iter() {
            match entry.tx.try_send(event.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(session_id = %id, "Session channel closed");
                    report.dropped.push(*id);
                }
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(session_id = %id, "Session queue full, dropping session");
                    report.dropped.push(*id);
                }
            }
        }

        for id in &report.dropped {
            sessions.remove(id);
        }

        tracing::debug!(
            event = event.name(),
            employee_id = event.employee_id(),
            delivered = report.delivered,
            dropped = report.dropped.len(),
            "Event broadcast"
        );
        report
    }

    /// 创建并注册新会话，返回作用域守卫与事件接收端
    pub fn open(
        &self,
        identity: SessionIdentity,
        capacity: usize,
    ) -> (SessionGuard, mpsc::Receiver<DashboardEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let id = Uuid::new_v4();
        self.register(id, identity, tx);
        (
            SessionGuard {
                registry: self.clone(),
                id,
            },
            rx,
        )
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    pub fn identity(&self, id: &SessionId) -> Option<SessionIdentity> {
        self.sessions.lock().get(id).map(|e| e.identity.clone())
    }
}

/// 会话作用域守卫
///
/// Drop 时注销会话，连接任务无论以何种方式退出都不会遗留注册项
#[derive(Debug)]
pub struct SessionGuard {
    registry: SessionRegistry,
    id: SessionId,
}

impl SessionGuard {
    pub fn id(&self) -> SessionId {
        self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.unregister(&self.id);
    }
}
