//! 会话模块
//!
//! 管理员事件通道的进程级注册表。

pub mod registry;

pub use registry::{BroadcastReport, SessionGuard, SessionId, SessionIdentity, SessionRegistry};
