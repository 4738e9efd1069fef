//! 实时事件通道消息类型定义
//!
//! 这些类型在 attendance-server 和 attendance-client 之间共享，
//! 通过 WebSocket 文本帧以 JSON 传输。
//!
//! Server → Client: [`ChannelMessage`] (推送)
//! Client → Server: 无业务消息，只有 ping/pong 与 close 控制帧

pub mod event;

pub use event::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server → Client 推送帧
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelMessage {
    /// 会话已注册，之后的广播都会送达
    Ready { session_id: Uuid },

    /// 单个广播事件
    Event { event: DashboardEvent },
}

impl ChannelMessage {
    pub fn event(event: DashboardEvent) -> Self {
        Self::Event { event }
    }
}
