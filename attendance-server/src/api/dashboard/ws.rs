//! 事件通道 - WebSocket 推送
//!
//! # 连接流程
//!
//! ```text
//! Client                                   Server
//!   │ GET /api/dashboard/ws?token=...        │
//!   │ ─────────────────────────────────────► │ 校验令牌 (401 / 403 拒绝，不升级)
//!   │ ◄───────────────────────────────────── │ 101 Switching Protocols
//!   │                                        │ registry.open() → SessionGuard
//!   │ ◄── {"type":"ready","session_id":..} ─ │
//!   │ ◄── {"type":"event","event":{..}} ──── │ 每次广播
//!   │ ◄── Ping ───────────────────────────── │ 每 WS_PING_INTERVAL_SECS
//!   │ ─── Close ──────────────────────────► │ guard drop → unregister
//! ```
//!
//! 会话在 [`crate::session::SessionGuard`] 的作用域内存活：任务无论因关闭帧、
//! 发送失败、注册表移除还是服务器关闭退出，都会注销。

use std::time::Duration;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    response::{IntoResponse, Response},
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::message::ChannelMessage;

use crate::auth::CurrentUser;
use crate::auth::middleware::authenticate;
use crate::core::ServerState;
use crate::security_log;
use crate::session::SessionIdentity;
use crate::utils::AppError;

#[derive(Debug, Deserialize)]
pub struct ChannelQuery {
    pub token: Option<String>,
}

/// `GET /api/dashboard/ws?token=...`
///
/// 令牌缺失或无效返回 401，非管理员返回 403，均不升级
pub async fn channel(
    State(state): State<ServerState>,
    Query(query): Query<ChannelQuery>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    let token = query
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            security_log!("WARN", "channel_missing_token", uri = "/api/dashboard/ws".to_string());
            AppError::not_authenticated()
        })?;

    let user = authenticate(&state, token, "/api/dashboard/ws")?;
    if !user.is_admin() {
        security_log!(
            "WARN",
            "channel_admin_required",
            user_id = user.id,
            user_role = user.role.as_str()
        );
        return Err(AppError::admin_required());
    }

    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    Ok(upgrade.on_upgrade(move |socket| run_session(socket, state, user)))
}

async fn run_session(socket: WebSocket, state: ServerState, user: CurrentUser) {
    let identity = SessionIdentity {
        employee_id: user.id,
        email: user.email,
        role: user.role,
    };
    let (guard, mut events) = state
        .sessions
        .open(identity, state.config.session_queue_capacity);
    let session_id = guard.id();

    let (mut sink, mut stream) = socket.split();

    if send_frame(&mut sink, &ChannelMessage::Ready { session_id })
        .await
        .is_err()
    {
        return;
    }

    let period = state.config.ws_ping_interval.max(Duration::from_secs(1));
    let mut ping = tokio::time::interval(period);
    // 第一次 tick 立即完成
    ping.tick().await;

    let reason = loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                break "server shutdown";
            }
            event = events.recv() => match event {
                Some(event) => {
                    if send_frame(&mut sink, &ChannelMessage::event(event)).await.is_err() {
                        break "send failed";
                    }
                }
                None => {
                    // 注册表已移除本会话
                    let _ = sink.send(Message::Close(None)).await;
                    break "dropped by registry";
                }
            },
            _ = ping.tick() => {
                if sink.send(Message::Ping(Default::default())).await.is_err() {
                    break "ping failed";
                }
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Close(_))) | None => break "client closed",
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(%session_id, error = %e, "Channel read error");
                    break "read error";
                }
            },
        }
    };

    tracing::info!(%session_id, reason, "Event channel closed");
    drop(guard);
}

async fn send_frame(
    sink: &mut SplitSink<WebSocket, Message>,
    frame: &ChannelMessage,
) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(frame) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize channel frame");
            return Ok(());
        }
    };
    sink.send(Message::Text(text.into())).await
}
