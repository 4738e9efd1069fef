//! 事件通道客户端
//!
//! 1. 以 query 令牌连接 `/api/dashboard/ws`
//! 2. 收到 `ready` 帧后发出 [`ChannelSignal::Opened`]，Dispatcher 据此全量刷新
//! 3. 每个 `event` 帧转为 [`ChannelSignal::Event`]
//! 4. 断开后发出 [`ChannelSignal::Closed`]，指数退避后重连
//! 5. 握手被 401/403 拒绝时发出 [`ChannelSignal::Refused`] 并停止 (需要重新登录)

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use shared::message::{ChannelMessage, DashboardEvent};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{ClientConfig, ClientError, ClientResult};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Lifecycle and payload signals delivered to the Dispatcher
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelSignal {
    /// 服务端已注册会话
    Opened { session_id: Uuid },
    /// 广播事件
    Event(DashboardEvent),
    /// 连接断开，将重连
    Closed { reason: String },
    /// 握手被拒绝，终止
    Refused { reason: String },
}

/// Reconnecting event channel
pub struct EventChannel {
    config: ClientConfig,
    token: String,
    signals: mpsc::Sender<ChannelSignal>,
    shutdown: CancellationToken,
}

impl EventChannel {
    pub fn new(
        config: ClientConfig,
        token: impl Into<String>,
        signals: mpsc::Sender<ChannelSignal>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            token: token.into(),
            signals,
            shutdown,
        }
    }

    /// Main run loop: connect, forward frames, reconnect on failure
    pub async fn run(self) {
        tracing::info!("Event channel started");
        let mut reconnect_delay = self.config.reconnect_delay;
        let mut failures: u32 = 0;

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            let outcome = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                result = self.connect() => result,
            };

            let reason = match outcome {
                Ok(ws) => {
                    failures = 0;
                    reconnect_delay = self.config.reconnect_delay;
                    match self.run_session(ws).await {
                        Ok(()) => break,
                        Err(e) => e.to_string(),
                    }
                }
                Err(ClientError::ConnectionRefused(reason)) => {
                    tracing::warn!(%reason, "Event channel refused");
                    self.emit(ChannelSignal::Refused { reason }).await;
                    break;
                }
                Err(e) => {
                    failures += 1;
                    e.to_string()
                }
            };

            tracing::warn!(
                %reason,
                delay_ms = reconnect_delay.as_millis() as u64,
                "Event channel disconnected, will reconnect"
            );
            self.emit(ChannelSignal::Closed {
                reason: reason.clone(),
            })
            .await;

            if self.config.max_reconnect_attempts > 0 && failures >= self.config.max_reconnect_attempts
            {
                tracing::error!(failures, "Event channel giving up after repeated failures");
                break;
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(reconnect_delay) => {},
            }
            reconnect_delay = next_delay(reconnect_delay, self.config.max_reconnect_delay);
        }

        tracing::info!("Event channel stopped");
    }

    async fn connect(&self) -> ClientResult<WsStream> {
        let url = self.config.ws_url(&self.token);
        let (ws, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| {
                // 401/403 是终止性的拒绝，其他错误可以重试
                if let tungstenite::Error::Http(ref resp) = e {
                    let status = resp.status().as_u16();
                    if status == 401 || status == 403 {
                        return ClientError::ConnectionRefused(format!("HTTP {status}"));
                    }
                }
                ClientError::ChannelDropped(format!("connect failed: {e}"))
            })?;
        Ok(ws)
    }

    /// Run one connected session until disconnect (`Err`) or shutdown (`Ok`)
    async fn run_session(&self, ws: WsStream) -> ClientResult<()> {
        let (mut sink, mut stream) = ws.split();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    let _ = sink.close().await;
                    return Ok(());
                }
                msg = stream.next() => match msg {
                    Some(Ok(Message::Text(text))) => self.handle_frame(&text).await,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Err(ClientError::ChannelDropped("closed by server".into()));
                    }
                    Some(Err(e)) => return Err(ClientError::ChannelDropped(e.to_string())),
                    Some(Ok(_)) => {}
                },
            }
        }
    }

    async fn handle_frame(&self, text: &str) {
        match serde_json::from_str::<ChannelMessage>(text) {
            Ok(ChannelMessage::Ready { session_id }) => {
                tracing::info!(%session_id, "Event channel ready");
                self.emit(ChannelSignal::Opened { session_id }).await;
            }
            Ok(ChannelMessage::Event { event }) => {
                tracing::debug!(event = event.name(), employee_id = event.employee_id(), "Event received");
                self.emit(ChannelSignal::Event(event)).await;
            }
            Err(e) => tracing::warn!(error = %e, "Unrecognized channel frame ignored"),
        }
    }

    async fn emit(&self, signal: ChannelSignal) {
        if self.signals.send(signal).await.is_err() {
            // Dispatcher 已退出
            self.shutdown.cancel();
        }
    }
}

fn next_delay(current: Duration, max: Duration) -> Duration {
    (current * 2).min(max)
}
