//! 管理员看板会话
//!
//! 把 [`HttpClient`]、[`EventChannel`] 与 [`Dispatcher`] 组装到一起，
//! 三者共享一个 [`CancellationToken`]：关闭会话即关闭事件通道、
//! 停止 Dispatcher 并丢弃未完成的请求。

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::channel::EventChannel;
use crate::dispatcher::{Dispatcher, DispatcherHandle};
use crate::{ClientConfig, ClientError, ClientResult, HttpClient};

const SIGNAL_CAPACITY: usize = 256;

/// A live admin dashboard bound to one login
pub struct DashboardSession {
    http: HttpClient,
    handle: DispatcherHandle,
    shutdown: CancellationToken,
    dispatcher_task: Option<JoinHandle<()>>,
    channel_task: Option<JoinHandle<()>>,
}

impl DashboardSession {
    /// 使用 `config.token` 打开会话
    pub async fn connect(config: ClientConfig) -> ClientResult<Self> {
        let token = config.token.clone().ok_or(ClientError::Unauthorized)?;
        let http = config.build_http_client()?.with_token(token.clone());
        Ok(Self::start(config, http, token))
    }

    /// 登录后打开会话，仅管理员可用
    pub async fn login(config: ClientConfig, email: &str, password: &str) -> ClientResult<Self> {
        let http = config.build_http_client()?;
        let login = http.login(email, password).await?;
        if !login.role.is_admin() {
            tracing::warn!(employee_id = login.employee_id, "Non-admin login refused for dashboard");
            return Err(ClientError::Forbidden("Unauthorized access".into()));
        }

        tracing::info!(employee_id = login.employee_id, "Admin logged in");
        let config = config.with_token(login.access_token.clone());
        let http = http.with_token(login.access_token.clone());
        Ok(Self::start(config, http, login.access_token))
    }

    fn start(config: ClientConfig, http: HttpClient, token: String) -> Self {
        let shutdown = CancellationToken::new();
        let (signals_tx, signals_rx) = mpsc::channel(SIGNAL_CAPACITY);

        let service = Arc::new(http.clone());
        let (handle, dispatcher_task) = Dispatcher::spawn(service, signals_rx, shutdown.clone());

        let channel = EventChannel::new(config, token, signals_tx, shutdown.clone());
        let channel_task = tokio::spawn(channel.run());

        Self {
            http,
            handle,
            shutdown,
            dispatcher_task: Some(dispatcher_task),
            channel_task: Some(channel_task),
        }
    }

    pub fn handle(&self) -> &DispatcherHandle {
        &self.handle
    }

    /// 已认证的 HTTP 客户端 (不经过 Dispatcher 的请求)
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// 关闭会话并等待后台任务退出
    pub async fn close(mut self) {
        self.shutdown.cancel();
        for task in [self.channel_task.take(), self.dispatcher_task.take()]
            .into_iter()
            .flatten()
        {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Session task failed");
            }
        }
        tracing::info!("Dashboard session closed");
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
