//! Dispatcher - 单 actor 串行处理所有输入
//!
//! # 输入
//!
//! ```text
//!  DispatcherHandle ──Command──┐
//!  EventChannel ──ChannelSignal┼──► Dispatcher task ──watch──► DashboardView
//!  JoinSet<Completion> ────────┘        │
//!                                       └── spawn 请求 (EmployeeService)
//! ```
//!
//! 用户操作、推送事件、请求结果都在同一个任务里依次处理，
//! store 与 reconciler 只在这里被修改。请求在 [`JoinSet`] 中运行，
//! Dispatcher 退出时未完成的请求直接丢弃。
//!
//! 快照请求进行中时收到的事件先缓存，快照落地后按顺序重放，
//! 较晚返回的快照不会覆盖较新的事件。

use std::sync::Arc;

use shared::message::DashboardEvent;
use shared::models::{
    ClockInStatus, DashboardSnapshot, EmployeeCreate, EmployeeField, EmployeeId, EmployeeRecord,
    FieldEdit, Recommendation,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::channel::ChannelSignal;
use crate::reconciler::{EditTicket, ExternalUpdate, Reconciler, Resolution};
use crate::service::EmployeeService;
use crate::store::EmployeeStore;
use crate::view::{ConnectionStatus, DashboardView, Notice};
use crate::{ClientError, ClientResult};

/// 保留的最近提示条数
const MAX_NOTICES: usize = 20;
const COMMAND_CAPACITY: usize = 64;

// =============================================================================
// Handle
// =============================================================================

enum Command {
    SubmitEdit {
        id: EmployeeId,
        edit: FieldEdit,
        reply: oneshot::Sender<ClientResult<()>>,
    },
    SubmitCreate {
        payload: EmployeeCreate,
        reply: oneshot::Sender<ClientResult<()>>,
    },
    Refresh,
    ClearNotices,
}

/// Cloneable handle to a running Dispatcher
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<Arc<DashboardView>>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SubmitEdit { id, edit, .. } => write!(f, "SubmitEdit({id}, {})", edit.field()),
            Self::SubmitCreate { payload, .. } => write!(f, "SubmitCreate({})", payload.email),
            Self::Refresh => f.write_str("Refresh"),
            Self::ClearNotices => f.write_str("ClearNotices"),
        }
    }
}

impl DispatcherHandle {
    /// 提交单字段编辑
    ///
    /// 返回时提议值已显示、字段处于 Pending；请求结果稍后异步落地。
    /// 员工不在视图中返回 `UnknownEmployee`。
    pub async fn submit_edit(&self, id: EmployeeId, edit: FieldEdit) -> ClientResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SubmitEdit { id, edit, reply }).await?;
        rx.await.map_err(|_| ClientError::SessionClosed)?
    }

    /// 提交新员工，结果 (成功的记录或失败提示) 异步落地
    pub async fn submit_create(&self, payload: EmployeeCreate) -> ClientResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SubmitCreate { payload, reply }).await?;
        rx.await.map_err(|_| ClientError::SessionClosed)?
    }

    /// 重新拉取全量快照
    pub async fn refresh(&self) -> ClientResult<()> {
        self.send(Command::Refresh).await
    }

    pub async fn clear_notices(&self) -> ClientResult<()> {
        self.send(Command::ClearNotices).await
    }

    /// 当前一致快照
    pub fn current_view(&self) -> Arc<DashboardView> {
        self.view.borrow().clone()
    }

    /// 每次状态变化都会通知
    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardView>> {
        self.view.clone()
    }

    /// 等待视图满足条件
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&DashboardView) -> bool,
    ) -> ClientResult<Arc<DashboardView>> {
        let mut rx = self.subscribe();
        let view = rx
            .wait_for(|view| predicate(view))
            .await
            .map_err(|_| ClientError::SessionClosed)?;
        Ok(view.clone())
    }

    /// 停止 Dispatcher，未完成的请求被丢弃
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn send(&self, command: Command) -> ClientResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ClientError::SessionClosed)
    }
}

// =============================================================================
// Actor
// =============================================================================

enum Completion {
    Snapshot {
        fetch_id: u64,
        result: ClientResult<DashboardSnapshot>,
    },
    Edit {
        ticket: EditTicket,
        result: ClientResult<FieldEdit>,
    },
    Create {
        email: String,
        result: ClientResult<EmployeeRecord>,
    },
}

/// 进行中的快照请求及其期间缓存的事件
struct FetchState {
    id: u64,
    buffered: Vec<DashboardEvent>,
}

pub struct Dispatcher {
    service: Arc<dyn EmployeeService>,
    store: EmployeeStore,
    reconciler: Reconciler,
    recommendations: Vec<Recommendation>,
    notices: Vec<Notice>,
    status: ConnectionStatus,
    revision: u64,
    fetch: Option<FetchState>,
    next_fetch_id: u64,
    requests: JoinSet<Completion>,
    view_tx: watch::Sender<Arc<DashboardView>>,
}

impl Dispatcher {
    /// 启动 Dispatcher 任务并立即拉取一次快照
    pub fn spawn(
        service: Arc<dyn EmployeeService>,
        signals: mpsc::Receiver<ChannelSignal>,
        shutdown: CancellationToken,
    ) -> (DispatcherHandle, JoinHandle<()>) {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (view_tx, view_rx) = watch::channel(Arc::new(DashboardView::default()));

        let dispatcher = Self {
            service,
            store: EmployeeStore::new(),
            reconciler: Reconciler::new(),
            recommendations: Vec::new(),
            notices: Vec::new(),
            status: ConnectionStatus::Connecting,
            revision: 0,
            fetch: None,
            next_fetch_id: 0,
            requests: JoinSet::new(),
            view_tx,
        };

        let task = tokio::spawn(dispatcher.run(commands_rx, signals, shutdown.clone()));
        let handle = DispatcherHandle {
            commands: commands_tx,
            view: view_rx,
            shutdown,
        };
        (handle, task)
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut signals: mpsc::Receiver<ChannelSignal>,
        shutdown: CancellationToken,
    ) {
        tracing::info!("Dispatcher started");
        self.start_fetch();
        self.publish();

        let mut signals_open = true;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                signal = signals.recv(), if signals_open => match signal {
                    Some(signal) => self.handle_signal(signal),
                    None => signals_open = false,
                },
                Some(done) = self.requests.join_next(), if !self.requests.is_empty() => match done {
                    Ok(completion) => self.handle_completion(completion),
                    Err(e) => tracing::error!(error = %e, "Request task failed"),
                },
            }
            self.publish();
        }

        let dropped = self.requests.len();
        self.requests.abort_all();
        tracing::info!(dropped_requests = dropped, "Dispatcher stopped");
    }

    // ========== Inputs ==========

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::SubmitEdit { id, edit, reply } => {
                let result = self.submit_edit(id, edit);
                let _ = reply.send(result);
            }
            Command::SubmitCreate { payload, reply } => {
                let service = self.service.clone();
                let email = payload.email.clone();
                self.requests.spawn(async move {
                    let result = service.create_employee(payload).await;
                    Completion::Create { email, result }
                });
                let _ = reply.send(Ok(()));
            }
            Command::Refresh => self.start_fetch(),
            Command::ClearNotices => self.notices.clear(),
        }
    }

    fn submit_edit(&mut self, id: EmployeeId, edit: FieldEdit) -> ClientResult<()> {
        let ticket = self.reconciler.begin(&mut self.store, id, edit.clone())?;
        let field = ticket.key.field;
        self.notices
            .retain(|n| !(n.employee_id == Some(id) && n.field == Some(field)));

        let service = self.service.clone();
        self.requests.spawn(async move {
            let result = service.edit_field(id, edit).await;
            Completion::Edit { ticket, result }
        });
        Ok(())
    }

    fn handle_signal(&mut self, signal: ChannelSignal) {
        match signal {
            ChannelSignal::Opened { session_id } => {
                tracing::info!(%session_id, "Connected, refreshing dashboard");
                self.status = ConnectionStatus::Connected;
                // 断线期间的事件不会重放，只能全量刷新
                self.start_fetch();
            }
            ChannelSignal::Event(event) => {
                if let Some(fetch) = self.fetch.as_mut() {
                    fetch.buffered.push(event);
                } else {
                    self.apply_event(event);
                }
            }
            ChannelSignal::Closed { reason } => {
                if self.status != ConnectionStatus::Refused {
                    tracing::info!(%reason, "Disconnected");
                    self.status = ConnectionStatus::Disconnected;
                }
            }
            ChannelSignal::Refused { reason } => {
                tracing::warn!(%reason, "Event channel refused");
                self.status = ConnectionStatus::Refused;
                self.push_notice(None, None, ClientError::ConnectionRefused(reason).to_string());
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Snapshot { fetch_id, result } => self.finish_fetch(fetch_id, result),
            Completion::Edit { ticket, result } => {
                let outcome = result.as_ref().cloned();
                match self.reconciler.resolve(&mut self.store, ticket, outcome) {
                    Resolution::Confirmed(_) | Resolution::Stale => {}
                    Resolution::RolledBack(_) => {
                        let message = match &result {
                            Err(e) => e.to_string(),
                            Ok(_) => "Server confirmed a different field".to_string(),
                        };
                        tracing::warn!(
                            employee_id = ticket.key.employee_id,
                            field = %ticket.key.field,
                            %message,
                            "Edit rejected, rolled back"
                        );
                        self.push_notice(
                            Some(ticket.key.employee_id),
                            Some(ticket.key.field),
                            message,
                        );
                    }
                }
            }
            Completion::Create { email, result } => match result {
                Ok(record) => {
                    tracing::info!(employee_id = record.id, "Employee created");
                    self.store.apply_created(record);
                }
                Err(e) => {
                    tracing::warn!(%email, error = %e, "Create employee failed");
                    self.push_notice(None, None, format!("Failed to create {email}: {e}"));
                }
            },
        }
    }

    // ========== Snapshot ==========

    fn start_fetch(&mut self) {
        self.next_fetch_id += 1;
        let fetch_id = self.next_fetch_id;
        // 保留上一个未完成请求期间缓存的事件
        let buffered = self.fetch.take().map(|f| f.buffered).unwrap_or_default();
        self.fetch = Some(FetchState {
            id: fetch_id,
            buffered,
        });

        let service = self.service.clone();
        self.requests.spawn(async move {
            let result = service.fetch_snapshot().await;
            Completion::Snapshot { fetch_id, result }
        });
    }

    fn finish_fetch(&mut self, fetch_id: u64, result: ClientResult<DashboardSnapshot>) {
        if self.fetch.as_ref().map(|f| f.id) != Some(fetch_id) {
            tracing::debug!(fetch_id, "Superseded snapshot ignored");
            return;
        }
        let Some(fetch) = self.fetch.take() else {
            return;
        };

        match result {
            Ok(snapshot) => {
                tracing::debug!(
                    employees = snapshot.attendance.len(),
                    replay = fetch.buffered.len(),
                    "Snapshot loaded"
                );
                self.reconciler
                    .apply_snapshot(&mut self.store, snapshot.attendance);
                self.recommendations = snapshot.recommendations;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Snapshot fetch failed");
                self.push_notice(None, None, format!("Failed to load dashboard: {e}"));
            }
        }

        for event in fetch.buffered {
            self.apply_event(event);
        }
    }

    // ========== Events ==========

    fn apply_event(&mut self, event: DashboardEvent) {
        let name = event.name();
        let result = match event {
            DashboardEvent::EmployeeClockedIn { id, .. } => self.reconciler.apply_external(
                &mut self.store,
                id,
                FieldEdit::ClockInStatus(ClockInStatus::ClockedIn),
            ),
            DashboardEvent::EmployeeClockedOut { id, .. } => self.reconciler.apply_external(
                &mut self.store,
                id,
                FieldEdit::ClockInStatus(ClockInStatus::NotClockedIn),
            ),
            DashboardEvent::EmployeeCreated { record, .. } => {
                self.store.apply_created(*record);
                Ok(ExternalUpdate::Applied)
            }
            DashboardEvent::EmployeeUpdated { id, edit, .. } => {
                self.reconciler.apply_external(&mut self.store, id, edit)
            }
            DashboardEvent::SkillAdded { id, skills, .. } => {
                self.reconciler
                    .apply_external(&mut self.store, id, FieldEdit::Skills(skills))
            }
        };

        match result {
            Ok(ExternalUpdate::Applied) => {}
            Ok(ExternalUpdate::Suppressed) => {
                tracing::debug!(event = name, "Pushed value held back by pending edit");
            }
            Err(ClientError::UnknownEmployee(id)) => {
                tracing::warn!(event = name, employee_id = id, "Event for unknown employee dropped");
            }
            Err(e) => tracing::warn!(event = name, error = %e, "Event dropped"),
        }
    }

    // ========== View ==========

    fn push_notice(
        &mut self,
        employee_id: Option<EmployeeId>,
        field: Option<EmployeeField>,
        message: String,
    ) {
        if self.notices.len() >= MAX_NOTICES {
            self.notices.remove(0);
        }
        self.notices.push(Notice {
            employee_id,
            field,
            message,
        });
    }

    fn publish(&mut self) {
        self.revision += 1;
        let view = DashboardView {
            revision: self.revision,
            status: self.status,
            recommendations: self.recommendations.clone(),
            notices: self.notices.clone(),
            employees: self.store.iter().cloned().collect(),
            pending: self.reconciler.pending_keys(),
        };
        self.view_tx.send_replace(Arc::new(view));
    }
}
