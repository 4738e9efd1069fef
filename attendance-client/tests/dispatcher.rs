//! Dispatcher 集成测试
//!
//! 用脚本化的 [`EmployeeService`] 替换 HTTP：编辑请求通过 channel 交给测试，
//! 由测试决定何时、以何种结果响应。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use attendance_client::{
    ChannelSignal, ClientError, ClientResult, ConnectionStatus, DashboardEvent, DashboardView,
    Dispatcher, DispatcherHandle, EmployeeService,
};
use parking_lot::Mutex;
use shared::ErrorCode;
use shared::models::{
    ClockInStatus, DashboardSnapshot, EmployeeCreate, EmployeeField, EmployeeId, EmployeeRecord,
    FieldEdit, Recommendation, Role,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

// =============================================================================
// Scripted service
// =============================================================================

struct EditCall {
    id: EmployeeId,
    edit: FieldEdit,
    respond: oneshot::Sender<ClientResult<FieldEdit>>,
}

impl EditCall {
    fn confirm(self) {
        let _ = self.respond.send(Ok(self.edit));
    }

    fn reject(self, message: &str) {
        let _ = self.respond.send(Err(ClientError::RequestFailed {
            code: Some(ErrorCode::InternalError),
            message: message.to_string(),
        }));
    }
}

struct ScriptedService {
    snapshot: Mutex<DashboardSnapshot>,
    fetch_gate: Mutex<Option<oneshot::Receiver<()>>>,
    edits: mpsc::UnboundedSender<EditCall>,
    create_fails: Mutex<bool>,
    next_id: Mutex<EmployeeId>,
}

impl ScriptedService {
    /// 下一次快照请求在返回的 sender 触发前保持挂起
    fn hold_next_fetch(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.fetch_gate.lock() = Some(rx);
        tx
    }

    fn set_snapshot(&self, attendance: Vec<EmployeeRecord>) {
        self.snapshot.lock().attendance = attendance;
    }
}

#[async_trait]
impl EmployeeService for ScriptedService {
    async fn fetch_snapshot(&self) -> ClientResult<DashboardSnapshot> {
        let gate = self.fetch_gate.lock().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(self.snapshot.lock().clone())
    }

    async fn create_employee(&self, payload: EmployeeCreate) -> ClientResult<EmployeeRecord> {
        if *self.create_fails.lock() {
            return Err(ClientError::RequestFailed {
                code: Some(ErrorCode::EmployeeEmailExists),
                message: "Employee email already registered".into(),
            });
        }
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            *next
        };
        Ok(EmployeeRecord::new(id, payload.name, payload.email, payload.role))
    }

    async fn edit_field(&self, id: EmployeeId, edit: FieldEdit) -> ClientResult<FieldEdit> {
        let (respond, rx) = oneshot::channel();
        self.edits
            .send(EditCall { id, edit, respond })
            .map_err(|_| ClientError::SessionClosed)?;
        rx.await
            .map_err(|_| ClientError::ChannelDropped("test dropped the call".into()))?
    }
}

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    handle: DispatcherHandle,
    signals: mpsc::Sender<ChannelSignal>,
    edits: mpsc::UnboundedReceiver<EditCall>,
    service: Arc<ScriptedService>,
    task: JoinHandle<()>,
}

impl Harness {
    async fn start(records: Vec<EmployeeRecord>) -> Self {
        let expected = records.len();
        let (edits_tx, edits) = mpsc::unbounded_channel();
        let service = Arc::new(ScriptedService {
            snapshot: Mutex::new(DashboardSnapshot {
                attendance: records,
                recommendations: vec![Recommendation::for_employee(7, "Sam has 5 leave days left")],
            }),
            fetch_gate: Mutex::new(None),
            edits: edits_tx,
            create_fails: Mutex::new(false),
            next_id: Mutex::new(100),
        });
        let (signals, signals_rx) = mpsc::channel(64);
        let (handle, task) =
            Dispatcher::spawn(service.clone(), signals_rx, CancellationToken::new());

        let harness = Self {
            handle,
            signals,
            edits,
            service,
            task,
        };
        harness.wait(|v| v.len() == expected && v.revision > 1).await;
        harness
    }

    async fn wait(&self, predicate: impl FnMut(&DashboardView) -> bool) -> Arc<DashboardView> {
        tokio::time::timeout(WAIT, self.handle.wait_for(predicate))
            .await
            .expect("timed out waiting for view")
            .expect("dispatcher stopped")
    }

    async fn next_edit(&mut self) -> EditCall {
        tokio::time::timeout(WAIT, self.edits.recv())
            .await
            .expect("timed out waiting for edit request")
            .expect("service dropped")
    }

    async fn push(&self, event: DashboardEvent) {
        self.signals.send(ChannelSignal::Event(event)).await.unwrap();
    }

    async fn signal(&self, signal: ChannelSignal) {
        self.signals.send(signal).await.unwrap();
    }

    /// 发送一个无关的标记事件并等待它生效，之前发送的信号必然已处理完
    async fn settle(&self) -> Arc<DashboardView> {
        let marker = "marker".to_string();
        self.push(DashboardEvent::EmployeeUpdated {
            id: 1,
            name: "Ann".into(),
            edit: FieldEdit::Attendance(marker.clone()),
        })
        .await;
        let view = self
            .wait(|v| v.employee(1).is_some_and(|r| r.attendance == marker))
            .await;
        // 复位以便再次使用
        self.push(DashboardEvent::EmployeeUpdated {
            id: 1,
            name: "Ann".into(),
            edit: FieldEdit::Attendance(String::new()),
        })
        .await;
        self.wait(|v| v.employee(1).is_some_and(|r| r.attendance.is_empty()))
            .await;
        view
    }
}

fn ann() -> EmployeeRecord {
    EmployeeRecord::new(1, "Ann", "ann@example.com", Role::Admin)
}

fn sam() -> EmployeeRecord {
    let mut record = EmployeeRecord::new(7, "Sam", "sam@example.com", Role::Employee);
    record.leave_days = 5;
    record
}

fn leave_days(view: &DashboardView, id: EmployeeId) -> u32 {
    view.employee(id).unwrap().leave_days
}

fn clocked_in(id: EmployeeId) -> DashboardEvent {
    DashboardEvent::EmployeeClockedIn {
        id,
        name: "Sam".into(),
    }
}

// =============================================================================
// Initial load
// =============================================================================

#[tokio::test]
async fn test_initial_snapshot_populates_view() {
    let h = Harness::start(vec![ann(), sam()]).await;
    let view = h.handle.current_view();

    assert_eq!(view.len(), 2);
    assert_eq!(view.status, ConnectionStatus::Connecting);
    assert_eq!(view.recommendations.len(), 1);
    assert_eq!(view.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 7]);
    assert_eq!(view.pending().count(), 0);
}

// =============================================================================
// Edit scenarios
// =============================================================================

#[tokio::test]
async fn test_edit_confirmed_clears_pending() {
    let mut h = Harness::start(vec![ann(), sam()]).await;

    h.handle.submit_edit(7, FieldEdit::LeaveDays(3)).await.unwrap();
    let view = h.wait(|v| v.is_pending(7, EmployeeField::LeaveDays)).await;
    assert_eq!(leave_days(&view, 7), 3);

    let call = h.next_edit().await;
    assert_eq!(call.id, 7);
    assert_eq!(call.edit, FieldEdit::LeaveDays(3));
    call.confirm();

    let view = h.wait(|v| !v.is_pending(7, EmployeeField::LeaveDays)).await;
    assert_eq!(leave_days(&view, 7), 3);
    assert_eq!(view.pending().count(), 0);
}

#[tokio::test]
async fn test_clock_in_during_pending_edit_coexists() {
    let mut h = Harness::start(vec![ann(), sam()]).await;

    h.handle.submit_edit(7, FieldEdit::LeaveDays(3)).await.unwrap();
    let call = h.next_edit().await;

    h.push(clocked_in(7)).await;
    let view = h
        .wait(|v| v.employee(7).is_some_and(EmployeeRecord::is_clocked_in))
        .await;
    assert!(view.is_pending(7, EmployeeField::LeaveDays));
    assert_eq!(leave_days(&view, 7), 3);

    call.confirm();
    let view = h.wait(|v| v.pending().count() == 0).await;
    let record = view.employee(7).unwrap();
    assert_eq!(record.leave_days, 3);
    assert_eq!(record.clock_in_status, ClockInStatus::ClockedIn);
}

#[tokio::test]
async fn test_pending_value_wins_over_broadcast() {
    let mut h = Harness::start(vec![ann(), sam()]).await;

    h.handle.submit_edit(7, FieldEdit::LeaveDays(3)).await.unwrap();
    let call = h.next_edit().await;

    h.push(DashboardEvent::EmployeeUpdated {
        id: 7,
        name: "Sam".into(),
        edit: FieldEdit::LeaveDays(9),
    })
    .await;
    let view = h.settle().await;
    assert_eq!(leave_days(&view, 7), 3);
    assert!(view.is_pending(7, EmployeeField::LeaveDays));

    call.confirm();
    let view = h.wait(|v| v.pending().count() == 0).await;
    assert_eq!(leave_days(&view, 7), 3);
}

#[tokio::test]
async fn test_failed_edit_rolls_back() {
    let mut h = Harness::start(vec![ann(), sam()]).await;
    h.push(DashboardEvent::EmployeeUpdated {
        id: 7,
        name: "Sam".into(),
        edit: FieldEdit::MachineLine(Some("alpha".into())),
    })
    .await;
    h.settle().await;

    h.handle
        .submit_edit(7, FieldEdit::MachineLine(Some("beta".into())))
        .await
        .unwrap();
    let view = h.wait(|v| v.is_pending(7, EmployeeField::MachineLine)).await;
    assert_eq!(view.employee(7).unwrap().machine_line.as_deref(), Some("beta"));

    h.next_edit().await.reject("Internal server error");

    let view = h.wait(|v| !v.is_pending(7, EmployeeField::MachineLine)).await;
    assert_eq!(view.employee(7).unwrap().machine_line.as_deref(), Some("alpha"));
    let notices: Vec<_> = view.notices_for(7, EmployeeField::MachineLine).collect();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message.contains("Internal server error"));
}

#[tokio::test]
async fn test_resubmit_clears_field_notice() {
    let mut h = Harness::start(vec![ann(), sam()]).await;

    h.handle.submit_edit(7, FieldEdit::LeaveDays(3)).await.unwrap();
    h.next_edit().await.reject("nope");
    h.wait(|v| v.notices_for(7, EmployeeField::LeaveDays).count() == 1)
        .await;

    h.handle.submit_edit(7, FieldEdit::LeaveDays(4)).await.unwrap();
    let view = h.wait(|v| v.is_pending(7, EmployeeField::LeaveDays)).await;
    assert_eq!(view.notices_for(7, EmployeeField::LeaveDays).count(), 0);
}

#[tokio::test]
async fn test_stale_response_arriving_last_is_suppressed() {
    let mut h = Harness::start(vec![ann(), sam()]).await;

    h.handle.submit_edit(7, FieldEdit::LeaveDays(1)).await.unwrap();
    let first = h.next_edit().await;
    h.handle.submit_edit(7, FieldEdit::LeaveDays(2)).await.unwrap();
    let second = h.next_edit().await;

    second.confirm();
    let view = h.wait(|v| !v.is_pending(7, EmployeeField::LeaveDays)).await;
    assert_eq!(leave_days(&view, 7), 2);

    first.confirm();
    let view = h.settle().await;
    assert_eq!(leave_days(&view, 7), 2);
    assert!(!view.is_pending(7, EmployeeField::LeaveDays));
}

#[tokio::test]
async fn test_stale_failure_does_not_roll_back_newer_edit() {
    let mut h = Harness::start(vec![ann(), sam()]).await;

    h.handle.submit_edit(7, FieldEdit::LeaveDays(1)).await.unwrap();
    let first = h.next_edit().await;
    h.handle.submit_edit(7, FieldEdit::LeaveDays(2)).await.unwrap();
    let second = h.next_edit().await;

    first.reject("timeout");
    let view = h.settle().await;
    assert_eq!(leave_days(&view, 7), 2);
    assert!(view.is_pending(7, EmployeeField::LeaveDays));
    assert!(view.notices.is_empty());

    second.confirm();
    let view = h.wait(|v| v.pending().count() == 0).await;
    assert_eq!(leave_days(&view, 7), 2);
}

#[tokio::test]
async fn test_edits_on_different_rows_are_independent() {
    let mut h = Harness::start(vec![ann(), sam()]).await;

    h.handle.submit_edit(1, FieldEdit::LeaveDays(10)).await.unwrap();
    let ann_call = h.next_edit().await;
    h.handle.submit_edit(7, FieldEdit::LeaveDays(3)).await.unwrap();
    let sam_call = h.next_edit().await;

    sam_call.reject("nope");
    let view = h.wait(|v| !v.is_pending(7, EmployeeField::LeaveDays)).await;
    assert_eq!(leave_days(&view, 7), 5);
    assert!(view.is_pending(1, EmployeeField::LeaveDays));
    assert_eq!(leave_days(&view, 1), 10);

    ann_call.confirm();
    let view = h.wait(|v| v.pending().count() == 0).await;
    assert_eq!(leave_days(&view, 1), 10);
}

#[tokio::test]
async fn test_edit_unknown_employee_is_rejected() {
    let h = Harness::start(vec![ann(), sam()]).await;

    let err = h
        .handle
        .submit_edit(99, FieldEdit::LeaveDays(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::UnknownEmployee(99)));
    assert_eq!(h.handle.current_view().pending().count(), 0);
}

// =============================================================================
// Broadcast events
// =============================================================================

#[tokio::test]
async fn test_clock_in_for_unknown_employee_is_dropped() {
    let h = Harness::start(vec![ann(), sam()]).await;

    h.push(clocked_in(99)).await;
    h.push(clocked_in(7)).await;
    let view = h
        .wait(|v| v.employee(7).is_some_and(EmployeeRecord::is_clocked_in))
        .await;

    assert_eq!(view.len(), 2);
    assert!(view.employee(99).is_none());
    assert!(!h.task.is_finished());
}

#[tokio::test]
async fn test_created_event_twice_is_idempotent() {
    let h = Harness::start(vec![ann(), sam()]).await;
    let mut record = EmployeeRecord::new(8, "Lee", "lee@example.com", Role::Employee);
    record.clock_in_status = ClockInStatus::ClockedIn;

    h.push(DashboardEvent::created(record.clone())).await;
    let once = h.wait(|v| v.len() == 3).await;
    h.push(DashboardEvent::created(record)).await;
    let twice = h.settle().await;

    assert_eq!(twice.len(), 3);
    assert_eq!(once.employee(8), twice.employee(8));
    assert_eq!(
        twice.employee(8).unwrap().clock_in_status,
        ClockInStatus::NotClockedIn
    );
}

#[tokio::test]
async fn test_clock_out_and_skill_events_apply() {
    let h = Harness::start(vec![ann(), sam()]).await;

    h.push(clocked_in(7)).await;
    h.push(DashboardEvent::EmployeeClockedOut {
        id: 7,
        name: "Sam".into(),
    })
    .await;
    h.push(DashboardEvent::SkillAdded {
        id: 7,
        name: "Sam".into(),
        skill: "Welding".into(),
        skills: vec!["Welding".into()],
    })
    .await;

    let view = h
        .wait(|v| v.employee(7).is_some_and(|r| !r.skills.is_empty()))
        .await;
    let record = view.employee(7).unwrap();
    assert_eq!(record.skills, vec!["Welding".to_string()]);
    assert!(!record.is_clocked_in());
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_then_broadcast_inserts_once() {
    let h = Harness::start(vec![ann(), sam()]).await;

    h.handle
        .submit_create(EmployeeCreate {
            name: "Lee".into(),
            email: "lee@example.com".into(),
            role: Role::Employee,
            password: "secret123".into(),
        })
        .await
        .unwrap();
    let view = h.wait(|v| v.len() == 3).await;
    let created = view.employee(101).unwrap().clone();
    assert_eq!(created.name, "Lee");

    // 同一记录的广播随后到达
    h.push(DashboardEvent::created(created)).await;
    let view = h.settle().await;
    assert_eq!(view.len(), 3);
}

#[tokio::test]
async fn test_create_failure_becomes_notice() {
    let h = Harness::start(vec![ann(), sam()]).await;
    *h.service.create_fails.lock() = true;

    h.handle
        .submit_create(EmployeeCreate {
            name: "Ann".into(),
            email: "ann@example.com".into(),
            role: Role::Employee,
            password: "secret123".into(),
        })
        .await
        .unwrap();

    let view = h.wait(|v| !v.notices.is_empty()).await;
    assert_eq!(view.len(), 2);
    assert_eq!(view.notices[0].employee_id, None);
    assert!(view.notices[0].message.contains("ann@example.com"));

    h.handle.clear_notices().await.unwrap();
    h.wait(|v| v.notices.is_empty()).await;
}

// =============================================================================
// Connection lifecycle
// =============================================================================

#[tokio::test]
async fn test_events_during_refresh_are_replayed_after_snapshot() {
    let h = Harness::start(vec![ann(), sam()]).await;
    let release = h.service.hold_next_fetch();
    let mut lee = EmployeeRecord::new(8, "Lee", "lee@example.com", Role::Employee);
    lee.leave_days = 2;
    h.service.set_snapshot(vec![ann(), sam(), lee]);

    h.signal(ChannelSignal::Opened {
        session_id: uuid::Uuid::new_v4(),
    })
    .await;
    let connected = h.wait(|v| v.status == ConnectionStatus::Connected).await;

    h.push(clocked_in(7)).await;
    let buffered = h.wait(|v| v.revision > connected.revision).await;
    assert!(!buffered.employee(7).unwrap().is_clocked_in());
    assert_eq!(buffered.len(), 2);

    release.send(()).unwrap();
    let view = h.wait(|v| v.len() == 3).await;
    assert!(view.employee(7).unwrap().is_clocked_in());
}

#[tokio::test]
async fn test_refresh_keeps_pending_value() {
    let mut h = Harness::start(vec![ann(), sam()]).await;

    h.handle.submit_edit(7, FieldEdit::LeaveDays(3)).await.unwrap();
    let call = h.next_edit().await;

    let mut updated = sam();
    updated.leave_days = 4;
    updated.attendance = "Present".into();
    h.service.set_snapshot(vec![ann(), updated]);
    h.handle.refresh().await.unwrap();

    // 非 Pending 字段取快照值，Pending 字段保留提议值
    let view = h
        .wait(|v| v.employee(7).is_some_and(|r| r.attendance == "Present"))
        .await;
    assert_eq!(leave_days(&view, 7), 3);
    assert!(view.is_pending(7, EmployeeField::LeaveDays));

    call.reject("nope");
    let view = h.wait(|v| v.pending().count() == 0).await;
    assert_eq!(leave_days(&view, 7), 4);
}

#[tokio::test]
async fn test_connection_status_transitions() {
    let h = Harness::start(vec![ann(), sam()]).await;
    let mut reloaded = ann();
    reloaded.attendance = "Present".into();
    h.service.set_snapshot(vec![reloaded, sam()]);

    // 打开后会重新拉取快照，等它落地再继续
    h.signal(ChannelSignal::Opened {
        session_id: uuid::Uuid::new_v4(),
    })
    .await;
    h.wait(|v| {
        v.status == ConnectionStatus::Connected
            && v.employee(1).is_some_and(|r| r.attendance == "Present")
    })
    .await;

    h.signal(ChannelSignal::Closed {
        reason: "closed by server".into(),
    })
    .await;
    h.wait(|v| v.status == ConnectionStatus::Disconnected).await;

    h.signal(ChannelSignal::Refused {
        reason: "HTTP 401".into(),
    })
    .await;
    let view = h.wait(|v| v.status == ConnectionStatus::Refused).await;
    assert_eq!(view.notices.len(), 1);

    h.signal(ChannelSignal::Closed {
        reason: "late".into(),
    })
    .await;
    let view = h.settle().await;
    assert_eq!(view.status, ConnectionStatus::Refused);
}

#[tokio::test]
async fn test_shutdown_drops_outstanding_requests() {
    let mut h = Harness::start(vec![ann(), sam()]).await;

    h.handle.submit_edit(7, FieldEdit::LeaveDays(3)).await.unwrap();
    let mut call = h.next_edit().await;

    h.handle.shutdown();
    tokio::time::timeout(WAIT, &mut h.task).await.unwrap().unwrap();

    // 请求任务被取消后响应端随之关闭
    tokio::time::timeout(WAIT, call.respond.closed())
        .await
        .expect("request was not cancelled");
    let err = h
        .handle
        .submit_edit(7, FieldEdit::LeaveDays(4))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::SessionClosed));
}
