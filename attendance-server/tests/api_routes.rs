//! 路由级测试 - 通过 oneshot 调用完整应用 (认证 + 中间件 + 状态)

use attendance_server::core::build_app;
use attendance_server::db::seed::{DEFAULT_ADMIN_EMAIL, DEFAULT_EMPLOYEE_EMAIL};
use attendance_server::session::SessionIdentity;
use attendance_server::{Config, ServerState};
use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use shared::message::DashboardEvent;
use shared::models::{FieldEdit, Role};
use tower::ServiceExt;

const SECRET: &str = "route-test-secret-route-test-secret-0001";

async fn setup() -> (Router, ServerState) {
    let config = Config::for_tests(SECRET);
    let state = ServerState::initialize(&config).await.unwrap();
    (build_app(state.clone()), state)
}

fn token_for(state: &ServerState, email: &str) -> String {
    let account = state.accounts().find_by_email(email).unwrap();
    let record = state.employees().find_by_id(account.employee_id).unwrap();
    state
        .jwt_service
        .generate_token(record.id, &account.email, &record.name, account.role)
        .unwrap()
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn admin_session(state: &ServerState) -> (attendance_server::session::SessionGuard, tokio::sync::mpsc::Receiver<DashboardEvent>) {
    state.sessions.open(
        SessionIdentity {
            employee_id: 1,
            email: DEFAULT_ADMIN_EMAIL.to_string(),
            role: Role::Admin,
        },
        16,
    )
}

// ========== Health / Auth ==========

#[tokio::test]
async fn test_health_reports_sessions() {
    let (app, state) = setup().await;
    let (_guard, _rx) = admin_session(&state);

    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sessions"], 1);
}

#[tokio::test]
async fn test_login_and_me() {
    let (app, _state) = setup().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": DEFAULT_ADMIN_EMAIL, "password": "admin123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, me) = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], DEFAULT_ADMIN_EMAIL);
    assert_eq!(me["employee_id"], body["employee_id"]);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (app, _state) = setup().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": DEFAULT_ADMIN_EMAIL, "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);
}

// ========== Admin gate ==========

#[tokio::test]
async fn test_dashboard_requires_admin() {
    let (app, state) = setup().await;

    let (status, _) = call(&app, Method::GET, "/api/admin/dashboard", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let employee = token_for(&state, DEFAULT_EMPLOYEE_EMAIL);
    let (status, body) =
        call(&app, Method::GET, "/api/admin/dashboard", Some(&employee), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Unauthorized access");

    let admin = token_for(&state, DEFAULT_ADMIN_EMAIL);
    let (status, body) = call(&app, Method::GET, "/api/admin/dashboard", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attendance"].as_array().unwrap().len(), 2);
    assert!(body["recommendations"].is_array());
}

#[tokio::test]
async fn test_channel_refuses_before_upgrade() {
    let (app, state) = setup().await;

    let (status, _) = call(&app, Method::GET, "/api/dashboard/ws", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::GET, "/api/dashboard/ws?token=garbage", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let employee = token_for(&state, DEFAULT_EMPLOYEE_EMAIL);
    let uri = format!("/api/dashboard/ws?token={employee}");
    let (status, body) = call(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2003);
    assert!(state.sessions.is_empty());
}

// ========== Mutations broadcast ==========

#[tokio::test]
async fn test_create_employee_broadcasts() {
    let (app, state) = setup().await;
    let admin = token_for(&state, DEFAULT_ADMIN_EMAIL);
    let (_guard, mut rx) = admin_session(&state);

    let payload = json!({
        "name": "Kim",
        "email": "kim@example.com",
        "role": "employee",
        "password": "secret1"
    });
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/employees",
        Some(&admin),
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["record"]["leave_days"], 14);

    match rx.try_recv().unwrap() {
        DashboardEvent::EmployeeCreated { name, record, .. } => {
            assert_eq!(name, "Kim");
            assert_eq!(record.email, "kim@example.com");
        }
        other => panic!("unexpected event {other:?}"),
    }

    let (status, body) =
        call(&app, Method::POST, "/api/employees", Some(&admin), Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 8002);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_edit_field_normalizes_and_broadcasts() {
    let (app, state) = setup().await;
    let admin = token_for(&state, DEFAULT_ADMIN_EMAIL);
    let employee_id = state
        .accounts()
        .find_by_email(DEFAULT_EMPLOYEE_EMAIL)
        .unwrap()
        .employee_id;
    let (_guard, mut rx) = admin_session(&state);

    let (status, body) = call(
        &app,
        Method::PATCH,
        &format!("/api/employees/{employee_id}"),
        Some(&admin),
        Some(json!({ "skills": ["Welding", " welding", ""] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["confirmed"], json!({ "skills": ["Welding"] }));

    assert_eq!(
        rx.try_recv().unwrap(),
        DashboardEvent::EmployeeUpdated {
            id: employee_id,
            name: "Default Employee".into(),
            edit: FieldEdit::Skills(vec!["Welding".into()]),
        }
    );

    let (status, body) = call(
        &app,
        Method::PATCH,
        "/api/employees/999",
        Some(&admin),
        Some(json!({ "leave_days": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 8001);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_edits_broadcast_in_commit_order() {
    let (app, state) = setup().await;
    let admin = token_for(&state, DEFAULT_ADMIN_EMAIL);
    let employee_id = state
        .accounts()
        .find_by_email(DEFAULT_EMPLOYEE_EMAIL)
        .unwrap()
        .employee_id;
    let (_guard, mut rx) = state.sessions.open(
        SessionIdentity {
            employee_id: 1,
            email: DEFAULT_ADMIN_EMAIL.to_string(),
            role: Role::Admin,
        },
        64,
    );

    for round in 0..20u32 {
        let mut requests = tokio::task::JoinSet::new();
        for n in 0..8u32 {
            let app = app.clone();
            let admin = admin.clone();
            requests.spawn(async move {
                call(
                    &app,
                    Method::PATCH,
                    &format!("/api/employees/{employee_id}"),
                    Some(&admin),
                    Some(json!({ "leave_days": round * 8 + n })),
                )
                .await
            });
        }
        while let Some(done) = requests.join_next().await {
            assert_eq!(done.unwrap().0, StatusCode::OK);
        }

        let mut last = None;
        let mut received = 0;
        while let Ok(event) = rx.try_recv() {
            received += 1;
            last = Some(event);
        }
        assert_eq!(received, 8);

        // 最后一个广播必须是存储中的最终值
        let stored = state.employees().find_by_id(employee_id).unwrap();
        match last {
            Some(DashboardEvent::EmployeeUpdated { edit, .. }) => {
                assert_eq!(edit, FieldEdit::LeaveDays(stored.leave_days), "round {round}");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_employee_cannot_edit() {
    let (app, state) = setup().await;
    let employee = token_for(&state, DEFAULT_EMPLOYEE_EMAIL);

    let (status, _) = call(
        &app,
        Method::PATCH,
        "/api/employees/1",
        Some(&employee),
        Some(json!({ "leave_days": 99 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_clock_in_and_out_broadcast() {
    let (app, state) = setup().await;
    let employee = token_for(&state, DEFAULT_EMPLOYEE_EMAIL);
    let (_guard, mut rx) = admin_session(&state);

    let (status, body) =
        call(&app, Method::POST, "/api/employees/clock-in", Some(&employee), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["record"]["clock_in_status"], "Clocked In");
    assert!(matches!(
        rx.try_recv().unwrap(),
        DashboardEvent::EmployeeClockedIn { .. }
    ));

    let (_, profile) =
        call(&app, Method::GET, "/api/employees/profile", Some(&employee), None).await;
    assert_eq!(profile["clock_in_status"], "Clocked In");

    let (status, _) =
        call(&app, Method::POST, "/api/employees/clock-out", Some(&employee), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(matches!(
        rx.try_recv().unwrap(),
        DashboardEvent::EmployeeClockedOut { .. }
    ));
}

#[tokio::test]
async fn test_add_skill_broadcasts_once() {
    let (app, state) = setup().await;
    let admin = token_for(&state, DEFAULT_ADMIN_EMAIL);
    let (_guard, mut rx) = admin_session(&state);

    let uri = "/api/employees/2/skills";
    let (status, body) =
        call(&app, Method::POST, uri, Some(&admin), Some(json!({ "skill": "Forklift" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["record"]["skills"], json!(["Forklift"]));
    assert!(matches!(
        rx.try_recv().unwrap(),
        DashboardEvent::SkillAdded { .. }
    ));

    // 重复技能不再广播
    call(&app, Method::POST, uri, Some(&admin), Some(json!({ "skill": "forklift" }))).await;
    assert!(rx.try_recv().is_err());
}
