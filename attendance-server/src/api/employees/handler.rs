//! Employee API Handlers
//!
//! 每个写操作在员工表写锁内广播对应事件，广播顺序与写入顺序一致

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shared::client::{
    AddSkillRequest, CreateEmployeeResponse, EditFieldResponse, EmployeeActionResponse,
};
use shared::message::DashboardEvent;
use shared::models::{ClockInStatus, EmployeeCreate, EmployeeId, EmployeeRecord, FieldEdit};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::validation::{MAX_NAME_LEN, normalize_edit, validate_create, validate_required_text};
use crate::utils::{AppError, AppResult};

/// Register a new employee with a login account
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<EmployeeCreate>,
) -> AppResult<(StatusCode, Json<CreateEmployeeResponse>)> {
    validate_create(&payload)?;

    let record = state
        .employees()
        .create(payload, |record| {
            state.broadcast(DashboardEvent::created(record.clone()));
        })
        .await?;
    tracing::info!(
        employee_id = record.id,
        created_by = user.id,
        "Employee created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateEmployeeResponse {
            message: "Employee created successfully".to_string(),
            record,
        }),
    ))
}

/// Edit exactly one field
///
/// 返回规范化后实际存储的值
pub async fn edit_field(
    State(state): State<ServerState>,
    Path(id): Path<EmployeeId>,
    Json(edit): Json<FieldEdit>,
) -> AppResult<Json<EditFieldResponse>> {
    let field = edit.field();
    let confirmed = normalize_edit(edit).map_err(|e| e.with_detail("field", field.as_str()))?;

    state
        .employees()
        .update_field(id, confirmed.clone(), |record| {
            state.broadcast(DashboardEvent::EmployeeUpdated {
                id,
                name: record.name.clone(),
                edit: record.field_value(field),
            });
        })?;
    tracing::info!(employee_id = id, field = %field, "Employee field updated");

    Ok(Json(EditFieldResponse {
        message: "Employee updated successfully".to_string(),
        confirmed,
    }))
}

/// Append a skill
///
/// 已存在的技能不重复添加，也不广播
pub async fn add_skill(
    State(state): State<ServerState>,
    Path(id): Path<EmployeeId>,
    Json(req): Json<AddSkillRequest>,
) -> AppResult<Json<EmployeeActionResponse>> {
    let skill = req.skill.trim();
    validate_required_text(skill, "skill", MAX_NAME_LEN)?;

    let (record, _) = state.employees().add_skill(id, skill, |record| {
        state.broadcast(DashboardEvent::SkillAdded {
            id,
            name: record.name.clone(),
            skill: skill.to_string(),
            skills: record.skills.clone(),
        });
    })?;

    Ok(Json(EmployeeActionResponse {
        message: "Skill added successfully".to_string(),
        record,
    }))
}

/// The caller's own record
pub async fn profile(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<EmployeeRecord>> {
    let record = state
        .employees()
        .find_by_id(user.id)
        .ok_or_else(|| AppError::employee_not_found(user.id))?;
    Ok(Json(record))
}

pub async fn clock_in(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<EmployeeActionResponse>> {
    let record = state
        .employees()
        .set_clock_status(user.id, ClockInStatus::ClockedIn, |record| {
            state.broadcast(DashboardEvent::EmployeeClockedIn {
                id: record.id,
                name: record.name.clone(),
            });
        })?;
    tracing::info!(employee_id = record.id, "Employee clocked in");

    Ok(Json(EmployeeActionResponse {
        message: "Clocked In successfully!".to_string(),
        record,
    }))
}

pub async fn clock_out(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<EmployeeActionResponse>> {
    let record = state
        .employees()
        .set_clock_status(user.id, ClockInStatus::NotClockedIn, |record| {
            state.broadcast(DashboardEvent::EmployeeClockedOut {
                id: record.id,
                name: record.name.clone(),
            });
        })?;
    tracing::info!(employee_id = record.id, "Employee clocked out");

    Ok(Json(EmployeeActionResponse {
        message: "Clocked Out successfully!".to_string(),
        record,
    }))
}
