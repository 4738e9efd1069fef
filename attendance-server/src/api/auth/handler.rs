//! Authentication Handlers

use axum::{Json, extract::State};
use shared::client::{CurrentUserResponse, LoginRequest, LoginResponse};

use crate::AppError;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::security_log;

/// Login handler
///
/// Authenticates credentials and returns a JWT token
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let account = state.accounts().find_by_email(&req.email);

    let verified = match account {
        Some(account) => {
            let password = req.password.clone();
            let candidate = account.clone();
            let valid = tokio::task::spawn_blocking(move || candidate.verify_password(&password))
                .await
                .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
                .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;
            valid.then_some(account)
        }
        None => None,
    };

    // 统一错误信息和固定延迟，防止邮箱枚举
    let Some(account) = verified else {
        tokio::time::sleep(state.config.login_delay).await;
        security_log!("WARN", "login_failed", email = req.email.clone());
        return Err(AppError::invalid_credentials());
    };

    let record = state
        .employees()
        .find_by_id(account.employee_id)
        .ok_or_else(|| AppError::employee_not_found(account.employee_id))?;

    let token = state
        .jwt_service
        .generate_token(record.id, &account.email, &record.name, account.role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;

    tracing::info!(
        employee_id = record.id,
        role = account.role.as_str(),
        "User logged in"
    );

    Ok(Json(LoginResponse {
        access_token: token,
        role: account.role,
        employee_id: record.id,
    }))
}

/// Get current user info
pub async fn me(user: CurrentUser) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        employee_id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
    })
}
