//! AppError 与错误响应体

use super::codes::ErrorCode;
use super::status::ErrorCategory;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Server-side error: a code, a message and optional structured details
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<HashMap<String, Value>>,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// 使用错误码的默认消息
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// 附加一个结构化字段 (如 `field`、`employee_id`)
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ========== 构造 ==========

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    pub fn employee_not_found(id: i64) -> Self {
        Self::new(ErrorCode::EmployeeNotFound).with_detail("employee_id", id)
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, msg)
    }

    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired)
    }

    /// 非管理员访问管理接口或事件通道
    pub fn admin_required() -> Self {
        Self::new(ErrorCode::AdminRequired)
    }

    pub fn conflict(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self::with_message(code, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }
}

/// JSON body of every failed response
///
/// ```json
/// {"code": 2003, "message": "Unauthorized access"}
/// ```
///
/// 成功响应直接返回负载，不经过包装。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl ErrorBody {
    /// 已知错误码；未知数值返回 `None`
    pub fn error_code(&self) -> Option<ErrorCode> {
        ErrorCode::try_from(self.code).ok()
    }
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code.code(),
            message: err.message.clone(),
            details: err.details.clone(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.code.category() == ErrorCategory::System {
            tracing::error!(code = %self.code, message = %self.message, "System error");
        }
        (self.http_status(), axum::Json(ErrorBody::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_message() {
        let err = AppError::admin_required();
        assert_eq!(err.code, ErrorCode::AdminRequired);
        assert_eq!(err.to_string(), "Unauthorized access");
        assert_eq!(err.http_status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_details_accumulate() {
        let err = AppError::validation("name must not be empty")
            .with_detail("field", "name")
            .with_detail("max_len", 100);
        let details = err.details.unwrap();
        assert_eq!(details["field"], "name");
        assert_eq!(details["max_len"], 100);
    }

    #[test]
    fn test_error_body_shape() {
        let err = AppError::employee_not_found(7);
        let json = serde_json::to_value(ErrorBody::from(&err)).unwrap();
        assert_eq!(json["code"], 8001);
        assert_eq!(json["message"], "Employee not found");
        assert_eq!(json["details"]["employee_id"], 7);

        let body: ErrorBody =
            serde_json::from_str(r#"{"code":8002,"message":"Email is already registered"}"#)
                .unwrap();
        assert_eq!(body.error_code(), Some(ErrorCode::EmployeeEmailExists));
        assert!(body.details.is_none());
    }

    #[test]
    fn test_unknown_code_in_body() {
        let body: ErrorBody = serde_json::from_str(r#"{"code":4242,"message":"?"}"#).unwrap();
        assert_eq!(body.error_code(), None);
    }
}
