//! 错误码
//!
//! 服务端响应体与客户端错误共用同一套数值码，按千位分段：
//! 通用 0xxx、认证 1xxx、权限 2xxx、员工 8xxx、系统与同步 9xxx。

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric error code carried in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ========== 0xxx ==========
    ValidationFailed = 2,
    NotFound = 3,
    /// 响应体无法解析
    InvalidFormat = 6,

    // ========== 1xxx ==========
    NotAuthenticated = 1001,
    InvalidCredentials = 1002,
    TokenExpired = 1003,
    TokenInvalid = 1004,
    /// 事件通道在打开时被拒绝
    ConnectionRefused = 1010,

    // ========== 2xxx ==========
    PermissionDenied = 2001,
    AdminRequired = 2003,

    // ========== 8xxx ==========
    EmployeeNotFound = 8001,
    EmployeeEmailExists = 8002,
    /// 事件或编辑引用了本地视图中不存在的员工
    UnknownEmployee = 8010,

    // ========== 9xxx ==========
    InternalError = 9001,
    NetworkError = 9003,
    /// 已打开的事件通道断开
    ChannelDropped = 9010,
    /// 员工存储请求失败
    RequestFailed = 9011,
    /// 本地会话已关闭
    ClientDisconnected = 9012,
}

impl ErrorCode {
    const ALL: [ErrorCode; 18] = [
        Self::ValidationFailed,
        Self::NotFound,
        Self::InvalidFormat,
        Self::NotAuthenticated,
        Self::InvalidCredentials,
        Self::TokenExpired,
        Self::TokenInvalid,
        Self::ConnectionRefused,
        Self::PermissionDenied,
        Self::AdminRequired,
        Self::EmployeeNotFound,
        Self::EmployeeEmailExists,
        Self::UnknownEmployee,
        Self::InternalError,
        Self::NetworkError,
        Self::ChannelDropped,
        Self::RequestFailed,
        Self::ClientDisconnected,
    ];

    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Default user-facing text
    pub const fn message(&self) -> &'static str {
        match self {
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::InvalidFormat => "Malformed response",
            Self::NotAuthenticated => "Authentication required",
            Self::InvalidCredentials => "Invalid email or password",
            Self::TokenExpired => "Token has expired",
            Self::TokenInvalid => "Invalid token",
            Self::ConnectionRefused => "Event channel refused, please log in again",
            Self::PermissionDenied => "Permission denied",
            Self::AdminRequired => "Unauthorized access",
            Self::EmployeeNotFound => "Employee not found",
            Self::EmployeeEmailExists => "Email is already registered",
            Self::UnknownEmployee => "Employee is not in the local view",
            Self::InternalError => "Internal server error",
            Self::NetworkError => "Network error",
            Self::ChannelDropped => "Event channel disconnected",
            Self::RequestFailed => "Request to the employee store failed",
            Self::ClientDisconnected => "Client disconnected",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// A u16 that is not a known [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown error code {0}")]
pub struct InvalidErrorCode(pub u16);

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|c| c.code() == value)
            .ok_or(InvalidErrorCode(value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
