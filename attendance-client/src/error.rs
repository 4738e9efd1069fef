//! Client error types

use shared::ErrorCode;
use shared::models::EmployeeId;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// 事件通道被拒绝 (令牌缺失/无效/非管理员)，需要重新登录
    #[error("Event channel refused: {0}")]
    ConnectionRefused(String),

    /// 事件通道断开，可重连后全量刷新
    #[error("Event channel dropped: {0}")]
    ChannelDropped(String),

    /// 员工存储返回错误或不可达
    #[error("{message}")]
    RequestFailed {
        code: Option<ErrorCode>,
        message: String,
    },

    /// 事件引用了本地视图中不存在的员工
    #[error("Employee {0} is not in the local view")]
    UnknownEmployee(EmployeeId),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The dispatcher task is no longer running
    #[error("Dashboard session closed")]
    SessionClosed,
}

impl ClientError {
    /// 对应的共享错误码
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ConnectionRefused(_) => ErrorCode::ConnectionRefused,
            Self::ChannelDropped(_) => ErrorCode::ChannelDropped,
            Self::RequestFailed { code, .. } => code.unwrap_or(ErrorCode::RequestFailed),
            Self::UnknownEmployee(_) => ErrorCode::UnknownEmployee,
            Self::Unauthorized => ErrorCode::NotAuthenticated,
            Self::Forbidden(_) => ErrorCode::PermissionDenied,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::Http(_) => ErrorCode::NetworkError,
            Self::Serialization(_) | Self::InvalidResponse(_) => ErrorCode::InvalidFormat,
            Self::SessionClosed => ErrorCode::ClientDisconnected,
        }
    }

    /// 可恢复错误：重试或重连后可能成功
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::ConnectionRefused(_) | Self::Unauthorized | Self::Forbidden(_) | Self::SessionClosed
        )
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
