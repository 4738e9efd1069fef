//! 错误码分类与 HTTP 状态映射

use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};

/// Error family, taken from the thousands digit of the code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    General,
    Auth,
    Permission,
    Employee,
    System,
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        match self.code() / 1000 {
            0 => ErrorCategory::General,
            1 => ErrorCategory::Auth,
            2 => ErrorCategory::Permission,
            8 => ErrorCategory::Employee,
            _ => ErrorCategory::System,
        }
    }

    /// 瞬时故障，稍后重试可能成功
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::ChannelDropped | Self::RequestFailed
        )
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::NotFound | Self::EmployeeNotFound | Self::UnknownEmployee => {
                StatusCode::NOT_FOUND
            }
            Self::EmployeeEmailExists => StatusCode::CONFLICT,
            _ if self.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            _ => match self.category() {
                ErrorCategory::General | ErrorCategory::Employee => StatusCode::BAD_REQUEST,
                ErrorCategory::Auth => StatusCode::UNAUTHORIZED,
                ErrorCategory::Permission => StatusCode::FORBIDDEN,
                ErrorCategory::System => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}
