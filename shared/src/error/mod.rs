//! 统一错误体系
//!
//! - [`ErrorCode`]: 服务端与客户端共用的数值错误码
//! - [`AppError`]: 服务端错误，实现 `IntoResponse`
//! - [`ErrorBody`]: 失败响应的 JSON 体
//!
//! ```
//! use shared::error::{AppError, ErrorBody, ErrorCode};
//!
//! let err = AppError::validation("Invalid email format").with_detail("field", "email");
//! let body = ErrorBody::from(&err);
//! assert_eq!(body.error_code(), Some(ErrorCode::ValidationFailed));
//! ```

mod codes;
mod status;
mod types;

pub use codes::{ErrorCode, InvalidErrorCode};
pub use status::ErrorCategory;
pub use types::{AppError, AppResult, ErrorBody};
