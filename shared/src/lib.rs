//! Shared types for the attendance dashboard
//!
//! Common types used by attendance-server and attendance-client:
//! employee models, live event messages, API DTOs and the unified error system.

pub mod client;
pub mod error;
pub mod message;
pub mod models;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorBody, ErrorCode};
pub use message::{ChannelMessage, DashboardEvent};
pub use models::{
    ClockInStatus, DashboardSnapshot, EmployeeCreate, EmployeeField, EmployeeId, EmployeeRecord,
    FieldEdit, Role,
};
