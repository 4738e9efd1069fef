//! Data models
//!
//! Shared between attendance-server and attendance-client (via API).
//! All IDs are `i64`.

pub mod dashboard;
pub mod employee;

// Re-exports
pub use dashboard::*;
pub use employee::*;
