//! 业务服务
//!
//! - [`dashboard`] - 看板快照与建议

pub mod dashboard;

pub use dashboard::{build_snapshot, recommendations};
